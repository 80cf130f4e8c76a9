//! Standalone HTML page showing every card face.

use std::path::Path;

use tracing::info;

use crate::{
    anki::CardFaces,
    core::{
        CardContent,
        GermankiError,
    },
};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn render_page(cards: &[CardContent], faces: &[CardFaces]) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>germanki preview</title>\n\
         <style>\nbody { font-family: sans-serif; }\n\
         .card { border: 1px solid #ccc; border-radius: 8px; margin: 1em; padding: 1em; }\n\
         .face { margin: 0.5em 0; }\nh3 { font-size: 0.8em; color: #888; margin: 0; }\n</style>\n\
         </head>\n<body>\n",
    );

    for (card, face) in cards.iter().zip(faces) {
        page.push_str(&format!("<div class=\"card\">\n<h2>{}</h2>\n", escape(card.query_word())));
        for (label, html) in [("FRONT", &face.front), ("BACK", &face.back), ("EXTRA", &face.extra)] {
            page.push_str(&format!("<div class=\"face\">\n<h3>{label}</h3>\n{html}\n</div>\n"));
        }
        page.push_str("</div>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}

pub fn write_page(path: &Path, cards: &[CardContent], faces: &[CardFaces]) -> Result<(), GermankiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_page(cards, faces))?;
    info!(path = %path.display(), cards = cards.len(), "Preview written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_page_lists_every_face() {
        let cards = vec![CardContent::new("Hund", vec!["dog".to_string()])];
        let faces = vec![CardFaces {
            front: "Hund<br><audio controls src=\"a.mp3\" style=\"\"></audio>".to_string(),
            back: "dog".to_string(),
            extra: String::new(),
        }];

        let page = render_page(&cards, &faces);

        assert!(page.contains("<h2>Hund</h2>"));
        assert!(page.contains("<h3>FRONT</h3>\nHund<br><audio"));
        assert!(page.contains("<h3>BACK</h3>\ndog"));
        assert!(page.contains("<h3>EXTRA</h3>"));
    }

    #[test]
    fn test_write_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("preview.html");

        write_page(&path, &[], &[]).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
