pub mod anki;
pub mod core;
pub mod input;
pub mod logging;
pub mod media;
pub mod persistence;
pub mod preview;
