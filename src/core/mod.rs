pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use config::Config;
pub use errors::{
    GermankiError,
    MediaError,
    MediaFailure,
};
pub use models::{
    CardContent,
    MediaKind,
    MediaPosition,
    ResolvedMedia,
    Speaker,
};
pub use pipeline::Germanki;
