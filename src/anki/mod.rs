pub mod api;
pub mod card;
pub mod types;

pub use api::{
    AnkiConnectClient,
    AnkiConnectError,
};
pub use card::{
    CardAssembler,
    CardFaces,
};
pub use types::{
    AnkiCard,
    AnkiMedia,
};
