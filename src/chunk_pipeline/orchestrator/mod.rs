pub mod core;

pub use self::core::{decode_chunk, decode_document, DecodedDocument};
