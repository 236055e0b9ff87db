//! Vocabulary and document storage
mod doc;
mod vocab;

pub use self::doc::Document;
pub use self::vocab::Vocabulary;
