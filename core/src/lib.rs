//! Core retrieval library: text analysis, inverted index, TF-IDF statistics,
//! boolean and cosine-ranked search over a fixed corpus of crawled pages.

pub mod analyzer;
pub mod boolean;
pub mod corpus;
pub mod error;
pub mod index;
pub mod persist;
pub mod stats;
pub mod vector;

pub use corpus::{Corpus, DocId, Document};
pub use error::{Error, Result};
pub use index::InvertedIndex;
