pub mod config;
pub mod error;
pub mod index;
pub mod listfmt;
pub mod loader;
pub mod model;
pub mod persist;
pub mod rank;
pub mod tokenizer;
pub mod vector;
pub mod vocabulary;

pub use error::{Result, VsmError};
pub use index::{DocId, InvertedIndex, Model, Query, RankedEntry, RankedResults, Ranking, Term};
