// book-ablation: ablation experiments on book corpora
//
// This is the library root. Each module corresponds to one stage of the
// corpus -> filter -> aspect vectors -> evaluation workflow.

pub mod aspects;
pub mod common_words;
pub mod config;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod store;

pub use error::{CorpusError, Result};
