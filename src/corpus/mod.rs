// Corpus data model: tokens, sentences, documents and the corpus aggregate.

pub mod corpus;
pub mod document;
pub mod tagger;
pub mod token;

pub use corpus::{Corpus, EntityIndex, SeriesDict};
pub use document::{Document, Language};
pub use tagger::{annotate_corpus, SimpleTagger, Tagger};
pub use token::{Sentence, Token, DELETED};
