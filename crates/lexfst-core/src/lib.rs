//! Shared types for lexicon transducers.
//!
//! - [`label`] -- string pair labels and the dense label table
//! - [`lexicon`] -- lexicon line parsing and symbol splitting
//! - [`encoding`] -- text encodings of the transducer string pool

pub mod encoding;
pub mod label;
pub mod lexicon;

pub use encoding::{EncodingError, TextEncoding};
pub use label::{LabelId, LabelTable, NULL_SYMBOL, StringPairLabel};
pub use lexicon::{LexiconEntry, LexiconError};
