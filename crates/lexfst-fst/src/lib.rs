//! Lexicon transducer runtime.
//!
//! This crate loads the bit-packed binary transducers produced by
//! `lexfst-build` and answers bidirectional lookups against them: forward
//! (graphemes to phones) and generating (phones back to graphemes).
//!
//! # Architecture
//!
//! - [`format`] -- Header parsing/writing and big-endian table access
//! - [`transition`] -- Arc bit-field layout, packing and unpacking
//! - [`strings`] -- Label offset table and string pool decoding
//! - [`config`] -- Traversal configuration (explicit DFS stack)
//! - [`lookup`] -- Transducer loading and traversal
//! - [`registry`] -- Load-once cache of transducers shared between threads

pub mod config;
pub mod format;
pub mod lookup;
pub mod registry;
pub mod strings;
pub mod transition;

use std::path::PathBuf;

pub use lookup::FstLookup;
pub use registry::{ArtifactKey, TransducerRegistry};

/// Error type for transducer parsing and loading.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("unsupported encoding in header: {0}")]
    UnsupportedEncoding(#[from] lexfst_core::EncodingError),
    #[error("unsupported bit widths: {overall_bits} overall, {arc_offset_bits} for arc offsets")]
    UnsupportedBitWidths { overall_bits: u32, arc_offset_bits: u32 },
    #[error("{field} value {value} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        bits: u32,
    },
    #[error("invalid arc table: {0}")]
    InvalidArcTable(String),
    #[error("invalid string pool: {0}")]
    InvalidStringPool(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for transducer traversal.
///
/// The `prepare` + `next` pattern is a coroutine-like interface: `prepare` sets
/// up the configuration for a new input, and each `next` call yields one output
/// string.
pub trait Transducer {
    type Config;

    /// Prepare the configuration for traversing `input`.
    ///
    /// With `generate == false` the input side of each label is matched and the
    /// output side is emitted; with `generate == true` the roles are swapped.
    fn prepare(&self, config: &mut Self::Config, input: &str, generate: bool);

    /// Yield the next output from the transducer.
    ///
    /// Returns `true` if an output was found, `false` if no more outputs exist.
    fn next(&self, config: &mut Self::Config, output: &mut String) -> bool;
}
