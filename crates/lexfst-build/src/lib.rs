//! Alignment training and transducer compilation.
//!
//! Turns a pronunciation lexicon into the binary transducer read by
//! `lexfst-fst`:
//!
//! - [`aligner`] -- Learns grapheme/phone alignments by iterated edit distance
//! - [`trie`] -- Trie over aligned label sequences and its minimization
//! - [`encoder`] -- Bit-packed serialization of a minimized trie
//! - [`compiler`] -- The end-to-end pipeline and post-compile verification
//! - [`config`] -- Compile settings loaded from TOML

pub mod aligner;
pub mod compiler;
pub mod config;
pub mod encoder;
pub mod trie;

use std::path::PathBuf;

pub use aligner::AlignerTrainer;
pub use compiler::{CompileStats, VerifyReport, compile, compile_file, verify};
pub use config::CompileConfig;
pub use trie::{MinimizedTrie, NodeId, SymbolTrie};

/// Error type for training, minimization, encoding and compilation.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A value does not fit its bit field; `required_bits` is the width that
    /// would have been needed.
    #[error("{what} needs {required_bits} bits, layout provides {available_bits}")]
    Capacity {
        what: &'static str,
        required_bits: u32,
        available_bits: u32,
    },

    #[error("string pool of {size} bytes exceeds 16-bit offsets")]
    StringPoolOverflow { size: usize },

    #[error("label {label:?} contains a NUL character")]
    NulInLabel { label: String },

    #[error("cannot compile an empty trie")]
    EmptyTrie,

    /// A node was left without an equivalence class after minimization.
    #[error("internal error: node {node} was not classified during minimization")]
    Unminimized { node: NodeId },

    #[error(transparent)]
    Encoding(#[from] lexfst_core::EncodingError),

    #[error(transparent)]
    Lexicon(#[from] lexfst_core::LexiconError),

    #[error(transparent)]
    Format(#[from] lexfst_fst::FstError),

    #[error("failed to read lexicon: {0}")]
    Read(#[from] std::io::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),
}
