// Compile settings, loadable from a TOML file

use std::path::Path;

use lexfst_core::TextEncoding;
use lexfst_core::lexicon::DEFAULT_DELIMITER;
use lexfst_fst::transition::{ArcLayout, DEFAULT_ARC_OFFSET_BITS};
use serde::Deserialize;

use crate::BuildError;
use crate::aligner::DEFAULT_EPOCHS;

/// Settings of one lexicon compilation.
///
/// ```toml
/// epochs = 4
/// delimiter = "|"
/// encoding = "UTF-8"
/// lexicon_encoding = "ISO-8859-1"
/// arc_offset_bits = 20
/// include_info = true
/// verify = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileConfig {
    /// Alignment training epochs.
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// Identical input and output symbols align for free.
    #[serde(default)]
    pub in_is_out: bool,
    /// Lexicon column delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Encoding of the artifact's string pool.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Encoding of the lexicon file.
    #[serde(default = "default_encoding")]
    pub lexicon_encoding: String,
    /// Width of the arc target field.
    #[serde(default = "default_arc_offset_bits")]
    pub arc_offset_bits: u32,
    /// Also insert `word + info` sequences for entries that carry info.
    #[serde(default = "default_true")]
    pub include_info: bool,
    /// Look every entry up in the compiled artifact afterwards.
    #[serde(default = "default_true")]
    pub verify: bool,
}

fn default_epochs() -> usize {
    DEFAULT_EPOCHS
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_encoding() -> String {
    TextEncoding::default().name().to_string()
}

fn default_arc_offset_bits() -> u32 {
    DEFAULT_ARC_OFFSET_BITS
}

fn default_true() -> bool {
    true
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            in_is_out: false,
            delimiter: default_delimiter(),
            encoding: default_encoding(),
            lexicon_encoding: default_encoding(),
            arc_offset_bits: default_arc_offset_bits(),
            include_info: true,
            verify: true,
        }
    }
}

impl CompileConfig {
    /// Load from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BuildError> {
        let config: Self =
            toml::from_str(content).map_err(|e| BuildError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that deserialization cannot.
    pub fn validate(&self) -> Result<(), BuildError> {
        self.text_encoding()?;
        self.lexicon_text_encoding()?;
        self.layout()?;
        Ok(())
    }

    pub fn text_encoding(&self) -> Result<TextEncoding, BuildError> {
        parse_encoding(&self.encoding)
    }

    pub fn lexicon_text_encoding(&self) -> Result<TextEncoding, BuildError> {
        parse_encoding(&self.lexicon_encoding)
    }

    pub fn layout(&self) -> Result<ArcLayout, BuildError> {
        ArcLayout::new(self.arc_offset_bits).map_err(|e| BuildError::Config(e.to_string()))
    }
}

fn parse_encoding(name: &str) -> Result<TextEncoding, BuildError> {
    name.parse()
        .map_err(|e: lexfst_core::EncodingError| BuildError::Config(e.to_string()))
}
