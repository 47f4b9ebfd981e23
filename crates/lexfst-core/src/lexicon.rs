// Lexicon entries: parsing `graphemes | phones [| info]` lines and splitting
// both sides into symbols

use crate::encoding::EncodingError;

/// Default column delimiter of lexicon files.
pub const DEFAULT_DELIMITER: char = '|';

/// Error type for lexicon parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexiconError {
    #[error("line {line}: missing output column")]
    MissingOutput { line: usize },
    #[error("line {line}: empty input column")]
    EmptyInput { line: usize },
    #[error("line {line}: {source}")]
    Undecodable {
        line: usize,
        #[source]
        source: EncodingError,
    },
}

/// One training pair, already split into symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexiconEntry {
    /// Input side (e.g. letters).
    pub input: Vec<String>,
    /// Output side (e.g. phones). Every symbol but the first of a
    /// space-separated transcription keeps its leading space.
    pub output: Vec<String>,
    /// Optional free-text info (e.g. part of speech), carried through
    /// unmodified.
    pub info: Option<String>,
}

impl LexiconEntry {
    /// Split a plain input/output pair into symbols.
    ///
    /// See [`split_input`] and [`split_output`].
    pub fn split(input: &str, output: &str, info: Option<String>) -> Self {
        Self {
            input: split_input(input),
            output: split_output(output),
            info,
        }
    }

    /// The concatenated output side, as a forward lookup returns it.
    pub fn output_string(&self) -> String {
        self.output.concat()
    }

    /// The concatenated input side.
    pub fn input_string(&self) -> String {
        self.input.concat()
    }
}

/// Split the input side into single-character symbols.
pub fn split_input(text: &str) -> Vec<String> {
    text.chars().map(String::from).collect()
}

/// Split the output side into symbols.
///
/// If the text contains spaces it is split on them and the separating space is
/// kept as a prefix of every symbol after the first, so that concatenating
/// the symbols gives back the original text. Otherwise every character is a
/// symbol.
pub fn split_output(text: &str) -> Vec<String> {
    if text.contains(' ') {
        text.split(' ')
            .enumerate()
            .map(|(i, part)| if i == 0 { part.to_string() } else { format!(" {part}") })
            .collect()
    } else {
        split_input(text)
    }
}

/// Parse one lexicon line.
///
/// Columns are separated by `delimiter`; whitespace around each column is
/// ignored. Returns `Ok(None)` for blank lines. A third, non-empty column
/// becomes the entry's info. `line_number` is only used for error messages.
pub fn parse_line(
    line: &str,
    delimiter: char,
    line_number: usize,
) -> Result<Option<LexiconEntry>, LexiconError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut columns = line.split(delimiter).map(str::trim);
    let input = columns.next().unwrap_or_default();
    if input.is_empty() {
        return Err(LexiconError::EmptyInput { line: line_number });
    }
    let output = columns
        .next()
        .ok_or(LexiconError::MissingOutput { line: line_number })?;
    let info = columns
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Some(LexiconEntry::split(input, output, info)))
}
