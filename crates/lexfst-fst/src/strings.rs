// Label strings: the offset table and the NUL-terminated string pool

use hashbrown::HashMap;
use lexfst_core::TextEncoding;

use crate::FstError;
use crate::format::{read_u16_table, read_u32};
use crate::transition::RESERVED_LABELS;

/// Decoded (input, output) strings of every label field.
///
/// Fields 0 and 1 are the reserved empty labels.
#[derive(Debug, Clone, Default)]
pub struct LabelStrings {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl LabelStrings {
    /// Number of label fields, reserved ones included.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Input and output string of a label field.
    pub fn get(&self, label: u32) -> Option<(&str, &str)> {
        let i = label as usize;
        Some((self.inputs.get(i)?.as_str(), self.outputs.get(i)?.as_str()))
    }

    /// `(match, replacement)` for a traversal direction.
    ///
    /// The caller guarantees `label < len()` (checked at load time).
    #[inline]
    pub fn sides(&self, label: u32, generate: bool) -> (&str, &str) {
        let i = label as usize;
        if generate {
            (&self.outputs[i], &self.inputs[i])
        } else {
            (&self.inputs[i], &self.outputs[i])
        }
    }
}

/// Parse the label offset table starting at `offset`; everything after the
/// table is the string pool.
///
/// The pool is scanned once for NUL terminators and each run is decoded with
/// `encoding`; every offset in the table must point at the start of a run.
pub fn parse_label_strings(
    data: &[u8],
    offset: usize,
    encoding: TextEncoding,
) -> Result<LabelStrings, FstError> {
    let pair_count = read_u32(data, offset)? as usize;
    if pair_count < RESERVED_LABELS as usize {
        return Err(FstError::InvalidStringPool(format!(
            "{pair_count} label pairs, expected at least {RESERVED_LABELS}"
        )));
    }
    let offsets = read_u16_table(data, offset + 4, pair_count * 2)?;
    let pool = &data[offset + 4 + pair_count * 4..];

    let runs = scan_pool(pool, encoding)?;

    let mut inputs = Vec::with_capacity(pair_count);
    let mut outputs = Vec::with_capacity(pair_count);
    for (i, pair) in offsets.chunks_exact(2).enumerate() {
        inputs.push(resolve(&runs, pair[0], i)?);
        outputs.push(resolve(&runs, pair[1], i)?);
    }

    Ok(LabelStrings { inputs, outputs })
}

/// Map from pool offset to the string starting there.
fn scan_pool(pool: &[u8], encoding: TextEncoding) -> Result<HashMap<u16, String>, FstError> {
    let mut runs = HashMap::new();
    let mut start = 0;
    while start < pool.len() {
        let len = pool[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| FstError::InvalidStringPool(format!("unterminated string at {start}")))?;
        let key = u16::try_from(start).map_err(|_| {
            FstError::InvalidStringPool(format!("string at {start} beyond 16-bit offsets"))
        })?;
        let text = encoding
            .decode(&pool[start..start + len])
            .map_err(|e| FstError::InvalidStringPool(format!("string at {start}: {e}")))?;
        runs.insert(key, text);
        start += len + 1;
    }
    Ok(runs)
}

fn resolve(runs: &HashMap<u16, String>, offset: u16, label: usize) -> Result<String, FstError> {
    runs.get(&offset).cloned().ok_or_else(|| {
        FstError::InvalidStringPool(format!(
            "label {label}: offset {offset} does not start a string"
        ))
    })
}
