// Binary transducer format: header parsing/writing, big-endian table access
//
// Layout (all integers big-endian):
//
//   [i32 encoding name length][encoding name, UTF-8]
//   [i32 overall bits][i32 arc offset bits]
//   [i32 arc count][arc count x u32 packed arc]
//   [i32 label pair count][label pair count x 2 x u16 pool offset]
//   [string pool bytes]
//
// Legacy artifacts omit the first three fields.

use lexfst_core::TextEncoding;

use crate::FstError;
use crate::transition::{ArcLayout, OVERALL_BITS};

/// Upper bound for the encoding name length accepted from a header.
const MAX_ENCODING_NAME_LEN: usize = 64;

/// Parsed transducer header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FstHeader {
    /// Encoding of the string pool.
    pub encoding: TextEncoding,
    /// Bit layout of the packed arcs.
    pub layout: ArcLayout,
}

impl FstHeader {
    pub fn new(encoding: TextEncoding, layout: ArcLayout) -> Self {
        Self { encoding, layout }
    }

    /// Header assumed for header-less artifacts: caller-supplied encoding and
    /// the default bit widths.
    pub fn legacy(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            layout: ArcLayout::default(),
        }
    }
}

/// Parses and validates the transducer header.
///
/// Returns the header and the offset of the arc table.
pub fn parse_header(data: &[u8]) -> Result<(FstHeader, usize), FstError> {
    let name_len = read_u32(data, 0)? as usize;
    if name_len == 0 || name_len > MAX_ENCODING_NAME_LEN {
        return Err(FstError::InvalidHeader(format!(
            "encoding name length {name_len} out of range"
        )));
    }
    let name_end = 4 + name_len;
    let name_bytes = data.get(4..name_end).ok_or(FstError::TooShort {
        expected: name_end,
        actual: data.len(),
    })?;
    let name = std::str::from_utf8(name_bytes)
        .map_err(|_| FstError::InvalidHeader("encoding name is not UTF-8".to_string()))?;
    let encoding: TextEncoding = name.parse()?;

    let overall_bits = read_u32(data, name_end)?;
    let arc_offset_bits = read_u32(data, name_end + 4)?;
    if overall_bits != OVERALL_BITS {
        return Err(FstError::UnsupportedBitWidths {
            overall_bits,
            arc_offset_bits,
        });
    }
    let layout = ArcLayout::new(arc_offset_bits)?;

    Ok((FstHeader { encoding, layout }, name_end + 8))
}

/// Appends the header to `out`.
pub fn write_header(out: &mut Vec<u8>, header: &FstHeader) {
    let name = header.encoding.name().as_bytes();
    write_u32(out, name.len() as u32);
    out.extend_from_slice(name);
    write_u32(out, OVERALL_BITS);
    write_u32(out, header.layout.arc_offset_bits());
}

// ---------------------------------------------------------------------------
// Big-endian primitives
// ---------------------------------------------------------------------------

pub fn read_u32(data: &[u8], pos: usize) -> Result<u32, FstError> {
    let bytes = data.get(pos..pos + 4).ok_or(FstError::TooShort {
        expected: pos + 4,
        actual: data.len(),
    })?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Copy `count` big-endian `u32` values starting at `pos` into an aligned
/// vector.
///
/// The source slice may not be 4-byte aligned, so the bytes are copied into
/// the vector's storage first and converted from big-endian in place.
pub fn read_u32_table(data: &[u8], pos: usize, count: usize) -> Result<Vec<u32>, FstError> {
    let end = count
        .checked_mul(size_of::<u32>())
        .and_then(|len| len.checked_add(pos))
        .ok_or_else(|| FstError::InvalidHeader(format!("table of {count} entries overflows")))?;
    let src = data.get(pos..end).ok_or(FstError::TooShort {
        expected: end,
        actual: data.len(),
    })?;

    let mut table = vec![0u32; count];
    bytemuck::cast_slice_mut::<u32, u8>(&mut table).copy_from_slice(src);
    for value in &mut table {
        *value = u32::from_be(*value);
    }
    Ok(table)
}

/// Like [`read_u32_table`], for `u16` values.
pub fn read_u16_table(data: &[u8], pos: usize, count: usize) -> Result<Vec<u16>, FstError> {
    let end = count
        .checked_mul(size_of::<u16>())
        .and_then(|len| len.checked_add(pos))
        .ok_or_else(|| FstError::InvalidHeader(format!("table of {count} entries overflows")))?;
    let src = data.get(pos..end).ok_or(FstError::TooShort {
        expected: end,
        actual: data.len(),
    })?;

    let mut table = vec![0u16; count];
    bytemuck::cast_slice_mut::<u16, u8>(&mut table).copy_from_slice(src);
    for value in &mut table {
        *value = u16::from_be(*value);
    }
    Ok(table)
}
