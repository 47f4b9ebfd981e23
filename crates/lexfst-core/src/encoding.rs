// Text encodings for the transducer string pool

use std::fmt;
use std::str::FromStr;

/// Error type for encoding lookups and conversions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("unsupported text encoding: {0}")]
    Unsupported(String),
    #[error("character {ch:?} cannot be represented in {encoding}")]
    Unmappable { ch: char, encoding: TextEncoding },
    #[error("invalid {encoding} byte sequence")]
    InvalidBytes { encoding: TextEncoding },
}

/// Character encoding used for the strings stored in a transducer.
///
/// Names follow the IANA spelling that is written into the artifact header
/// (`UTF-8`, `ISO-8859-1`, `US-ASCII`); parsing accepts common aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl TextEncoding {
    /// Canonical name written into the artifact header.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Latin1 => "ISO-8859-1",
            TextEncoding::Ascii => "US-ASCII",
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Latin1 | TextEncoding::Ascii => {
                let max = if self == TextEncoding::Ascii { 0x7F } else { 0xFF };
                text.chars()
                    .map(|ch| {
                        let code = ch as u32;
                        if code <= max {
                            Ok(code as u8)
                        } else {
                            Err(EncodingError::Unmappable { ch, encoding: self })
                        }
                    })
                    .collect()
            }
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|_| EncodingError::InvalidBytes { encoding: self }),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Ascii => {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| b as char).collect())
                } else {
                    Err(EncodingError::InvalidBytes { encoding: self })
                }
            }
        }
    }
}

impl FromStr for TextEncoding {
    type Err = EncodingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "iso88591" | "latin1" | "l1" => Ok(TextEncoding::Latin1),
            "usascii" | "ascii" => Ok(TextEncoding::Ascii),
            _ => Err(EncodingError::Unsupported(name.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("utf8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("ISO-8859-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("ASCII".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii);
        assert!(matches!(
            "EBCDIC".parse::<TextEncoding>(),
            Err(EncodingError::Unsupported(_))
        ));
    }

    #[test]
    fn canonical_name_parses_back() {
        for enc in [TextEncoding::Utf8, TextEncoding::Latin1, TextEncoding::Ascii] {
            assert_eq!(enc.name().parse::<TextEncoding>().unwrap(), enc);
        }
    }

    #[test]
    fn latin1_is_one_byte_per_char() {
        let bytes = TextEncoding::Latin1.encode("s\u{00e4}\u{00e4}").unwrap();
        assert_eq!(bytes, vec![b's', 0xE4, 0xE4]);
        assert_eq!(TextEncoding::Latin1.decode(&bytes).unwrap(), "s\u{00e4}\u{00e4}");
    }

    #[test]
    fn unmappable_characters_are_rejected() {
        let err = TextEncoding::Latin1.encode("\u{0283}").unwrap_err();
        assert!(matches!(err, EncodingError::Unmappable { ch: '\u{0283}', .. }));
        assert!(TextEncoding::Ascii.encode("\u{00e4}").is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(TextEncoding::Utf8.decode(&[0xC3]).is_err());
        assert!(TextEncoding::Ascii.decode(&[0x80]).is_err());
    }
}
