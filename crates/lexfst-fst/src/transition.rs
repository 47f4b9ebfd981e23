// Packed arc layout: target offset, label field and last-arc flag in one u32

use crate::FstError;

/// Width of a packed arc.
pub const OVERALL_BITS: u32 = 32;

/// Default width of the target offset field (bits 0-19).
pub const DEFAULT_ARC_OFFSET_BITS: u32 = 20;

/// Default width of the label field (bits 20-30).
pub const DEFAULT_LABEL_BITS: u32 = OVERALL_BITS - DEFAULT_ARC_OFFSET_BITS - 1;

/// Bit 31 marks the last arc of a state.
const LAST_ARC_FLAG: u32 = 1 << (OVERALL_BITS - 1);

/// Label field of the synthetic final arc (empty label).
pub const FINAL_LABEL: u32 = 0;

/// Label field of the start arc (empty label).
pub const START_LABEL: u32 = 1;

/// Number of reserved label fields; trie label `k` is written as `k + 2`.
pub const RESERVED_LABELS: u32 = 2;

const _: () = assert!(DEFAULT_LABEL_BITS == 11);
const _: () = assert!(DEFAULT_ARC_OFFSET_BITS + DEFAULT_LABEL_BITS + 1 == OVERALL_BITS);

/// One decoded arc.
///
/// `target` is the index of the first arc of the target state in the arc
/// table. For the final arc the target is the state's own offset and carries
/// no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub target: u32,
    pub label: u32,
    pub last: bool,
}

impl Transition {
    pub fn is_final(&self) -> bool {
        self.label == FINAL_LABEL
    }
}

/// Split of the 31 payload bits between target offset and label field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArcLayout {
    arc_offset_bits: u32,
}

impl Default for ArcLayout {
    fn default() -> Self {
        Self {
            arc_offset_bits: DEFAULT_ARC_OFFSET_BITS,
        }
    }
}

impl ArcLayout {
    /// Create a layout with `arc_offset_bits` bits for the target offset.
    ///
    /// Both fields need at least one bit, so the accepted range is `1..=30`.
    pub fn new(arc_offset_bits: u32) -> Result<Self, FstError> {
        if arc_offset_bits == 0 || arc_offset_bits >= OVERALL_BITS - 1 {
            return Err(FstError::UnsupportedBitWidths {
                overall_bits: OVERALL_BITS,
                arc_offset_bits,
            });
        }
        Ok(Self { arc_offset_bits })
    }

    pub fn arc_offset_bits(&self) -> u32 {
        self.arc_offset_bits
    }

    pub fn label_bits(&self) -> u32 {
        OVERALL_BITS - 1 - self.arc_offset_bits
    }

    #[inline]
    fn offset_mask(&self) -> u32 {
        (1 << self.arc_offset_bits) - 1
    }

    #[inline]
    fn label_mask(&self) -> u32 {
        (1 << self.label_bits()) - 1
    }

    /// Largest target offset that fits the layout.
    pub fn max_target(&self) -> u32 {
        self.offset_mask()
    }

    /// Largest label field that fits the layout.
    pub fn max_label(&self) -> u32 {
        self.label_mask()
    }

    /// Pack an arc, checking that every field fits its width.
    pub fn pack(&self, arc: Transition) -> Result<u32, FstError> {
        if arc.target > self.offset_mask() {
            return Err(FstError::FieldOverflow {
                field: "arc target",
                value: arc.target as u64,
                bits: self.arc_offset_bits,
            });
        }
        if arc.label > self.label_mask() {
            return Err(FstError::FieldOverflow {
                field: "label",
                value: arc.label as u64,
                bits: self.label_bits(),
            });
        }
        let flag = if arc.last { LAST_ARC_FLAG } else { 0 };
        Ok(arc.target | (arc.label << self.arc_offset_bits) | flag)
    }

    /// Split a packed arc into its fields.
    #[inline]
    pub fn unpack(&self, raw: u32) -> Transition {
        Transition {
            target: raw & self.offset_mask(),
            label: (raw >> self.arc_offset_bits) & self.label_mask(),
            last: raw & LAST_ARC_FLAG != 0,
        }
    }
}

/// Number of bits needed to represent `value`.
pub fn bits_needed(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_widths() {
        let layout = ArcLayout::default();
        assert_eq!(layout.arc_offset_bits(), 20);
        assert_eq!(layout.label_bits(), 11);
        assert_eq!(layout.max_target(), 0x000F_FFFF);
        assert_eq!(layout.max_label(), 0x7FF);
    }

    #[test]
    fn field_extraction() {
        let layout = ArcLayout::default();
        // target=0x12345, label=0x2AB, last
        let raw = 0x12345 | (0x2AB << 20) | (1 << 31);
        let arc = layout.unpack(raw);
        assert_eq!(arc.target, 0x12345);
        assert_eq!(arc.label, 0x2AB);
        assert!(arc.last);
        assert_eq!(layout.pack(arc).unwrap(), raw);
    }

    #[test]
    fn start_arc_encoding() {
        let layout = ArcLayout::default();
        let raw = layout
            .pack(Transition {
                target: 1,
                label: START_LABEL,
                last: true,
            })
            .unwrap();
        assert_eq!(raw, 1 | (1 << 20) | (1 << 31));
    }

    #[test]
    fn final_arc_is_recognized() {
        let layout = ArcLayout::default();
        let arc = layout.unpack(5 | (1 << 31));
        assert!(arc.is_final());
        assert!(arc.last);
        assert!(!layout.unpack(5 | (3 << 20)).is_final());
    }

    #[test]
    fn extremes_fit() {
        let layout = ArcLayout::default();
        let arc = Transition {
            target: layout.max_target(),
            label: layout.max_label(),
            last: false,
        };
        let raw = layout.pack(arc).unwrap();
        assert_eq!(raw, 0x7FFF_FFFF);
        assert_eq!(layout.unpack(raw), arc);
    }

    #[test]
    fn overflowing_fields_are_rejected() {
        let layout = ArcLayout::default();
        let err = layout
            .pack(Transition {
                target: 1 << 20,
                label: 0,
                last: false,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FstError::FieldOverflow {
                field: "arc target",
                bits: 20,
                ..
            }
        ));
        let err = layout
            .pack(Transition {
                target: 0,
                label: 2048,
                last: false,
            })
            .unwrap_err();
        assert!(matches!(err, FstError::FieldOverflow { bits: 11, .. }));
    }

    #[test]
    fn custom_layout_shifts_labels() {
        let layout = ArcLayout::new(16).unwrap();
        assert_eq!(layout.label_bits(), 15);
        let arc = Transition {
            target: 0xFFFF,
            label: 0x4000,
            last: true,
        };
        assert_eq!(layout.unpack(layout.pack(arc).unwrap()), arc);
    }

    #[test]
    fn invalid_layouts() {
        assert!(ArcLayout::new(0).is_err());
        assert!(ArcLayout::new(31).is_err());
        assert!(ArcLayout::new(30).is_ok());
        assert!(ArcLayout::new(1).is_ok());
    }

    #[test]
    fn bits_needed_counts_significant_bits() {
        assert_eq!(bits_needed(0), 0);
        assert_eq!(bits_needed(1), 1);
        assert_eq!(bits_needed(2047), 11);
        assert_eq!(bits_needed(2048), 12);
        assert_eq!(bits_needed(1 << 20), 21);
    }
}
