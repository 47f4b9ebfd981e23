// Serialization of a minimized trie into the bit-packed transducer format

use std::path::Path;

use lexfst_core::TextEncoding;
use lexfst_fst::format::{self, FstHeader};
use lexfst_fst::transition::{
    ArcLayout, FINAL_LABEL, RESERVED_LABELS, START_LABEL, Transition, bits_needed,
};

use crate::BuildError;
use crate::trie::MinimizedTrie;

/// Encode `trie` into a complete artifact.
///
/// Every class becomes one contiguous block of arcs, in class id order,
/// starting at arc 1 (arc 0 is the start arc). A final class ends with a
/// synthetic arc carrying the final label. Capacity limits are checked before
/// anything is produced.
pub fn encode(
    trie: &MinimizedTrie<'_>,
    encoding: TextEncoding,
    layout: ArcLayout,
) -> Result<Vec<u8>, BuildError> {
    let labels = trie.trie().labels();

    // Arc offset of each class; the extra last entry is the total arc count
    let mut offsets = Vec::with_capacity(trie.class_count() + 1);
    let mut next: u64 = 1;
    offsets.push(next);
    for class in 0..trie.class_count() {
        next += trie.arc_count(class) as u64 + u64::from(trie.is_final(class));
        offsets.push(next);
    }
    let arc_count = next;

    if arc_count > u64::from(layout.max_target()) {
        return Err(BuildError::Capacity {
            what: "arc offsets",
            required_bits: bits_needed(arc_count),
            available_bits: layout.arc_offset_bits(),
        });
    }
    let label_fields = labels.len() as u64 + u64::from(RESERVED_LABELS);
    if label_fields - 1 > u64::from(layout.max_label()) {
        return Err(BuildError::Capacity {
            what: "label fields",
            required_bits: bits_needed(label_fields - 1),
            available_bits: layout.label_bits(),
        });
    }

    // String pool: two reserved empty pairs, then `input NUL output NUL` per
    // label
    let mut pool = vec![0u8; 4];
    let mut string_offsets: Vec<usize> = vec![0, 1, 2, 3];
    for label in labels.iter() {
        for text in [label.input(), label.output()] {
            let bytes = encoding.encode(text)?;
            // NUL terminates pool strings
            if bytes.contains(&0) {
                return Err(BuildError::NulInLabel {
                    label: label.to_string(),
                });
            }
            string_offsets.push(pool.len());
            pool.extend_from_slice(&bytes);
            pool.push(0);
        }
    }
    if pool.len() > usize::from(u16::MAX) {
        return Err(BuildError::StringPoolOverflow { size: pool.len() });
    }

    let header = FstHeader::new(encoding, layout);
    let mut out = Vec::with_capacity(
        64 + arc_count as usize * 4 + string_offsets.len() * 2 + pool.len(),
    );
    format::write_header(&mut out, &header);

    format::write_u32(&mut out, arc_count as u32);
    let start = Transition {
        target: offsets[trie.root_class()] as u32,
        label: START_LABEL,
        last: true,
    };
    format::write_u32(&mut out, layout.pack(start)?);

    for class in 0..trie.class_count() {
        let mut arcs: Vec<Transition> = trie
            .class_arcs(class)
            .map(|(label, target)| Transition {
                target: offsets[target] as u32,
                label: label + RESERVED_LABELS,
                last: false,
            })
            .collect();
        if trie.is_final(class) {
            arcs.push(Transition {
                target: offsets[class] as u32,
                label: FINAL_LABEL,
                last: false,
            });
        }
        if let Some(last) = arcs.last_mut() {
            last.last = true;
        }
        for arc in arcs {
            format::write_u32(&mut out, layout.pack(arc)?);
        }
    }

    format::write_u32(&mut out, label_fields as u32);
    for offset in string_offsets {
        format::write_u16(&mut out, offset as u16);
    }
    out.extend_from_slice(&pool);

    tracing::info!(
        classes = trie.class_count(),
        arcs = arc_count,
        labels = labels.len(),
        pool_bytes = pool.len(),
        bytes = out.len(),
        "encoded transducer"
    );
    Ok(out)
}

/// Encode `trie` and write it to `path`; returns the artifact size.
///
/// The artifact is built in memory first, so a failing encode leaves no file
/// behind.
pub fn write_to_path(
    trie: &MinimizedTrie<'_>,
    encoding: TextEncoding,
    layout: ArcLayout,
    path: impl AsRef<Path>,
) -> Result<usize, BuildError> {
    let path = path.as_ref();
    let data = encode(trie, encoding, layout)?;
    std::fs::write(path, &data).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(data.len())
}
