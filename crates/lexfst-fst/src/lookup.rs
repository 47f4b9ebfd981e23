// Transducer loading and bidirectional lookup

use std::fmt;
use std::path::Path;

use lexfst_core::TextEncoding;

use crate::config::{LookupConfig, TraversalFrame};
use crate::format::{self, FstHeader};
use crate::strings::{self, LabelStrings};
use crate::transition::Transition;
use crate::{FstError, Transducer};

/// A loaded lexicon transducer.
///
/// Immutable after loading; lookups take `&self` and keep all traversal state
/// in a [`LookupConfig`], so one instance can serve concurrent lookups from
/// many threads.
pub struct FstLookup {
    header: FstHeader,
    /// Decoded arc table. Index 0 is the start arc.
    transitions: Vec<Transition>,
    /// Strings of every label field.
    strings: LabelStrings,
    /// Stack frames needed for the longest path from the start state.
    max_depth: usize,
}

impl fmt::Debug for FstLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FstLookup")
            .field("encoding", &self.header.encoding)
            .field("arc_offset_bits", &self.header.layout.arc_offset_bits())
            .field("transition_count", &self.transitions.len())
            .field("label_count", &self.strings.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl FstLookup {
    /// Load a transducer from its binary form (with header).
    pub fn from_bytes(data: &[u8]) -> Result<Self, FstError> {
        let (header, pos) = format::parse_header(data)?;
        Self::from_bytes_inner(data, pos, header)
    }

    /// Load a header-less legacy transducer whose strings use `encoding`.
    pub fn from_legacy_bytes(data: &[u8], encoding: TextEncoding) -> Result<Self, FstError> {
        Self::from_bytes_inner(data, 0, FstHeader::legacy(encoding))
    }

    /// Read and load a transducer file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FstError> {
        Self::from_bytes(&read_file(path.as_ref())?)
    }

    /// Read and load a header-less legacy transducer file.
    pub fn from_legacy_path(
        path: impl AsRef<Path>,
        encoding: TextEncoding,
    ) -> Result<Self, FstError> {
        Self::from_legacy_bytes(&read_file(path.as_ref())?, encoding)
    }

    fn from_bytes_inner(data: &[u8], pos: usize, header: FstHeader) -> Result<Self, FstError> {
        let arc_count = format::read_u32(data, pos)? as usize;
        if arc_count == 0 {
            return Err(FstError::InvalidArcTable("no start arc".to_string()));
        }
        let raw = format::read_u32_table(data, pos + 4, arc_count)?;
        let transitions: Vec<Transition> =
            raw.iter().map(|&r| header.layout.unpack(r)).collect();

        let label_pos = pos + 4 + arc_count * 4;
        let strings = strings::parse_label_strings(data, label_pos, header.encoding)?;

        validate(&transitions, &strings)?;
        let max_depth = longest_path(&transitions)? + 1;

        Ok(Self {
            header,
            transitions,
            strings,
            max_depth,
        })
    }

    pub fn header(&self) -> &FstHeader {
        &self.header
    }

    pub fn encoding(&self) -> TextEncoding {
        self.header.encoding
    }

    /// Number of arcs, the start arc included.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Number of label fields, the two reserved ones included.
    pub fn label_count(&self) -> usize {
        self.strings.len()
    }

    pub fn strings(&self) -> &LabelStrings {
        &self.strings
    }

    /// Number of stack frames a traversal can reach: one for the start
    /// state plus one per label on the longest path.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Create a new configuration suitable for this transducer.
    pub fn new_config(&self) -> LookupConfig {
        LookupConfig::new(self.max_depth)
    }

    /// All outputs for `word` in the forward direction.
    pub fn lookup(&self, word: &str) -> Vec<String> {
        self.lookup_with(word, false)
    }

    /// All outputs for `word`; with `generate` the output side is matched and
    /// the input side emitted.
    ///
    /// An empty vector means the word is not covered by the transducer.
    pub fn lookup_with(&self, word: &str, generate: bool) -> Vec<String> {
        let mut config = self.new_config();
        self.prepare(&mut config, word, generate);
        let mut results = Vec::new();
        let mut output = String::new();
        while self.next(&mut config, &mut output) {
            results.push(output.clone());
        }
        results
    }
}

impl Transducer for FstLookup {
    type Config = LookupConfig;

    fn prepare(&self, config: &mut Self::Config, input: &str, generate: bool) {
        config.reset();
        config.generate = generate;
        config.input.push_str(input);
        config.frames.push(TraversalFrame {
            next_arc: Some(self.transitions[0].target),
            input_pos: 0,
            output_len: 0,
        });
    }

    /// Depth-first backtracking traversal.
    ///
    /// Every arc of a block is explored, not only the first match: several
    /// labels may match the same prefix. The output buffer is truncated to the
    /// frame's entry length before each arc, which undoes whatever the
    /// previous sibling appended.
    fn next(&self, config: &mut Self::Config, output: &mut String) -> bool {
        while let Some(frame) = config.frames.last_mut() {
            let Some(arc_idx) = frame.next_arc else {
                // Block exhausted: pop (backtrack up)
                config.frames.pop();
                continue;
            };

            let arc = self.transitions[arc_idx as usize];
            frame.next_arc = if arc.last { None } else { Some(arc_idx + 1) };
            let input_pos = frame.input_pos;
            config.output.truncate(frame.output_len);

            if arc.is_final() {
                if input_pos == config.input.len() {
                    output.clear();
                    output.push_str(&config.output);
                    return true;
                }
                continue;
            }

            let (matched, replacement) = self.strings.sides(arc.label, config.generate);
            let rest = &config.input.as_bytes()[input_pos..];
            if !rest.starts_with(matched.as_bytes()) {
                continue;
            }
            if config.frames.len() >= config.max_depth {
                continue;
            }

            // Push down
            config.output.push_str(replacement);
            config.frames.push(TraversalFrame {
                next_arc: Some(arc.target),
                input_pos: input_pos + matched.len(),
                output_len: config.output.len(),
            });
        }
        false
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, FstError> {
    std::fs::read(path).map_err(|source| FstError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Structural checks that make traversal panic-free: every target and label
/// is in range and the table ends with a flagged arc, so no block runs past
/// the end.
fn validate(transitions: &[Transition], strings: &LabelStrings) -> Result<(), FstError> {
    let count = transitions.len();
    for (i, arc) in transitions.iter().enumerate() {
        if arc.target as usize >= count {
            return Err(FstError::InvalidArcTable(format!(
                "arc {i} targets {} of {count}",
                arc.target
            )));
        }
        if arc.label as usize >= strings.len() {
            return Err(FstError::InvalidArcTable(format!(
                "arc {i} has label {} of {}",
                arc.label,
                strings.len()
            )));
        }
    }
    if !transitions[count - 1].last {
        return Err(FstError::InvalidArcTable(
            "last arc of the table is not flagged".to_string(),
        ));
    }
    Ok(())
}

/// Number of label arcs on the longest path from the start state.
///
/// Iterative post-order DFS over states (block start indices). Final arcs are
/// not edges. A state reached again while still on the stack is a cycle,
/// which compiled transducers never contain.
fn longest_path(transitions: &[Transition]) -> Result<usize, FstError> {
    const UNSEEN: usize = usize::MAX;
    const ACTIVE: usize = usize::MAX - 1;

    let mut longest = vec![UNSEEN; transitions.len()];
    // (state, next arc of its block, longest path found so far)
    let mut stack: Vec<(usize, Option<usize>, usize)> = Vec::new();
    let root = transitions[0].target as usize;
    longest[root] = ACTIVE;
    stack.push((root, Some(root), 0));

    while let Some(top) = stack.last_mut() {
        let (state, next_arc, best) = *top;
        let Some(arc_idx) = next_arc else {
            longest[state] = best;
            stack.pop();
            if let Some(parent) = stack.last_mut() {
                parent.2 = parent.2.max(best + 1);
            }
            continue;
        };

        let arc = transitions[arc_idx];
        top.1 = if arc.last { None } else { Some(arc_idx + 1) };
        if arc.is_final() {
            continue;
        }

        let target = arc.target as usize;
        match longest[target] {
            ACTIVE => {
                return Err(FstError::InvalidArcTable(format!(
                    "arc {arc_idx} closes a cycle through state {target}"
                )));
            }
            UNSEEN => {
                longest[target] = ACTIVE;
                stack.push((target, Some(target), 0));
            }
            depth => top.2 = top.2.max(depth + 1),
        }
    }
    Ok(longest[root])
}
