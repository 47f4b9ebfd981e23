// Traversal configuration: explicit DFS stack for backtracking lookup

/// One level of the DFS stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalFrame {
    /// Next arc to examine in this state's block, `None` once the flagged
    /// last arc has been processed.
    pub next_arc: Option<u32>,
    /// Byte offset into the input at which this state was entered.
    pub input_pos: usize,
    /// Length of the output buffer when this state was entered. The buffer is
    /// truncated back to it before every arc of the block (undo).
    pub output_len: usize,
}

/// Traversal configuration for [`FstLookup`](crate::FstLookup).
///
/// Holds the input, the direction, the output buffer and the explicit DFS
/// stack, so one configuration can be reused for many lookups without
/// reallocating.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Maximum stack depth.
    pub max_depth: usize,
    /// Match output-side strings and emit input-side strings.
    pub generate: bool,
    /// The word being looked up.
    pub input: String,
    /// Output accumulated along the current path.
    pub output: String,
    /// DFS stack; the top is the state currently being explored.
    pub frames: Vec<TraversalFrame>,
}

impl LookupConfig {
    /// Create a new traversal configuration with the given maximum depth.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            generate: false,
            input: String::new(),
            output: String::new(),
            frames: Vec::with_capacity(max_depth.min(64)),
        }
    }

    /// Reset to the initial state (called at the start of `prepare`).
    #[inline]
    pub fn reset(&mut self) {
        self.generate = false;
        self.input.clear();
        self.output.clear();
        self.frames.clear();
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
