// Alignment learning: iterated edit-distance alignment of input symbols to
// output symbol spans, with costs re-estimated from the previous epoch

use std::io::BufRead;

use hashbrown::{HashMap, HashSet};
use lexfst_core::lexicon::{self, LexiconEntry};
use lexfst_core::{LexiconError, NULL_SYMBOL, StringPairLabel, TextEncoding};

use crate::BuildError;

/// Cost of any operation the training data has not made cheaper.
pub const DEFAULT_COST: u32 = 10;

/// Number of training epochs used by the compile pipeline.
pub const DEFAULT_EPOCHS: usize = 4;

/// Learns which span of output symbols each input symbol produces.
///
/// Two operations are scored: aligning one more output symbol to the current
/// input symbol, at a learned per-pair cost, and skipping to the next input
/// symbol without consuming output. A skip is free unless the previous step
/// was a skip as well.
#[derive(Debug, Clone)]
pub struct AlignerTrainer {
    /// Learned pair costs, keyed by input then output symbol. Only costs below
    /// [`DEFAULT_COST`] are stored.
    align_costs: HashMap<String, HashMap<String, u32>>,
    skip_cost: u32,
    /// Identical input and output symbols align for free.
    in_is_out: bool,
    entries: Vec<LexiconEntry>,
    input_symbols: HashSet<String>,
}

impl Default for AlignerTrainer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AlignerTrainer {
    pub fn new(in_is_out: bool) -> Self {
        let mut input_symbols = HashSet::new();
        input_symbols.insert(NULL_SYMBOL.to_string());
        Self {
            align_costs: HashMap::new(),
            skip_cost: DEFAULT_COST,
            in_is_out,
            entries: Vec::new(),
            input_symbols,
        }
    }

    // -----------------------------------------------------------------------
    // Training data
    // -----------------------------------------------------------------------

    /// Read `input | output [| info]` lines in `encoding`; returns the number
    /// of entries added.
    pub fn read_lexicon<R: BufRead>(
        &mut self,
        mut reader: R,
        delimiter: char,
        encoding: TextEncoding,
    ) -> Result<usize, BuildError> {
        let mut added = 0;
        let mut line_number = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;
            let bytes = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
            let line = encoding
                .decode(bytes)
                .map_err(|source| LexiconError::Undecodable {
                    line: line_number,
                    source,
                })?;
            if let Some(entry) = lexicon::parse_line(&line, delimiter, line_number)? {
                self.add_entry(entry);
                added += 1;
            }
        }
        tracing::debug!(added, total = self.entries.len(), "read lexicon");
        Ok(added)
    }

    /// Split a plain pair into symbols and add it.
    ///
    /// The input side becomes one symbol per character. The output side is
    /// split on spaces if it has any, otherwise per character.
    pub fn split_and_add(&mut self, input: &str, output: &str) {
        self.add_entry(LexiconEntry::split(input, output, None));
    }

    /// Add a pair whose symbols were split by the caller.
    pub fn add_already_split(
        &mut self,
        input: Vec<String>,
        output: Vec<String>,
        info: Option<String>,
    ) {
        self.add_entry(LexiconEntry {
            input,
            output,
            info,
        });
    }

    pub fn add_entry(&mut self, entry: LexiconEntry) {
        for symbol in &entry.input {
            if !self.input_symbols.contains(symbol.as_str()) {
                self.input_symbols.insert(symbol.clone());
            }
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    pub fn lexicon_size(&self) -> usize {
        self.entries.len()
    }

    /// Every input symbol seen so far, plus the `"null"` placeholder.
    pub fn input_symbols(&self) -> &HashSet<String> {
        &self.input_symbols
    }

    // -----------------------------------------------------------------------
    // Costs
    // -----------------------------------------------------------------------

    pub fn skip_cost(&self) -> u32 {
        self.skip_cost
    }

    /// Cost of aligning `output` to `input`.
    pub fn symbol_cost(&self, input: &str, output: &str) -> u32 {
        match self.align_costs.get(input).and_then(|costs| costs.get(output)) {
            Some(&cost) => cost,
            None if self.in_is_out && input == output => 0,
            None => DEFAULT_COST,
        }
    }

    /// Number of learned pair costs.
    pub fn learned_pairs(&self) -> usize {
        self.align_costs.values().map(HashMap::len).sum()
    }

    // -----------------------------------------------------------------------
    // Alignment
    // -----------------------------------------------------------------------

    /// Cheapest alignment of `output` to `input` under the current costs.
    ///
    /// `boundaries[i]` is the index into `output` up to which input symbol `i`
    /// is aligned: input symbol `i` produces `output[boundaries[i - 1]..
    /// boundaries[i]]` (with an implicit `0` before the first symbol). The
    /// boundaries are non-decreasing and the last one is `output.len()`.
    ///
    /// The dynamic program runs column by column over the input, keeping one
    /// previous column of costs, skip flags and boundary rows. On equal costs
    /// the align operation wins.
    pub fn align<I, O>(&self, input: &[I], output: &[O]) -> Vec<usize>
    where
        I: AsRef<str>,
        O: AsRef<str>,
    {
        let Some(first) = input.first() else {
            return Vec::new();
        };
        let n = input.len();
        let rows = output.len() + 1;
        let skip = self.skip_cost;

        // Column 0: the first input symbol absorbs output[..j]
        let mut prev_cost = vec![0u32; rows];
        let mut prev_skip = vec![false; rows];
        let mut prev_rows = vec![vec![0usize; n]; rows];
        prev_skip[0] = true;
        for j in 1..rows {
            prev_rows[j][0] = j;
            prev_cost[j] = prev_cost[j - 1]
                .saturating_add(self.symbol_cost(first.as_ref(), output[j - 1].as_ref()));
        }

        let mut cost = vec![0u32; rows];
        let mut skipped = vec![false; rows];
        let mut cur_rows = vec![vec![0usize; n]; rows];

        for (i, symbol) in input.iter().enumerate().skip(1) {
            let symbol = symbol.as_ref();

            cost[0] = prev_cost[0].saturating_add(skip);
            skipped[0] = true;
            cur_rows[0].copy_from_slice(&prev_rows[0]);
            cur_rows[0][i] = 0;

            for j in 1..rows {
                let skip_step = if prev_skip[j] { skip } else { 0 };
                let skip_total = skip_step.saturating_add(prev_cost[j]);
                let align_total = self
                    .symbol_cost(symbol, output[j - 1].as_ref())
                    .saturating_add(cost[j - 1]);

                if skip_total < align_total {
                    cost[j] = skip_total;
                    skipped[j] = true;
                    cur_rows[j].copy_from_slice(&prev_rows[j]);
                } else {
                    cost[j] = align_total;
                    skipped[j] = false;
                    let (done, rest) = cur_rows.split_at_mut(j);
                    rest[0][..i].copy_from_slice(&done[j - 1][..i]);
                }
                cur_rows[j][i] = j;
            }

            std::mem::swap(&mut prev_cost, &mut cost);
            std::mem::swap(&mut prev_skip, &mut skipped);
            std::mem::swap(&mut prev_rows, &mut cur_rows);
        }

        std::mem::take(&mut prev_rows[rows - 1])
    }

    /// Align every entry with the current costs and re-estimate the costs
    /// from the result.
    pub fn align_iteration(&mut self) {
        // Output symbols absorbed per input symbol
        let mut absorbed: HashMap<&str, usize> = HashMap::new();
        // Occurrences of each (input, output) pairing
        let mut pairings: HashMap<(&str, &str), usize> = HashMap::new();
        let mut symbols = 0usize;
        let mut skips = 0usize;

        for entry in &self.entries {
            let boundaries = self.align(&entry.input, &entry.output);
            symbols += entry.input.len();

            let mut start = 0;
            for (input, &end) in entry.input.iter().zip(&boundaries) {
                if end == start {
                    skips += 1;
                } else {
                    *absorbed.entry(input.as_str()).or_default() += end - start;
                    for output in &entry.output[start..end] {
                        *pairings
                            .entry((input.as_str(), output.as_str()))
                            .or_default() += 1;
                    }
                }
                start = end;
            }
        }

        let skip_cost = neg_log2(skips, symbols);

        let mut align_costs: HashMap<String, HashMap<String, u32>> = HashMap::new();
        for ((input, output), count) in pairings {
            let Some(&total) = absorbed.get(input) else {
                continue;
            };
            let cost = neg_log2(count, total);
            if cost < DEFAULT_COST {
                align_costs
                    .entry(input.to_string())
                    .or_default()
                    .insert(output.to_string(), cost);
            }
        }

        self.skip_cost = skip_cost;
        self.align_costs = align_costs;
    }

    /// Run `epochs` alignment iterations.
    pub fn train(&mut self, epochs: usize) {
        for epoch in 0..epochs {
            self.align_iteration();
            tracing::info!(
                epoch,
                skip_cost = self.skip_cost,
                learned_pairs = self.learned_pairs(),
                "alignment epoch finished"
            );
        }
    }

    /// The entry as labels: each input symbol paired with the concatenation
    /// of the output symbols aligned to it.
    pub fn alignment(&self, entry: &LexiconEntry) -> Vec<StringPairLabel> {
        let boundaries = self.align(&entry.input, &entry.output);
        let mut start = 0;
        entry
            .input
            .iter()
            .zip(boundaries)
            .map(|(input, end)| {
                let output = entry.output[start..end].concat();
                start = end;
                StringPairLabel::new(input.as_str(), output)
            })
            .collect()
    }

    /// The alignment in readable form: each input symbol followed by its
    /// output symbols, space separated.
    pub fn alignment_strings(&self, entry: &LexiconEntry) -> Vec<String> {
        let boundaries = self.align(&entry.input, &entry.output);
        let mut start = 0;
        entry
            .input
            .iter()
            .zip(boundaries)
            .map(|(input, end)| {
                let mut text = input.clone();
                for output in &entry.output[start..end] {
                    text.push(' ');
                    text.push_str(output);
                }
                start = end;
                text
            })
            .collect()
    }

    /// The alignment followed by an `(info, "")` label, or `None` for an
    /// entry without info.
    ///
    /// Looking up `word + info` in a transducer that contains this sequence
    /// yields the entry's output.
    pub fn info_alignment(&self, entry: &LexiconEntry) -> Option<Vec<StringPairLabel>> {
        let info = entry.info.as_deref()?;
        let mut labels = self.alignment(entry);
        labels.push(StringPairLabel::new(info, ""));
        Some(labels)
    }
}

/// `trunc(-log2(count / total))`; a zero count gives `u32::MAX`, `0 / 0` gives 0.
fn neg_log2(count: usize, total: usize) -> u32 {
    let fraction = count as f64 / total as f64;
    (-fraction.log2()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn trained(pairs: &[(&str, &str)], epochs: usize) -> AlignerTrainer {
        let mut trainer = AlignerTrainer::default();
        for (input, output) in pairs {
            trainer.split_and_add(input, output);
        }
        trainer.train(epochs);
        trainer
    }

    #[test]
    fn untrained_alignment_is_monotone_and_complete() {
        let trainer = AlignerTrainer::default();
        let input = symbols(&["c", "a", "t"]);
        let output = symbols(&["k", " ae", " t"]);
        let boundaries = trainer.align(&input, &output);
        assert_eq!(boundaries.len(), 3);
        assert!(boundaries.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*boundaries.last().unwrap(), 3);
    }

    #[test]
    fn untrained_alignment_pairs_one_to_one() {
        // All operations cost 10; the diagonal costs 30 and any skip path more
        let trainer = AlignerTrainer::default();
        let boundaries = trainer.align(&["c", "a", "t"], &["k", " ae", " t"]);
        assert_eq!(boundaries, vec![1, 2, 3]);
    }

    #[test]
    fn single_input_symbol_absorbs_everything() {
        let trainer = AlignerTrainer::default();
        assert_eq!(trainer.align(&["x"], &["k", "s"]), vec![2]);
    }

    #[test]
    fn more_input_than_output_skips() {
        let trainer = AlignerTrainer::default();
        let boundaries = trainer.align(&["e", "e", "e"], &["i"]);
        assert_eq!(boundaries.len(), 3);
        assert_eq!(*boundaries.last().unwrap(), 1);
        assert!(boundaries.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_sides() {
        let trainer = AlignerTrainer::default();
        let empty: [&str; 0] = [];
        assert!(trainer.align(&empty, &["a"]).is_empty());
        assert_eq!(trainer.align(&["a", "b"], &empty), vec![0, 0]);
    }

    #[test]
    fn alignment_is_deterministic() {
        let trainer = trained(&[("cat", "k ae t"), ("bat", "b ae t")], 4);
        let entry = &trainer.entries()[0];
        let first = trainer.align(&entry.input, &entry.output);
        for _ in 0..5 {
            assert_eq!(trainer.align(&entry.input, &entry.output), first);
        }
    }

    #[test]
    fn in_is_out_makes_identity_free() {
        let trainer = AlignerTrainer::new(true);
        assert_eq!(trainer.symbol_cost("a", "a"), 0);
        assert_eq!(trainer.symbol_cost("a", "b"), DEFAULT_COST);
        let plain = AlignerTrainer::default();
        assert_eq!(plain.symbol_cost("a", "a"), DEFAULT_COST);
    }

    #[test]
    fn training_lowers_observed_costs_only() {
        let trainer = trained(&[("cat", "k ae t"), ("bat", "b ae t"), ("can", "k ae n")], 4);
        assert!(trainer.symbol_cost("c", "k") < DEFAULT_COST);
        assert!(trainer.symbol_cost("t", " t") < DEFAULT_COST);
        assert!(trainer.symbol_cost("a", " ae") < DEFAULT_COST);
        assert_eq!(trainer.symbol_cost("c", " t"), DEFAULT_COST);
        assert_eq!(trainer.symbol_cost("z", "k"), DEFAULT_COST);
        assert!(trainer.learned_pairs() > 0);
    }

    #[test]
    fn no_skips_saturate_skip_cost() {
        // One output symbol per input symbol: epoch 0 aligns the diagonal
        let trainer = trained(&[("ab", "xy")], 1);
        assert_eq!(trainer.skip_cost(), u32::MAX);
        // Still aligns without overflowing
        assert_eq!(trainer.align(&["a", "b"], &["x", "y"]), vec![1, 2]);
    }

    #[test]
    fn training_without_input_symbols_zeroes_skip_cost() {
        let mut trainer = AlignerTrainer::default();
        assert_eq!(trainer.skip_cost(), DEFAULT_COST);
        trainer.train(3);
        assert_eq!(trainer.skip_cost(), 0);
        assert_eq!(trainer.learned_pairs(), 0);

        let mut trainer = AlignerTrainer::default();
        trainer.add_already_split(Vec::new(), symbols(&["x"]), None);
        trainer.align_iteration();
        assert_eq!(trainer.skip_cost(), 0);
    }

    #[test]
    fn alignment_concatenates_output_spans() {
        let trainer = trained(&[("cat", "k ae t"), ("bat", "b ae t"), ("can", "k ae n")], 4);
        let entry = &trainer.entries()[0];
        let labels = trainer.alignment(entry);
        assert_eq!(
            labels,
            vec![
                StringPairLabel::new("c", "k"),
                StringPairLabel::new("a", " ae"),
                StringPairLabel::new("t", " t"),
            ]
        );
        let joined: String = labels.iter().map(StringPairLabel::output).collect();
        assert_eq!(joined, "k ae t");
    }

    #[test]
    fn alignment_strings_are_readable() {
        let trainer = trained(&[("ab", "xy")], 1);
        let entry = &trainer.entries()[0];
        assert_eq!(trainer.alignment_strings(entry), vec!["a x", "b y"]);
    }

    #[test]
    fn info_alignment_appends_info_label() {
        let mut trainer = AlignerTrainer::default();
        trainer.add_already_split(symbols(&["a"]), symbols(&["x"]), Some("NN".to_string()));
        trainer.split_and_add("b", "y");

        let with_info = trainer.info_alignment(&trainer.entries()[0]).unwrap();
        assert_eq!(
            with_info,
            vec![StringPairLabel::new("a", "x"), StringPairLabel::new("NN", "")]
        );
        assert!(trainer.info_alignment(&trainer.entries()[1]).is_none());
    }

    #[test]
    fn read_lexicon_parses_columns() {
        let text = "cat | k ae t\n\n bat|b ae t | NN \ncan|k ae n\n";
        let mut trainer = AlignerTrainer::default();
        let added = trainer
            .read_lexicon(text.as_bytes(), '|', TextEncoding::Utf8)
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(trainer.lexicon_size(), 3);
        let bat = &trainer.entries()[1];
        assert_eq!(bat.input, symbols(&["b", "a", "t"]));
        assert_eq!(bat.output, symbols(&["b", " ae", " t"]));
        assert_eq!(bat.info.as_deref(), Some("NN"));
        assert!(trainer.entries()[0].info.is_none());
    }

    #[test]
    fn read_lexicon_reports_line_number() {
        let text = "cat|k ae t\nbroken\n";
        let mut trainer = AlignerTrainer::default();
        let err = trainer
            .read_lexicon(text.as_bytes(), '|', TextEncoding::Utf8)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Lexicon(LexiconError::MissingOutput { line: 2 })
        ));
    }

    #[test]
    fn read_lexicon_decodes_latin1() {
        let bytes = b"k\xe4si|k ae s i\r\nyo|j o\n";
        let mut trainer = AlignerTrainer::default();
        assert_eq!(
            trainer
                .read_lexicon(&bytes[..], '|', TextEncoding::Latin1)
                .unwrap(),
            2
        );
        assert_eq!(trainer.entries()[0].input, symbols(&["k", "\u{00e4}", "s", "i"]));
        assert_eq!(trainer.entries()[0].output_string(), "k ae s i");

        // The same bytes are not UTF-8
        let mut trainer = AlignerTrainer::default();
        let err = trainer
            .read_lexicon(&bytes[..], '|', TextEncoding::Utf8)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Lexicon(LexiconError::Undecodable { line: 1, .. })
        ));
    }

    #[test]
    fn input_symbols_include_null() {
        let mut trainer = AlignerTrainer::default();
        assert!(trainer.input_symbols().contains(NULL_SYMBOL));
        trainer.split_and_add("ab", "xy");
        trainer.add_already_split(symbols(&["ch"]), symbols(&["k"]), None);
        let syms = trainer.input_symbols();
        assert_eq!(syms.len(), 4);
        assert!(syms.contains("a") && syms.contains("b") && syms.contains("ch"));
    }
}
