// Compile pipeline: lexicon -> trained alignments -> trie -> minimized ->
// encoded artifact, plus verification of the result

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lexfst_fst::FstLookup;

use crate::BuildError;
use crate::aligner::AlignerTrainer;
use crate::config::CompileConfig;
use crate::encoder;
use crate::trie::SymbolTrie;

/// Sizes of one compilation, for logging and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileStats {
    pub entries: usize,
    /// Sequences inserted into the trie (info sequences included).
    pub sequences: usize,
    pub labels: usize,
    pub nodes: usize,
    pub classes: usize,
    pub bytes: usize,
}

/// Insert every entry's alignment into a new trie, and with `include_info`
/// also the info alignment of entries that carry info.
pub fn build_trie(trainer: &AlignerTrainer, include_info: bool) -> SymbolTrie {
    let mut trie = SymbolTrie::new();
    for entry in trainer.entries() {
        trie.insert(&trainer.alignment(entry));
        if include_info {
            if let Some(labels) = trainer.info_alignment(entry) {
                trie.insert(&labels);
            }
        }
    }
    trie
}

/// Train `trainer` and compile its entries into an artifact.
pub fn compile(
    trainer: &mut AlignerTrainer,
    config: &CompileConfig,
) -> Result<(Vec<u8>, CompileStats), BuildError> {
    let encoding = config.text_encoding()?;
    let layout = config.layout()?;

    trainer.train(config.epochs);
    let trie = build_trie(trainer, config.include_info);
    let minimized = trie.minimize()?;
    let data = encoder::encode(&minimized, encoding, layout)?;

    let stats = CompileStats {
        entries: trainer.lexicon_size(),
        sequences: trie.sequence_count(),
        labels: trie.labels().len(),
        nodes: trie.node_count(),
        classes: minimized.class_count(),
        bytes: data.len(),
    };
    Ok((data, stats))
}

/// Compile the lexicon file at `lexicon` into `output`.
///
/// The artifact is written only after compilation succeeded. With
/// `config.verify` it is then loaded back and every entry looked up.
pub fn compile_file(
    lexicon: &Path,
    output: &Path,
    config: &CompileConfig,
) -> Result<(CompileStats, Option<VerifyReport>), BuildError> {
    let file = File::open(lexicon).map_err(|source| BuildError::Io {
        path: lexicon.to_path_buf(),
        source,
    })?;
    let mut trainer = AlignerTrainer::new(config.in_is_out);
    trainer.read_lexicon(
        BufReader::new(file),
        config.delimiter,
        config.lexicon_text_encoding()?,
    )?;
    tracing::info!(
        lexicon = %lexicon.display(),
        entries = trainer.lexicon_size(),
        "read lexicon"
    );

    let (data, stats) = compile(&mut trainer, config)?;
    std::fs::write(output, &data).map_err(|source| BuildError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::info!(output = %output.display(), ?stats, "wrote transducer");

    let report = if config.verify {
        let fst = FstLookup::from_bytes(&data)?;
        Some(verify(&fst, &trainer))
    } else {
        None
    };
    Ok((stats, report))
}

/// One entry whose lookup did not give exactly its expected output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyFailure {
    pub input: String,
    pub expected: String,
    pub actual: Vec<String>,
}

/// Result of looking every training entry up in a compiled artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub correct: usize,
    pub failures: Vec<VerifyFailure>,
}

impl VerifyReport {
    pub fn total(&self) -> usize {
        self.correct + self.failures.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Look up every entry of `trainer` in `fst`.
///
/// An entry is correct when the lookup yields exactly one result equal to the
/// entry's output. Words with several pronunciations in the lexicon therefore
/// count as failures.
pub fn verify(fst: &FstLookup, trainer: &AlignerTrainer) -> VerifyReport {
    let mut report = VerifyReport::default();
    for entry in trainer.entries() {
        let input = entry.input_string();
        let expected = entry.output_string();
        let actual = fst.lookup(&input);
        if actual.len() == 1 && actual[0] == expected {
            report.correct += 1;
        } else {
            tracing::warn!(%input, %expected, ?actual, "lookup mismatch");
            report.failures.push(VerifyFailure {
                input,
                expected,
                actual,
            });
        }
    }
    tracing::info!(
        total = report.total(),
        correct = report.correct,
        failed = report.failed(),
        "verification complete"
    );
    report
}
