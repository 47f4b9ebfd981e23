// Criterion benchmarks for lexicon compilation and lookup.
//
// The lexicon is generated, so no data files are needed.
//
// Run:
//   cargo bench -p lexfst-build

use criterion::{Criterion, criterion_group, criterion_main};
use lexfst_build::{AlignerTrainer, CompileConfig, compile};
use lexfst_fst::FstLookup;

// ---------------------------------------------------------------------------
// Synthetic lexicon
// ---------------------------------------------------------------------------

const ONSETS: &[(&str, &str)] = &[
    ("b", "b"),
    ("d", "d"),
    ("k", "k"),
    ("m", "m"),
    ("p", "p"),
    ("s", "s"),
    ("t", "t"),
    ("sh", "sh"),
];
const NUCLEI: &[(&str, &str)] = &[("a", "ae"), ("e", "e"), ("i", "i"), ("o", "o"), ("oo", "uu")];
const CODAS: &[(&str, &str)] = &[("", ""), ("n", "n"), ("t", "t"), ("ng", "ng"), ("ck", "k")];

/// Two-syllable words built from the tables above, with space-separated
/// transcriptions.
fn synthetic_lexicon() -> Vec<(String, String)> {
    let mut syllables = Vec::new();
    for (og, op) in ONSETS {
        for (ng, np) in NUCLEI {
            for (cg, cp) in CODAS {
                let mut phones = vec![*op, *np];
                if !cp.is_empty() {
                    phones.push(*cp);
                }
                syllables.push((format!("{og}{ng}{cg}"), phones.join(" ")));
            }
        }
    }
    let mut words = Vec::new();
    for (i, (g1, p1)) in syllables.iter().enumerate() {
        for (g2, p2) in syllables.iter().skip(i % 7).step_by(23) {
            words.push((format!("{g1}{g2}"), format!("{p1} {p2}")));
        }
    }
    words
}

fn trainer_for(words: &[(String, String)]) -> AlignerTrainer {
    let mut trainer = AlignerTrainer::default();
    for (graphemes, phones) in words {
        trainer.split_and_add(graphemes, phones);
    }
    trainer
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_align_epoch(c: &mut Criterion) {
    let words = synthetic_lexicon();
    let trainer = trainer_for(&words);
    c.bench_function("align_epoch", |b| {
        b.iter(|| {
            let mut t = trainer.clone();
            t.align_iteration();
            std::hint::black_box(t.skip_cost());
        });
    });
}

fn bench_compile(c: &mut Criterion) {
    let words = synthetic_lexicon();
    let config = CompileConfig {
        verify: false,
        ..CompileConfig::default()
    };
    c.bench_function("compile_lexicon", |b| {
        b.iter(|| {
            let mut trainer = trainer_for(&words);
            let (data, _) = compile(&mut trainer, &config).expect("compile");
            std::hint::black_box(data);
        });
    });
}

fn bench_lookup(c: &mut Criterion) {
    let words = synthetic_lexicon();
    let mut trainer = trainer_for(&words);
    let (data, _) = compile(&mut trainer, &CompileConfig::default()).expect("compile");
    let fst = FstLookup::from_bytes(&data).expect("load");

    c.bench_function("lookup_forward", |b| {
        b.iter(|| {
            for (graphemes, _) in &words {
                std::hint::black_box(fst.lookup(graphemes));
            }
        });
    });

    c.bench_function("lookup_generate", |b| {
        b.iter(|| {
            for (_, phones) in &words {
                std::hint::black_box(fst.lookup_with(phones, true));
            }
        });
    });
}

criterion_group!(benches, bench_align_epoch, bench_compile, bench_lookup);
criterion_main!(benches);
