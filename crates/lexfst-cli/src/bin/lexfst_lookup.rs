// lexfst-lookup: Look words up in a compiled lexicon transducer.
//
// Prints every output for each word, or "(no result)" when the word is not
// covered. With --generate the transducer runs backwards (phones to
// graphemes).
//
// Usage:
//   lexfst-lookup [-f FST] [-g] [--legacy ENCODING] [WORD...]
//
// Options:
//   -f, --fst FILE          Transducer file (default: $LEXFST_PATH)
//   -g, --generate          Match output strings, print input strings
//   --legacy ENCODING       Read a header-less transducer in ENCODING
//   -h, --help              Print help

use std::io::{self, BufRead, Write};

use lexfst_fst::FstLookup;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-lookup: Look words up in a lexicon transducer.");
        println!();
        println!("Usage: lexfst-lookup [-f FST] [-g] [--legacy ENCODING] [WORD...]");
        println!();
        println!("If WORD arguments are given, looks up each word.");
        println!("Otherwise reads words from stdin (one per line).");
        println!();
        println!("Options:");
        println!("  -f, --fst FILE          Transducer file (default: $LEXFST_PATH)");
        println!("  -g, --generate          Match output strings, print input strings");
        println!("  --legacy ENCODING       Read a header-less transducer in ENCODING");
        println!("  -h, --help              Print this help");
        return;
    }

    lexfst_cli::init_logging();

    let (fst_path, args) =
        lexfst_cli::parse_option(&args, "--fst", Some("-f")).unwrap_or_else(|e| lexfst_cli::fatal(&e));
    let (legacy, args) = lexfst_cli::parse_option(&args, "--legacy", None)
        .unwrap_or_else(|e| lexfst_cli::fatal(&e));
    let (generate, words) = lexfst_cli::parse_flag(&args, "--generate", Some("-g"));

    if let Some(unknown) = words.iter().find(|w| w.starts_with("--")) {
        lexfst_cli::fatal(&format!("unknown option {unknown}"));
    }

    let fst = lexfst_cli::load_transducer(fst_path.as_deref(), legacy.as_deref())
        .unwrap_or_else(|e| lexfst_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let lookup_word = |word: &str, fst: &FstLookup, out: &mut io::BufWriter<io::StdoutLock<'_>>| {
        let results = fst.lookup_with(word, generate);
        if results.is_empty() {
            let _ = writeln!(out, "{word}: (no result)");
        } else {
            for result in results {
                let _ = writeln!(out, "{word}: {result}");
            }
        }
    };

    if words.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("error reading stdin: {e}");
                    break;
                }
            };
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            lookup_word(word, &fst, &mut out);
        }
    } else {
        for word in &words {
            lookup_word(word, &fst, &mut out);
        }
    }
}
