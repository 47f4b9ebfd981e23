// lexfst-compile: Compile a pronunciation lexicon into a transducer.
//
// Reads `graphemes | phones [| info]` lines, learns the grapheme/phone
// alignment, and writes the minimized binary transducer. Afterwards every
// entry is looked up in the result and mismatches are reported.
//
// Usage:
//   lexfst-compile [OPTIONS] LEXICON OUTPUT
//
// Options:
//   -c, --config FILE       TOML file with compile settings
//   -e, --epochs N          Alignment training epochs
//   --encoding NAME         String encoding (UTF-8, ISO-8859-1, US-ASCII)
//   --lexicon-encoding NAME Encoding of the lexicon file
//   --delimiter CHAR        Lexicon column delimiter
//   --arc-offset-bits N     Width of the arc target field
//   --no-info               Do not compile `word + info` entries
//   --no-verify             Skip the lookup check after writing
//   -h, --help              Print help

use std::path::Path;
use std::process;

use lexfst_build::{CompileConfig, compile_file};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-compile: Compile a pronunciation lexicon into a transducer.");
        println!();
        println!("Usage: lexfst-compile [OPTIONS] LEXICON OUTPUT");
        println!();
        println!("Options:");
        println!("  -c, --config FILE       TOML file with compile settings");
        println!("  -e, --epochs N          Alignment training epochs (default: 4)");
        println!("  --encoding NAME         String encoding (default: UTF-8)");
        println!("  --lexicon-encoding NAME Encoding of the lexicon file (default: UTF-8)");
        println!("  --delimiter CHAR        Lexicon column delimiter (default: |)");
        println!("  --arc-offset-bits N     Width of the arc target field (default: 20)");
        println!("  --no-info               Do not compile `word + info` entries");
        println!("  --no-verify             Skip the lookup check after writing");
        println!("  -h, --help              Print this help");
        return;
    }

    lexfst_cli::init_logging();

    let (config, rest) = parse_config(&args).unwrap_or_else(|e| lexfst_cli::fatal(&e));
    tracing::debug!(?config, "compile settings");

    if let Some(unknown) = rest.iter().find(|a| a.starts_with('-')) {
        lexfst_cli::fatal(&format!("unknown option {unknown}"));
    }
    let [lexicon, output] = rest.as_slice() else {
        lexfst_cli::fatal("expected LEXICON and OUTPUT arguments (see --help)");
    };

    let (stats, report) = compile_file(Path::new(lexicon), Path::new(output), &config)
        .unwrap_or_else(|e| lexfst_cli::fatal(&e.to_string()));

    println!(
        "{output}: {} entries, {} labels, {} states, {} bytes",
        stats.entries, stats.labels, stats.classes, stats.bytes
    );

    if let Some(report) = report {
        println!(
            "verified {} entries ({} correct, {} failed)",
            report.total(),
            report.correct,
            report.failed()
        );
        for failure in &report.failures {
            let got = if failure.actual.is_empty() {
                "no result".to_string()
            } else {
                failure.actual.join(" / ")
            };
            eprintln!(
                "  {}: expected '{}', got {got}",
                failure.input, failure.expected
            );
        }
        if !report.is_clean() {
            process::exit(2);
        }
    }
}

/// Build the compile settings: config file first, then command-line
/// overrides. Returns the settings and the positional arguments.
fn parse_config(args: &[String]) -> Result<(CompileConfig, Vec<String>), String> {
    let (config_path, args) = lexfst_cli::parse_option(args, "--config", Some("-c"))?;
    let (epochs, args) = lexfst_cli::parse_option(&args, "--epochs", Some("-e"))?;
    let (encoding, args) = lexfst_cli::parse_option(&args, "--encoding", None)?;
    let (lexicon_encoding, args) = lexfst_cli::parse_option(&args, "--lexicon-encoding", None)?;
    let (delimiter, args) = lexfst_cli::parse_option(&args, "--delimiter", None)?;
    let (arc_bits, args) = lexfst_cli::parse_option(&args, "--arc-offset-bits", None)?;
    let (no_info, args) = lexfst_cli::parse_flag(&args, "--no-info", None);
    let (no_verify, args) = lexfst_cli::parse_flag(&args, "--no-verify", None);

    let mut config = match config_path {
        Some(path) => CompileConfig::load(&path).map_err(|e| e.to_string())?,
        None => CompileConfig::default(),
    };

    if let Some(n) = epochs {
        config.epochs = n
            .parse()
            .map_err(|_| format!("invalid epoch count: {n}"))?;
    }
    if let Some(name) = encoding {
        config.encoding = name;
    }
    if let Some(name) = lexicon_encoding {
        config.lexicon_encoding = name;
    }
    if let Some(d) = delimiter {
        let mut chars = d.chars();
        config.delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(format!("delimiter must be one character: {d:?}")),
        };
    }
    if let Some(bits) = arc_bits {
        config.arc_offset_bits = bits
            .parse()
            .map_err(|_| format!("invalid arc offset bits: {bits}"))?;
    }
    if no_info {
        config.include_info = false;
    }
    if no_verify {
        config.verify = false;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok((config, args))
}
