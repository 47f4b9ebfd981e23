// lexfst-cli: shared utilities for CLI tools.

use std::path::PathBuf;
use std::process;

use lexfst_core::TextEncoding;
use lexfst_fst::FstLookup;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the transducer used when `-f` is absent.
pub const FST_PATH_VAR: &str = "LEXFST_PATH";

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Split a valued option (`--long=VALUE`, `--long VALUE` or `-s VALUE`) out of
/// `args`.
///
/// Returns `(value, remaining_args)`; the last occurrence wins.
pub fn parse_option(
    args: &[String],
    long: &str,
    short: Option<&str>,
) -> Result<(Option<String>, Vec<String>), String> {
    let prefix = format!("{long}=");
    let mut value = None;
    let mut remaining = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            value = Some(val.to_string());
        } else if arg == long || short.is_some_and(|s| arg == s) {
            let val = iter
                .next()
                .ok_or_else(|| format!("{arg} requires a value"))?;
            value = Some(val.clone());
        } else {
            remaining.push(arg.clone());
        }
    }

    Ok((value, remaining))
}

/// Split a boolean flag out of `args`; returns whether it was present.
pub fn parse_flag(args: &[String], long: &str, short: Option<&str>) -> (bool, Vec<String>) {
    let mut present = false;
    let remaining = args
        .iter()
        .filter(|arg| {
            let matched = *arg == long || short.is_some_and(|s| *arg == s);
            present |= matched;
            !matched
        })
        .cloned()
        .collect();
    (present, remaining)
}

/// Load a transducer from `path`, or from `$LEXFST_PATH` when no path is
/// given. With `legacy` the file is read as a header-less artifact in that
/// encoding.
pub fn load_transducer(path: Option<&str>, legacy: Option<&str>) -> Result<FstLookup, String> {
    let path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::var(FST_PATH_VAR)
            .map(PathBuf::from)
            .map_err(|_| format!("no transducer given (use -f FILE or set {FST_PATH_VAR})"))?,
    };

    let result = match legacy {
        Some(name) => {
            let encoding: TextEncoding = name.parse().map_err(|e| format!("{e}"))?;
            FstLookup::from_legacy_path(&path, encoding)
        }
        None => FstLookup::from_path(&path),
    };
    result.map_err(|e| format!("failed to load {}: {e}", path.display()))
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}
