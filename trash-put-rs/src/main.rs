use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use xdg_desktop_core::prelude::*;

const PROG: &str = "trash-put";

#[derive(Debug, Default)]
struct PutConfig {
    verbose: bool,
    paths: Vec<PathBuf>,
}

#[derive(Debug)]
enum ParseOutcome {
    Run(PutConfig),
    Help,
    Usage(String),
}

fn print_help() {
    println!(
        "\
usage: {PROG} [-h] [-v] PATH [PATH ...]

Move files and directories to the home trash.

options:
  -h, --help     show this help message and exit
  -v, --verbose  report each trashed path
  --             treat every following argument as a path"
    );
}

fn parse_args<I: IntoIterator<Item = OsString>>(args: I) -> ParseOutcome {
    let mut config = PutConfig::default();
    let mut only_paths = false;
    for arg in args {
        if !only_paths {
            match arg.to_str() {
                Some("-h" | "--help") => return ParseOutcome::Help,
                Some("-v" | "--verbose") => {
                    config.verbose = true;
                    continue;
                }
                Some("--") => {
                    only_paths = true;
                    continue;
                }
                Some(flag) if flag.starts_with('-') && flag.len() > 1 => {
                    return ParseOutcome::Usage(format!("unrecognized option '{flag}'"));
                }
                _ => {}
            }
        }
        config.paths.push(PathBuf::from(arg));
    }
    if config.paths.is_empty() {
        return ParseOutcome::Usage("no paths given".to_string());
    }
    ParseOutcome::Run(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Trashes every path and reports whether all of them were moved.
fn run(trash: &TrashService, config: &PutConfig) -> bool {
    let mut all_trashed = true;
    for path in &config.paths {
        match trash.move_to_trash(path) {
            Ok(true) => {
                if config.verbose {
                    eprintln!("{PROG}: '{}' trashed in {}", path.display(), trash.trash_directory().path.display());
                }
            }
            Ok(false) => {
                eprintln!("{PROG}: cannot trash '{}'", path.display());
                all_trashed = false;
            }
            Err(err) => {
                eprintln!("{PROG}: cannot trash '{}': {err}", path.display());
                all_trashed = false;
            }
        }
    }
    all_trashed
}

fn main() {
    init_logging();
    let config = match parse_args(env::args_os().skip(1)) {
        ParseOutcome::Run(config) => config,
        ParseOutcome::Help => {
            print_help();
            return;
        }
        ParseOutcome::Usage(message) => {
            eprintln!("{PROG}: {message}");
            eprintln!("Try '{PROG} --help' for more information.");
            process::exit(2);
        }
    };

    let platform = match Platform::current() {
        Ok(platform) => platform,
        Err(err) => {
            eprintln!("{PROG}: {err}");
            process::exit(1);
        }
    };
    if !run(platform.trash(), &config) {
        process::exit(1);
    }
}
