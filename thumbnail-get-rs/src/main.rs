use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use xdg_desktop_core::prelude::*;

const PROG: &str = "thumbnail-get";

#[derive(Debug)]
struct GetConfig {
    size: ThumbnailSize,
    files: Vec<PathBuf>,
}

#[derive(Debug)]
enum ParseOutcome {
    Run(GetConfig),
    Help,
    Usage(String),
}

fn print_help() {
    println!(
        "\
usage: {PROG} [-h] [--size {{normal,large,x-large,xx-large}}] FILE [FILE ...]

Print the path of an up-to-date cached thumbnail for each FILE,
rendering it first when the shared cache has none.

options:
  -h, --help     show this help message and exit
  --size SIZE    thumbnail size class (default: large)"
    );
}

fn parse_size(value: Option<OsString>) -> Result<ThumbnailSize> {
    let value = value.ok_or_else(|| CoreError::invalid_input("--size expects a value"))?;
    value
        .to_str()
        .ok_or_else(|| CoreError::invalid_input("--size expects a value"))?
        .parse()
}

fn parse_args<I: IntoIterator<Item = OsString>>(args: I) -> ParseOutcome {
    let mut config = GetConfig {
        size: ThumbnailSize::default(),
        files: Vec::new(),
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("-h" | "--help") => return ParseOutcome::Help,
            Some("--size") => match parse_size(args.next()) {
                Ok(size) => config.size = size,
                Err(err) => return ParseOutcome::Usage(err.to_string()),
            },
            Some(flag) if flag.starts_with("--size=") => match flag["--size=".len()..].parse::<ThumbnailSize>() {
                Ok(size) => config.size = size,
                Err(err) => return ParseOutcome::Usage(err.to_string()),
            },
            Some(flag) if flag.starts_with('-') && flag.len() > 1 => {
                return ParseOutcome::Usage(format!("unrecognized option '{flag}'"));
            }
            _ => config.files.push(PathBuf::from(arg)),
        }
    }
    if config.files.is_empty() {
        return ParseOutcome::Usage("no files given".to_string());
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
    let mut failed = false;
    for file in &config.files {
        match platform
            .thumbnails()
            .get_thumbnail(file, Some(config.size), &ImageThumbnailGenerator)
        {
            Ok(path) => println!("{}", path.display()),
            Err(err) => {
                eprintln!("{PROG}: {}: {err}", file.display());
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn size_defaults_to_large() {
        let ParseOutcome::Run(config) = parse_args(args(&["a.png"])) else {
            panic!("expected run");
        };
        assert_eq!(config.size, ThumbnailSize::Large);
        assert_eq!(config.files, vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn size_accepts_both_spellings() {
        for argv in [&["--size", "x-large", "a.png"][..], &["--size=x-large", "a.png"][..]] {
            let ParseOutcome::Run(config) = parse_args(args(argv)) else {
                panic!("expected run");
            };
            assert_eq!(config.size, ThumbnailSize::XLarge);
        }
    }

    #[test]
    fn bad_size_is_usage_error() {
        assert!(matches!(parse_args(args(&["--size", "huge", "a.png"])), ParseOutcome::Usage(_)));
        assert!(matches!(parse_args(args(&["--size"])), ParseOutcome::Usage(_)));
    }
}
