use std::{env, fs, path::{Path, PathBuf}, process, time::Instant};

use tf_idf_essay::{Corpus, EssayConfig, EssayError, EssaySummarizer, Result, ScoringMode, Upload};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// What to print
#[derive(Debug, Clone, Copy, PartialEq)]
enum Output {
    Single(ScoringMode),
    /// statistical and semantic side by side
    Compare,
}

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    output: Option<Output>,
    skip_top: Option<usize>,
    main_term: Option<String>,
    docs_dir: Option<PathBuf>,
    files: Vec<PathBuf>,
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(message) => {
            eprintln!("[error] {message}");
            print_usage();
            process::exit(2);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("[error] {e}");
        process::exit(1);
    }
}

/// `Ok(None)` when help was requested
fn parse_args<I: Iterator<Item = String>>(mut args: I) -> std::result::Result<Option<Options>, String> {
    let mut options = Options::default();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => {
                let v = args.next().ok_or("--config requires a path")?;
                options.config = Some(PathBuf::from(v));
            }
            "--mode" => {
                let v = args.next().ok_or("--mode requires a value")?;
                options.output = Some(match v.as_str() {
                    "compare" => Output::Compare,
                    other => Output::Single(other.parse::<ScoringMode>()?),
                });
            }
            "--skip" => {
                let v = args.next().ok_or("--skip requires a number")?;
                let k = v.parse::<usize>().map_err(|_| format!("--skip needs a non-negative integer, got '{v}'"))?;
                options.skip_top = Some(k);
            }
            "--main-term" => {
                let v = args.next().ok_or("--main-term requires a term")?;
                options.main_term = Some(v);
            }
            "--docs" => {
                let v = args.next().ok_or("--docs requires a directory")?;
                options.docs_dir = Some(PathBuf::from(v));
            }
            "--json" => options.json = true,
            "-h" | "--help" => return Ok(None),
            other if other.starts_with("--") => return Err(format!("unknown option '{other}'")),
            other => options.files.push(PathBuf::from(other)),
        }
    }
    if options.files.is_empty() && options.docs_dir.is_none() {
        return Err("no input files".to_string());
    }
    Ok(Some(options))
}

fn print_usage() {
    eprintln!("Usage: tf-idf-essay [--config FILE] [--mode statistical|positional|semantic|compare]");
    eprintln!("                    [--skip K] [--main-term TERM] [--docs DIR] [--json] [FILE...]");
    eprintln!("Log level is controlled with RUST_LOG (default: info).");
}

fn run(options: Options) -> Result<()> {
    let program_start = Instant::now();

    let mut config = match &options.config {
        Some(path) => EssayConfig::load(path)?,
        None => EssayConfig::default(),
    };
    if let Some(k) = options.skip_top {
        config.selection.skip_top = k;
    }
    if let Some(term) = options.main_term {
        config.main_term = Some(term);
    }
    if let Some(Output::Single(mode)) = options.output {
        config.mode = mode;
    }
    config.validate()?;
    let output = options.output.unwrap_or(Output::Single(config.mode));

    let mut paths = options.files;
    if let Some(dir) = &options.docs_dir {
        paths.extend(list_dir(dir)?);
    }

    let load_start = Instant::now();
    let uploads: Vec<Upload> = paths
        .iter()
        .filter_map(|path| match fs::read(path) {
            Ok(bytes) => Some(Upload::new(path.display().to_string(), bytes)),
            Err(source) => {
                let e = EssayError::Io { path: path.clone(), source };
                warn!(error = %e, "Skipping input");
                None
            }
        })
        .collect();
    let (corpus, rejected) = Corpus::from_uploads(uploads);
    for e in &rejected {
        warn!(error = %e, "Skipping input");
    }
    if corpus.is_empty() {
        return Err(EssayError::EmptyCorpus);
    }
    info!(
        documents = corpus.doc_num(),
        rejected = rejected.len(),
        elapsed_ms = load_start.elapsed().as_secs_f64() * 1000.0,
        "Corpus loaded"
    );

    let summarizer = EssaySummarizer::new(config);
    match output {
        Output::Single(mode) => {
            let essay = summarizer.summarize_with(&corpus, mode);
            if options.json {
                println!("{}", serde_json::to_string_pretty(&essay)?);
            } else {
                println!("{}", essay.text);
            }
        }
        Output::Compare => {
            let pair = summarizer.summarize_pair(&corpus);
            if options.json {
                println!("{}", serde_json::to_string_pretty(&pair)?);
            } else {
                println!("[statistical]\n{}\n", pair.statistical.text);
                println!("[semantic]\n{}", pair.semantic.text);
            }
        }
    }

    info!(elapsed_ms = program_start.elapsed().as_secs_f64() * 1000.0, "Done");
    Ok(())
}

/// Regular files directly inside `dir`, sorted by path
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| EssayError::Io { path: dir.to_path_buf(), source };
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    if files.is_empty() {
        warn!(dir = %dir.display(), "No files found in directory");
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_modes_and_files() {
        let options = parse_args(args(&["--mode", "compare", "--skip", "0", "a.txt", "b.txt"]))
            .unwrap()
            .unwrap();
        assert_eq!(options.output, Some(Output::Compare));
        assert_eq!(options.skip_top, Some(0));
        assert_eq!(options.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);

        let options = parse_args(args(&["--mode", "positional", "--json", "--docs", "in"])).unwrap().unwrap();
        assert_eq!(options.output, Some(Output::Single(ScoringMode::Positional)));
        assert!(options.json);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(args(&["--mode", "fuzzy", "a.txt"])).is_err());
        assert!(parse_args(args(&["--skip", "-1", "a.txt"])).is_err());
        assert!(parse_args(args(&["--skip"])).is_err());
        assert!(parse_args(args(&["--verbose", "a.txt"])).is_err());
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--help"])).unwrap().is_none());
    }
}
