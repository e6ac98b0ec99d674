//! spidcert: Command-line tool for checking X.509 certificates against the
//! SPID service provider profile.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use spidcert_lib::{Format, Profile, Report, Sector, SpidError, ValidateOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spidcert",
    about = "Check X.509 certificates against the SPID service provider profile",
    long_about = "spidcert validates a certificate (PEM or DER, auto-detected)\n\
                  against the SPID profile for public or private service\n\
                  providers and prints a report of every check performed.\n\n\
                  All commands read from stdin when no file is given.",
    after_help = "EXAMPLES:\n\
                  \n  spidcert validate crt.pem\
                  \n  spidcert validate --sector private --format json crt.pem\
                  \n  spidcert validate --format xml --output report.xml crt.der\
                  \n  spidcert validate --recurse certs/\
                  \n  cat crt.pem | spidcert validate"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a certificate (exit code 0 = compliant, 1 = not compliant, 2 = error)
    #[command(after_help = "FORMATS:\n\
                      \n  txt   Indented plain text (default)\
                      \n  json  Compact JSON\
                      \n  xml   XML document\
                      \n  yaml  YAML document\
                      \n\nDIRECTORY MODE:\n\
                      \n  When FILE is a directory every .pem, .der, .crt and .cer file\
                      \n  in it is validated in parallel and one line is printed per file.\
                      \n  --output and a --format other than txt are rejected.\
                      \n\nEXAMPLES:\n\
                      \n  spidcert validate crt.pem\
                      \n  spidcert validate --sector private crt.pem\
                      \n  spidcert validate --profile profile.yaml crt.pem\
                      \n  spidcert validate --attime 1767225600 crt.pem\
                      \n  spidcert validate --failures-only -r certs/")]
    Validate {
        /// Certificate file or directory. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Sector of the service provider: public or private
        #[arg(long, default_value = "public")]
        sector: String,
        /// Report format: json, txt, xml, yaml
        #[arg(long, default_value = "txt")]
        format: String,
        /// Write the report to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// YAML file overriding the key and digest requirements
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
        /// Evaluate expiration at a specific Unix timestamp instead of now
        #[arg(long, value_name = "EPOCH")]
        attime: Option<i64>,
        /// Only print failures (directory mode)
        #[arg(long)]
        failures_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
    },
}

/// Exit code when at least one certificate is not compliant.
const EXIT_FAILURE: i32 = 1;
/// Exit code for fatal errors (load, configuration, format).
const EXIT_ERROR: i32 = 2;

const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Map `-v` occurrences to a default filter directive.
fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build validation options, rejecting a bad sector or profile before any
/// certificate is read.
fn build_options(
    sector: &str,
    profile: Option<&PathBuf>,
    attime: Option<i64>,
) -> Result<ValidateOptions> {
    let sector: Sector = sector.parse()?;
    let mut opts = ValidateOptions::new(sector);
    if let Some(path) = profile {
        let profile = Profile::from_file(path)
            .with_context(|| format!("Failed to load profile: {}", path.display()))?;
        opts = opts.with_profile(profile);
    }
    if let Some(ts) = attime {
        opts = opts.at_time(ts);
    }
    Ok(opts)
}

/// Check if a path has a certificate file extension (.pem, .der, .crt or .cer).
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// A single result from batch processing.
struct BatchResult {
    path: String,
    pass: bool,
    detail: String,
}

impl BatchResult {
    fn from_report(path: &Path, result: std::result::Result<Report, SpidError>) -> Self {
        let path = path.display().to_string();
        match result {
            Ok(report) if report.is_success() => BatchResult {
                path,
                pass: true,
                detail: "OK".into(),
            },
            Ok(report) => BatchResult {
                path,
                pass: false,
                detail: format!("FAIL ({} failing checks)", report.failures()),
            },
            Err(e) => BatchResult {
                path,
                pass: false,
                detail: format!("ERROR ({})", e),
            },
        }
    }
}

/// Process certificate files in parallel, printing `filename: result`.
///
/// Returns the number of failures.
fn run_batch<F>(files: &[PathBuf], failures_only: bool, op: F) -> usize
where
    F: Fn(&Path) -> BatchResult + Sync,
{
    let results: Vec<BatchResult> = files.par_iter().map(|f| op(f)).collect();

    let mut failures = 0;
    for r in &results {
        if !r.pass {
            failures += 1;
        }
        if failures_only && r.pass {
            continue;
        }
        if r.pass {
            println!("{}: {}", r.path, r.detail);
        } else {
            eprintln!("{}: {}", r.path, r.detail);
        }
    }
    failures
}

/// Write a rendered report to `output`, or stdout when absent.
fn write_report(rendered: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let mut f = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            writeln!(f, "{}", rendered)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Run the `validate` subcommand and return the process exit code.
fn validate(
    file: Option<&PathBuf>,
    format: Format,
    output: Option<&PathBuf>,
    opts: &ValidateOptions,
    failures_only: bool,
    recurse: bool,
) -> Result<i32> {
    if let Some(dir) = file.filter(|p| p.is_dir()) {
        if output.is_some() || format != Format::Txt {
            anyhow::bail!(
                "--format and --output apply to a single certificate, not to directory {}",
                dir.display()
            );
        }
        let files = find_cert_files(dir, recurse);
        if files.is_empty() {
            anyhow::bail!("No certificate files found in {}", dir.display());
        }
        tracing::info!(dir = %dir.display(), files = files.len(), "validating directory");
        let failures = run_batch(&files, failures_only, |path| {
            BatchResult::from_report(path, spidcert_lib::validate_file(path, opts))
        });
        return Ok(if failures > 0 { EXIT_FAILURE } else { 0 });
    }

    let report = match file {
        Some(path) => {
            let input = read_input(Some(path))?;
            let target = std::path::absolute(path)
                .unwrap_or_else(|_| path.clone())
                .display()
                .to_string();
            spidcert_lib::validate_bytes(&target, &input, opts)?
        }
        None => {
            let input = read_input(None)?;
            spidcert_lib::validate_bytes("<stdin>", &input, opts)?
        }
    };

    write_report(&format.render(&report)?, output)?;
    Ok(if report.is_success() { 0 } else { EXIT_FAILURE })
}

fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Validate {
            file,
            sector,
            format,
            output,
            profile,
            attime,
            failures_only,
            recurse,
        } => {
            let format: Format = format.parse()?;
            let opts = build_options(sector, profile.as_ref(), *attime)?;
            validate(
                file.as_ref(),
                format,
                output.as_ref(),
                &opts,
                *failures_only,
                *recurse,
            )
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}
