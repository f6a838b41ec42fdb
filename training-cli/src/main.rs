mod terminal;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::time::Instant;
use training_lib::config::ValidatorsFile;
use training_lib::error::{CheckError, ConfigError, Error};
use training_lib::form::Form;
use training_lib::{HttpChecker, Validator, ValidatorBinding};

use crate::terminal::TerminalView;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Live "already in use" checks for the sign-up form.
///
/// Reads `element_id=value` lines from stdin, each one replacing the text of
/// that field as if it had been typed. `element_id=` empties the field,
/// `:export` shows whether exporting results needs a login, and `:quit`
/// stops reading.
#[derive(Debug, Parser)]
#[command(name = "training", version)]
struct Args {
    /// JSON file with the base URL, host state and bindings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server the check endpoints live on.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides the debounce interval of every binding.
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Timeout of a single check request.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Lib(#[from] Error),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// One line of terminal input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Set { element_id: &'a str, value: &'a str },
    Export,
    Quit,
    Blank,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.trim() {
        "" => return Command::Blank,
        ":quit" => return Command::Quit,
        ":export" => return Command::Export,
        _ => {}
    }
    match line.split_once('=') {
        Some((element_id, value)) if !element_id.trim().is_empty() => Command::Set {
            element_id: element_id.trim(),
            value,
        },
        _ => Command::Unknown(line),
    }
}

fn init_logging(args: &Args) -> Result<(), CliError> {
    match &args.log_file {
        Some(path) => WriteLogger::init(args.log_level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(
            args.log_level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ValidatorsFile, CliError> {
    let mut file = match &args.config {
        Some(path) => ValidatorsFile::load(path)?,
        None => ValidatorsFile::new(DEFAULT_BASE_URL),
    };
    if let Some(base_url) = &args.base_url {
        file.base_url = base_url.clone();
    }
    if let Some(ms) = args.debounce_ms {
        file = file.with_debounce_interval(Duration::from_millis(ms));
    }
    file.validate()?;
    Ok(file)
}

/// Waits until every binding is settled or `limit` has passed.
async fn wait_settled(bindings: &[Arc<ValidatorBinding>], limit: Duration) {
    let deadline = Instant::now() + limit;
    while !bindings.iter().all(|binding| binding.is_settled()) {
        if Instant::now() >= deadline {
            log::warn!("gave up waiting for outstanding checks");
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let file = load_config(&args)?;
    if args.print_config {
        println!("{}", file.to_json()?);
        return Ok(());
    }

    let timeout = Duration::from_secs(args.timeout_secs);
    let checker = HttpChecker::new(&file.base_url)?.with_timeout(timeout);
    let form = Form::new();
    let validator = Validator::new(Arc::new(checker), Arc::new(TerminalView));
    let bindings = validator.attach_all(&form, &file.bindings)?;
    log::info!("validating {} fields against {}", bindings.len(), file.base_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Command::Set { element_id, value } => form.set_value(element_id, value),
            Command::Export => match file.host.export_redirect() {
                Some(login_url) => println!("export requires login: {}", login_url),
                None => println!("export allowed"),
            },
            Command::Quit => break,
            Command::Blank => {}
            Command::Unknown(text) => log::warn!("ignoring '{}': expected element_id=value", text),
        }
    }

    let longest_debounce = file
        .bindings
        .values()
        .map(|config| config.debounce_interval)
        .max()
        .unwrap_or_default();
    wait_settled(&bindings, longest_debounce + timeout).await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
