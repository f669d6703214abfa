//! `kanabo`: query YAML/JSON documents from the shell with a JSONPath-style
//! expression, wiring `kanabo-path`'s parser and evaluator behind a minimal
//! loader and emitter.

mod emitter;
mod error;
mod loader;

use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use log::debug;

use emitter::OutputFormat;
use error::CliError;
use loader::DuplicatePolicy;

/// Bludgeon YAML and JSON files from the shell with a JSONPath-style query.
#[derive(Parser)]
#[command(name = "kanabo", version, about)]
struct Cli {
    /// JSONPath-style expression to evaluate.
    #[arg(short, long)]
    query: String,

    /// Input file to read; omit or pass `-` to read from stdin.
    input: Option<PathBuf>,

    /// Output format for matched nodes.
    #[arg(short, long, default_value = "bash")]
    output: String,

    /// What to do when a mapping key repeats.
    #[arg(short, long, value_enum, default_value_t = DuplicatePolicy::Last)]
    duplicate: DuplicatePolicy,

    /// Print the no-warranty notice and exit.
    #[arg(long)]
    no_warranty: bool,
}

const NO_WARRANTY_NOTICE: &str = "\
This program is distributed in the hope that it will be useful, but WITHOUT \
ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or \
FITNESS FOR A PARTICULAR PURPOSE.";

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.no_warranty {
        println!("{NO_WARRANTY_NOTICE}");
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kanabo: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::from_str(&cli.output)?;

    let path = kanabo_path::parse(cli.query.as_bytes())?;
    debug!("parsed query: {}", kanabo_path::path_to_string(&path));

    let (display_path, text) = read_input(cli.input.as_deref())?;
    let documents = loader::load(&display_path, &text, cli.duplicate)?;

    let nodes = kanabo_path::evaluate(&documents, &path)?;
    debug!("evaluation produced {} node(s)", nodes.len());

    let stdout = std::io::stdout();
    emitter::emit(&nodes, format, &mut stdout.lock()).map_err(|source| CliError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

/// Reads the query's input source, returning a display path (for error
/// messages) alongside the full text. `-` and a missing positional argument
/// both mean stdin.
fn read_input(input: Option<&std::path::Path>) -> Result<(PathBuf, String), CliError> {
    match input {
        None => read_stdin().map(|text| (PathBuf::from("<stdin>"), text)),
        Some(path) if path == std::path::Path::new("-") => {
            read_stdin().map(|text| (PathBuf::from("<stdin>"), text))
        }
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((path.to_path_buf(), text))
        }
    }
}

fn read_stdin() -> Result<String, CliError> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|source| CliError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(text)
}
