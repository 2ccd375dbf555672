//! FireWALL-E - iptables rule wizard
//!
//! Asks about the host's network role and writes an `iptables-restore` rule
//! file together with a JSON record of the answers.
//!
//! # Usage
//!
//! ```bash
//! firewalle                                   # New rules, timestamped file names
//! firewalle -o web.txt                        # Rules to web.txt, answers to questions_web.json
//! firewalle -a load -f questions_web.json     # Start from previous answers
//! ```

use clap::{Parser, ValueEnum};
use firewalle::config::{WizardConfig, load_config};
use firewalle::core::assembler::assemble;
use firewalle::core::record;
use firewalle::core::registry::Registry;
use firewalle::output::{OutputPaths, write_outputs};
use firewalle::wizard::{Collection, Wizard};
use firewalle::{AnswersMap, Error};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FIREWALLE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Create a new set of rules
    Create,
    /// Load a previous answers file and amend it
    Load,
}

#[derive(Parser)]
#[command(name = "firewalle")]
#[command(
    about = "Program to simplify the creation of firewall rules",
    long_about = "Program to simplify the creation of firewall rules.\n\
The program has two modes, create a new set of rules, or load and modify an old one.\n\
The default mode performed by the program is to create a new set of rules."
)]
struct Cli {
    /// Action to perform on the file
    #[arg(short, long, value_enum, default_value_t = Action::Create)]
    action: Action,
    /// Name of the file to create
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Name of the file to load: must be the questions_....json file
    #[arg(short, long, required_if_eq("action", "load"))]
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let config = load_config();

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("run failed: {e}");
            let translation = e.translate();
            eprintln!("Error: {}", translation.user_message);
            for suggestion in translation.suggestions {
                eprintln!("  - {suggestion}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to a file in the state directory so they never mix with prompts.
///
/// The level defaults to `info`; set `FIREWALLE_LOG=debug` to trace assembly.
fn init_logging() {
    let filter = log_filter(std::env::var(LOG_ENV).ok().as_deref());

    if let Ok(Some(mut log_path)) = firewalle::utils::ensure_state_dir() {
        log_path.push("firewalle.log");
        if let Ok(file) = std::fs::File::create(log_path) {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();
            return;
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Filter from `FIREWALLE_LOG` directives, falling back to `info` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn run(cli: &Cli, config: &WizardConfig) -> Result<(), Error> {
    let registry = Registry::builtin();
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout();
    let mut wizard = Wizard::new(registry, stdin, stdout);

    let paths = match &cli.output {
        Some(output) => {
            if output.is_file() {
                let question = format!(
                    "A file named {} already exists, do you want to overwrite it?",
                    output.display()
                );
                if wizard.prompt_yes_no(&question, None)? != Some(true) {
                    tracing::info!(path = %output.display(), "overwrite declined");
                    return Ok(());
                }
            }
            OutputPaths::for_rules_file(output)
        }
        None => {
            let dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            OutputPaths::timestamped(&dir, &chrono::Local::now(), &config.timestamp_format)
        }
    };

    let previous = match (cli.action, &cli.file) {
        (Action::Load, Some(file)) => {
            tracing::info!(path = %file.display(), "loading previous answers");
            record::load(file, registry)?
        }
        _ => AnswersMap::new(),
    };

    let answers = match wizard.with_previous(previous).run()? {
        Collection::Completed(answers) => answers,
        Collection::Cancelled => {
            println!("Cancelled, nothing was written.");
            return Ok(());
        }
    };

    let document = assemble(registry, &answers)?;
    write_outputs(&paths, &document, &answers, config.write_checksum)?;

    println!("-----------------");
    println!("The rules have been created and stored in {}", paths.rules.display());
    println!("Run 'sudo iptables-restore {}' to apply them.", paths.rules.display());
    Ok(())
}
