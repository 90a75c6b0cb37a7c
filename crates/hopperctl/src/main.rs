//! hopperctl - chat with Grace and keep a hash-linked log of her replies

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use hopper_common::recorder::ConversationRecorder;
use hopper_common::response::CONVERSATION;
use hopper_common::{HeuristicScorer, HopperConfig, HttpGenerator, Ledger, LedgerError};
use hopperctl::{commands, logging, repl};

// Version is embedded at build time
const VERSION: &str = env!("HOPPER_VERSION");

#[derive(Parser)]
#[command(name = "hopperctl")]
#[command(about = "Grace Hopper GenAI CLI - confidence-scored, hash-linked chat log", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Configuration file (default: ~/.config/hopper/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger file, overriding the configuration
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Record a raw assistant reply without calling the model
    Record {
        /// Response type stored with the reply
        #[arg(long = "type", default_value = CONVERSATION)]
        response_type: String,

        /// File holding the reply (stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Search logged replies (case-insensitive substring)
    Search { query: String },

    /// List ledger records
    Log {
        /// Only the last N records
        #[arg(long)]
        last: Option<usize>,
    },

    /// Verify the hash chain
    Verify,

    /// Show the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<LedgerError>()
                .map_or(1, LedgerError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = HopperConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.ledger {
        config.storage.ledger_path = path;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let command = cli.command.unwrap_or(Commands::Chat);

    let open_ledger = || -> Result<Ledger> {
        let ledger = Ledger::open(&config.storage.ledger_path)?;
        info!(path = %ledger.path().display(), records = ledger.len(), "ledger opened");
        Ok(ledger)
    };

    match command {
        Commands::Chat => {
            let generator =
                HttpGenerator::new(config.llm.clone()).context("Failed to set up LLM client")?;
            let scorer = HeuristicScorer::new(config.scoring.out_of_range);
            let mut recorder = ConversationRecorder::new(open_ledger()?, Box::new(scorer));

            // Clear screen
            write!(out, "\x1b[2J\x1b[H")?;
            repl::print_banner(&mut out)?;
            let exit = repl::run_repl(io::stdin().lock(), &mut out, &generator, &mut recorder)?;
            info!(?exit, "chat ended");

            recorder.into_ledger().close()?;
        }
        Commands::Record {
            response_type,
            file,
        } => {
            let ledger = commands::record(
                open_ledger()?,
                config.scoring.out_of_range,
                &response_type,
                file.as_deref(),
                &mut out,
            )?;
            ledger.close()?;
        }
        Commands::Search { query } => {
            commands::search(&open_ledger()?, &query, &mut out)?;
        }
        Commands::Log { last } => {
            commands::log(&open_ledger()?, last, &mut out)?;
        }
        Commands::Verify => {
            if !commands::verify(&open_ledger()?, &mut out)? {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Config => {
            commands::config(&config, &mut out)?;
        }
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
