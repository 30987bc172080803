use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueHint};
use payescrow_core::interface::{load_json, save_json};
use payescrow_core::Address;
use payescrow_ledger::config::{check_group_sizes, DEFAULT_GENESIS_PATH, DEFAULT_SCRIPT_PATH};
use payescrow_ledger::{GenesisConfig, Ledger, Script};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            genesis,
            script,
            outfile,
            resume,
            checkpoint,
        } => {
            let script: Script = load_json(&script)?;
            check_group_sizes(&script)?;

            let mut ledger = match resume {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading checkpoint {:?}", path))?;
                    Ledger::restore(&bytes)?
                }
                None => {
                    let genesis: GenesisConfig = load_json(&genesis)?;
                    Ledger::from_genesis(&genesis)?
                }
            };
            let report = ledger.replay(&script)?;
            tracing::info!(
                committed = report.committed,
                rejected = report.rejected.len(),
                "Script replayed"
            );

            match outfile {
                Some(path) => save_json(&path, &report)?,
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
            if let Some(path) = checkpoint {
                std::fs::write(&path, ledger.checkpoint()?)
                    .with_context(|| format!("writing checkpoint {:?}", path))?;
            }
        }
        Commands::AppAddress { app_id } => {
            println!("{}", Address::for_application(app_id));
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "payescrow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of atomic groups against a fresh ledger.
    Run {
        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_GENESIS_PATH,
            value_hint = ValueHint::FilePath)]
        genesis: PathBuf,

        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_SCRIPT_PATH,
            value_hint = ValueHint::FilePath)]
        script: PathBuf,

        /// Where to write the report; stdout when omitted.
        #[arg(short, long, value_parser, value_hint = ValueHint::FilePath)]
        outfile: Option<PathBuf>,

        /// Start from a saved checkpoint instead of the genesis file.
        #[arg(short, long, value_parser, value_hint = ValueHint::FilePath)]
        resume: Option<PathBuf>,

        /// Save a binary checkpoint of the ledger after the replay.
        #[arg(short, long, value_parser, value_hint = ValueHint::FilePath)]
        checkpoint: Option<PathBuf>,
    },
    /// Print the account address of an application.
    AppAddress {
        #[arg(short, long)]
        app_id: u64,
    },
}
