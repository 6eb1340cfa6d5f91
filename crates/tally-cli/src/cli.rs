use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tally_types::{Operation, TypeError};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally: batched double-entry ledger client",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Client configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the two-account scenario on a loopback cluster
    Demo,
    /// Submit JSON batches, in order, to one fresh loopback cluster
    ///
    /// The cluster starts empty and lives only for this invocation, so
    /// accounts a later batch refers to must be created by an earlier one.
    Submit(SubmitArgs),
    /// Print the effective client configuration
    Config,
}

#[derive(Args)]
pub struct SubmitArgs {
    /// `operation=file.json`, where operation is create_accounts,
    /// create_transfers, commit_transfers or lookup_accounts and the file holds
    /// a JSON array of commands (or of ids, for lookups)
    #[arg(required = true, value_name = "OPERATION=FILE")]
    pub batches: Vec<BatchFile>,
}

/// One batch named on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFile {
    pub operation: Operation,
    pub path: PathBuf,
}

impl FromStr for BatchFile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (operation, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected OPERATION=FILE, got {s:?}"))?;
        if path.is_empty() {
            return Err(format!("no file given for {operation}"));
        }
        Ok(Self {
            operation: operation.parse().map_err(|e: TypeError| e.to_string())?,
            path: PathBuf::from(path),
        })
    }
}
