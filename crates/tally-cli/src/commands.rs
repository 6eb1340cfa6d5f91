use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tally_client::{Client, ClientConfig, SessionRegistry};
use tally_engine::{EngineConfig, MemoryEngine};
use tally_types::{
    condition_for, id, Account, AccountLookupResult, Batch, CommitTransfer, CreateAccount,
    CreateTransfer, Operation, Results,
};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Demo => cmd_demo(config, cli.format).await,
        Command::Submit(args) => cmd_submit(config, args, cli.format).await,
        Command::Config => cmd_config(&config, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    debug!(cluster = %id::format(config.cluster_id), "configuration loaded");
    Ok(config)
}

/// Open a session on a fresh loopback cluster serving `config.cluster_id`.
fn open(config: ClientConfig) -> anyhow::Result<(MemoryEngine, Client)> {
    let engine = MemoryEngine::new(EngineConfig::new(config.cluster_id));
    let client = SessionRegistry::global().open(&engine, config)?;
    Ok((engine, client))
}

async fn cmd_demo(config: ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let (_engine, client) = open(config)?;
    let (a, b) = (id::time_ordered(), id::time_ordered());

    let created = client
        .create_accounts(&[
            CreateAccount::with_limits(a, 1, 100),
            CreateAccount::with_limits(b, 1, 100),
        ])
        .await?;
    report("create_accounts", &Results::CreateAccounts(created), format)?;

    let transfer = id::time_ordered();
    let reserved = client
        .create_transfers(&[CreateTransfer::new(transfer, a, b, 50)])
        .await?;
    report("create_transfers", &Results::CreateTransfers(reserved), format)?;
    report(
        "after reserve",
        &Results::LookupAccounts(client.lookup_accounts(&[a, b]).await?),
        format,
    )?;

    let committed = client.commit_transfers(&[CommitTransfer::accept(transfer)]).await?;
    report("commit_transfers", &Results::CommitTransfers(committed), format)?;

    let preimage: [u8; 32] = rand::random();
    let condition = condition_for(&preimage);
    let locked = id::time_ordered();
    if format == OutputFormat::Text {
        println!("{} {}", "condition".bold(), hex::encode(condition).dimmed());
    }
    let results = client
        .create_transfers(&[CreateTransfer::new(locked, b, a, 20).with_condition(&condition)])
        .await?;
    report("create_transfers (hash-locked)", &Results::CreateTransfers(results), format)?;
    let results = client
        .commit_transfers(&[
            CommitTransfer::accept(locked),
            CommitTransfer::accept(locked).with_preimage(&preimage),
        ])
        .await?;
    report(
        "commit_transfers (without, with pre-image)",
        &Results::CommitTransfers(results),
        format,
    )?;

    report(
        "final balances",
        &Results::LookupAccounts(client.lookup_accounts(&[a, b]).await?),
        format,
    )?;
    client.close();
    Ok(())
}

async fn cmd_submit(
    config: ClientConfig,
    args: SubmitArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let batches = read_batches(&args.batches)?;
    let (_engine, client) = open(config)?;
    for (file, results) in args.batches.iter().zip(submit_all(&client, batches).await?) {
        report(&format!("{} ({})", file.operation, file.path.display()), &results, format)?;
    }
    client.close();
    Ok(())
}

/// Read and parse every batch file before anything is submitted.
fn read_batches(files: &[BatchFile]) -> anyhow::Result<Vec<Batch>> {
    files
        .iter()
        .map(|file| {
            let text = std::fs::read_to_string(&file.path)
                .with_context(|| format!("reading {}", file.path.display()))?;
            parse_batch(file.operation, &text)
                .with_context(|| format!("parsing {} as {}", file.path.display(), file.operation))
        })
        .collect()
}

/// Submit batches one after another; each sees the effects of the ones before.
async fn submit_all(client: &Client, batches: Vec<Batch>) -> anyhow::Result<Vec<Results>> {
    let mut out = Vec::with_capacity(batches.len());
    for batch in batches {
        out.push(client.submit(batch).await?);
    }
    Ok(out)
}

fn parse_batch(operation: Operation, text: &str) -> anyhow::Result<Batch> {
    Ok(match operation {
        Operation::CreateAccounts => {
            Batch::CreateAccounts(serde_json::from_str::<Vec<CreateAccount>>(text)?)
        }
        Operation::CreateTransfers => {
            Batch::CreateTransfers(serde_json::from_str::<Vec<CreateTransfer>>(text)?)
        }
        Operation::CommitTransfers => {
            Batch::CommitTransfers(serde_json::from_str::<Vec<CommitTransfer>>(text)?)
        }
        Operation::LookupAccounts => {
            Batch::LookupAccounts(serde_json::from_str::<Vec<u128>>(text)?)
        }
    })
}

fn cmd_config(config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

fn report(title: &str, results: &Results, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "step": title, "results": results }));
        }
        OutputFormat::Text => {
            println!("{}", title.bold());
            for line in describe(results) {
                println!("  {line}");
            }
        }
    }
    Ok(())
}

fn describe(results: &Results) -> Vec<String> {
    fn indexed(index: u32, error: Option<&'static str>) -> String {
        match error {
            None => format!("[{index}] {}", "ok".green()),
            Some(name) => format!("[{index}] {}", name.red()),
        }
    }

    match results {
        Results::CreateAccounts(v) => v
            .iter()
            .map(|r| indexed(r.index, r.error.map(|e| e.as_str())))
            .collect(),
        Results::CreateTransfers(v) => v
            .iter()
            .map(|r| indexed(r.index, r.error.map(|e| e.as_str())))
            .collect(),
        Results::CommitTransfers(v) => v
            .iter()
            .map(|r| indexed(r.index, r.error.map(|e| e.as_str())))
            .collect(),
        Results::LookupAccounts(v) => v
            .iter()
            .enumerate()
            .map(|(index, r)| match r {
                AccountLookupResult::Found(account) => format!("[{index}] {}", balances(account)),
                AccountLookupResult::Missing { error, .. } => {
                    indexed(index as u32, Some(error.as_str()))
                }
            })
            .collect(),
    }
}

fn balances(account: &Account) -> String {
    format!(
        "{} unit={} dr {}/{} cr {}/{} (reserved/accepted)",
        id::format(account.id).cyan(),
        account.unit,
        account.debit_reserved,
        account.debit_accepted,
        account.credit_reserved,
        account.credit_accepted,
    )
}
