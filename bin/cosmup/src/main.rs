//! cosmup is a CLI tool to upload, instantiate and wire together CosmWasm contracts.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::{Cli, Command};
use cosmup_deploy::{
    RunReport, Scenario,
    contracts::{minter::MinterQueryClient, validate_address},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let deployer = cli.deployer()?;

    match cli.command {
        Command::Run { scenario, json } => {
            tokio::select! {
                report = deployer.deploy(scenario) => {
                    let report = report?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        println!("{}", report_table(&report));
                    }
                }
                _ = cancellation(tokio::signal::ctrl_c()) => {
                    tracing::warn!(
                        %scenario,
                        "Received Ctrl+C, cancelling the run. Confirmed steps stay on chain."
                    );
                    anyhow::bail!("Scenario `{}` cancelled", scenario);
                }
            }
        }
        Command::Plan { scenario } => {
            let scenario = deployer.scenario(scenario);
            scenario.validate()?;
            println!("{}", plan_table(&scenario));
        }
        Command::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists, pass --force to overwrite it",
                    path.display()
                );
            }
            deployer.config.save_to_file(&path)?;
        }
        Command::MinterInfo { address } => {
            validate_address(&address, &deployer.config.network.prefix)
                .map_err(anyhow::Error::msg)?;

            let client = deployer.client()?;
            let minter = MinterQueryClient::new(&client, address);

            let owner = minter.owner().await.context("Failed to query minter owner")?;
            let receiver = minter
                .receiver()
                .await
                .context("Failed to query minter receiver")?;
            let info = minter
                .exchanging_info()
                .await
                .context("Failed to query minter exchanging info")?;

            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);
            table.add_row(vec!["contract", minter.contract_address()]);
            table.add_row(vec!["owner", owner.as_str()]);
            table.add_row(vec!["receiver name", receiver.name.as_str()]);
            table.add_row(vec!["receiver address", receiver.address.as_str()]);
            table.add_row(vec!["accepted denom", info.accepted_denom.as_str()]);
            table.add_row(vec!["token address", info.token_address.as_str()]);
            table.add_row(vec!["price feed", info.price_feed.as_str()]);
            println!("{table}");
        }
    }

    Ok(())
}

/// Resolves once `signal` reports Ctrl+C. If listening fails the run can no longer be
/// cancelled, so this never resolves.
async fn cancellation(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(error) = signal.await {
        tracing::error!(%error, "Failed to listen for Ctrl+C, the run cannot be cancelled");
        std::future::pending::<()>().await;
    }
}

fn report_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Step", "Kind", "Tx hash", "Gas used", "Result"]);

    for (index, record) in report.steps.iter().enumerate() {
        let tx = record.result.tx();
        table.add_row(vec![
            (index + 1).to_string(),
            record.name.clone(),
            record.kind().to_string(),
            tx.map(|tx| tx.transaction_hash.clone())
                .unwrap_or_else(|| "-".to_string()),
            tx.map(|tx| tx.gas_used.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.result.summary(),
        ]);
    }

    table
}

fn plan_table(scenario: &Scenario) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Step", "Kind", "Operation"]);

    for (index, step) in scenario.steps.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            step.name.clone(),
            step.kind().to_string(),
            step.operation.describe(),
        ]);
    }

    table
}
