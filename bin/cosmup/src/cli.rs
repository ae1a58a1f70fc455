use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use cosmup_deploy::{CONFIG_FILENAME, Deployer, DeployerBuilder, ScenarioKind};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "cosmup")]
#[command(
    author,
    version,
    about = "Deploy and wire together CosmWasm contracts from declarative scenarios"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, global = true, env = "COSMUP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a configuration file, or to a directory containing Cosmup.toml.
    ///
    /// Without it, built-in defaults and COSMUP_* environment variables are used.
    #[arg(long, global = true, alias = "conf", env = "COSMUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON-RPC endpoint of the signing relay.
    #[arg(long, global = true, alias = "relay", env = "COSMUP_RELAY_URL")]
    pub relay_url: Option<String>,

    /// LCD REST endpoint used for smart queries.
    #[arg(long, global = true, alias = "lcd", env = "COSMUP_LCD_URL")]
    pub lcd_url: Option<String>,

    /// The chain ID.
    #[arg(long, global = true, env = "COSMUP_CHAIN_ID")]
    pub chain_id: Option<String>,

    /// Gas price used for the upload fee, e.g. 0.025uaura. Its denom becomes the native denom.
    #[arg(long, global = true, env = "COSMUP_GAS_PRICE")]
    pub gas_price: Option<String>,

    /// Directory holding the compiled <contract>.wasm artifacts.
    #[arg(long, global = true, alias = "artifacts", env = "COSMUP_ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Admin of instantiated contracts.
    #[arg(long, global = true, env = "COSMUP_ADMIN")]
    pub admin: Option<String>,

    /// Upper bound on a single chain operation, in seconds.
    #[arg(long, global = true, env = "COSMUP_STEP_TIMEOUT")]
    pub step_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a built-in scenario against the chain.
    Run {
        /// The scenario to run (bootstrap, mint, wrap-token, minter).
        scenario: ScenarioKind,

        /// Print the run report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario and print its steps without contacting the chain.
    Plan {
        /// The scenario to plan (bootstrap, mint, wrap-token, minter).
        scenario: ScenarioKind,
    },

    /// Write the effective configuration to a TOML file.
    InitConfig {
        /// Destination file.
        #[arg(default_value = CONFIG_FILENAME)]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Query the owner, receiver and exchange setup of a deployed minter.
    MinterInfo {
        /// Address of the minter contract.
        address: String,
    },
}

impl Cli {
    /// Build a deployer from the configuration and the command line overrides.
    pub fn deployer(&self) -> anyhow::Result<Deployer> {
        let mut builder = DeployerBuilder::new();

        if let Some(config) = &self.config {
            builder = builder.config_path(config);
        }
        if let Some(relay_url) = &self.relay_url {
            builder = builder.relay_url(relay_url);
        }
        if let Some(lcd_url) = &self.lcd_url {
            builder = builder.lcd_url(lcd_url);
        }
        if let Some(chain_id) = &self.chain_id {
            builder = builder.chain_id(chain_id);
        }
        if let Some(gas_price) = &self.gas_price {
            builder = builder.gas_price(gas_price);
        }
        if let Some(dir) = &self.artifacts_dir {
            builder = builder.artifacts_dir(dir);
        }
        if let Some(admin) = &self.admin {
            builder = builder.admin(admin);
        }
        if let Some(secs) = self.step_timeout {
            builder = builder.step_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "cosmup",
            "run",
            "bootstrap",
            "--relay-url",
            "http://relay:26658",
            "-v",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.verbosity, LevelFilter::DEBUG);
        assert_eq!(cli.relay_url.as_deref(), Some("http://relay:26658"));
        assert!(matches!(
            cli.command,
            Command::Run {
                scenario: ScenarioKind::Bootstrap,
                json: false
            }
        ));
    }

    #[test]
    fn test_parse_plan_rejects_unknown_scenario() {
        assert!(Cli::try_parse_from(["cosmup", "plan", "teardown"]).is_err());
        assert!(Cli::try_parse_from(["cosmup", "plan", "wrap-token"]).is_ok());
    }

    #[test]
    fn test_init_config_default_path() {
        let cli = Cli::try_parse_from(["cosmup", "init-config"]).unwrap();
        match cli.command {
            Command::InitConfig { path, force } => {
                assert_eq!(path, PathBuf::from(CONFIG_FILENAME));
                assert!(!force);
            }
            _ => panic!("expected init-config"),
        }
    }
}
