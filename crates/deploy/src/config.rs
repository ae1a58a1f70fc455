//! Deployment configuration.
//!
//! Values are layered: built-in defaults, then a TOML file, then `COSMUP_` environment
//! variables (`__` separates sections, e.g. `COSMUP_NETWORK__RELAY_URL`).

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    chain::{GasPrice, calculate_fee},
    scenarios::ScenarioParams,
};

/// The default name for the configuration file.
pub const CONFIG_FILENAME: &str = "Cosmup.toml";

/// Prefix of the environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "COSMUP_";

/// Network endpoints and chain parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Chain ID, used for logging and as a sanity check by the relay.
    pub chain_id: String,
    /// JSON-RPC endpoint of the signing relay.
    pub relay_url: String,
    /// LCD REST endpoint used for smart queries.
    pub lcd_url: String,
    /// Bech32 human readable prefix of account and contract addresses.
    pub prefix: String,
    /// Native denom attached to payable execute calls.
    pub denom: String,
    /// Gas price used to compute the upload fee.
    pub gas_price: GasPrice,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: "xstaxy-1".to_string(),
            relay_url: "http://127.0.0.1:26658".to_string(),
            lcd_url: "https://lcd.aura.network".to_string(),
            prefix: "aura".to_string(),
            denom: "uaura".to_string(),
            gas_price: GasPrice::default_for("uaura"),
        }
    }
}

/// How steps are submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Directory holding `<contract>.wasm` artifacts.
    pub artifacts_dir: PathBuf,
    /// Gas limit paid for at the configured gas price on every upload.
    pub upload_gas_limit: u64,
    /// Label given to instantiated contracts that do not set their own.
    pub instantiate_label: String,
    /// Memo attached to execute transactions.
    pub execute_memo: String,
    /// Admin of instantiated contracts. No admin when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
    /// Upper bound on a single chain operation, in seconds. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
}

impl DeploySettings {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            upload_gas_limit: 2_600_000,
            instantiate_label: "instantiation contract".to_string(),
            execute_memo: "execute a message".to_string(),
            admin: None,
            step_timeout_secs: Some(120),
        }
    }
}

/// Complete configuration of a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    pub network: NetworkConfig,
    pub deploy: DeploySettings,
    pub scenario: ScenarioParams,
}

impl DeployConfig {
    /// Load the layered configuration.
    ///
    /// `path` may point at a TOML file or at a directory containing [`CONFIG_FILENAME`].
    /// Without a path only defaults and environment variables apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            let config_path = Self::resolve_path(path)?;
            figment = figment.merge(Toml::file(&config_path));
            tracing::debug!(path = %config_path.display(), "Using configuration file");
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to load configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file only, ignoring the environment.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_path = Self::resolve_path(path)?;

        let content = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config from {}", config_path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        config.validate()?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file or directory not found: {}",
                path.display()
            ));
        }

        Ok(if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        })
    }

    fn validate(&self) -> Result<()> {
        if self.network.prefix.trim().is_empty() {
            anyhow::bail!("network.prefix must not be empty");
        }
        if self.network.denom.trim().is_empty() {
            anyhow::bail!("network.denom must not be empty");
        }
        if self.network.gas_price.denom() != self.network.denom {
            anyhow::bail!(
                "network.gas_price is priced in `{}` but network.denom is `{}`",
                self.network.gas_price.denom(),
                self.network.denom
            );
        }
        if self.deploy.upload_gas_limit == 0 {
            anyhow::bail!("deploy.upload_gas_limit must be > 0");
        }
        calculate_fee(self.deploy.upload_gas_limit, &self.network.gas_price)
            .context("deploy.upload_gas_limit at network.gas_price does not give a valid fee")?;
        if self.deploy.step_timeout_secs == Some(0) {
            anyhow::bail!("deploy.step_timeout_secs must be > 0 when set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.network.prefix, "aura");
        assert_eq!(config.network.gas_price.to_string(), "0.025uaura");
        assert_eq!(config.deploy.upload_gas_limit, 2_600_000);
        assert_eq!(config.deploy.step_timeout(), Some(Duration::from_secs(120)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new("cosmup-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILENAME);

        let mut config = DeployConfig::default();
        config.network.relay_url = "http://relay:26658".to_string();
        config.deploy.admin = Some("aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".to_string());
        config.save_to_file(&path).expect("Failed to save config");

        // A directory resolves to the default file name inside it.
        let loaded = DeployConfig::load_from_file(temp_dir.path()).expect("Failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_layered_load_overrides_defaults() {
        let temp_dir = TempDir::new("cosmup-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[network]\nlcd_url = \"https://lcd.example.com\"\n\n[deploy]\nupload_gas_limit = 3000000\n",
        )
        .unwrap();

        let config = DeployConfig::load(Some(&path)).expect("Failed to load config");
        assert_eq!(config.network.lcd_url, "https://lcd.example.com");
        assert_eq!(config.deploy.upload_gas_limit, 3_000_000);
        assert_eq!(config.network.denom, "uaura");
    }

    #[test]
    fn test_mint_amount_from_env_and_toml() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("COSMUP_SCENARIO__MINT_AMOUNT", "5");
            let config = DeployConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.scenario.mint_amount, 5);

            jail.clear_env();
            jail.create_file(
                CONFIG_FILENAME,
                "[scenario]\nmint_amount = 30000000000\nmint_recipient = \"aura1recipient\"\n",
            )?;
            let config = DeployConfig::load(Some(jail.directory())).map_err(|e| e.to_string())?;
            assert_eq!(config.scenario.mint_amount, 30_000_000_000);
            assert_eq!(config.scenario.mint_recipient, "aura1recipient");

            jail.create_file(CONFIG_FILENAME, "[scenario]\nmint_amount = \"42\"\n")?;
            let config = DeployConfig::load(Some(jail.directory())).map_err(|e| e.to_string())?;
            assert_eq!(config.scenario.mint_amount, 42);

            jail.create_file(CONFIG_FILENAME, "[scenario]\nmint_amount = -1\n")?;
            assert!(DeployConfig::load(Some(jail.directory())).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new("cosmup-test").expect("Failed to create temp dir");
        assert!(DeployConfig::load_from_file(&temp_dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_mismatched_gas_price_denom() {
        let mut config = DeployConfig::default();
        config.network.gas_price = "0.025ustake".parse().unwrap();
        assert!(config.validate().is_err());
    }
}
