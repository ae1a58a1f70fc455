//! Builder module for creating a [`Deployer`].
//!
//! [`DeployerBuilder`] loads the layered configuration and applies explicit
//! overrides (typically command line flags) on top of it.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::{DeployConfig, Deployer, chain::GasPrice};

/// Builder for creating a [`Deployer`].
#[derive(Debug, Clone, Default)]
pub struct DeployerBuilder {
    config_path: Option<PathBuf>,
    relay_url: Option<String>,
    lcd_url: Option<String>,
    chain_id: Option<String>,
    gas_price: Option<String>,
    artifacts_dir: Option<PathBuf>,
    admin: Option<String>,
    step_timeout: Option<Duration>,
}

impl DeployerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration file, or a directory holding [`crate::CONFIG_FILENAME`].
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = Some(url.into());
        self
    }

    pub fn lcd_url(mut self, url: impl Into<String>) -> Self {
        self.lcd_url = Some(url.into());
        self
    }

    pub fn chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Gas price such as `0.025uaura`.
    pub fn gas_price(mut self, gas_price: impl Into<String>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    pub fn artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    pub fn admin(mut self, admin: impl Into<String>) -> Self {
        self.admin = Some(admin.into());
        self
    }

    pub fn step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Load the configuration and apply the overrides.
    pub fn build(self) -> Result<Deployer> {
        let mut config = DeployConfig::load(self.config_path.as_deref())?;

        if let Some(relay_url) = self.relay_url {
            config.network.relay_url = relay_url;
        }
        if let Some(lcd_url) = self.lcd_url {
            config.network.lcd_url = lcd_url;
        }
        if let Some(chain_id) = self.chain_id {
            config.network.chain_id = chain_id;
        }
        if let Some(gas_price) = self.gas_price {
            let gas_price: GasPrice = gas_price
                .parse()
                .context(format!("Invalid gas price: {}", gas_price))?;
            config.network.denom = gas_price.denom().to_string();
            config.network.gas_price = gas_price;
        }
        if let Some(dir) = self.artifacts_dir {
            config.deploy.artifacts_dir = dir;
        }
        if let Some(admin) = self.admin {
            config.deploy.admin = Some(admin);
        }
        if let Some(timeout) = self.step_timeout {
            config.deploy.step_timeout_secs = Some(timeout.as_secs().max(1));
        }

        tracing::debug!(?config, "Deployer configuration");
        Ok(Deployer::new(config))
    }
}
