use anyhow::{Context, Result};
use url::Url;

use crate::{
    ChainClient, DeployConfig, DeployContext, JsonRpcChainClient, Orchestrator, RunReport,
    Scenario, ScenarioKind,
};

/// Top level entry point: runs built-in scenarios against the configured network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployer {
    pub config: DeployConfig,
}

impl Deployer {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    /// The step list of a built-in scenario, with this deployer's parameters.
    pub fn scenario(&self, kind: ScenarioKind) -> Scenario {
        kind.build(&self.config.scenario, &self.config.network.denom)
    }

    /// Build the JSON-RPC client for the configured relay and LCD endpoints.
    pub fn client(&self) -> Result<JsonRpcChainClient> {
        let network = &self.config.network;
        let relay_url = Url::parse(&network.relay_url)
            .context(format!("Invalid relay URL: {}", network.relay_url))?;
        let lcd_url = Url::parse(&network.lcd_url)
            .context(format!("Invalid LCD URL: {}", network.lcd_url))?;

        JsonRpcChainClient::new(relay_url, lcd_url, self.config.deploy.step_timeout())
    }

    /// Run a built-in scenario over the JSON-RPC client.
    pub async fn deploy(&self, kind: ScenarioKind) -> Result<RunReport> {
        let client = self.client()?;
        self.deploy_with(client, kind).await
    }

    /// Run a built-in scenario over any chain client.
    pub async fn deploy_with<C: ChainClient>(&self, client: C, kind: ScenarioKind) -> Result<RunReport> {
        tracing::info!(
            scenario = %kind,
            chain_id = %self.config.network.chain_id,
            relay_url = %self.config.network.relay_url,
            artifacts_dir = %self.config.deploy.artifacts_dir.display(),
            "Starting deployment process..."
        );

        let ctx = DeployContext::connect(client, &self.config).await?;
        let mut orchestrator = Orchestrator::new(&ctx);
        let report = orchestrator.run(self.scenario(kind)).await?;

        for record in &report.steps {
            tracing::info!(
                step = %record.name,
                kind = %record.kind(),
                tx_hash = record.result.transaction_hash(),
                result = %record.result.summary(),
                "Step result"
            );
        }

        Ok(report)
    }
}
