//! Primitive chain operations: upload, instantiate, execute, query.
//!
//! [`StepExecutor`] owns no state of its own. Everything it needs (client, signer,
//! artifacts, fees and memos) lives in a [`DeployContext`] that the caller builds once
//! and passes explicitly.

use std::{future::Future, time::Duration};

use anyhow::Context;
use serde_json::Value;

use crate::{
    DeployError,
    artifacts::ArtifactStore,
    chain::{ChainClient, Coin, Fee, calculate_fee},
    config::DeployConfig,
    pipeline::StepResult,
};

/// Everything a deployment run needs to talk to the chain.
#[derive(Debug, Clone)]
pub struct DeployContext<C> {
    client: C,
    sender: String,
    artifacts: ArtifactStore,
    denom: String,
    address_prefix: String,
    upload_fee: Fee,
    instantiate_label: String,
    execute_memo: String,
    admin: Option<String>,
    step_timeout: Option<Duration>,
}

impl<C: ChainClient> DeployContext<C> {
    /// Build a context, asking the client which address it signs with.
    pub async fn connect(client: C, config: &DeployConfig) -> anyhow::Result<Self> {
        let sender = client
            .signer_address()
            .await
            .context("Failed to fetch the signer address")?;
        tracing::info!(%sender, chain_id = %config.network.chain_id, "Connected to chain");
        Self::new(client, sender, config)
    }

    pub fn new(client: C, sender: impl Into<String>, config: &DeployConfig) -> anyhow::Result<Self> {
        let upload_fee = Fee::Fixed(
            calculate_fee(config.deploy.upload_gas_limit, &config.network.gas_price)
                .context("Failed to compute the upload fee")?,
        );

        Ok(Self {
            client,
            sender: sender.into(),
            artifacts: ArtifactStore::new(&config.deploy.artifacts_dir),
            denom: config.network.denom.clone(),
            address_prefix: config.network.prefix.clone(),
            upload_fee,
            instantiate_label: config.deploy.instantiate_label.clone(),
            execute_memo: config.deploy.execute_memo.clone(),
            admin: config.deploy.admin.clone(),
            step_timeout: config.deploy.step_timeout(),
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn address_prefix(&self) -> &str {
        &self.address_prefix
    }

    pub fn upload_fee(&self) -> &Fee {
        &self.upload_fee
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    /// Override the per-operation timeout. `None` waits forever.
    pub fn with_step_timeout(mut self, step_timeout: Option<Duration>) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn executor(&self) -> StepExecutor<'_, C> {
        StepExecutor::new(self)
    }
}

/// Performs exactly one chain operation per call and normalizes the response.
///
/// Failures are never retried here.
#[derive(Debug, Clone, Copy)]
pub struct StepExecutor<'a, C> {
    ctx: &'a DeployContext<C>,
}

impl<'a, C: ChainClient> StepExecutor<'a, C> {
    pub fn new(ctx: &'a DeployContext<C>) -> Self {
        Self { ctx }
    }

    /// Read the artifact for `artifact` and store it on chain.
    ///
    /// Uses the fixed upload fee. A missing artifact fails before the chain is contacted.
    pub async fn upload_code(&self, artifact: &str) -> Result<StepResult, DeployError> {
        let artifact = self.ctx.artifacts.load(artifact).await?;
        let memo = format!("Upload {} contract code", artifact.name);

        tracing::info!(
            artifact = %artifact.name,
            checksum = %artifact.checksum,
            size = artifact.bytes.len(),
            "Uploading contract code..."
        );

        let response = self
            .timed(
                "upload",
                self.ctx
                    .client
                    .upload(&self.ctx.sender, &artifact.bytes, &self.ctx.upload_fee, &memo),
            )
            .await?;

        tracing::info!(
            artifact = %artifact.name,
            code_id = response.code_id,
            tx_hash = %response.tx.transaction_hash,
            gas_wanted = response.tx.gas_wanted,
            gas_used = response.tx.gas_used,
            "Contract code uploaded"
        );

        Ok(StepResult::Uploaded {
            tx: response.tx,
            code_id: response.code_id,
            checksum: artifact.checksum,
        })
    }

    /// Instantiate stored code with an automatically estimated fee.
    ///
    /// `label` falls back to the configured label and `admin` to the configured admin.
    pub async fn instantiate(
        &self,
        code_id: u64,
        msg: &Value,
        label: Option<&str>,
        admin: Option<&str>,
    ) -> Result<StepResult, DeployError> {
        let label = label.unwrap_or(&self.ctx.instantiate_label);
        let admin = admin.or(self.ctx.admin.as_deref());

        tracing::info!(code_id, label, admin, "Instantiating contract...");
        tracing::debug!(%msg, "Instantiate message");

        let response = self
            .timed(
                "instantiate",
                self.ctx.client.instantiate(
                    &self.ctx.sender,
                    code_id,
                    msg,
                    label,
                    &Fee::Auto,
                    admin,
                ),
            )
            .await?;

        tracing::info!(
            code_id,
            contract_address = %response.contract_address,
            tx_hash = %response.tx.transaction_hash,
            gas_wanted = response.tx.gas_wanted,
            gas_used = response.tx.gas_used,
            "Contract instantiated"
        );

        Ok(StepResult::Instantiated {
            tx: response.tx,
            contract_address: response.contract_address,
        })
    }

    /// Execute `msg` on `contract` with an automatically estimated fee.
    ///
    /// `native_amount = None` sends no funds at all. `Some(n)` attaches exactly one coin of
    /// `n` in the configured denom, and `Some(0)` is rejected without contacting the chain.
    pub async fn execute(
        &self,
        contract: &str,
        msg: &Value,
        native_amount: Option<u128>,
    ) -> Result<StepResult, DeployError> {
        let funds = self.native_funds(contract, native_amount)?;

        tracing::info!(
            contract,
            funds = ?funds.as_ref().map(|coins| coins[0].to_string()),
            "Executing contract message..."
        );
        tracing::debug!(%msg, "Execute message");

        let response = self
            .timed(
                "execute",
                self.ctx.client.execute(
                    &self.ctx.sender,
                    contract,
                    msg,
                    &Fee::Auto,
                    &self.ctx.execute_memo,
                    funds.as_deref(),
                ),
            )
            .await?;

        tracing::info!(
            contract,
            tx_hash = %response.tx.transaction_hash,
            gas_wanted = response.tx.gas_wanted,
            gas_used = response.tx.gas_used,
            "Contract message executed"
        );

        Ok(StepResult::Executed {
            tx: response.tx,
            data: response.data,
        })
    }

    /// Run a read-only smart query. No transaction, no fee.
    pub async fn query(&self, contract: &str, msg: &Value) -> Result<Value, DeployError> {
        tracing::debug!(contract, %msg, "Querying contract...");

        let data = self
            .timed(
                "query",
                self.ctx.client.query_contract_smart(contract, msg),
            )
            .await?;

        tracing::info!(contract, %data, "Contract query answered");
        Ok(data)
    }

    fn native_funds(
        &self,
        contract: &str,
        native_amount: Option<u128>,
    ) -> Result<Option<Vec<Coin>>, DeployError> {
        match native_amount {
            None => Ok(None),
            Some(0) => Err(DeployError::InvalidFunds {
                contract: contract.to_string(),
            }),
            Some(amount) => Ok(Some(vec![Coin::new(amount, self.ctx.denom.clone())])),
        }
    }

    /// Await a chain call, bounded by the configured timeout.
    async fn timed<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, DeployError> {
        let result = match self.ctx.step_timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| DeployError::Timeout { operation, after })?,
            None => call.await,
        };

        result.map_err(|e| {
            tracing::error!(operation, err = %format!("{e:#}"), "Chain request failed");
            DeployError::chain(operation, e)
        })
    }
}
