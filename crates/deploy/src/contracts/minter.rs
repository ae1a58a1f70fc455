//! Minter contract: exchanges native currency for a stable token it instantiates itself.
//!
//! [`MinterQueryClient`] and [`MinterClient`] are the read and write interfaces to a
//! deployed minter.

use derive_more::Deref;
use serde::{Deserialize, Serialize};

use super::{
    Validate, check_address, check_decimals, check_nonzero, query_smart,
    wrap_token::{Cw20Coin, MinterResponse},
};
use crate::{
    DeployError,
    chain::{ChainClient, Coin, ExecuteResponse, Fee, uint128},
    pipeline::{Bindable, Binding, OutputRef, PipelineContext},
};

/// Memo used by the write interface when none is given.
const DEFAULT_MEMO: &str = "";

/// cw20-base instantiate message for the token the minter creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInstantiateMsg {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_balances: Vec<Cw20Coin>,
    /// Overwritten by the minter with its own address.
    pub mint: Option<MinterResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantiateMsg {
    pub receiver_name: String,
    pub receiver_address: Binding<String>,
    pub accepted_denom: String,
    pub price_feed: Binding<String>,
    pub token_code_id: Binding<u64>,
    pub token_instantiation_msg: TokenInstantiateMsg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    Exchange {
        #[serde(with = "uint128")]
        amount: u128,
        #[serde(with = "uint128")]
        expected_received: u128,
    },
    Withdraw {},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Owner {},
    Receiver {},
    ExchangingInfo {},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverResponse {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangingInfoResponse {
    pub accepted_denom: String,
    pub token_address: String,
    pub price_feed: String,
}

impl ExecuteMsg {
    pub fn method(&self) -> &'static str {
        match self {
            ExecuteMsg::Exchange { .. } => "exchange",
            ExecuteMsg::Withdraw {} => "withdraw",
        }
    }
}

impl QueryMsg {
    pub fn method(&self) -> &'static str {
        match self {
            QueryMsg::Owner {} => "owner",
            QueryMsg::Receiver {} => "receiver",
            QueryMsg::ExchangingInfo {} => "exchanging_info",
        }
    }
}

impl Bindable for InstantiateMsg {
    fn references(&self) -> Vec<&OutputRef> {
        let mut refs = self.receiver_address.references();
        refs.extend(self.price_feed.references());
        refs.extend(self.token_code_id.references());
        refs.extend(self.token_instantiation_msg.initial_balances.references());
        refs.extend(self.token_instantiation_msg.mint.references());
        refs
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.receiver_address.bind(step, ctx)?;
        self.price_feed.bind(step, ctx)?;
        self.token_code_id.bind(step, ctx)?;
        self.token_instantiation_msg
            .initial_balances
            .bind(step, ctx)?;
        self.token_instantiation_msg.mint.bind(step, ctx)
    }
}

impl Validate for InstantiateMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        if self.receiver_name.trim().is_empty() {
            return Err("receiver_name must not be empty".to_string());
        }
        check_address("receiver_address", &self.receiver_address, address_prefix)?;
        check_address("price_feed", &self.price_feed, address_prefix)?;
        if self.accepted_denom.trim().is_empty() {
            return Err("accepted_denom must not be empty".to_string());
        }
        check_decimals(self.token_instantiation_msg.decimals)
    }
}

impl Bindable for ExecuteMsg {
    fn references(&self) -> Vec<&OutputRef> {
        Vec::new()
    }

    fn bind(&mut self, _step: &str, _ctx: &PipelineContext) -> Result<(), DeployError> {
        Ok(())
    }
}

impl Validate for ExecuteMsg {
    fn validate(&self, _address_prefix: &str) -> Result<(), String> {
        match self {
            ExecuteMsg::Exchange { amount, .. } => check_nonzero("amount", *amount),
            ExecuteMsg::Withdraw {} => Ok(()),
        }
    }
}

impl Bindable for QueryMsg {
    fn references(&self) -> Vec<&OutputRef> {
        Vec::new()
    }

    fn bind(&mut self, _step: &str, _ctx: &PipelineContext) -> Result<(), DeployError> {
        Ok(())
    }
}

impl Validate for QueryMsg {
    fn validate(&self, _address_prefix: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Read-only interface to a deployed minter.
#[derive(Debug, Clone)]
pub struct MinterQueryClient<'a, C> {
    client: &'a C,
    contract_address: String,
}

impl<'a, C: ChainClient> MinterQueryClient<'a, C> {
    pub fn new(client: &'a C, contract_address: impl Into<String>) -> Self {
        Self {
            client,
            contract_address: contract_address.into(),
        }
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub async fn owner(&self) -> anyhow::Result<String> {
        query_smart(self.client, &self.contract_address, &QueryMsg::Owner {}).await
    }

    pub async fn receiver(&self) -> anyhow::Result<ReceiverResponse> {
        query_smart(self.client, &self.contract_address, &QueryMsg::Receiver {}).await
    }

    pub async fn exchanging_info(&self) -> anyhow::Result<ExchangingInfoResponse> {
        query_smart(self.client, &self.contract_address, &QueryMsg::ExchangingInfo {}).await
    }
}

/// Read and write interface to a deployed minter, signing as `sender`.
#[derive(Debug, Clone, Deref)]
pub struct MinterClient<'a, C> {
    #[deref]
    query: MinterQueryClient<'a, C>,
    client: &'a C,
    sender: String,
}

impl<'a, C: ChainClient> MinterClient<'a, C> {
    pub fn new(client: &'a C, sender: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self {
            query: MinterQueryClient::new(client, contract_address),
            client,
            sender: sender.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Exchange `amount` native currency for at least `expected_received` stable tokens.
    pub async fn exchange(
        &self,
        amount: u128,
        expected_received: u128,
        fee: Option<Fee>,
        memo: Option<&str>,
        funds: Option<&[Coin]>,
    ) -> anyhow::Result<ExecuteResponse> {
        self.send(
            &ExecuteMsg::Exchange {
                amount,
                expected_received,
            },
            fee,
            memo,
            funds,
        )
        .await
    }

    /// Withdraw the native currency collected by the minter.
    pub async fn withdraw(
        &self,
        fee: Option<Fee>,
        memo: Option<&str>,
        funds: Option<&[Coin]>,
    ) -> anyhow::Result<ExecuteResponse> {
        self.send(&ExecuteMsg::Withdraw {}, fee, memo, funds).await
    }

    async fn send(
        &self,
        msg: &ExecuteMsg,
        fee: Option<Fee>,
        memo: Option<&str>,
        funds: Option<&[Coin]>,
    ) -> anyhow::Result<ExecuteResponse> {
        let msg = serde_json::to_value(msg)?;
        self.client
            .execute(
                &self.sender,
                self.query.contract_address(),
                &msg,
                &fee.unwrap_or(Fee::Auto),
                memo.unwrap_or(DEFAULT_MEMO),
                funds,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_shape() {
        let msg = ExecuteMsg::Exchange {
            amount: 1_000_000,
            expected_received: 990_000,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({
                "exchange": { "amount": "1000000", "expected_received": "990000" }
            })
        );
        assert_eq!(
            serde_json::to_value(ExecuteMsg::Withdraw {}).unwrap(),
            serde_json::json!({ "withdraw": {} })
        );
    }

    #[test]
    fn test_instantiate_references() {
        let msg = InstantiateMsg {
            receiver_name: "Aura Receiver".to_string(),
            receiver_address: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".into(),
            accepted_denom: "uaura".to_string(),
            price_feed: "aura199ehk0vljy6tx9rsyzz9pl3ee8hldyjl8enje0vsnzgxauvf5slsms95jp".into(),
            token_code_id: Binding::code_id_of("upload-token"),
            token_instantiation_msg: TokenInstantiateMsg {
                name: "Aura Stable VND".to_string(),
                symbol: "sVND".to_string(),
                decimals: 6,
                initial_balances: vec![],
                mint: None,
            },
        };

        let refs: Vec<String> = msg.references().iter().map(|r| r.to_string()).collect();
        assert_eq!(refs, vec!["upload-token.code_id"]);
        assert!(msg.validate("aura").is_ok());
        assert!(serde_json::to_value(&msg).is_err());
    }
}
