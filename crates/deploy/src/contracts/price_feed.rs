//! Price feed contract: stores round data pushed by its controller.

use serde::{Deserialize, Serialize};

use super::{Validate, check_address, check_decimals, query_smart};
use crate::{
    DeployError,
    chain::{ChainClient, uint128},
    pipeline::{Bindable, Binding, OutputRef, PipelineContext},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantiateMsg {
    pub controller: Binding<String>,
    pub decimals: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    /// Hand control of the feed to another address, usually a price collector.
    UpdateController { controller: Binding<String> },
    UpdateRoundData { answer: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    // The deployed contract spells it this way.
    #[serde(rename = "lastest_round_data")]
    LatestRoundData {},
    RoundData { round_id: u64 },
}

/// One round of price data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoundDataResponse {
    #[serde(with = "uint128")]
    pub answer: u128,
    /// Block time in nanoseconds, as a string.
    pub updated_at: String,
}

impl ExecuteMsg {
    pub fn method(&self) -> &'static str {
        match self {
            ExecuteMsg::UpdateController { .. } => "update_controller",
            ExecuteMsg::UpdateRoundData { .. } => "update_round_data",
        }
    }
}

impl QueryMsg {
    pub fn method(&self) -> &'static str {
        match self {
            QueryMsg::LatestRoundData {} => "lastest_round_data",
            QueryMsg::RoundData { .. } => "round_data",
        }
    }
}

impl Bindable for InstantiateMsg {
    fn references(&self) -> Vec<&OutputRef> {
        self.controller.references()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.controller.bind(step, ctx)
    }
}

impl Validate for InstantiateMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        check_address("controller", &self.controller, address_prefix)?;
        check_decimals(self.decimals)?;
        if self.description.trim().is_empty() {
            return Err("description must not be empty".to_string());
        }
        Ok(())
    }
}

impl Bindable for ExecuteMsg {
    fn references(&self) -> Vec<&OutputRef> {
        match self {
            ExecuteMsg::UpdateController { controller } => controller.references(),
            ExecuteMsg::UpdateRoundData { .. } => Vec::new(),
        }
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        match self {
            ExecuteMsg::UpdateController { controller } => controller.bind(step, ctx),
            ExecuteMsg::UpdateRoundData { .. } => Ok(()),
        }
    }
}

impl Validate for ExecuteMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        match self {
            ExecuteMsg::UpdateController { controller } => {
                check_address("controller", controller, address_prefix)
            }
            ExecuteMsg::UpdateRoundData { .. } => Ok(()),
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

/// Read-only interface to a deployed price feed.
#[derive(Debug, Clone)]
pub struct PriceFeedQueryClient<'a, C> {
    client: &'a C,
    contract_address: String,
}

impl<'a, C: ChainClient> PriceFeedQueryClient<'a, C> {
    pub fn new(client: &'a C, contract_address: impl Into<String>) -> Self {
        Self {
            client,
            contract_address: contract_address.into(),
        }
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub async fn latest_round_data(&self) -> anyhow::Result<RoundDataResponse> {
        query_smart(self.client, &self.contract_address, &QueryMsg::LatestRoundData {}).await
    }

    pub async fn round_data(&self, round_id: u64) -> anyhow::Result<RoundDataResponse> {
        query_smart(
            self.client,
            &self.contract_address,
            &QueryMsg::RoundData { round_id },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_msg_shape() {
        let msg = InstantiateMsg {
            controller: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".into(),
            decimals: 6,
            description: "AURA / VND".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({
                "controller": "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd",
                "decimals": 6,
                "description": "AURA / VND"
            })
        );
        assert!(msg.validate("aura").is_ok());
    }

    #[test]
    fn test_query_keeps_contract_spelling() {
        assert_eq!(
            serde_json::to_value(QueryMsg::LatestRoundData {}).unwrap(),
            serde_json::json!({ "lastest_round_data": {} })
        );
    }

    #[test]
    fn test_invalid_decimals() {
        let msg = InstantiateMsg {
            controller: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".into(),
            decimals: 19,
            description: "AURA / VND".to_string(),
        };
        assert!(msg.validate("aura").is_err());
    }
}
