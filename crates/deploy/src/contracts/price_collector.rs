//! Price collector contract: aggregates feeder answers and pushes rounds to a price feed.

use serde::Serialize;

use super::{Validate, check_address, check_decimals};
use crate::{
    DeployError,
    pipeline::{Bindable, Binding, OutputRef, PipelineContext},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantiateMsg {
    /// Address of the price feed this collector controls.
    pub price_feed: Binding<String>,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    /// Allow (`status = true`) or revoke a feeder.
    UpdatePriceFeeder {
        price_feeder: Binding<String>,
        status: bool,
    },
    ProvideRoundData {
        answer: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    #[serde(rename = "lastest_round_data")]
    LatestRoundData {},
    RoundData { round_id: u64 },
}

impl ExecuteMsg {
    pub fn method(&self) -> &'static str {
        match self {
            ExecuteMsg::UpdatePriceFeeder { .. } => "update_price_feeder",
            ExecuteMsg::ProvideRoundData { .. } => "provide_round_data",
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
        self.price_feed.references()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.price_feed.bind(step, ctx)
    }
}

impl Validate for InstantiateMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        check_address("price_feed", &self.price_feed, address_prefix)?;
        check_decimals(self.decimals)
    }
}

impl Bindable for ExecuteMsg {
    fn references(&self) -> Vec<&OutputRef> {
        match self {
            ExecuteMsg::UpdatePriceFeeder { price_feeder, .. } => price_feeder.references(),
            ExecuteMsg::ProvideRoundData { .. } => Vec::new(),
        }
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        match self {
            ExecuteMsg::UpdatePriceFeeder { price_feeder, .. } => price_feeder.bind(step, ctx),
            ExecuteMsg::ProvideRoundData { .. } => Ok(()),
        }
    }
}

impl Validate for ExecuteMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        match self {
            ExecuteMsg::UpdatePriceFeeder { price_feeder, .. } => {
                check_address("price_feeder", price_feeder, address_prefix)
            }
            ExecuteMsg::ProvideRoundData { .. } => Ok(()),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_price_feeder_shape() {
        let msg = ExecuteMsg::UpdatePriceFeeder {
            price_feeder: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".into(),
            status: true,
        };

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({
                "update_price_feeder": {
                    "price_feeder": "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd",
                    "status": true
                }
            })
        );
    }
}
