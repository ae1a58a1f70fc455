//! Wrap token contract: a cw20 token backed 1:1 by the chain's native denom.
//!
//! Minting requires the minter to attach exactly the minted amount in native currency.

use serde::{Deserialize, Serialize};

use super::{Validate, check_address, check_decimals, check_nonzero, query_smart};
use crate::{
    DeployError,
    chain::{ChainClient, uint128},
    pipeline::{Bindable, Binding, OutputRef, PipelineContext},
};

/// An initial cw20 balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cw20Coin {
    pub address: Binding<String>,
    #[serde(with = "uint128")]
    pub amount: u128,
}

/// Who may mint, and up to what cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinterResponse {
    pub minter: Binding<String>,
    #[serde(with = "uint128::option")]
    pub cap: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantiateMsg {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_balances: Vec<Cw20Coin>,
    pub mint: Option<MinterResponse>,
    pub native_denom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    Mint {
        recipient: Binding<String>,
        #[serde(with = "uint128")]
        amount: u128,
    },
    Burn {
        #[serde(with = "uint128")]
        amount: u128,
    },
    Transfer {
        recipient: Binding<String>,
        #[serde(with = "uint128")]
        amount: u128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Balance { address: Binding<String> },
    TokenInfo {},
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceResponse {
    #[serde(with = "uint128")]
    pub balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenInfoResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "uint128")]
    pub total_supply: u128,
}

impl ExecuteMsg {
    pub fn method(&self) -> &'static str {
        match self {
            ExecuteMsg::Mint { .. } => "mint",
            ExecuteMsg::Burn { .. } => "burn",
            ExecuteMsg::Transfer { .. } => "transfer",
        }
    }
}

impl QueryMsg {
    pub fn method(&self) -> &'static str {
        match self {
            QueryMsg::Balance { .. } => "balance",
            QueryMsg::TokenInfo {} => "token_info",
        }
    }
}

/// Name must be 3 to 50 bytes.
fn check_name(name: &str) -> Result<(), String> {
    if !(3..=50).contains(&name.len()) {
        return Err("name is not in the expected format (3-50 UTF-8 bytes)".to_string());
    }
    Ok(())
}

/// Symbol must be 3 to 12 characters of `[a-zA-Z-]`.
fn check_symbol(symbol: &str) -> Result<(), String> {
    let valid = (3..=12).contains(&symbol.len())
        && symbol.bytes().all(|b| b == b'-' || b.is_ascii_alphabetic());
    if !valid {
        return Err("ticker symbol is not in expected format [a-zA-Z\\-]{3,12}".to_string());
    }
    Ok(())
}

impl Bindable for Cw20Coin {
    fn references(&self) -> Vec<&OutputRef> {
        self.address.references()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.address.bind(step, ctx)
    }
}

impl Bindable for MinterResponse {
    fn references(&self) -> Vec<&OutputRef> {
        self.minter.references()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.minter.bind(step, ctx)
    }
}

impl Bindable for InstantiateMsg {
    fn references(&self) -> Vec<&OutputRef> {
        let mut refs = self.initial_balances.references();
        refs.extend(self.mint.references());
        refs
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.initial_balances.bind(step, ctx)?;
        self.mint.bind(step, ctx)
    }
}

impl Validate for InstantiateMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        check_name(&self.name)?;
        check_symbol(&self.symbol)?;
        check_decimals(self.decimals)?;

        // Every token must be backed by native currency held by the contract.
        if !self.initial_balances.is_empty() {
            return Err("initial balances must be empty".to_string());
        }

        if let Some(mint) = &self.mint {
            check_address("mint.minter", &mint.minter, address_prefix)?;
        }

        if self.native_denom.trim().is_empty() {
            return Err("native_denom must not be empty".to_string());
        }

        Ok(())
    }
}

impl Bindable for ExecuteMsg {
    fn references(&self) -> Vec<&OutputRef> {
        match self {
            ExecuteMsg::Mint { recipient, .. } | ExecuteMsg::Transfer { recipient, .. } => {
                recipient.references()
            }
            ExecuteMsg::Burn { .. } => Vec::new(),
        }
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        match self {
            ExecuteMsg::Mint { recipient, .. } | ExecuteMsg::Transfer { recipient, .. } => {
                recipient.bind(step, ctx)
            }
            ExecuteMsg::Burn { .. } => Ok(()),
        }
    }
}

impl Validate for ExecuteMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        match self {
            ExecuteMsg::Mint { recipient, amount } | ExecuteMsg::Transfer { recipient, amount } => {
                check_address("recipient", recipient, address_prefix)?;
                check_nonzero("amount", *amount)
            }
            ExecuteMsg::Burn { amount } => check_nonzero("amount", *amount),
        }
    }
}

impl Bindable for QueryMsg {
    fn references(&self) -> Vec<&OutputRef> {
        match self {
            QueryMsg::Balance { address } => address.references(),
            QueryMsg::TokenInfo {} => Vec::new(),
        }
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        match self {
            QueryMsg::Balance { address } => address.bind(step, ctx),
            QueryMsg::TokenInfo {} => Ok(()),
        }
    }
}

impl Validate for QueryMsg {
    fn validate(&self, address_prefix: &str) -> Result<(), String> {
        match self {
            QueryMsg::Balance { address } => check_address("address", address, address_prefix),
            QueryMsg::TokenInfo {} => Ok(()),
        }
    }
}

/// Read-only interface to a deployed wrap token.
#[derive(Debug, Clone)]
pub struct WrapTokenQueryClient<'a, C> {
    client: &'a C,
    contract_address: String,
}

impl<'a, C: ChainClient> WrapTokenQueryClient<'a, C> {
    pub fn new(client: &'a C, contract_address: impl Into<String>) -> Self {
        Self {
            client,
            contract_address: contract_address.into(),
        }
    }

    pub async fn balance(&self, address: impl Into<String>) -> anyhow::Result<BalanceResponse> {
        let msg = QueryMsg::Balance {
            address: Binding::Literal(address.into()),
        };
        query_smart(self.client, &self.contract_address, &msg).await
    }

    pub async fn token_info(&self) -> anyhow::Result<TokenInfoResponse> {
        query_smart(self.client, &self.contract_address, &QueryMsg::TokenInfo {}).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instantiate_msg() -> InstantiateMsg {
        InstantiateMsg {
            name: "Aura Wrap Token".to_string(),
            symbol: "wAURA".to_string(),
            decimals: 6,
            initial_balances: vec![],
            mint: Some(MinterResponse {
                minter: "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r".into(),
                cap: None,
            }),
            native_denom: "uaura".to_string(),
        }
    }

    #[test]
    fn test_instantiate_msg_shape() {
        let msg = instantiate_msg();
        assert!(msg.validate("aura").is_ok());
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({
                "name": "Aura Wrap Token",
                "symbol": "wAURA",
                "decimals": 6,
                "initial_balances": [],
                "mint": {
                    "minter": "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r",
                    "cap": null
                },
                "native_denom": "uaura"
            })
        );
    }

    #[test]
    fn test_symbol_and_name_rules() {
        let mut msg = instantiate_msg();
        msg.symbol = "w4URA".to_string();
        assert!(msg.validate("aura").is_err());

        let mut msg = instantiate_msg();
        msg.name = "ab".to_string();
        assert!(msg.validate("aura").is_err());
    }

    #[test]
    fn test_initial_balances_rejected() {
        let mut msg = instantiate_msg();
        msg.initial_balances.push(Cw20Coin {
            address: "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r".into(),
            amount: 1,
        });
        assert_eq!(
            msg.validate("aura"),
            Err("initial balances must be empty".to_string())
        );
    }

    #[test]
    fn test_mint_shape() {
        let msg = ExecuteMsg::Mint {
            recipient: "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r".into(),
            amount: 30_000_000_000,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({
                "mint": {
                    "recipient": "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r",
                    "amount": "30000000000"
                }
            })
        );
    }
}
