//! Typed messages and interfaces for the contracts the scenarios deploy.
//!
//! Every contract method is one enum variant with typed fields. The aggregate
//! [`InstantiateMsg`], [`ExecuteMsg`] and [`QueryMsg`] enums pick the contract and
//! serialize transparently as the inner message.

use derive_more::From;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    chain::ChainClient,
    pipeline::{Bindable, Binding, OutputRef, PipelineContext},
    DeployError,
};

pub mod minter;
pub mod price_collector;
pub mod price_feed;
pub mod wrap_token;

/// Bech32 data characters.
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Data part of the shortest address accepted (20-byte account + checksum).
const MIN_ADDRESS_DATA_LEN: usize = 38;

/// Maximum length of a bech32 string.
const MAX_ADDRESS_LEN: usize = 90;

/// Check that `addr` looks like a bech32 address with the given human readable prefix.
///
/// The checksum itself is verified by the chain.
pub fn validate_address(addr: &str, prefix: &str) -> Result<(), String> {
    let data = addr
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('1'))
        .ok_or_else(|| format!("address `{}` does not start with `{}1`", addr, prefix))?;

    if data.len() < MIN_ADDRESS_DATA_LEN || addr.len() > MAX_ADDRESS_LEN {
        return Err(format!("address `{}` has an invalid length", addr));
    }

    if !data.chars().all(|c| BECH32_CHARSET.contains(c)) {
        return Err(format!("address `{}` contains non-bech32 characters", addr));
    }

    Ok(())
}

/// Validate an address binding once it holds a literal.
pub(crate) fn check_address(
    field: &str,
    binding: &Binding<String>,
    prefix: &str,
) -> Result<(), String> {
    match binding.as_literal() {
        Some(addr) => validate_address(addr, prefix).map_err(|e| format!("{}: {}", field, e)),
        None => Ok(()),
    }
}

pub(crate) fn check_decimals(decimals: u8) -> Result<(), String> {
    if decimals > 18 {
        return Err("decimals must not exceed 18".to_string());
    }
    Ok(())
}

pub(crate) fn check_nonzero(field: &str, amount: u128) -> Result<(), String> {
    if amount == 0 {
        return Err(format!("{} must be greater than zero", field));
    }
    Ok(())
}

/// Schema checks run on a message right before it is submitted.
pub trait Validate {
    fn validate(&self, address_prefix: &str) -> Result<(), String>;
}

/// Run a smart query and deserialize the typed response.
pub(crate) async fn query_smart<C, Q, R>(client: &C, contract: &str, msg: &Q) -> anyhow::Result<R>
where
    C: ChainClient,
    Q: Serialize,
    R: DeserializeOwned,
{
    let msg = serde_json::to_value(msg)?;
    let data = client.query_contract_smart(contract, &msg).await?;
    Ok(serde_json::from_value(data)?)
}

macro_rules! aggregate_msg {
    ($(#[$meta:meta])* $name:ident { $($variant:ident($module:ident)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, From)]
        #[serde(untagged)]
        pub enum $name {
            $($variant($module::$name),)+
        }

        impl $name {
            /// Logical name of the target contract.
            pub fn contract_name(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => stringify!($module),)+
                }
            }
        }

        impl Bindable for $name {
            fn references(&self) -> Vec<&OutputRef> {
                match self {
                    $($name::$variant(msg) => msg.references(),)+
                }
            }

            fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
                match self {
                    $($name::$variant(msg) => msg.bind(step, ctx),)+
                }
            }
        }

        impl Validate for $name {
            fn validate(&self, address_prefix: &str) -> Result<(), String> {
                match self {
                    $($name::$variant(msg) => msg.validate(address_prefix),)+
                }
            }
        }
    };
}

aggregate_msg!(
    /// Instantiate message for any known contract.
    InstantiateMsg {
        PriceFeed(price_feed),
        PriceCollector(price_collector),
        WrapToken(wrap_token),
        Minter(minter),
    }
);

aggregate_msg!(
    /// Execute message for any known contract.
    ExecuteMsg {
        PriceFeed(price_feed),
        PriceCollector(price_collector),
        WrapToken(wrap_token),
        Minter(minter),
    }
);

aggregate_msg!(
    /// Query message for any known contract.
    QueryMsg {
        PriceFeed(price_feed),
        PriceCollector(price_collector),
        WrapToken(wrap_token),
        Minter(minter),
    }
);

impl ExecuteMsg {
    /// Snake case name of the contract method.
    pub fn method(&self) -> &'static str {
        match self {
            ExecuteMsg::PriceFeed(msg) => msg.method(),
            ExecuteMsg::PriceCollector(msg) => msg.method(),
            ExecuteMsg::WrapToken(msg) => msg.method(),
            ExecuteMsg::Minter(msg) => msg.method(),
        }
    }
}

impl QueryMsg {
    /// Snake case name of the query.
    pub fn method(&self) -> &'static str {
        match self {
            QueryMsg::PriceFeed(msg) => msg.method(),
            QueryMsg::PriceCollector(msg) => msg.method(),
            QueryMsg::WrapToken(msg) => msg.method(),
            QueryMsg::Minter(msg) => msg.method(),
        }
    }
}
