//! Chain client capability.
//!
//! Signing, account sequencing and transport all live behind [`ChainClient`].
//! The rest of the crate only sees request shapes and normalized responses.

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod fee;
mod rpc;

pub use fee::{Fee, GasPrice, StdFee, calculate_fee};
pub use rpc::{JsonRpcChainClient, create_client};

/// A native-currency amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "uint128")]
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Transaction metadata shared by every state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInfo {
    pub transaction_hash: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
}

/// Response to a code upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(flatten)]
    pub tx: TxInfo,
    pub code_id: u64,
}

/// Response to a contract instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateResponse {
    #[serde(flatten)]
    pub tx: TxInfo,
    pub contract_address: String,
}

/// Response to an execute message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    #[serde(flatten)]
    pub tx: TxInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Capability to submit wasm transactions and smart queries to a chain.
///
/// Implementations own the signer and its account sequence. Callers never touch either.
pub trait ChainClient: Send + Sync {
    /// The address transactions are signed with.
    fn signer_address(&self) -> impl Future<Output = Result<String>> + Send;

    /// Store wasm bytecode on chain.
    fn upload(
        &self,
        sender: &str,
        wasm: &[u8],
        fee: &Fee,
        memo: &str,
    ) -> impl Future<Output = Result<UploadResponse>> + Send;

    /// Instantiate a contract from a stored code id.
    fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        msg: &Value,
        label: &str,
        fee: &Fee,
        admin: Option<&str>,
    ) -> impl Future<Output = Result<InstantiateResponse>> + Send;

    /// Execute a message on a contract.
    ///
    /// `funds = None` is the no-funds call shape. It must not be sent as an empty coin list.
    fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &Fee,
        memo: &str,
        funds: Option<&[Coin]>,
    ) -> impl Future<Output = Result<ExecuteResponse>> + Send;

    /// Run a read-only smart query.
    fn query_contract_smart(
        &self,
        contract: &str,
        msg: &Value,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Serde helper for `Uint128`-style amounts.
///
/// Amounts serialize as decimal strings. Deserialization also takes plain integers, which is
/// what TOML files and environment variables produce.
pub(crate) mod uint128 {
    use std::fmt;

    use serde::{Deserialize, Deserializer, Serializer, de};

    struct AmountVisitor;

    impl de::Visitor<'_> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(v.into())
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    struct Amount(u128);

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(AmountVisitor).map(Amount)
        }
    }

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        Amount::deserialize(deserializer).map(|amount| amount.0)
    }

    /// Same encoding for optional amounts.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::Amount;

        pub fn serialize<S: Serializer>(
            value: &Option<u128>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_some(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u128>, D::Error> {
            let amount: Option<Amount> = Deserialize::deserialize(deserializer)?;
            Ok(amount.map(|amount| amount.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_amount_is_a_string() {
        let coin = Coin::new(30_000_000_000, "uaura");
        let json = serde_json::to_value(&coin).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "denom": "uaura", "amount": "30000000000" })
        );

        let back: Coin = serde_json::from_value(json).unwrap();
        assert_eq!(back, coin);
        assert_eq!(back.to_string(), "30000000000uaura");
    }

    #[test]
    fn test_coin_amount_accepts_integers() {
        let coin: Coin =
            serde_json::from_value(serde_json::json!({ "denom": "uaura", "amount": 5 })).unwrap();
        assert_eq!(coin, Coin::new(5, "uaura"));

        assert!(
            serde_json::from_value::<Coin>(serde_json::json!({ "denom": "uaura", "amount": -5 }))
                .is_err()
        );
        assert!(
            serde_json::from_value::<Coin>(serde_json::json!({ "denom": "uaura", "amount": "5u" }))
                .is_err()
        );
    }

    #[test]
    fn test_upload_response_from_relay_json() {
        let response: UploadResponse = serde_json::from_value(serde_json::json!({
            "transactionHash": "ABCD",
            "gasWanted": 2600000,
            "gasUsed": 1874211,
            "codeId": 42
        }))
        .unwrap();

        assert_eq!(response.code_id, 42);
        assert_eq!(response.tx.transaction_hash, "ABCD");
        assert_eq!(response.tx.gas_used, 1874211);
    }
}
