//! JSON-RPC chain client backed by a signing relay and an LCD endpoint.

use std::time::Duration;

use anyhow::Context;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use url::Url;

use super::{ChainClient, Coin, ExecuteResponse, Fee, InstantiateResponse, UploadResponse};

/// Default timeout for a single HTTP request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Create an HTTP client configured for relay and LCD requests.
pub fn create_client(timeout: Option<Duration>) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .build()
        .context("Failed to create HTTP client")
}

/// Error object of a JSON-RPC 2.0 response.
///
/// The relay puts the chain's raw log (e.g. `out of gas`) in `data` when a transaction is rejected.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)?;
        match &self.data {
            Some(Value::String(log)) => write!(f, " ({})", log),
            Some(Value::Null) | None => Ok(()),
            Some(other) => write!(f, " ({})", other),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Send `method` to the relay and decode its result.
async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Value,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url.clone())
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response (HTTP {})", method, status))?;

    decode_rpc_response(method, body)
}

/// Turn a relay response body into `T`, surfacing the error object if there is one.
fn decode_rpc_response<T: DeserializeOwned>(method: &str, body: Value) -> Result<T, anyhow::Error> {
    let response: RpcResponse = serde_json::from_value(body)
        .with_context(|| format!("Malformed JSON-RPC response to {}", method))?;

    if let Some(error) = response.error {
        anyhow::bail!("{} rejected by the relay: {}", method, error);
    }

    let result = response
        .result
        .with_context(|| format!("No result in {} response", method))?;

    serde_json::from_value(result)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

#[derive(Debug, Deserialize)]
struct AccountResult {
    address: String,
}

#[derive(Debug, Deserialize)]
struct SmartQueryResponse {
    data: Value,
}

/// Chain client that delegates signing and broadcasting to a JSON-RPC relay.
///
/// Smart queries go straight to the LCD REST endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    relay_url: Url,
    lcd_url: Url,
}

impl JsonRpcChainClient {
    pub fn new(relay_url: Url, lcd_url: Url, timeout: Option<Duration>) -> anyhow::Result<Self> {
        Ok(Self {
            http: create_client(timeout)?,
            relay_url,
            lcd_url,
        })
    }

    /// Build the LCD smart query URL for a contract and a JSON query.
    fn smart_query_url(&self, contract: &str, msg: &Value) -> anyhow::Result<Url> {
        let encoded = STANDARD.encode(
            serde_json::to_vec(msg).context("Failed to serialize query message")?,
        );

        let mut url = self.lcd_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("LCD URL cannot be a base: {}", self.lcd_url))?
            .pop_if_empty()
            .extend(["cosmwasm", "wasm", "v1", "contract", contract, "smart", &encoded]);
        Ok(url)
    }
}

/// Build the `wasm_execute` params. The `funds` key is omitted entirely when there are no funds.
fn execute_params(
    sender: &str,
    contract: &str,
    msg: &Value,
    fee: &Fee,
    memo: &str,
    funds: Option<&[Coin]>,
) -> anyhow::Result<Value> {
    let mut params = Map::new();
    params.insert("sender".into(), json!(sender));
    params.insert("contract".into(), json!(contract));
    params.insert("msg".into(), msg.clone());
    params.insert("fee".into(), serde_json::to_value(fee)?);
    params.insert("memo".into(), json!(memo));
    if let Some(funds) = funds {
        params.insert("funds".into(), serde_json::to_value(funds)?);
    }
    Ok(Value::Object(params))
}

impl ChainClient for JsonRpcChainClient {
    async fn signer_address(&self) -> anyhow::Result<String> {
        let account: AccountResult =
            json_rpc_call(&self.http, &self.relay_url, "account", json!({})).await?;
        Ok(account.address)
    }

    async fn upload(
        &self,
        sender: &str,
        wasm: &[u8],
        fee: &Fee,
        memo: &str,
    ) -> anyhow::Result<UploadResponse> {
        json_rpc_call(
            &self.http,
            &self.relay_url,
            "wasm_upload",
            json!({
                "sender": sender,
                "wasm": STANDARD.encode(wasm),
                "fee": fee,
                "memo": memo,
            }),
        )
        .await
    }

    async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        msg: &Value,
        label: &str,
        fee: &Fee,
        admin: Option<&str>,
    ) -> anyhow::Result<InstantiateResponse> {
        let mut params = json!({
            "sender": sender,
            "codeId": code_id,
            "msg": msg,
            "label": label,
            "fee": fee,
        });
        if let Some(admin) = admin {
            params["admin"] = json!(admin);
        }

        json_rpc_call(&self.http, &self.relay_url, "wasm_instantiate", params).await
    }

    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &Fee,
        memo: &str,
        funds: Option<&[Coin]>,
    ) -> anyhow::Result<ExecuteResponse> {
        let params = execute_params(sender, contract, msg, fee, memo, funds)?;
        json_rpc_call(&self.http, &self.relay_url, "wasm_execute", params).await
    }

    async fn query_contract_smart(&self, contract: &str, msg: &Value) -> anyhow::Result<Value> {
        let url = self.smart_query_url(contract, msg)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send smart query")?
            .error_for_status()
            .with_context(|| format!("Smart query to {} was rejected", contract))?;

        let body: SmartQueryResponse = response
            .json()
            .await
            .context("Failed to parse smart query response")?;

        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JsonRpcChainClient {
        JsonRpcChainClient::new(
            Url::parse("http://localhost:26658").unwrap(),
            Url::parse("https://lcd.example.com/").unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_rpc_result() {
        let account: AccountResult = decode_rpc_response(
            "account",
            json!({ "jsonrpc": "2.0", "id": 1, "result": { "address": "aura1signer" } }),
        )
        .unwrap();
        assert_eq!(account.address, "aura1signer");
    }

    #[test]
    fn test_decode_rpc_error_keeps_code_and_log() {
        let err = decode_rpc_response::<UploadResponse>(
            "wasm_upload",
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {
                    "code": -32000,
                    "message": "transaction failed",
                    "data": "out of gas in location: wasm contract"
                }
            }),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "wasm_upload rejected by the relay: RPC error -32000: transaction failed \
             (out of gas in location: wasm contract)"
        );
    }

    #[test]
    fn test_decode_rpc_response_without_result() {
        let err = decode_rpc_response::<Value>("account", json!({ "jsonrpc": "2.0", "id": 1 }))
            .unwrap_err();
        assert_eq!(err.to_string(), "No result in account response");
    }

    #[test]
    fn test_smart_query_url() {
        let url = client()
            .smart_query_url("aura1contract", &json!({ "owner": {} }))
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://lcd.example.com/cosmwasm/wasm/v1/contract/aura1contract/smart/eyJvd25lciI6e319"
        );
    }

    #[test]
    fn test_execute_params_without_funds_omit_the_key() {
        let params =
            execute_params("aura1sender", "aura1contract", &json!({ "withdraw": {} }), &Fee::Auto, "memo", None)
                .unwrap();

        assert!(params.get("funds").is_none());
        assert_eq!(params["fee"], json!("auto"));
    }

    #[test]
    fn test_execute_params_with_funds() {
        let funds = [Coin::new(5, "uaura")];
        let params = execute_params(
            "aura1sender",
            "aura1contract",
            &json!({ "withdraw": {} }),
            &Fee::Auto,
            "memo",
            Some(&funds),
        )
        .unwrap();

        assert_eq!(params["funds"], json!([{ "denom": "uaura", "amount": "5" }]));
    }
}
