//! Wallet that is driven over JSON-RPC.
//!
//! Desktop wallets and signer proxies expose the same request surface a
//! browser wallet injects into a page (`eth_requestAccounts`,
//! `wallet_switchEthereumChain`, ...). [`RemoteWallet`] forwards those
//! requests over HTTP and leaves account selection, chain management and
//! signing to the wallet.

use crate::{ClientError, Wallet};
use alloy_primitives::{Address, Bytes, U64};
use alloy_rpc_types::eth::TransactionRequest;
use config::ChainConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::debug;

/// A wallet reachable through a JSON-RPC endpoint.
///
/// # Example
///
/// ```ignore
/// let wallet = RemoteWallet::new("http://127.0.0.1:1248");
/// let accounts = wallet.request_accounts().await?;
/// ```
#[derive(Debug, Clone)]
pub struct RemoteWallet {
    client: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RemoteWallet {
    /// Creates a new remote wallet.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Creates a new remote wallet with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Wallet endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a single JSON-RPC request and decode its result.
    pub async fn request<T>(&self, method: &'static str, params: Value) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        debug!(method, id, url = %self.url, "Wallet request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ClientError::Connection(format!(
                "wallet returned {status}: {body}"
            )));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Other(format!("malformed wallet response: {e}")))?;

        if let Some(error) = rpc_response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(rpc_response.result.unwrap_or(Value::Null))
            .map_err(|e| ClientError::Other(format!("unexpected {method} result: {e}")))
    }
}

impl Wallet for RemoteWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.request("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn net_version(&self) -> Result<String, ClientError> {
        self.request("net_version", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(chain_id.to())
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ClientError> {
        let _: Value = self
            .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await?;
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), ClientError> {
        let params = AddChainParams::from(chain);
        let _: Value = self
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, ClientError> {
        let signed: SignedTransaction = self.request("eth_signTransaction", json!([tx])).await?;
        Ok(signed.into_raw())
    }
}

/// `wallet_addEthereumChain` parameter object (EIP-3085).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParams<'a> {
    chain_id: String,
    chain_name: &'a str,
    native_currency: &'a config::NativeCurrency,
    rpc_urls: &'a [String],
    block_explorer_urls: &'a [String],
}

impl<'a> From<&'a ChainConfig> for AddChainParams<'a> {
    fn from(chain: &'a ChainConfig) -> Self {
        Self {
            chain_id: chain.hex_chain_id(),
            chain_name: &chain.chain_name,
            native_currency: &chain.native_currency,
            rpc_urls: &chain.rpc_urls,
            block_explorer_urls: &chain.block_explorer_urls,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `eth_signTransaction` result: geth-style `{raw, tx}` or a bare hex string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignedTransaction {
    Envelope { raw: Bytes },
    Raw(Bytes),
}

impl SignedTransaction {
    fn into_raw(self) -> Bytes {
        match self {
            Self::Envelope { raw } | Self::Raw(raw) => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Serve one canned JSON-RPC response per connection, returning the request bodies.
    async fn serve(responses: Vec<Value>) -> (String, JoinHandle<Vec<Value>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let body = read_request_body(&mut socket).await;
                requests.push(serde_json::from_slice(&body).unwrap());

                let payload = response.to_string();
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        (url, handle)
    }

    async fn read_request_body(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length: usize = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse().unwrap())
                    .unwrap_or(0);
                let body_start = end + 4;
                while buf.len() < body_start + length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                }
                return buf[body_start..body_start + length].to_vec();
            }
            assert!(n > 0, "connection closed before headers");
        }
    }

    #[tokio::test]
    async fn test_request_accounts() {
        let (url, server) = serve(vec![json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": ["0x87028e52304a3d58d6d48dc5a864815ab70fb6f5"]
        })])
        .await;

        let wallet = RemoteWallet::new(url);
        let accounts = wallet.request_accounts().await.unwrap();
        assert_eq!(
            accounts,
            vec![address!("87028e52304A3d58D6d48DC5a864815Ab70fB6F5")]
        );

        let requests = server.await.unwrap();
        assert_eq!(requests[0]["method"], "eth_requestAccounts");
        assert_eq!(requests[0]["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn test_network_queries() {
        let (url, server) = serve(vec![
            json!({ "jsonrpc": "2.0", "id": 1, "result": "11155111" }),
            json!({ "jsonrpc": "2.0", "id": 2, "result": "0xaa36a7" }),
        ])
        .await;

        let wallet = RemoteWallet::new(url);
        assert_eq!(wallet.net_version().await.unwrap(), "11155111");
        assert_eq!(wallet.chain_id().await.unwrap(), 11155111);

        let requests = server.await.unwrap();
        assert_eq!(requests[0]["method"], "net_version");
        assert_eq!(requests[1]["method"], "eth_chainId");
        assert_ne!(requests[0]["id"], requests[1]["id"]);
    }

    #[tokio::test]
    async fn test_switch_chain_unrecognized() {
        let (url, server) = serve(vec![json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4902, "message": "Unrecognized chain ID \"0xaa36a7\"." }
        })])
        .await;

        let wallet = RemoteWallet::new(url);
        let err = wallet.switch_chain("0xaa36a7").await.unwrap_err();
        assert!(err.is_unrecognized_chain());

        let requests = server.await.unwrap();
        assert_eq!(requests[0]["method"], "wallet_switchEthereumChain");
        assert_eq!(requests[0]["params"][0]["chainId"], "0xaa36a7");
    }

    #[tokio::test]
    async fn test_add_chain_params() {
        let (url, server) =
            serve(vec![json!({ "jsonrpc": "2.0", "id": 1, "result": null })]).await;

        let wallet = RemoteWallet::new(url);
        wallet.add_chain(&ChainConfig::sepolia()).await.unwrap();

        let requests = server.await.unwrap();
        let params = &requests[0]["params"][0];
        assert_eq!(requests[0]["method"], "wallet_addEthereumChain");
        assert_eq!(params["chainId"], "0xaa36a7");
        assert_eq!(params["chainName"], "Sepolia");
        assert_eq!(params["nativeCurrency"]["symbol"], "SEPOLIA");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(
            params["rpcUrls"][0],
            "https://ethereum-sepolia.publicnode.com"
        );
        assert_eq!(params["blockExplorerUrls"][0], "https://sepolia.etherscan.io");
    }

    #[tokio::test]
    async fn test_sign_transaction_result_shapes() {
        let (url, _server) = serve(vec![
            json!({ "jsonrpc": "2.0", "id": 1, "result": { "raw": "0x02f8", "tx": {} } }),
            json!({ "jsonrpc": "2.0", "id": 2, "result": "0x02f9" }),
        ])
        .await;

        let wallet = RemoteWallet::new(url);
        let tx = TransactionRequest::default();

        let raw = wallet.sign_transaction(tx.clone()).await.unwrap();
        assert_eq!(raw, Bytes::from(vec![0x02, 0xf8]));

        let raw = wallet.sign_transaction(tx).await.unwrap();
        assert_eq!(raw, Bytes::from(vec![0x02, 0xf9]));
    }

    #[tokio::test]
    async fn test_unreachable_wallet() {
        let wallet = RemoteWallet::new("http://127.0.0.1:1");
        let err = wallet.accounts().await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
    }
}
