//! alloy-backed JSON-RPC client.
//!
//! Reads go through `eth_call`; writes are signed locally by a
//! [`PrivateKeySigner`] bound to the configured chain id and broadcast with
//! `eth_sendRawTransaction`. Gas, nonce and fee fields are filled by the
//! provider's recommended fillers. Every request is bounded by
//! `request_timeout`; there is no retry at this layer.

use std::future::Future;
use std::time::Duration;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy_primitives::{Address, Bytes, TxHash};
use tracing::debug;

use crate::{ChainError, ChainReader, ChainWriter, Result};

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP JSON-RPC client for one chain.
#[derive(Clone)]
pub struct RpcClient {
    url: Url,
    chain_id: u64,
    signer: Option<PrivateKeySigner>,
    request_timeout: Duration,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url.as_str())
            .field("chain_id", &self.chain_id)
            .field("operator", &self.operator())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl RpcClient {
    /// Read-only client. Call [`with_signing_key`](Self::with_signing_key) before submitting.
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let url = rpc_url
            .parse::<Url>()
            .map_err(|e| ChainError::Config(format!("invalid RPC URL '{rpc_url}': {e}")))?;
        Ok(Self {
            url,
            chain_id,
            signer: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Attach the operator key, hex encoded with or without `0x`.
    pub fn with_signing_key(mut self, key_hex: &str) -> Result<Self> {
        let signer = key_hex
            .trim()
            .trim_start_matches("0x")
            .parse::<PrivateKeySigner>()
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        self.signer = Some(signer);
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address of the operator key, if one is configured.
    pub fn operator(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// A transactor for a single submission.
    fn transactor(&self) -> Result<EthereumWallet> {
        let signer = self.signer.clone().ok_or(ChainError::NoSigner)?;
        Ok(EthereumWallet::from(signer))
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| ChainError::Timeout(self.request_timeout))?
    }
}

#[async_trait::async_trait]
impl ChainReader for RpcClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let provider = ProviderBuilder::new().connect_http(self.url.clone());
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.with_deadline(async move {
            provider
                .call(tx)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }
}

#[async_trait::async_trait]
impl ChainWriter for RpcClient {
    async fn submit(&self, to: Address, data: Bytes) -> Result<TxHash> {
        let wallet = self.transactor()?;
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.url.clone());
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(data)
            .with_chain_id(self.chain_id);

        let tx_hash = self
            .with_deadline(async move {
                let pending = provider
                    .send_transaction(tx)
                    .await
                    .map_err(|e| ChainError::Rpc(e.to_string()))?;
                Ok(*pending.tx_hash())
            })
            .await?;
        debug!(%to, %tx_hash, chain_id = self.chain_id, "transaction broadcast");
        Ok(tx_hash)
    }
}
