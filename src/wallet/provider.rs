use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, TransactionRequest, U256};
use std::fmt;

use crate::config::CONTRACTS;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// Failure reported by the wallet / node, with the JSON-RPC code when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletError {
    pub code: Option<i64>,
    pub message: String,
}

impl WalletError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(CONTRACTS.user_rejected_code)
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for WalletError {}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        match e.as_error_response() {
            Some(rpc) => WalletError::new(rpc.code, rpc.message.clone()),
            None => WalletError::other(e.to_string()),
        }
    }
}

/// Transaction the wallet is asked to sign and send.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas: Option<U256>,
}

impl TxRequest {
    fn to_request(&self) -> TransactionRequest {
        let request = TransactionRequest::new()
            .from(self.from)
            .to(self.to)
            .data(self.data.clone());
        match self.gas {
            Some(gas) => request.gas(gas),
            None => request,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// The connected wallet: account access, reads, gas estimation, signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError>;

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<U256, WalletError>;

    async fn send_transaction(&self, tx: &TxRequest) -> Result<H256, WalletError>;

    /// `None` while the transaction is still pending.
    async fn transaction_receipt(&self, hash: H256) -> Result<Option<ReceiptStatus>, WalletError>;

    fn signature(&self) -> &'static str;
}

/// A JSON-RPC endpoint that holds (or proxies) unlocked accounts.
pub struct RpcWallet {
    provider: Provider<Http>,
    url: String,
}

impl RpcWallet {
    pub fn new(url: &str) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(url).with_context(|| format!("invalid RPC url {}", url))?;
        Ok(Self {
            provider,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        match self
            .provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(WalletError::from)
        {
            // Plain nodes only know eth_accounts
            Err(e) if e.code == Some(METHOD_NOT_FOUND) => {
                Ok(self.provider.get_accounts().await?)
            }
            other => other,
        }
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.provider.get_chainid().await?.as_u64())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        Ok(self.provider.call(&tx, None).await?)
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<U256, WalletError> {
        let typed: TypedTransaction = tx.to_request().into();
        Ok(self.provider.estimate_gas(&typed, None).await?)
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<H256, WalletError> {
        Ok(self
            .provider
            .request::<_, H256>("eth_sendTransaction", [tx.to_request()])
            .await?)
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<Option<ReceiptStatus>, WalletError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|r| match r.status.map(|s| s.as_u64()) {
            Some(0) => ReceiptStatus::Reverted,
            _ => ReceiptStatus::Success,
        }))
    }

    fn signature(&self) -> &'static str {
        "JSON-RPC wallet"
    }
}
