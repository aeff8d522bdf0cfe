//! In-process wallet for tests.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use std::collections::HashMap;
use std::sync::Mutex;

use super::abi::ContractCall;
use super::provider::{ReceiptStatus, TxRequest, WalletError, WalletProvider};

pub struct MockWallet {
    pub accounts: Vec<Address>,
    pub chain_id: u64,
    reads: HashMap<(Address, Vec<u8>), Bytes>,
    estimate: Result<U256, WalletError>,
    send: Result<H256, WalletError>,
    receipts: Mutex<HashMap<H256, ReceiptStatus>>,
    sent: Mutex<Vec<TxRequest>>,
}

impl MockWallet {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self {
            accounts: vec![account],
            chain_id,
            reads: HashMap::new(),
            estimate: Ok(U256::from(100_000)),
            send: Ok(H256::from_low_u64_be(0xabc)),
            receipts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Answers `call` with a single uint256.
    pub fn with_uint(mut self, call: &ContractCall, value: U256) -> Self {
        let mut raw = [0u8; 32];
        value.to_big_endian(&mut raw);
        if let Ok(data) = call.encode() {
            self.reads.insert((call.to, data.to_vec()), Bytes::from(raw.to_vec()));
        }
        self
    }

    pub fn with_estimate(mut self, estimate: Result<U256, WalletError>) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn with_send(mut self, send: Result<H256, WalletError>) -> Self {
        self.send = send;
        self
    }

    pub fn settle(&self, hash: H256, status: ReceiptStatus) {
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.insert(hash, status);
        }
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.chain_id)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        self.reads
            .get(&(to, data.to_vec()))
            .cloned()
            .ok_or_else(|| WalletError::new(-32000, "execution reverted"))
    }

    async fn estimate_gas(&self, _tx: &TxRequest) -> Result<U256, WalletError> {
        self.estimate.clone()
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<H256, WalletError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(tx.clone());
        }
        self.send.clone()
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<Option<ReceiptStatus>, WalletError> {
        Ok(self.receipts.lock().ok().and_then(|r| r.get(&hash).copied()))
    }

    fn signature(&self) -> &'static str {
        "Mock wallet"
    }
}
