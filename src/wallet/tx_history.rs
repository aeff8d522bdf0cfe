use chrono::{DateTime, Utc};
use ethers::types::H256;
use futures::future::join_all;
use poll_promise::Promise;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

use super::provider::{ReceiptStatus, WalletProvider};
use crate::config::CONTRACTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Reverted,
}

impl TxStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TxStatus::Pending => "Pending",
            TxStatus::Confirmed => "Confirmed",
            TxStatus::Reverted => "Reverted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    pub hash: H256,
    pub summary: String,
    pub status: TxStatus,
    pub submitted_at: DateTime<Utc>,
}

type ReceiptBatch = Vec<(H256, Option<ReceiptStatus>)>;

/// Submitted transactions of this session, newest first.
pub struct TxHistory {
    records: Vec<TxRecord>,
    poll: Option<Promise<ReceiptBatch>>,
    last_poll: Option<Instant>,
    interval: Duration,
}

impl Default for TxHistory {
    fn default() -> Self {
        Self::new(Duration::from_millis(CONTRACTS.receipt_poll_interval_ms))
    }
}

impl TxHistory {
    pub fn new(interval: Duration) -> Self {
        Self {
            records: Vec::new(),
            poll: None,
            last_poll: None,
            interval,
        }
    }

    pub fn register(&mut self, hash: H256, summary: impl Into<String>) {
        if self.records.iter().any(|r| r.hash == hash) {
            return;
        }
        let summary = summary.into();
        log::info!("Submitted {} ({:?})", summary, hash);
        self.records.insert(
            0,
            TxRecord {
                hash,
                summary,
                status: TxStatus::Pending,
                submitted_at: Utc::now(),
            },
        );
    }

    pub fn records(&self) -> &[TxRecord] {
        &self.records
    }

    pub fn pending(&self) -> Vec<H256> {
        self.records
            .iter()
            .filter(|r| r.status == TxStatus::Pending)
            .map(|r| r.hash)
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.records.iter().any(|r| r.status == TxStatus::Pending)
    }

    /// Applies fetched receipts and returns the entries that just settled.
    pub fn apply_receipts(&mut self, receipts: &[(H256, Option<ReceiptStatus>)]) -> Vec<(H256, TxStatus)> {
        let mut settled = Vec::new();
        for (hash, receipt) in receipts {
            let Some(receipt) = receipt else { continue };
            let Some(record) = self
                .records
                .iter_mut()
                .find(|r| r.hash == *hash && r.status == TxStatus::Pending)
            else {
                continue;
            };
            record.status = match receipt {
                ReceiptStatus::Success => TxStatus::Confirmed,
                ReceiptStatus::Reverted => TxStatus::Reverted,
            };
            match record.status {
                TxStatus::Reverted => log::warn!("{} reverted ({:?})", record.summary, hash),
                _ => log::info!("{} confirmed ({:?})", record.summary, hash),
            }
            settled.push((*hash, record.status));
        }
        settled
    }

    /// Call once per frame. Collects a finished receipt batch and starts a
    /// new one when the interval has elapsed and something is pending.
    pub fn poll_receipts(&mut self, wallet: &Arc<dyn WalletProvider>, now: Instant) -> Vec<(H256, TxStatus)> {
        if let Some(promise) = self.poll.take() {
            return match promise.try_take() {
                Ok(batch) => self.apply_receipts(&batch),
                Err(promise) => {
                    self.poll = Some(promise);
                    Vec::new()
                }
            };
        }

        let due = self
            .last_poll
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        let pending = self.pending();
        if !due || pending.is_empty() {
            return Vec::new();
        }

        self.last_poll = Some(now);
        let wallet = Arc::clone(wallet);
        self.poll = Some(Promise::spawn_async(fetch_receipts(wallet, pending)));
        Vec::new()
    }
}

async fn fetch_receipts(wallet: Arc<dyn WalletProvider>, hashes: Vec<H256>) -> ReceiptBatch {
    let lookups = hashes.iter().map(|hash| {
        let wallet = Arc::clone(&wallet);
        let hash = *hash;
        async move {
            match wallet.transaction_receipt(hash).await {
                Ok(status) => (hash, status),
                Err(e) => {
                    log::warn!("Receipt lookup for {:?} failed: {}", hash, e);
                    (hash, None)
                }
            }
        }
    });
    let batch = join_all(lookups).await;

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_receipt_polls {
        log::info!("[wallet] receipt poll: {:?}", batch);
    }

    batch
}
