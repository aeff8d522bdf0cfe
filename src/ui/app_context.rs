//! Application-wide state, created once at the root and changed only through
//! its methods: the gateway, the wallet and its connection, the latest
//! on-chain snapshot and the transaction history.

use anyhow::Result;
use ethers::types::{Address, H256};
use poll_promise::Promise;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{CONTRACTS, GATEWAY};
use crate::gateway::{ChainContext, ComputationGateway};
use crate::wallet::{
    ActionContext, ActionEvent, AddressBook, ChainAddresses, TxHistory, TxStatus, WalletError, WalletProvider,
    WalletSnapshot, read_snapshot,
};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

/// Wallet connection as the UI sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Disconnected,
    Connecting,
    Connected { account: Address, chain_id: u64 },
}

/// Errors shown in the status bar.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Connecting failed for a reason other than the user declining
    WalletConnect(String),
    /// Balance / key reads failed; the last good snapshot stays on screen
    SnapshotRead(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::WalletConnect(msg) => write!(f, "Wallet connection failed: {}", msg),
            AppError::SnapshotRead(msg) => write!(f, "Could not read balances: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

type ConnectResult = Result<(Address, u64), WalletError>;
type SnapshotResult = (Address, Result<WalletSnapshot>);

pub struct AppContext {
    gateway: Arc<dyn ComputationGateway>,
    gateway_label: String,
    wallet: Arc<dyn WalletProvider>,
    wallet_label: String,
    address_book: AddressBook,
    analytics_chain_id: u64,

    connection: Connection,
    addresses: Option<ChainAddresses>,
    connect_promise: Option<Promise<ConnectResult>>,

    snapshot: WalletSnapshot,
    snapshot_promise: Option<Promise<SnapshotResult>>,
    last_snapshot: Option<Instant>,
    snapshot_interval: Duration,

    tx_history: TxHistory,
    last_error: Option<AppError>,
}

/// What changed during one [`AppContext::poll`].
#[derive(Debug, Default)]
pub struct ContextUpdate {
    /// Transactions that got a receipt this frame
    pub settled: Vec<(H256, TxStatus)>,
    pub snapshot_changed: bool,
    pub connection_changed: bool,
}

impl AppContext {
    pub fn new(
        gateway: Arc<dyn ComputationGateway>,
        wallet: Arc<dyn WalletProvider>,
        address_book: AddressBook,
        analytics_chain_id: u64,
    ) -> Self {
        Self {
            gateway,
            gateway_label: GATEWAY.url.to_string(),
            wallet,
            wallet_label: String::new(),
            address_book,
            analytics_chain_id,
            connection: Connection::Disconnected,
            addresses: None,
            connect_promise: None,
            snapshot: WalletSnapshot::default(),
            snapshot_promise: None,
            last_snapshot: None,
            snapshot_interval: Duration::from_millis(CONTRACTS.balance_refresh_interval_ms),
            tx_history: TxHistory::default(),
            last_error: None,
        }
    }

    /// Labels for the status bar (endpoint urls).
    pub fn with_labels(mut self, gateway: impl Into<String>, wallet: impl Into<String>) -> Self {
        self.gateway_label = gateway.into();
        self.wallet_label = wallet.into();
        self
    }

    pub fn gateway(&self) -> &Arc<dyn ComputationGateway> {
        &self.gateway
    }

    pub fn gateway_label(&self) -> &str {
        &self.gateway_label
    }

    pub fn wallet(&self) -> &Arc<dyn WalletProvider> {
        &self.wallet
    }

    pub fn wallet_label(&self) -> &str {
        &self.wallet_label
    }

    /// Chain the analytics run against (latest block).
    pub fn chain_context(&self) -> ChainContext {
        ChainContext::latest(self.analytics_chain_id)
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn account(&self) -> Option<Address> {
        match self.connection {
            Connection::Connected { account, .. } => Some(account),
            _ => None,
        }
    }

    pub fn wallet_chain_id(&self) -> Option<u64> {
        match self.connection {
            Connection::Connected { chain_id, .. } => Some(chain_id),
            _ => None,
        }
    }

    /// `false` while connected to a chain the address book does not cover.
    pub fn is_supported_network(&self) -> bool {
        self.addresses.is_some()
    }

    pub fn addresses(&self) -> Option<&ChainAddresses> {
        self.addresses.as_ref()
    }

    pub fn snapshot(&self) -> &WalletSnapshot {
        &self.snapshot
    }

    pub fn tx_history(&self) -> &TxHistory {
        &self.tx_history
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    /// What every wallet action validates against this frame.
    pub fn action_context(&self) -> ActionContext<'_> {
        ActionContext {
            account: self.account(),
            addresses: self.addresses.as_ref(),
            balances: &self.snapshot.balances,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.connect_promise.is_some() || self.snapshot_promise.is_some() || self.tx_history.has_pending()
    }

    pub fn connect(&mut self) {
        if self.connect_promise.is_some() {
            return;
        }
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_ui_interactions {
            log::info!("Connecting via {}", self.wallet.signature());
        }

        self.connection = Connection::Connecting;
        let wallet = Arc::clone(&self.wallet);
        self.connect_promise = Some(Promise::spawn_async(async move {
            let accounts = wallet.request_accounts().await?;
            let account = accounts
                .first()
                .copied()
                .ok_or_else(|| WalletError::other("wallet returned no accounts"))?;
            let chain_id = wallet.chain_id().await?;
            Ok((account, chain_id))
        }));
    }

    /// Forgets the account. Pending transactions stay in the history.
    pub fn disconnect(&mut self) {
        self.connect_promise = None;
        self.snapshot_promise = None;
        self.connection = Connection::Disconnected;
        self.addresses = None;
        self.snapshot = WalletSnapshot::default();
        self.last_snapshot = None;
    }

    /// Starts a snapshot read unless one is running or there is nothing to read.
    pub fn refresh_snapshot(&mut self) {
        if self.snapshot_promise.is_some() {
            return;
        }
        let (Some(owner), Some(addresses)) = (self.account(), self.addresses.clone()) else {
            return;
        };
        let wallet = Arc::clone(&self.wallet);
        self.last_snapshot = Some(Instant::now());
        self.snapshot_promise = Some(Promise::spawn_async(async move {
            let result = read_snapshot(wallet.as_ref(), &addresses, owner).await;
            (owner, result)
        }));
    }

    /// Routes what a finished action asks for.
    pub fn apply_action_event(&mut self, event: ActionEvent) {
        if let ActionEvent::Submitted { hash, summary } = event {
            self.tx_history.register(hash, summary);
        }
    }

    /// Call once per frame before rendering.
    pub fn poll(&mut self, now: Instant) -> ContextUpdate {
        let mut update = ContextUpdate {
            connection_changed: self.poll_connect(),
            ..ContextUpdate::default()
        };
        update.snapshot_changed = self.poll_snapshot();

        let wallet = Arc::clone(&self.wallet);
        update.settled = self.tx_history.poll_receipts(&wallet, now);
        if !update.settled.is_empty() {
            // Balances and allowances moved
            self.snapshot_promise = None;
            self.refresh_snapshot();
        }

        let due = self
            .last_snapshot
            .is_some_and(|last| now.duration_since(last) >= self.snapshot_interval);
        if due {
            self.refresh_snapshot();
        }
        update
    }

    fn poll_connect(&mut self) -> bool {
        let Some(promise) = self.connect_promise.take() else {
            return false;
        };
        let result = match promise.try_take() {
            Ok(result) => result,
            Err(promise) => {
                self.connect_promise = Some(promise);
                return false;
            }
        };

        match result {
            Ok((account, chain_id)) => {
                log::info!("Connected {:?} on chain {}", account, chain_id);
                self.connection = Connection::Connected { account, chain_id };
                self.addresses = self.address_book.chain(chain_id);
                if self.addresses.is_none() {
                    log::warn!(
                        "Chain {} has no complete address book entry (supported: {:?})",
                        chain_id,
                        self.address_book.supported_chains()
                    );
                }
                self.snapshot = WalletSnapshot::default();
                self.last_error = None;
                self.refresh_snapshot();
            }
            Err(e) if e.is_user_rejection() => {
                self.connection = Connection::Disconnected;
            }
            Err(e) => {
                log::error!("Wallet connection failed: {}", e);
                self.connection = Connection::Disconnected;
                self.last_error = Some(AppError::WalletConnect(e.to_string()));
            }
        }
        true
    }

    fn poll_snapshot(&mut self) -> bool {
        let Some(promise) = self.snapshot_promise.take() else {
            return false;
        };
        let (owner, result) = match promise.try_take() {
            Ok(done) => done,
            Err(promise) => {
                self.snapshot_promise = Some(promise);
                return false;
            }
        };

        // The account may have changed while the read was running
        if self.account() != Some(owner) {
            return false;
        }

        match result {
            Ok(snapshot) => {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_wallet_reads {
                    log::info!(
                        "Snapshot: {} CMK / {} xCMK / {} USDC, {} keys",
                        snapshot.balances.cmk,
                        snapshot.balances.xcmk,
                        snapshot.balances.usdc,
                        snapshot.access_keys.len()
                    );
                }
                self.snapshot = snapshot;
                if matches!(self.last_error, Some(AppError::SnapshotRead(_))) {
                    self.last_error = None;
                }
                true
            }
            Err(e) => {
                log::warn!("Snapshot read failed: {:#}", e);
                self.last_error = Some(AppError::SnapshotRead(format!("{:#}", e)));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::wallet::reads::tests::sample_addresses;
    use crate::wallet::testing::MockWallet;
    use crate::wallet::{ContractCall, ContractKind, ReceiptStatus};
    use ethers::types::U256;

    fn owner() -> Address {
        Address::from_low_u64_be(0xaa)
    }

    fn book_for(chain_id: u64) -> AddressBook {
        let a = sample_addresses();
        let mut book = AddressBook::default();
        let json = format!(
            r#"{{"{}": {{"cmk": "{:?}", "xcmk": "{:?}", "usdc": "{:?}", "access_key": "{:?}", "access_factory": "{:?}"}}}}"#,
            chain_id, a.cmk, a.xcmk, a.usdc, a.access_key, a.access_factory
        );
        book.apply_overrides(&json).expect("overrides");
        book
    }

    async fn pump(ctx: &mut AppContext, until: impl Fn(&AppContext) -> bool) {
        for _ in 0..300 {
            ctx.poll(Instant::now());
            if until(ctx) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("condition never reached");
    }

    fn context(wallet: MockWallet, book: AddressBook) -> (AppContext, Arc<MockWallet>) {
        let wallet = Arc::new(wallet);
        let ctx = AppContext::new(Arc::new(ScriptedGateway::new()), wallet.clone(), book, 1);
        (ctx, wallet)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn connect_on_unsupported_chain_blocks_actions() {
        let (mut ctx, _) = context(MockWallet::new(owner(), 5), book_for(1));
        ctx.connect();
        assert_eq!(ctx.connection(), Connection::Connecting);
        pump(&mut ctx, |c| matches!(c.connection(), Connection::Connected { .. })).await;

        assert_eq!(ctx.wallet_chain_id(), Some(5));
        assert!(!ctx.is_supported_network());
        let action_ctx = ctx.action_context();
        assert_eq!(action_ctx.account, Some(owner()));
        assert!(action_ctx.addresses.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn connect_reads_the_snapshot() {
        let a = sample_addresses();
        let mut wallet = MockWallet::new(owner(), 1)
            .with_uint(&ContractCall::balance_of(a.cmk, ContractKind::Erc20, owner()), U256::from(100))
            .with_uint(&ContractCall::balance_of(a.xcmk, ContractKind::Staking, owner()), U256::from(50))
            .with_uint(&ContractCall::balance_of(a.usdc, ContractKind::Erc20, owner()), U256::from(7))
            .with_uint(&ContractCall::balance_of(a.access_key, ContractKind::AccessKey, owner()), U256::zero())
            .with_uint(&ContractCall::total_supply(a.xcmk, ContractKind::Staking), U256::from(1_000))
            .with_uint(&ContractCall::shares_to_cmk(a.xcmk, U256::exp10(18)), U256::exp10(18))
            .with_uint(&ContractCall::cmk_to_shares(a.xcmk, U256::exp10(18)), U256::exp10(18));
        for asset in [crate::domain::Asset::Cmk, crate::domain::Asset::Xcmk, crate::domain::Asset::Usdc] {
            wallet = wallet.with_uint(&ContractCall::per_sec(a.access_factory, asset), U256::from(1));
        }
        for (token, spender) in [
            (a.cmk, a.xcmk),
            (a.cmk, a.access_key),
            (a.cmk, a.access_factory),
            (a.xcmk, a.access_factory),
            (a.usdc, a.access_factory),
        ] {
            wallet = wallet.with_uint(&ContractCall::allowance(token, owner(), spender), U256::zero());
        }

        let (mut ctx, _) = context(wallet, book_for(1));
        ctx.connect();
        pump(&mut ctx, |c| c.snapshot().balances.cmk == U256::from(100)).await;

        assert_eq!(ctx.snapshot().balances.xcmk, U256::from(50));
        assert!(ctx.last_error().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_reads_keep_the_previous_snapshot() {
        let (mut ctx, _) = context(MockWallet::new(owner(), 1), book_for(1));
        ctx.connect();
        pump(&mut ctx, |c| c.last_error().is_some()).await;

        assert!(matches!(ctx.last_error(), Some(AppError::SnapshotRead(_))));
        assert_eq!(ctx.snapshot(), &WalletSnapshot::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn submitted_actions_are_tracked_until_mined() {
        let (mut ctx, wallet) = context(MockWallet::new(owner(), 1), AddressBook::default());
        let hash = H256::from_low_u64_be(0xabc);
        ctx.apply_action_event(ActionEvent::Submitted {
            hash,
            summary: "Stake 1 CMK".to_string(),
        });
        ctx.apply_action_event(ActionEvent::Ignored);
        assert_eq!(ctx.tx_history().records().len(), 1);
        assert!(ctx.is_busy());

        wallet.settle(hash, ReceiptStatus::Success);
        pump(&mut ctx, |c| !c.tx_history().has_pending()).await;
        assert_eq!(ctx.tx_history().records()[0].status, TxStatus::Confirmed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn empty_account_list_is_a_connection_error() {
        let mut wallet = MockWallet::new(owner(), 1);
        wallet.accounts.clear();
        let (mut ctx, _) = context(wallet, book_for(1));
        ctx.connect();
        pump(&mut ctx, |c| c.connection() == Connection::Disconnected).await;
        assert!(matches!(ctx.last_error(), Some(AppError::WalletConnect(_))));
    }
}
