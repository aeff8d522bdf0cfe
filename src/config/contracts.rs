//! On-chain configuration: built-in address table and transaction knobs.

/// Known deployments per chain. Anything left as `None` has to be supplied
/// through the `--contracts` JSON file before the matching flows unlock.
pub struct BuiltinChain {
    pub chain_id: u64,
    pub cmk: Option<&'static str>,
    pub xcmk: Option<&'static str>,
    pub usdc: Option<&'static str>,
    pub access_key: Option<&'static str>,
    pub access_factory: Option<&'static str>,
}

pub struct ContractsConfig {
    /// JSON-RPC endpoint of the signing wallet (a local node or wallet bridge)
    pub default_rpc_url: &'static str,
    /// Extra gas added on top of `eth_estimateGas`, in basis points (2000 = +20%)
    pub gas_margin_bps: u64,
    /// EIP-1193 "user rejected request"
    pub user_rejected_code: i64,
    /// How often pending transactions are checked for a receipt
    pub receipt_poll_interval_ms: u64,
    /// How often balances / allowances / keys are re-read while connected
    pub balance_refresh_interval_ms: u64,
    /// Smallest mint the access key contract accepts, in whole CMK
    pub min_mint_cmk: &'static str,
    /// Cap on `tokenOfOwnerByIndex` lookups per refresh
    pub max_access_keys_listed: usize,
    pub builtin: &'static [BuiltinChain],
}

pub const CONTRACTS: ContractsConfig = ContractsConfig {
    default_rpc_url: "http://127.0.0.1:8545",
    gas_margin_bps: 2_000,
    user_rejected_code: 4001,
    receipt_poll_interval_ms: 4_000,
    balance_refresh_interval_ms: 30_000,
    min_mint_cmk: "1",
    max_access_keys_listed: 20,
    builtin: &[BuiltinChain {
        chain_id: 1,
        cmk: Some("0x68CFb82Eacb9f198d508B514d898a403c449533E"),
        xcmk: None,
        usdc: Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        access_key: None,
        access_factory: None,
    }],
};
