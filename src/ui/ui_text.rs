//! User-facing strings, in one place.

pub struct UiText {
    pub app_title: &'static str,
    pub nav_heading: &'static str,

    // Pages
    pub page_analytics_heading: &'static str,
    pub page_lending_heading: &'static str,
    pub page_staking_heading: &'static str,
    pub page_access_keys_heading: &'static str,
    pub page_tiers_heading: &'static str,

    // Calls
    pub loading: &'static str,
    pub error_heading: &'static str,
    pub error_code_prefix: &'static str,
    pub error_stack: &'static str,
    pub no_data: &'static str,
    pub refresh: &'static str,

    // Charts
    pub chart_latest: &'static str,
    pub chart_change: &'static str,
    pub history_heading: &'static str,
    pub history_date: &'static str,
    pub history_value: &'static str,
    pub history_errors_suffix: &'static str,

    // Wallet
    pub connect_wallet: &'static str,
    pub connecting: &'static str,
    pub disconnect: &'static str,
    pub wallet_window_title: &'static str,
    pub wallet_account: &'static str,
    pub wallet_network: &'static str,
    pub wallet_unsupported: &'static str,
    pub balances_heading: &'static str,
    pub tx_heading: &'static str,
    pub tx_empty: &'static str,
    pub max_button: &'static str,

    // Staking
    pub stake_heading: &'static str,
    pub unstake_heading: &'static str,
    pub staking_pool_heading: &'static str,
    pub staking_total_shares: &'static str,
    pub staking_cmk_per_share: &'static str,
    pub staking_shares_per_cmk: &'static str,

    // Access keys
    pub mint_heading: &'static str,
    pub keys_heading: &'static str,
    pub keys_empty: &'static str,
    pub key_deposit: &'static str,
    pub key_fees: &'static str,
    pub key_net: &'static str,
    pub extend_days: &'static str,
    pub extend_pay_with: &'static str,
    pub extend_cost: &'static str,

    // Tiers
    pub tiers_feature_column: &'static str,

    // Status bar
    pub status_gateway: &'static str,
    pub status_rpc: &'static str,
    pub status_loading: &'static str,
    pub status_pending_tx: &'static str,
}

pub const UI_TEXT: UiText = UiText {
    app_title: "Credmark Terminal",
    nav_heading: "Terminal",

    page_analytics_heading: "CMK Analytics",
    page_lending_heading: "Lending Risk",
    page_staking_heading: "Staking",
    page_access_keys_heading: "Access Keys",
    page_tiers_heading: "Tiers",

    loading: "Loading…",
    error_heading: "Model error",
    error_code_prefix: "Code",
    error_stack: "Stack",
    no_data: "No data for this window",
    refresh: "⟳ Refresh",

    chart_latest: "Latest",
    chart_change: "Change",
    history_heading: "History",
    history_date: "Date",
    history_value: "Value",
    history_errors_suffix: "samples failed",

    connect_wallet: "Connect wallet",
    connecting: "Connecting…",
    disconnect: "Disconnect",
    wallet_window_title: "Wallet",
    wallet_account: "Account",
    wallet_network: "Network",
    wallet_unsupported: "Unsupported network",
    balances_heading: "Balances",
    tx_heading: "Transactions",
    tx_empty: "No transactions this session",
    max_button: "Max",

    stake_heading: "Stake CMK",
    unstake_heading: "Unstake xCMK",
    staking_pool_heading: "Pool",
    staking_total_shares: "Total xCMK",
    staking_cmk_per_share: "CMK per xCMK",
    staking_shares_per_cmk: "xCMK per CMK",

    mint_heading: "Mint an access key",
    keys_heading: "Your keys",
    keys_empty: "No access keys held by this account",
    key_deposit: "Deposit",
    key_fees: "Fees",
    key_net: "Net",
    extend_days: "Days",
    extend_pay_with: "Pay with",
    extend_cost: "Cost",

    tiers_feature_column: "Feature",

    status_gateway: "Gateway",
    status_rpc: "RPC",
    status_loading: "⚙ Loading models…",
    status_pending_tx: "pending tx",
};
