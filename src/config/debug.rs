//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet. Most call sites are further gated by `cfg(debug_assertions)`.

pub struct DebugFlags {
    /// Emit UI interaction logs (e.g., page switching, tab changes, window selection).
    pub print_ui_interactions: bool,
    /// Emit one line per gateway request issued / superseded / completed.
    pub print_gateway_calls: bool,
    /// Dump the full JSON body sent to the gateway.
    pub print_gateway_bodies: bool,
    /// Emit wallet reads (balances, allowances, access keys) as they land.
    pub print_wallet_reads: bool,
    /// Emit receipt polling results for pending transactions.
    pub print_receipt_polls: bool,
    /// Emit details of UI state serialization/deserialization logs.
    pub print_state_serde: bool,
    /// Emit shutdown app messages.
    pub print_shutdown: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_ui_interactions: true,
    print_gateway_calls: true,
    print_gateway_bodies: false,
    print_wallet_reads: false,
    print_receipt_polls: false,
    print_state_serde: false,
    print_shutdown: false,
};
