//! Model gateway configuration

/// Defaults for the remote model-execution gateway.
/// Every field except `historical_slug` can be overridden from the command line.
pub struct GatewayConfig {
    /// Endpoint that accepts `POST {slug, chainId, blockNumber, version?, input}`
    pub url: &'static str,
    /// Wrapper model that fans a base model out over a time window
    pub historical_slug: &'static str,
    /// Chain the analytics are computed against
    pub default_chain_id: u64,
    /// Whole-request timeout. Historical runs are slow, so this is generous.
    pub timeout_ms: u64,
    /// What the user sees for any transport failure (the detail only goes to the log)
    pub transport_error_message: &'static str,
}

pub const GATEWAY: GatewayConfig = GatewayConfig {
    url: "https://gateway.credmark.com/v1/model/run",
    historical_slug: "historical.run-model",
    default_chain_id: 1,
    timeout_ms: 60_000,
    transport_error_message: "Unable to reach the analytics gateway",
};
