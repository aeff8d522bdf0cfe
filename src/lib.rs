#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod config;
pub mod domain;
pub mod gateway;
pub mod ui;
pub mod utils;
pub mod wallet;

// Re-export commonly used types
pub use gateway::{ComputationGateway, HttpGateway};
pub use ui::{AppContext, TerminalApp};
pub use wallet::{AddressBook, RpcWallet, WalletProvider};

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CONTRACTS, GATEWAY};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Model gateway endpoint
    #[arg(long, default_value = GATEWAY.url)]
    pub gateway_url: String,

    /// JSON-RPC endpoint used for wallet reads and transactions
    #[arg(long, default_value = CONTRACTS.default_rpc_url)]
    pub rpc_url: String,

    /// Chain the analytics are computed against
    #[arg(long, default_value_t = GATEWAY.default_chain_id)]
    pub chain_id: u64,

    /// JSON file with contract addresses per chain, merged over the built-ins
    #[arg(long)]
    pub contracts: Option<PathBuf>,
}

/// Builds the application context from the command line: gateway client,
/// wallet provider and address book. Must run inside the tokio runtime.
pub fn build_context(args: &Cli) -> Result<AppContext> {
    let gateway = HttpGateway::new(args.gateway_url.clone(), Duration::from_millis(GATEWAY.timeout_ms))
        .context("failed to build the gateway client")?;
    let wallet = RpcWallet::new(&args.rpc_url)?;

    let address_book = match &args.contracts {
        Some(path) => AddressBook::with_overrides_file(path)?,
        None => AddressBook::builtin().context("built-in address table is invalid")?,
    };
    log::info!(
        "Gateway {} | RPC {} | chains with full address book: {:?}",
        gateway.url(),
        wallet.url(),
        address_book.supported_chains()
    );

    let (gateway_label, wallet_label) = (gateway.url().to_string(), wallet.url().to_string());
    let gateway: Arc<dyn ComputationGateway> = Arc::new(gateway);
    let wallet: Arc<dyn WalletProvider> = Arc::new(wallet);
    Ok(AppContext::new(gateway, wallet, address_book, args.chain_id).with_labels(gateway_label, wallet_label))
}

/// Logger with `default` as the base level; a filter in `env` (normally
/// `RUST_LOG`) takes precedence.
pub fn log_builder(default: log::LevelFilter, env: env_logger::Env) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default);
    builder.parse_env(env);
    builder
}

/// Main application entry point - creates the GUI app
/// This is the public API for the binary to call
pub fn run_app(cc: &eframe::CreationContext, context: AppContext) -> Box<dyn eframe::App> {
    Box::new(TerminalApp::new(cc, context))
}
