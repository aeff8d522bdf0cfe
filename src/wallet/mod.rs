//! Wallet-gated token actions: contract ABIs, the address book, the provider
//! seam, batched reads, the action state machine and the transaction history.

pub mod abi;
pub mod action;
pub mod addresses;
pub mod provider;
pub mod reads;
pub mod tx_history;
pub mod units;

#[cfg(test)]
pub mod testing;

pub use abi::{ContractCall, ContractKind};
pub use action::{
    ActionContext, ActionEvent, ActionKind, ActionPhase, ActionStep, ButtonIntent, ButtonState, PendingOp,
    SubmitOutcome, TokenAction, ValidationError, submit_call,
};
pub use addresses::{AddressBook, ChainAddresses};
pub use provider::{ReceiptStatus, RpcWallet, TxRequest, WalletError, WalletProvider};
pub use reads::{Balances, StakingInfo, WalletSnapshot, read_snapshot};
pub use tx_history::{TxHistory, TxRecord, TxStatus};
pub use units::{format_amount, parse_amount};
