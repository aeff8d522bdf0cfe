//! One state machine behind every wallet button: stake, unstake, mint, burn,
//! add CMK, extend expiry, and the ERC-20 approval any of them may need first.
//!
//! The UI owns a [`TokenAction`] per form, asks it for a [`ButtonState`] each
//! frame, and on click spawns [`submit_call`] with the returned [`PendingOp`].
//! The outcome goes back through [`TokenAction::finish`]; settled receipts
//! through [`TokenAction::on_tx_settled`].

use ethers::types::{Address, H256, U256};
use std::fmt;
use std::sync::Arc;

use super::abi::ContractCall;
use super::addresses::ChainAddresses;
use super::provider::{TxRequest, WalletError, WalletProvider};
use super::reads::Balances;
use super::units::{AmountError, format_amount, parse_amount};
use crate::config::CONTRACTS;
use crate::domain::Asset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// CMK -> xCMK
    Stake,
    /// xCMK -> CMK
    Unstake,
    MintKey,
    BurnKey { token_id: U256 },
    AddCmk { token_id: U256 },
    ExtendExpiry { token_id: U256, payment: Asset },
}

impl ActionKind {
    /// Denomination of the amount input.
    pub fn asset(&self) -> Asset {
        match self {
            ActionKind::Unstake => Asset::Xcmk,
            ActionKind::ExtendExpiry { payment, .. } => *payment,
            ActionKind::Stake | ActionKind::MintKey | ActionKind::BurnKey { .. } | ActionKind::AddCmk { .. } => {
                Asset::Cmk
            }
        }
    }

    pub fn takes_amount(&self) -> bool {
        !matches!(self, ActionKind::BurnKey { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Stake => "Stake",
            ActionKind::Unstake => "Unstake",
            ActionKind::MintKey => "Mint key",
            ActionKind::BurnKey { .. } => "Burn key",
            ActionKind::AddCmk { .. } => "Add CMK",
            ActionKind::ExtendExpiry { .. } => "Extend expiry",
        }
    }

    /// Smallest accepted amount, in whole units of [`Self::asset`].
    pub fn minimum(&self) -> Option<&'static str> {
        match self {
            ActionKind::MintKey => Some(CONTRACTS.min_mint_cmk),
            _ => None,
        }
    }

    /// Contract that pulls the tokens, if the action moves ERC-20s via `transferFrom`.
    fn spender(&self, addresses: &ChainAddresses) -> Option<Address> {
        match self {
            ActionKind::Stake => Some(addresses.xcmk),
            ActionKind::MintKey | ActionKind::AddCmk { .. } => Some(addresses.access_key),
            ActionKind::ExtendExpiry { .. } => Some(addresses.access_factory),
            ActionKind::Unstake | ActionKind::BurnKey { .. } => None,
        }
    }

    fn primary_call(&self, addresses: &ChainAddresses, amount: U256) -> ContractCall {
        match *self {
            ActionKind::Stake => ContractCall::create_share(addresses.xcmk, amount),
            ActionKind::Unstake => ContractCall::remove_share(addresses.xcmk, amount),
            ActionKind::MintKey => ContractCall::mint_key(addresses.access_key, amount),
            ActionKind::BurnKey { token_id } => ContractCall::burn_key(addresses.access_key, token_id),
            ActionKind::AddCmk { token_id } => ContractCall::add_cmk(addresses.access_key, token_id, amount),
            ActionKind::ExtendExpiry { token_id, payment } => {
                ContractCall::extend_expiry(addresses.access_factory, token_id, payment, amount)
            }
        }
    }
}

/// First failed precondition. Its `Display` is the button label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NotConnected,
    UnsupportedNetwork,
    NoAmount,
    InvalidAmount,
    InsufficientBalance,
    BelowMinimum { minimum: &'static str, symbol: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotConnected => write!(f, "Connect wallet"),
            ValidationError::UnsupportedNetwork => write!(f, "Unsupported network"),
            ValidationError::NoAmount => write!(f, "Enter an amount"),
            ValidationError::InvalidAmount => write!(f, "Invalid amount"),
            ValidationError::InsufficientBalance => write!(f, "Insufficient balance"),
            ValidationError::BelowMinimum { minimum, symbol } => write!(f, "Minimum is {} {}", minimum, symbol),
        }
    }
}

impl std::error::Error for ValidationError {}

/// What the action is checked against.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub account: Option<Address>,
    /// `None` when the wallet is on a chain the address book does not cover
    pub addresses: Option<&'a ChainAddresses>,
    /// Zero until the first read lands
    pub balances: &'a Balances,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub from: Address,
    pub addresses: ChainAddresses,
    /// Zero for actions without an amount
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Idle,
    /// `tx` is `None` while the wallet is still asked to sign the approval
    Approving { tx: Option<H256> },
    /// Approval mined; the allowance shows up with the next wallet snapshot
    AwaitingAllowance,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStep {
    Approve,
    Primary,
}

/// A transaction to sign, produced by a click.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOp {
    pub step: ActionStep,
    pub from: Address,
    pub call: ContractCall,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonIntent {
    Blocked,
    Approve,
    Submit,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub label: String,
    pub enabled: bool,
    pub intent: ButtonIntent,
}

impl ButtonState {
    fn new(label: impl Into<String>, enabled: bool, intent: ButtonIntent) -> Self {
        Self {
            label: label.into(),
            enabled,
            intent,
        }
    }
}

/// Result of asking the wallet to sign and send.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(H256),
    /// The user declined in the wallet
    Rejected,
    Failed(WalletError),
}

/// What the caller has to do after [`TokenAction::finish`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    /// Register `hash` with the transaction history
    Submitted { hash: H256, summary: String },
    /// Nothing to report
    Ignored,
    /// Already logged; carries the message for callers that want it
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenAction {
    kind: ActionKind,
    pub amount_input: String,
    phase: ActionPhase,
}

impl TokenAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            amount_input: String::new(),
            phase: ActionPhase::Idle,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Retargets the form (e.g. another payment asset). Ignored while busy.
    pub fn set_kind(&mut self, kind: ActionKind) {
        if !self.is_busy() {
            self.kind = kind;
        }
    }

    pub fn phase(&self) -> ActionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != ActionPhase::Idle
    }

    pub fn validate(&self, ctx: &ActionContext) -> Result<Validated, ValidationError> {
        let from = ctx.account.ok_or(ValidationError::NotConnected)?;
        let addresses = ctx.addresses.ok_or(ValidationError::UnsupportedNetwork)?;

        if !self.kind.takes_amount() {
            return Ok(Validated {
                from,
                addresses: addresses.clone(),
                amount: U256::zero(),
            });
        }

        let asset = self.kind.asset();
        let amount = parse_amount(&self.amount_input, asset.decimals()).map_err(|e| match e {
            AmountError::Empty | AmountError::Zero => ValidationError::NoAmount,
            AmountError::Invalid => ValidationError::InvalidAmount,
        })?;

        if amount > ctx.balances.of(asset) {
            return Err(ValidationError::InsufficientBalance);
        }

        if let Some(minimum) = self.kind.minimum() {
            let floor = parse_amount(minimum, asset.decimals()).unwrap_or_default();
            if amount < floor {
                return Err(ValidationError::BelowMinimum {
                    minimum,
                    symbol: asset.symbol(),
                });
            }
        }

        Ok(Validated {
            from,
            addresses: addresses.clone(),
            amount,
        })
    }

    /// `(token, spender)` when the current allowance does not cover the amount.
    fn approval_needed(&self, validated: &Validated, balances: &Balances) -> Option<(Address, Address)> {
        let spender = self.kind.spender(&validated.addresses)?;
        let token = validated.addresses.token(self.kind.asset());
        (balances.allowance(token, spender) < validated.amount).then_some((token, spender))
    }

    pub fn button_state(&self, ctx: &ActionContext) -> ButtonState {
        match self.phase {
            ActionPhase::Approving { .. } | ActionPhase::AwaitingAllowance => {
                return ButtonState::new("Approving…", false, ButtonIntent::Busy);
            }
            ActionPhase::Submitting => return ButtonState::new("Submitting…", false, ButtonIntent::Busy),
            ActionPhase::Idle => {}
        }

        match self.validate(ctx) {
            Err(e) => ButtonState::new(e.to_string(), false, ButtonIntent::Blocked),
            Ok(validated) => match self.approval_needed(&validated, ctx.balances) {
                Some(_) => ButtonState::new(
                    format!("Approve {}", self.kind.asset().symbol()),
                    true,
                    ButtonIntent::Approve,
                ),
                None => ButtonState::new(self.kind.label(), true, ButtonIntent::Submit),
            },
        }
    }

    /// Moves to a busy phase and returns the transaction to send, or `None`
    /// if the button is not clickable.
    pub fn on_click(&mut self, ctx: &ActionContext) -> Option<PendingOp> {
        if self.is_busy() {
            return None;
        }
        let validated = self.validate(ctx).ok()?;
        let asset = self.kind.asset();

        let op = match self.approval_needed(&validated, ctx.balances) {
            Some((token, spender)) => {
                self.phase = ActionPhase::Approving { tx: None };
                PendingOp {
                    step: ActionStep::Approve,
                    from: validated.from,
                    call: ContractCall::approve(token, spender, validated.amount),
                    summary: format!("Approve {} {}", format_amount(validated.amount, asset.decimals()), asset),
                }
            }
            None => {
                self.phase = ActionPhase::Submitting;
                let summary = if self.kind.takes_amount() {
                    format!(
                        "{} {} {}",
                        self.kind.label(),
                        format_amount(validated.amount, asset.decimals()),
                        asset
                    )
                } else {
                    self.kind.label().to_string()
                };
                PendingOp {
                    step: ActionStep::Primary,
                    from: validated.from,
                    call: self.kind.primary_call(&validated.addresses, validated.amount),
                    summary,
                }
            }
        };
        Some(op)
    }

    pub fn finish(&mut self, op: &PendingOp, outcome: SubmitOutcome) -> ActionEvent {
        match outcome {
            SubmitOutcome::Submitted(hash) => {
                match op.step {
                    // Stay busy until the approval is mined
                    ActionStep::Approve => self.phase = ActionPhase::Approving { tx: Some(hash) },
                    ActionStep::Primary => {
                        self.amount_input.clear();
                        self.phase = ActionPhase::Idle;
                    }
                }
                ActionEvent::Submitted {
                    hash,
                    summary: op.summary.clone(),
                }
            }
            SubmitOutcome::Rejected => {
                self.phase = ActionPhase::Idle;
                ActionEvent::Ignored
            }
            SubmitOutcome::Failed(e) => {
                log::error!("{} failed: {}", op.summary, e);
                self.phase = ActionPhase::Idle;
                ActionEvent::Failed(e.to_string())
            }
        }
    }

    /// Returns `true` if `hash` was the approval this action was waiting on.
    pub fn on_tx_settled(&mut self, hash: H256) -> bool {
        if self.phase == (ActionPhase::Approving { tx: Some(hash) }) {
            self.phase = ActionPhase::AwaitingAllowance;
            return true;
        }
        false
    }

    /// A wallet snapshot read after the approval settled has landed.
    pub fn on_snapshot_refreshed(&mut self) {
        if self.phase == ActionPhase::AwaitingAllowance {
            self.phase = ActionPhase::Idle;
        }
    }
}

/// `estimate * (1 + margin)`
pub fn with_gas_margin(estimate: U256) -> U256 {
    estimate.saturating_mul(U256::from(10_000 + CONTRACTS.gas_margin_bps)) / U256::from(10_000)
}

fn classify(e: WalletError) -> SubmitOutcome {
    if e.is_user_rejection() {
        SubmitOutcome::Rejected
    } else {
        SubmitOutcome::Failed(e)
    }
}

/// Encode, estimate gas, add the margin, send.
pub async fn submit_call(wallet: Arc<dyn WalletProvider>, from: Address, call: ContractCall) -> SubmitOutcome {
    let data = match call.encode() {
        Ok(data) => data,
        Err(e) => return SubmitOutcome::Failed(WalletError::other(format!("{:#}", e))),
    };
    let mut tx = TxRequest {
        from,
        to: call.to,
        data,
        gas: None,
    };

    let estimate = match wallet.estimate_gas(&tx).await {
        Ok(estimate) => estimate,
        Err(e) => return classify(e),
    };
    tx.gas = Some(with_gas_margin(estimate));

    match wallet.send_transaction(&tx).await {
        Ok(hash) => SubmitOutcome::Submitted(hash),
        Err(e) => classify(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::reads::Allowance;
    use crate::wallet::reads::tests::sample_addresses;
    use crate::wallet::testing::MockWallet;

    fn account() -> Address {
        Address::from_low_u64_be(0xaa)
    }

    fn cmk(whole: u64) -> U256 {
        U256::from(whole) * U256::exp10(18)
    }

    fn balances(addresses: &ChainAddresses, cmk_balance: U256, staking_allowance: U256) -> Balances {
        Balances {
            cmk: cmk_balance,
            xcmk: cmk(3),
            usdc: U256::zero(),
            allowances: vec![Allowance {
                token: addresses.cmk,
                spender: addresses.xcmk,
                amount: staking_allowance,
            }],
        }
    }

    fn label(action: &TokenAction, ctx: &ActionContext) -> (String, bool) {
        let state = action.button_state(ctx);
        (state.label, state.enabled)
    }

    #[test]
    fn empty_or_zero_amount_blocks() {
        let addresses = sample_addresses();
        let balances = balances(&addresses, cmk(10), cmk(10));
        let ctx = ActionContext {
            account: Some(account()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let mut action = TokenAction::new(ActionKind::Stake);

        for input in ["", "0", "0.000"] {
            action.amount_input = input.to_string();
            assert_eq!(label(&action, &ctx), ("Enter an amount".to_string(), false), "{:?}", input);
        }
        action.amount_input = "1,5".to_string();
        assert_eq!(label(&action, &ctx), ("Invalid amount".to_string(), false));
    }

    #[test]
    fn amount_above_balance_blocks() {
        let addresses = sample_addresses();
        let balances = balances(&addresses, cmk(10), cmk(100));
        let ctx = ActionContext {
            account: Some(account()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let mut action = TokenAction::new(ActionKind::Stake);
        action.amount_input = "10.5".to_string();
        assert_eq!(label(&action, &ctx), ("Insufficient balance".to_string(), false));
        assert_eq!(action.validate(&ctx), Err(ValidationError::InsufficientBalance));
    }

    #[test]
    fn connection_and_network_are_checked_first() {
        let addresses = sample_addresses();
        let balances = Balances::default();
        let mut action = TokenAction::new(ActionKind::Stake);
        action.amount_input = "abc".to_string();

        let disconnected = ActionContext {
            account: None,
            addresses: Some(&addresses),
            balances: &balances,
        };
        assert_eq!(label(&action, &disconnected), ("Connect wallet".to_string(), false));

        let wrong_chain = ActionContext {
            account: Some(account()),
            addresses: None,
            balances: &balances,
        };
        assert_eq!(label(&action, &wrong_chain), ("Unsupported network".to_string(), false));
    }

    #[test]
    fn mint_enforces_minimum() {
        let addresses = sample_addresses();
        let balances = balances(&addresses, cmk(10), U256::zero());
        let ctx = ActionContext {
            account: Some(account()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let mut action = TokenAction::new(ActionKind::MintKey);
        action.amount_input = "0.5".to_string();
        assert_eq!(label(&action, &ctx), ("Minimum is 1 CMK".to_string(), false));

        action.amount_input = "2".to_string();
        assert_eq!(label(&action, &ctx), ("Approve CMK".to_string(), true));
    }

    #[test]
    fn approval_then_primary_action() {
        let addresses = sample_addresses();
        let low_allowance = balances(&addresses, cmk(10), cmk(1));
        let ctx = ActionContext {
            account: Some(account()),
            addresses: Some(&addresses),
            balances: &low_allowance,
        };
        let mut action = TokenAction::new(ActionKind::Stake);
        action.amount_input = "5".to_string();

        assert_eq!(action.button_state(&ctx).intent, ButtonIntent::Approve);
        let op = action.on_click(&ctx).expect("approve op");
        assert_eq!(op.step, ActionStep::Approve);
        assert_eq!(op.call, ContractCall::approve(addresses.cmk, addresses.xcmk, cmk(5)));
        assert_eq!(action.button_state(&ctx), ButtonState::new("Approving…", false, ButtonIntent::Busy));
        assert!(action.on_click(&ctx).is_none());

        let hash = H256::from_low_u64_be(1);
        let event = action.finish(&op, SubmitOutcome::Submitted(hash));
        assert!(matches!(event, ActionEvent::Submitted { .. }));
        assert_eq!(action.phase(), ActionPhase::Approving { tx: Some(hash) });
        assert_eq!(action.amount_input, "5");

        assert!(!action.on_tx_settled(H256::from_low_u64_be(2)));
        assert!(action.on_tx_settled(hash));
        assert_eq!(action.phase(), ActionPhase::AwaitingAllowance);
        // The old allowance must not offer a second approval
        assert_eq!(action.button_state(&ctx), ButtonState::new("Approving…", false, ButtonIntent::Busy));
        assert!(action.on_click(&ctx).is_none());
        action.on_snapshot_refreshed();
        assert_eq!(action.phase(), ActionPhase::Idle);

        let approved = balances(&addresses, cmk(10), cmk(5));
        let ctx = ActionContext {
            balances: &approved,
            ..ctx
        };
        assert_eq!(label(&action, &ctx), ("Stake".to_string(), true));
        let op = action.on_click(&ctx).expect("stake op");
        assert_eq!(op.call, ContractCall::create_share(addresses.xcmk, cmk(5)));
        assert_eq!(op.summary, "Stake 5 CMK");
        assert_eq!(action.phase(), ActionPhase::Submitting);

        action.finish(&op, SubmitOutcome::Submitted(H256::from_low_u64_be(3)));
        assert_eq!(action.phase(), ActionPhase::Idle);
        assert!(action.amount_input.is_empty());
    }

    #[test]
    fn rejection_is_silent_and_other_failures_are_reported() {
        let addresses = sample_addresses();
        let balances = balances(&addresses, cmk(10), U256::zero());
        let ctx = ActionContext {
            account: Some(account()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let mut action = TokenAction::new(ActionKind::Unstake);
        action.amount_input = "1".to_string();

        let op = action.on_click(&ctx).expect("unstake needs no approval");
        assert_eq!(op.call, ContractCall::remove_share(addresses.xcmk, cmk(1)));
        assert_eq!(action.finish(&op, SubmitOutcome::Rejected), ActionEvent::Ignored);
        assert_eq!(action.phase(), ActionPhase::Idle);
        assert_eq!(action.amount_input, "1");

        let op = action.on_click(&ctx).expect("op");
        let event = action.finish(
            &op,
            SubmitOutcome::Failed(WalletError::new(-32000, "execution reverted")),
        );
        assert!(matches!(event, ActionEvent::Failed(ref m) if m.contains("execution reverted")));
        assert_eq!(action.phase(), ActionPhase::Idle);
    }

    #[test]
    fn burn_needs_no_amount() {
        let addresses = sample_addresses();
        let balances = Balances::default();
        let ctx = ActionContext {
            account: Some(account()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let mut action = TokenAction::new(ActionKind::BurnKey { token_id: U256::from(9) });
        assert_eq!(label(&action, &ctx), ("Burn key".to_string(), true));
        let op = action.on_click(&ctx).expect("burn op");
        assert_eq!(op.call, ContractCall::burn_key(addresses.access_key, U256::from(9)));
    }

    #[test]
    fn gas_margin_is_twenty_percent() {
        assert_eq!(with_gas_margin(U256::from(100_000)), U256::from(120_000));
        assert_eq!(with_gas_margin(U256::zero()), U256::zero());
    }

    #[tokio::test]
    async fn submit_sends_with_margin() {
        let wallet = Arc::new(MockWallet::new(account(), 1).with_estimate(Ok(U256::from(50_000))));
        let call = ContractCall::mint_key(Address::from_low_u64_be(0x13), cmk(1));

        let outcome = submit_call(wallet.clone(), account(), call.clone()).await;
        assert_eq!(outcome, SubmitOutcome::Submitted(H256::from_low_u64_be(0xabc)));

        let sent = wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].gas, Some(U256::from(60_000)));
        assert_eq!(sent[0].to, call.to);
        assert_eq!(sent[0].data, call.encode().unwrap());
    }

    #[tokio::test]
    async fn submit_classifies_wallet_errors() {
        let rejecting = Arc::new(
            MockWallet::new(account(), 1).with_send(Err(WalletError::new(4001, "User rejected the request."))),
        );
        let call = ContractCall::burn_key(Address::from_low_u64_be(0x13), U256::one());
        assert_eq!(
            submit_call(rejecting, account(), call.clone()).await,
            SubmitOutcome::Rejected
        );

        let reverting = Arc::new(
            MockWallet::new(account(), 1).with_estimate(Err(WalletError::new(-32000, "execution reverted"))),
        );
        let outcome = submit_call(reverting.clone(), account(), call).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(ref e) if e.code == Some(-32000)));
        assert!(reverting.sent().is_empty());
    }
}
