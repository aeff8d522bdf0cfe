use eframe::egui::{Button, RichText, TextEdit, Ui};
use poll_promise::Promise;
use std::sync::Arc;

use crate::ui::config::{UI_CONFIG, UI_TEXT};
use crate::wallet::{
    ActionContext, ActionEvent, ActionKind, ButtonIntent, PendingOp, SubmitOutcome, TokenAction, WalletProvider,
    format_amount, submit_call,
};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

/// A [`TokenAction`] plus the submission it may have in flight.
pub struct ActionRunner {
    action: TokenAction,
    in_flight: Option<(PendingOp, Promise<SubmitOutcome>)>,
}

impl ActionRunner {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            action: TokenAction::new(kind),
            in_flight: None,
        }
    }

    pub fn action(&self) -> &TokenAction {
        &self.action
    }

    pub fn set_kind(&mut self, kind: ActionKind) {
        self.action.set_kind(kind);
    }

    /// Prefills the amount (e.g. a computed cost). Ignored while busy.
    pub fn set_amount(&mut self, amount: String) {
        if !self.action.is_busy() {
            self.action.amount_input = amount;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.action.is_busy()
    }

    /// Starts the next step if the button is clickable. Returns `true` if a
    /// transaction was handed to the wallet.
    pub fn click(&mut self, ctx: &ActionContext, wallet: &Arc<dyn WalletProvider>) -> bool {
        let Some(op) = self.action.on_click(ctx) else {
            return false;
        };

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_ui_interactions {
            log::info!("Submitting {} via {}", op.call.describe(), wallet.signature());
        }

        let promise = Promise::spawn_async(submit_call(Arc::clone(wallet), op.from, op.call.clone()));
        self.in_flight = Some((op, promise));
        true
    }

    /// Applies a finished submission, if any.
    pub fn poll(&mut self) -> Option<ActionEvent> {
        let (op, promise) = self.in_flight.take()?;
        match promise.try_take() {
            Ok(outcome) => Some(self.action.finish(&op, outcome)),
            Err(promise) => {
                self.in_flight = Some((op, promise));
                None
            }
        }
    }

    pub fn on_tx_settled(&mut self, hash: ethers::types::H256) -> bool {
        self.action.on_tx_settled(hash)
    }

    pub fn on_snapshot_refreshed(&mut self) {
        self.action.on_snapshot_refreshed();
    }

    /// Amount field (when the action takes one), a max shortcut and the
    /// action button.
    pub fn show(&mut self, ui: &mut Ui, id_salt: &str, ctx: &ActionContext, wallet: &Arc<dyn WalletProvider>) {
        let kind = self.action.kind();
        let asset = kind.asset();

        if kind.takes_amount() {
            ui.horizontal(|ui| {
                let busy = self.action.is_busy();
                ui.add_enabled(
                    !busy,
                    TextEdit::singleline(&mut self.action.amount_input)
                        .id_salt(("amount", id_salt))
                        .hint_text(format!("0.0 {}", asset.symbol()))
                        .desired_width(160.0),
                );
                if ui.add_enabled(!busy && ctx.account.is_some(), Button::new(UI_TEXT.max_button)).clicked() {
                    self.action.amount_input = format_amount(ctx.balances.of(asset), asset.decimals());
                }
            });
        }

        let state = self.action.button_state(ctx);
        let text = match state.intent {
            ButtonIntent::Approve => RichText::new(&state.label).color(UI_CONFIG.colors.pending),
            ButtonIntent::Submit => RichText::new(&state.label).strong(),
            ButtonIntent::Blocked | ButtonIntent::Busy => RichText::new(&state.label),
        };
        ui.horizontal(|ui| {
            if ui.add_enabled(state.enabled, Button::new(text)).clicked() {
                self.click(ctx, wallet);
            }
            if state.intent == ButtonIntent::Busy {
                ui.spinner();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::reads::tests::sample_addresses;
    use crate::wallet::testing::MockWallet;
    use crate::wallet::{ActionPhase, Balances, WalletError};
    use ethers::types::{Address, H256, U256};
    use std::time::Duration;

    fn owner() -> Address {
        Address::from_low_u64_be(0xaa)
    }

    fn whole(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    async fn settle(runner: &mut ActionRunner) -> ActionEvent {
        for _ in 0..300 {
            if let Some(event) = runner.poll() {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("submission never finished");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unstake_submits_and_clears_the_input() {
        let addresses = sample_addresses();
        let balances = Balances {
            xcmk: whole(10),
            ..Balances::default()
        };
        let ctx = ActionContext {
            account: Some(owner()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let wallet: Arc<dyn WalletProvider> = Arc::new(MockWallet::new(owner(), 1));

        let mut runner = ActionRunner::new(ActionKind::Unstake);
        runner.action.amount_input = "2".to_string();
        assert!(runner.click(&ctx, &wallet));
        assert!(runner.is_busy());
        assert!(!runner.click(&ctx, &wallet));

        let event = settle(&mut runner).await;
        assert!(matches!(event, ActionEvent::Submitted { hash, .. } if hash == H256::from_low_u64_be(0xabc)));
        assert_eq!(runner.action().phase(), ActionPhase::Idle);
        assert!(runner.action().amount_input.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_signature_returns_to_idle_quietly() {
        let addresses = sample_addresses();
        let balances = Balances {
            xcmk: whole(10),
            ..Balances::default()
        };
        let ctx = ActionContext {
            account: Some(owner()),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let wallet: Arc<dyn WalletProvider> = Arc::new(
            MockWallet::new(owner(), 1).with_send(Err(WalletError::new(4001, "User rejected the request."))),
        );

        let mut runner = ActionRunner::new(ActionKind::Unstake);
        runner.action.amount_input = "1".to_string();
        runner.click(&ctx, &wallet);

        assert_eq!(settle(&mut runner).await, ActionEvent::Ignored);
        assert!(!runner.is_busy());
        assert_eq!(runner.action().amount_input, "1");
    }

    #[test]
    fn blocked_button_does_not_submit() {
        let balances = Balances::default();
        let ctx = ActionContext {
            account: None,
            addresses: None,
            balances: &balances,
        };
        let wallet: Arc<dyn WalletProvider> = Arc::new(MockWallet::new(owner(), 1));
        let mut runner = ActionRunner::new(ActionKind::Stake);
        runner.action.amount_input = "1".to_string();
        assert!(!runner.click(&ctx, &wallet));
        assert!(runner.poll().is_none());
    }
}
