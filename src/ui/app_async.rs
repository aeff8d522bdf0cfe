use eframe::egui;
use std::time::{Duration, Instant};

use crate::ui::app::{Page, TerminalApp};
use crate::wallet::ActionEvent;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

/// Repaint cadence while something is in flight.
const BUSY_REPAINT: Duration = Duration::from_millis(100);
/// Repaint cadence otherwise, so timers (snapshot refresh, "x ago") still tick.
const IDLE_REPAINT: Duration = Duration::from_secs(1);

impl TerminalApp {
    /// Drives every promise the app owns. Called once per frame before rendering.
    pub(super) fn poll_async(&mut self, ctx: &egui::Context) {
        let update = self.context.poll(Instant::now());

        if update.connection_changed && self.context.account().is_none() {
            self.show_wallet_window = false;
        }
        // Before settlements: a snapshot landing this frame was read before them
        if update.snapshot_changed || update.connection_changed {
            self.keys.sync(&self.context.snapshot().access_keys);
            self.staking.on_snapshot_refreshed();
            self.keys.on_snapshot_refreshed();
        }

        for (hash, _) in &update.settled {
            self.staking.on_tx_settled(*hash);
            self.keys.on_tx_settled(*hash);
        }

        let events: Vec<ActionEvent> = self.staking.poll().into_iter().chain(self.keys.poll()).collect();
        for event in events {
            #[cfg(debug_assertions)]
            if DEBUG_FLAGS.print_ui_interactions {
                log::info!("Action finished: {:?}", event);
            }
            self.context.apply_action_event(event);
        }

        self.poll_page_calls();
        self.ensure_page_calls();

        if self.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        } else {
            ctx.request_repaint_after(IDLE_REPAINT);
        }
    }

    /// Polls every call site; hidden ones were cancelled and return nothing.
    fn poll_page_calls(&mut self) {
        self.token_cards.poll();
        self.token_tabs.poll();
        self.lending_cards.poll();
        self.lending_tabs.poll();
    }

    /// Issues the current page's requests. Already-active requests are no-ops.
    fn ensure_page_calls(&mut self) {
        let gateway = self.context.gateway();
        let chain = self.context.chain_context();
        match self.state.page {
            Page::Analytics => {
                self.token_cards.ensure(gateway, &chain);
                self.token_tabs.ensure(gateway, &chain, &self.state.token_selection);
            }
            Page::LendingRisk => {
                self.lending_cards.ensure(gateway, &chain);
                self.lending_tabs.ensure(gateway, &chain, &self.state.lending_selection);
            }
            Page::Staking | Page::AccessKeys | Page::Tiers => {}
        }
    }

    pub(super) fn is_loading(&self) -> bool {
        self.token_cards.is_loading()
            || self.token_tabs.is_loading()
            || self.lending_cards.is_loading()
            || self.lending_tabs.is_loading()
    }

    pub(super) fn is_busy(&self) -> bool {
        self.is_loading() || self.context.is_busy() || self.staking.is_busy() || self.keys.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::METRICS;
    use crate::gateway::testing::ScriptedGateway;
    use crate::gateway::{ComputationGateway, GatewayOutcome};
    use crate::ui::app::UiState;
    use crate::ui::app_context::AppContext;
    use crate::wallet::AddressBook;
    use crate::wallet::testing::MockWallet;
    use ethers::types::Address;
    use serde_json::json;
    use std::sync::Arc;

    fn app_with(gateway: Arc<ScriptedGateway>) -> TerminalApp {
        let gateway: Arc<dyn ComputationGateway> = gateway;
        let context = AppContext::new(
            gateway,
            Arc::new(MockWallet::new(Address::from_low_u64_be(1), 1)),
            AddressBook::default(),
            1,
        );
        TerminalApp::with_state(UiState::default(), context)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn only_the_current_page_issues_requests() {
        let scripted = Arc::new(
            ScriptedGateway::new().respond_to_all(Duration::from_millis(5), GatewayOutcome::Success(json!({}))),
        );
        let mut app = app_with(scripted.clone());
        let ctx = egui::Context::default();
        let analytics_calls = METRICS.token_cards.len() + 1;

        for _ in 0..300 {
            app.poll_async(&ctx);
            if !app.is_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(scripted.calls(), analytics_calls);
        assert!(scripted.requests().iter().all(|r| {
            METRICS.token_cards.iter().any(|m| m.slug == r.slug())
                || r.input()["model_slug"] == json!(METRICS.token_tabs[0].metric.slug)
        }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn leaving_a_page_cancels_its_calls() {
        let scripted = Arc::new(
            ScriptedGateway::new().respond_to_all(Duration::from_secs(30), GatewayOutcome::Success(json!({}))),
        );
        let mut app = app_with(scripted);
        let ctx = egui::Context::default();

        app.poll_async(&ctx);
        assert!(app.token_cards.is_loading());

        app.set_page(Page::Tiers);
        assert!(!app.token_cards.is_loading());
        assert!(!app.token_tabs.is_loading());
        app.poll_async(&ctx);
        assert!(!app.is_loading());
    }
}
