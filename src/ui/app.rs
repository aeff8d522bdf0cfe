use eframe::{Frame, egui};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::config::METRICS;
use crate::ui::app_context::AppContext;
use crate::ui::stat_card::StatCardRow;
use crate::ui::tab_group::{TabGroup, TabSelection};
use crate::ui::utils::setup_custom_visuals;
use crate::ui::wallet_forms::{AccessKeyForms, StakingForms};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

/// Sidebar pages, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum Page {
    #[default]
    Analytics,
    #[strum(to_string = "Lending Risk")]
    LendingRisk,
    Staking,
    #[strum(to_string = "Access Keys")]
    AccessKeys,
    Tiers,
}

/// The part of the app that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub page: Page,
    #[serde(default)]
    pub token_selection: TabSelection,
    #[serde(default)]
    pub lending_selection: TabSelection,
}

pub struct TerminalApp {
    pub(super) state: UiState,
    pub(super) context: AppContext,

    pub(super) token_cards: StatCardRow,
    pub(super) token_tabs: TabGroup,
    pub(super) lending_cards: StatCardRow,
    pub(super) lending_tabs: TabGroup,

    pub(super) staking: StakingForms,
    pub(super) keys: AccessKeyForms,

    pub(super) show_wallet_window: bool,
}

impl TerminalApp {
    pub fn new(cc: &eframe::CreationContext<'_>, context: AppContext) -> Self {
        let state = match cc.storage.and_then(|storage| eframe::get_value::<UiState>(storage, eframe::APP_KEY)) {
            Some(state) => {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_state_serde {
                    log::info!("Successfully loaded persisted state: {:?}", state);
                }
                state
            }
            None => {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_state_serde {
                    log::info!("No persisted terminal state. Creating anew.");
                }
                UiState::default()
            }
        };
        Self::with_state(state, context)
    }

    pub fn with_state(state: UiState, context: AppContext) -> Self {
        Self {
            state,
            context,
            token_cards: StatCardRow::new(METRICS.token_cards),
            token_tabs: TabGroup::new("token", METRICS.token_tabs),
            lending_cards: StatCardRow::new(METRICS.lending_cards),
            lending_tabs: TabGroup::new("lending", METRICS.lending_tabs),
            staking: StakingForms::default(),
            keys: AccessKeyForms::default(),
            show_wallet_window: false,
        }
    }

    pub fn page(&self) -> Page {
        self.state.page
    }

    /// Switches page. Calls owned by the page being left are cancelled; the
    /// new page issues its own on the next poll.
    pub(super) fn set_page(&mut self, page: Page) {
        if page == self.state.page {
            return;
        }
        match self.state.page {
            Page::Analytics => {
                self.token_cards.cancel();
                self.token_tabs.cancel();
            }
            Page::LendingRisk => {
                self.lending_cards.cancel();
                self.lending_tabs.cancel();
            }
            Page::Staking | Page::AccessKeys | Page::Tiers => {}
        }
        self.state.page = page;
    }

    /// Re-runs every call on the current page.
    pub(super) fn refresh_page(&mut self) {
        let gateway = self.context.gateway();
        match self.state.page {
            Page::Analytics => {
                self.token_cards.refresh(gateway);
                self.token_tabs.refresh(gateway, &self.state.token_selection);
            }
            Page::LendingRisk => {
                self.lending_cards.refresh(gateway);
                self.lending_tabs.refresh(gateway, &self.state.lending_selection);
            }
            Page::Staking | Page::AccessKeys => self.context.refresh_snapshot(),
            Page::Tiers => {}
        }
    }
}

impl eframe::App for TerminalApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // In-flight runs hold a cancellation token each; drop them before the runtime goes
        self.token_cards.cancel();
        self.token_tabs.cancel();
        self.lending_cards.cancel();
        self.lending_tabs.cancel();

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_shutdown {
            log::info!("Application shutdown complete.");
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_state_serde {
            log::info!("Saving terminal state: {:?}", self.state);
        }
        eframe::set_value(storage, eframe::APP_KEY, &self.state);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        setup_custom_visuals(ctx);

        self.poll_async(ctx);

        self.render_side_panel(ctx);
        self.render_status_panel(ctx);
        self.render_central_panel(ctx);
        if self.show_wallet_window {
            self.render_wallet_window(ctx);
        }
    }
}
