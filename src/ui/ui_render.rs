use chrono::Local;
use eframe::egui::{
    Button, CentralPanel, Context, Frame, Grid, Margin, RichText, ScrollArea, SidePanel, Spinner, TopBottomPanel, Ui,
    Window,
};

use crate::ui::app::{Page, TerminalApp};
use crate::ui::app_context::Connection;
use crate::ui::config::{UI_CONFIG, UI_TEXT};
use crate::ui::styles::UiStyleExt;
use crate::ui::ui_panels::{BalancesPanel, NavPanel, Panel, TierTablePanel};
use crate::ui::utils::{colored_heading, section_heading, spaced_separator};
use crate::utils::format::shorten_address;
use crate::utils::time_utils::{format_ago, local_now};
use crate::wallet::TxStatus;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

impl TerminalApp {
    pub(super) fn render_side_panel(&mut self, ctx: &Context) {
        let side_panel_frame = Frame::new()
            .fill(UI_CONFIG.colors.side_panel)
            .inner_margin(Margin::symmetric(8, 8));
        SidePanel::left("left_panel")
            .exact_width(UI_CONFIG.side_panel_width)
            .resizable(false)
            .frame(side_panel_frame)
            .show(ctx, |ui| {
                ui.label(colored_heading(UI_TEXT.nav_heading));
                ui.add_space(8.0);

                ui.vertical(|ui| {
                    for page in NavPanel::new(self.state.page).render(ui) {
                        self.set_page(page);
                    }
                });

                spaced_separator(ui);
                self.wallet_button(ui);
            });
    }

    fn wallet_button(&mut self, ui: &mut Ui) {
        match self.context.connection() {
            Connection::Disconnected => {
                if ui.button(UI_TEXT.connect_wallet).clicked() {
                    self.context.connect();
                }
            }
            Connection::Connecting => {
                ui.horizontal(|ui| {
                    ui.add(Spinner::new());
                    ui.label_subdued(UI_TEXT.connecting);
                });
            }
            Connection::Connected { account, chain_id } => {
                let color = if self.context.is_supported_network() {
                    UI_CONFIG.colors.connected
                } else {
                    UI_CONFIG.colors.pending
                };
                let text = RichText::new(format!("{} · {}", shorten_address(&account), chain_id)).color(color);
                if ui.add(Button::new(text)).clicked() {
                    #[cfg(debug_assertions)]
                    if DEBUG_FLAGS.print_ui_interactions {
                        log::info!("Toggling wallet window");
                    }
                    self.show_wallet_window = !self.show_wallet_window;
                }
                if !self.context.is_supported_network() {
                    ui.label_warning(UI_TEXT.wallet_unsupported);
                }
            }
        }
    }

    pub(super) fn render_central_panel(&mut self, ctx: &Context) {
        let central_panel_frame = Frame::new()
            .fill(UI_CONFIG.colors.central_panel)
            .inner_margin(Margin::symmetric(16, 10));
        CentralPanel::default().frame(central_panel_frame).show(ctx, |ui| {
            ScrollArea::vertical().id_salt("central_scroll").show(ui, |ui| {
                let page = self.state.page;
                self.page_header(ui, page);
                match page {
                    Page::Analytics => self.render_analytics_page(ui),
                    Page::LendingRisk => self.render_lending_page(ui),
                    Page::Staking => self.staking.show(ui, &self.context),
                    Page::AccessKeys => self.keys.show(ui, &self.context),
                    Page::Tiers => {
                        TierTablePanel.render(ui);
                    }
                }
            });
        });
    }

    fn page_header(&mut self, ui: &mut Ui, page: Page) {
        let heading = match page {
            Page::Analytics => UI_TEXT.page_analytics_heading,
            Page::LendingRisk => UI_TEXT.page_lending_heading,
            Page::Staking => UI_TEXT.page_staking_heading,
            Page::AccessKeys => UI_TEXT.page_access_keys_heading,
            Page::Tiers => UI_TEXT.page_tiers_heading,
        };
        ui.horizontal(|ui| {
            section_heading(ui, heading);
            if page != Page::Tiers {
                ui.add_space(12.0);
                if ui.button(UI_TEXT.refresh).clicked() {
                    #[cfg(debug_assertions)]
                    if DEBUG_FLAGS.print_ui_interactions {
                        log::info!("Refreshing {}", page);
                    }
                    self.refresh_page();
                }
            }
        });
    }

    fn render_analytics_page(&mut self, ui: &mut Ui) {
        self.token_cards.show(ui);
        ui.add_space(10.0);
        if self.token_tabs.show(ui, &mut self.state.token_selection) {
            let gateway = self.context.gateway();
            self.token_tabs
                .ensure(gateway, &self.context.chain_context(), &self.state.token_selection);
        }
    }

    fn render_lending_page(&mut self, ui: &mut Ui) {
        self.lending_cards.show(ui);
        ui.add_space(10.0);
        if self.lending_tabs.show(ui, &mut self.state.lending_selection) {
            let gateway = self.context.gateway();
            self.lending_tabs
                .ensure(gateway, &self.context.chain_context(), &self.state.lending_selection);
        }
    }

    pub(super) fn render_status_panel(&mut self, ctx: &Context) {
        let status_frame = Frame::new()
            .fill(UI_CONFIG.colors.side_panel)
            .inner_margin(Margin::symmetric(8, 4));
        TopBottomPanel::bottom("status_panel").frame(status_frame).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.metric(UI_TEXT.status_gateway, self.context.gateway_label(), UI_CONFIG.colors.heading);
                ui.separator();
                ui.metric(UI_TEXT.status_rpc, self.context.wallet_label(), UI_CONFIG.colors.heading);
                ui.separator();

                if self.is_loading() {
                    ui.label_warning(UI_TEXT.status_loading);
                    ui.separator();
                }

                let pending = self.context.tx_history().pending().len();
                if pending > 0 {
                    ui.label_warning(format!("{} {}", pending, UI_TEXT.status_pending_tx));
                    ui.separator();
                }

                if let Some(error) = self.context.last_error() {
                    ui.label_error(error.to_string());
                }
            });
        });
    }

    pub(super) fn render_wallet_window(&mut self, ctx: &Context) {
        let mut open = self.show_wallet_window;
        let mut disconnect = false;

        Window::new(UI_TEXT.wallet_window_title)
            .open(&mut open)
            .resizable(false)
            .default_width(360.0)
            .show(ctx, |ui| {
                if let Some(account) = self.context.account() {
                    ui.metric(UI_TEXT.wallet_account, &format!("{:?}", account), UI_CONFIG.colors.heading);
                }
                if let Some(chain_id) = self.context.wallet_chain_id() {
                    if self.context.is_supported_network() {
                        ui.metric(UI_TEXT.wallet_network, &chain_id.to_string(), UI_CONFIG.colors.connected);
                    } else {
                        ui.metric(UI_TEXT.wallet_network, UI_TEXT.wallet_unsupported, UI_CONFIG.colors.negative);
                    }
                }

                ui.add_space(6.0);
                ui.label_subheader(UI_TEXT.balances_heading);
                BalancesPanel::new(&self.context.snapshot().balances).render(ui);

                ui.add_space(6.0);
                ui.label_subheader(UI_TEXT.tx_heading);
                self.tx_history_grid(ui);

                ui.add_space(6.0);
                if ui.button(UI_TEXT.disconnect).clicked() {
                    disconnect = true;
                }
            });

        if disconnect {
            self.context.disconnect();
            open = false;
        }
        self.show_wallet_window = open;
    }

    fn tx_history_grid(&self, ui: &mut Ui) {
        let records = self.context.tx_history().records();
        if records.is_empty() {
            ui.label_subdued(UI_TEXT.tx_empty);
            return;
        }

        let now = local_now();
        Grid::new("tx_history_grid")
            .num_columns(3)
            .spacing([16.0, 4.0])
            .striped(true)
            .show(ui, |ui| {
                for record in records.iter().take(UI_CONFIG.tx_rows) {
                    let color = match record.status {
                        TxStatus::Pending => UI_CONFIG.colors.pending,
                        TxStatus::Confirmed => UI_CONFIG.colors.positive,
                        TxStatus::Reverted => UI_CONFIG.colors.negative,
                    };
                    ui.label(&record.summary)
                        .on_hover_text(format!("{:?}", record.hash));
                    ui.label(RichText::new(record.status.label()).color(color));
                    ui.label_subdued(format_ago(record.submitted_at.with_timezone(&Local), now));
                    ui.end_row();
                }
            });
    }
}
