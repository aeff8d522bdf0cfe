use eframe::egui::{CollapsingHeader, Grid, RichText, Spinner, Ui};
use strum::IntoEnumIterator;

use crate::domain::tiers::{TIER_FEATURES, TIERS};
use crate::domain::{Asset, TimeWindow};
use crate::gateway::{CallError, CallState};
use crate::ui::app::Page;
use crate::ui::config::{UI_CONFIG, UI_TEXT};
use crate::ui::styles::UiStyleExt;
use crate::ui::utils::colored_subsection_heading;
use crate::wallet::{Balances, format_amount};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

/// Trait for UI panels that can be rendered
pub trait Panel {
    type Event;
    fn render(&mut self, ui: &mut Ui) -> Vec<Self::Event>;
}

/// Sidebar page list
pub struct NavPanel {
    current: Page,
}

impl NavPanel {
    pub fn new(current: Page) -> Self {
        Self { current }
    }
}

impl Panel for NavPanel {
    type Event = Page;

    fn render(&mut self, ui: &mut Ui) -> Vec<Page> {
        let mut events = Vec::new();
        for page in Page::iter() {
            let selected = page == self.current;
            let text = if selected {
                RichText::new(page.to_string()).color(UI_CONFIG.colors.selected_nav).strong()
            } else {
                RichText::new(page.to_string())
            };
            if ui.selectable_label(selected, text).clicked() && !selected {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_ui_interactions {
                    log::info!("Page selected: {}", page);
                }
                events.push(page);
            }
        }
        events
    }
}

/// `7D | 30D | 90D` toggle above a chart
pub struct WindowSelector {
    current: TimeWindow,
}

impl WindowSelector {
    pub fn new(current: TimeWindow) -> Self {
        Self { current }
    }
}

impl Panel for WindowSelector {
    type Event = TimeWindow;

    fn render(&mut self, ui: &mut Ui) -> Vec<TimeWindow> {
        let mut events = Vec::new();
        ui.horizontal(|ui| {
            for window in TimeWindow::iter() {
                if ui
                    .selectable_label(window == self.current, window.to_string())
                    .clicked()
                    && window != self.current
                {
                    events.push(window);
                }
            }
        });
        events
    }
}

/// Static comparison grid for the tiers page
pub struct TierTablePanel;

impl Panel for TierTablePanel {
    type Event = ();

    fn render(&mut self, ui: &mut Ui) -> Vec<()> {
        Grid::new("tier_table")
            .num_columns(TIERS.len() + 1)
            .spacing([30.0, 10.0])
            .striped(true)
            .show(ui, |ui| {
                ui.label_subdued(UI_TEXT.tiers_feature_column);
                for tier in &TIERS {
                    ui.vertical(|ui| {
                        ui.label(colored_subsection_heading(tier.name).strong());
                        ui.label(RichText::new(tier.price).small());
                    });
                }
                ui.end_row();

                ui.label("");
                for tier in &TIERS {
                    ui.label_subdued(tier.blurb);
                }
                ui.end_row();

                for feature in TIER_FEATURES {
                    ui.label(feature.label);
                    for included in feature.included {
                        if included {
                            ui.label(RichText::new("✔").color(UI_CONFIG.colors.positive));
                        } else {
                            ui.label(RichText::new("—").color(UI_CONFIG.colors.label));
                        }
                    }
                    ui.end_row();
                }
            });
        Vec::new()
    }
}

/// Token balances of the connected account
pub struct BalancesPanel<'a> {
    balances: &'a Balances,
}

impl<'a> BalancesPanel<'a> {
    pub fn new(balances: &'a Balances) -> Self {
        Self { balances }
    }
}

impl Panel for BalancesPanel<'_> {
    type Event = ();

    fn render(&mut self, ui: &mut Ui) -> Vec<()> {
        Grid::new("balances_grid").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
            for asset in Asset::iter() {
                ui.label_subdued(asset.symbol());
                ui.label(format_amount(self.balances.of(asset), asset.decimals()));
                ui.end_row();
            }
        });
        Vec::new()
    }
}

/// Renders one call site: spinner while loading, the error panel on failure,
/// `on_success` once a result is in.
pub fn show_call_state<T>(
    ui: &mut Ui,
    id_salt: &str,
    state: &CallState<T>,
    on_success: impl FnOnce(&mut Ui, &T),
) {
    match state {
        CallState::Idle => {
            ui.label_subdued("—");
        }
        CallState::Loading => {
            ui.horizontal(|ui| {
                ui.add(Spinner::new());
                ui.label_subdued(UI_TEXT.loading);
            });
        }
        CallState::Failed(error) => show_call_error(ui, id_salt, error),
        CallState::Success(value) => on_success(ui, value),
    }
}

/// Inline error panel. Model errors show their message and code, with the
/// stack behind a collapsible header.
pub fn show_call_error(ui: &mut Ui, id_salt: &str, error: &CallError) {
    match error.model_error() {
        Some(model_error) => {
            ui.label_error(format!("⚠ {}", UI_TEXT.error_heading));
            ui.label(RichText::new(&model_error.message).small());
            if let Some(code) = model_error.code_label() {
                ui.metric(UI_TEXT.error_code_prefix, &code, UI_CONFIG.colors.negative);
            }
            let stack = model_error.stack_lines();
            if !stack.is_empty() {
                CollapsingHeader::new(UI_TEXT.error_stack)
                    .id_salt(("call_error_stack", id_salt))
                    .default_open(false)
                    .show(ui, |ui| {
                        for line in stack {
                            ui.label(RichText::new(line).small().monospace());
                        }
                    });
            }
        }
        None => ui.label_error(format!("⚠ {}", error)),
    }
}
