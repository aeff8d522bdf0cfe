use eframe::egui::Color32;

pub use crate::ui::ui_text::{UI_TEXT, UiText};

/// UI Colors for consistent theming
#[derive(Clone, Copy, Default)]
pub struct UiColors {
    pub label: Color32,
    pub heading: Color32,
    pub subsection_heading: Color32,
    pub central_panel: Color32,
    pub side_panel: Color32,
    pub card_fill: Color32,
    pub selected_nav: Color32,
    pub positive: Color32,
    pub negative: Color32,
    pub pending: Color32,
    pub connected: Color32,
}

/// Main UI configuration struct that holds all UI-related settings
#[derive(Default, Clone, Copy)]
pub struct UiConfig {
    pub colors: UiColors,
    pub side_panel_width: f32,
    pub card_width: f32,
    /// Rows shown in a history table under a chart
    pub history_rows: usize,
    /// Rows shown in the wallet window's transaction list
    pub tx_rows: usize,
    /// Preset durations offered by the extend-expiry form
    pub extension_days: [u64; 4],
}

/// Global UI configuration instance
pub static UI_CONFIG: UiConfig = UiConfig {
    colors: UiColors {
        label: Color32::GRAY,     // This sets every label globally to this color
        heading: Color32::from_rgb(0, 191, 255),
        subsection_heading: Color32::ORANGE,
        central_panel: Color32::from_rgb(18, 22, 30),
        side_panel: Color32::from_rgb(25, 25, 25),
        card_fill: Color32::from_rgb(32, 38, 50),
        selected_nav: Color32::from_rgb(0, 191, 255),
        positive: Color32::from_rgb(130, 200, 140),
        negative: Color32::from_rgb(255, 100, 100),
        pending: Color32::from_rgb(255, 215, 0),
        connected: Color32::from_rgb(100, 200, 100),
    },
    side_panel_width: 190.0,
    card_width: 200.0,
    history_rows: 10,
    tx_rows: 12,
    extension_days: [7, 30, 90, 365],
};
