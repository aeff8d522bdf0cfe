// User interface components
pub mod action_form;
pub mod app;
mod app_async;
pub mod app_context;
pub mod config;
pub mod plot_layers;
pub mod stat_card;
pub mod styles;
pub mod tab_group;
pub mod ui_panels;
pub mod ui_plot_view;
mod ui_render;
pub mod ui_text;
pub mod utils;
pub mod wallet_forms;

// Re-export main app
pub use app::{Page, TerminalApp, UiState};
pub use app_context::{AppContext, AppError, Connection};
pub use config::UI_CONFIG;
