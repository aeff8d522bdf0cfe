//! Plot visualization configuration

use eframe::egui::Color32;

pub struct PlotConfig {
    /// Width of the metric line
    pub line_width: f32,
    /// Colour of the "latest value" marker and its guide line
    pub latest_marker_color: Color32,
    /// Radius of the latest value marker
    pub latest_marker_radius: f32,
    /// Height of a historical chart inside a tab group
    pub chart_height: f32,
    /// Number of date labels we aim for on the x axis
    pub x_axis_divisions: u32,
    /// Number of value labels we aim for on the y axis
    pub y_axis_divisions: u32,
    /// Fraction of the value range added above and below the series
    pub y_padding_pct: f64,
    /// Grid colour behind the lines
    pub grid_color: Color32,
}

pub const PLOT_CONFIG: PlotConfig = PlotConfig {
    line_width: 2.0,
    latest_marker_color: Color32::from_rgb(255, 215, 0), // Gold
    latest_marker_radius: 4.0,
    chart_height: 280.0,
    x_axis_divisions: 6,
    y_axis_divisions: 5,
    y_padding_pct: 0.05,
    grid_color: Color32::from_rgb(60, 60, 60),
};
