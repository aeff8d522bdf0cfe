use egui_plot::{HLine, Line, LineStyle, PlotPoints, PlotUi, Points};

use crate::config::plot::PLOT_CONFIG;
use crate::domain::ChartSeries;
use crate::utils::format::ValueFormat;

/// Context passed to every layer during rendering.
pub struct LayerContext<'a> {
    pub series: &'a ChartSeries,
    pub format: ValueFormat,
}

/// A standardized layer in the plot stack.
pub trait PlotLayer {
    fn render(&self, ui: &mut PlotUi, ctx: &LayerContext);
}

// ============================================================================
// 1. SERIES LINE
// ============================================================================
pub struct SeriesLineLayer;

impl PlotLayer for SeriesLineLayer {
    fn render(&self, plot_ui: &mut PlotUi, ctx: &LayerContext) {
        let points: PlotPoints = ctx
            .series
            .points
            .iter()
            .map(|p| [p.timestamp as f64, p.value])
            .collect();

        plot_ui.line(
            Line::new(ctx.series.name.as_str(), points)
                .color(ctx.series.color)
                .width(PLOT_CONFIG.line_width),
        );
    }
}

// ============================================================================
// 2. LATEST VALUE (guide line + marker)
// ============================================================================
pub struct LatestValueLayer;

impl PlotLayer for LatestValueLayer {
    fn render(&self, plot_ui: &mut PlotUi, ctx: &LayerContext) {
        let Some(latest) = ctx.series.latest() else {
            return;
        };
        let label = format!("Latest {}", ctx.format.format(latest.value));

        plot_ui.hline(
            HLine::new(label.as_str(), latest.value)
                .color(PLOT_CONFIG.latest_marker_color.gamma_multiply(0.5))
                .width(1.0)
                .style(LineStyle::dashed_loose()),
        );

        plot_ui.points(
            Points::new(label.as_str(), vec![[latest.timestamp as f64, latest.value]])
                .color(PLOT_CONFIG.latest_marker_color)
                .radius(PLOT_CONFIG.latest_marker_radius),
        );
    }
}
