use eframe::egui;
use egui_plot::{AxisHints, Corner, GridMark, HPlacement, Legend, Plot};

use crate::config::plot::PLOT_CONFIG;
use crate::domain::ChartSeries;
use crate::ui::plot_layers::{LatestValueLayer, LayerContext, PlotLayer, SeriesLineLayer};
use crate::utils::TimeUtils;
use crate::utils::format::ValueFormat;
use crate::utils::time_utils::{epoch_sec_to_axis_label, format_epoch_sec};

/// Padded plot bounds for a series, `None` when it is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartBounds {
    pub fn of(series: &ChartSeries) -> Option<Self> {
        let (t_min, t_max) = series.time_range()?;
        let (v_min, v_max) = series.value_range()?;

        // A flat series still needs some vertical room
        let span = if v_max > v_min {
            v_max - v_min
        } else {
            v_max.abs().max(1.0)
        };
        let pad = span * PLOT_CONFIG.y_padding_pct;

        // Likewise a single sample gets a day either side
        let (x_min, x_max) = if t_max > t_min {
            (t_min as f64, t_max as f64)
        } else {
            ((t_min - TimeUtils::SECS_IN_D) as f64, (t_max + TimeUtils::SECS_IN_D) as f64)
        };

        Some(Self {
            x_min,
            x_max,
            y_min: v_min - pad,
            y_max: v_max + pad,
        })
    }
}

/// Evenly spaced marks across `[min, max]`, both ends included.
fn even_marks(min: f64, max: f64, divisions: u32) -> Vec<GridMark> {
    let divisions = divisions.max(1);
    let step = (max - min) / divisions as f64;
    if step <= 0.0 || !step.is_finite() {
        return vec![GridMark {
            value: min,
            step_size: 1.0,
        }];
    }
    (0..=divisions)
        .map(|i| GridMark {
            value: min + step * i as f64,
            step_size: step,
        })
        .collect()
}

#[derive(Default)]
pub struct ChartView;

impl ChartView {
    pub fn new() -> Self {
        Self
    }

    /// Date x-axis, value y-axis, read-only (no zoom or drag).
    pub fn show(&self, ui: &mut egui::Ui, id: &str, series: &ChartSeries, format: ValueFormat) {
        let Some(bounds) = ChartBounds::of(series) else {
            return;
        };

        Plot::new(id)
            .height(PLOT_CONFIG.chart_height)
            .legend(Legend::default().position(Corner::LeftTop))
            .custom_x_axes(vec![create_x_axis()])
            .custom_y_axes(vec![create_y_axis(format)])
            .label_formatter(move |_name, value| {
                format!(
                    "{}\n{}",
                    format_epoch_sec(value.x as i64, TimeUtils::STANDARD_TIME_FORMAT),
                    format.format(value.y)
                )
            })
            .x_grid_spacer(move |input| {
                let (min, max) = input.bounds;
                even_marks(min, max, PLOT_CONFIG.x_axis_divisions)
            })
            .y_grid_spacer(move |input| {
                let (min, max) = input.bounds;
                even_marks(min, max, PLOT_CONFIG.y_axis_divisions)
            })
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_boxed_zoom(false)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds_x(bounds.x_min..=bounds.x_max);
                plot_ui.set_plot_bounds_y(bounds.y_min..=bounds.y_max);

                let ctx = LayerContext { series, format };

                // Back to front
                let layers: Vec<Box<dyn PlotLayer>> = vec![Box::new(SeriesLineLayer), Box::new(LatestValueLayer)];
                for layer in layers {
                    layer.render(plot_ui, &ctx);
                }
            });
    }
}

fn create_x_axis() -> AxisHints<'static> {
    AxisHints::new_x().formatter(|grid_mark, _range| epoch_sec_to_axis_label(grid_mark.value as i64))
}

fn create_y_axis(format: ValueFormat) -> AxisHints<'static> {
    AxisHints::new_y()
        .formatter(move |grid_mark, _range| format.format_axis(grid_mark.value))
        .placement(HPlacement::Left)
}
