use eframe::egui::Color32;
use itertools::Itertools;
use serde_json::Value;

use crate::config::metrics::MetricSpec;
use crate::gateway::SeriesResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    /// Seconds since epoch
    pub timestamp: i64,
    pub value: f64,
}

/// Order a call site consumes samples in. Charts read ascending; the
/// history table lists newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrder {
    Ascending,
    Descending,
}

/// Reads a number at `pointer`. Models emit numbers either as JSON numbers or
/// as decimal strings.
pub fn extract_number(output: &Value, pointer: &str) -> Option<f64> {
    let value = match output.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// A plottable line derived from a historical result. Read-only; rebuild it
/// when the source call's revision changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub color: Color32,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Samples whose output has no number at `pointer` are skipped. One point
    /// per timestamp.
    pub fn derive(
        name: impl Into<String>,
        color: Color32,
        result: &SeriesResult,
        pointer: &str,
        order: SeriesOrder,
    ) -> Self {
        let points = result
            .series
            .iter()
            .filter_map(|sample| {
                extract_number(&sample.output, pointer).map(|value| ChartPoint {
                    timestamp: sample.sample_timestamp,
                    value,
                })
            })
            .sorted_by(|a, b| match order {
                SeriesOrder::Ascending => a.timestamp.cmp(&b.timestamp),
                SeriesOrder::Descending => b.timestamp.cmp(&a.timestamp),
            })
            .dedup_by(|a, b| a.timestamp == b.timestamp)
            .collect();

        Self {
            name: name.into(),
            color,
            points,
        }
    }

    pub fn from_metric(metric: &MetricSpec, result: &SeriesResult, order: SeriesOrder) -> Self {
        Self::derive(metric.label, metric.color, result, metric.value_pointer, order)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent point, whatever the order.
    pub fn latest(&self) -> Option<ChartPoint> {
        self.points.iter().max_by_key(|p| p.timestamp).copied()
    }

    pub fn earliest(&self) -> Option<ChartPoint> {
        self.points.iter().min_by_key(|p| p.timestamp).copied()
    }

    /// Relative change from the first to the last point (0.05 = +5%).
    pub fn change(&self) -> Option<f64> {
        let first = self.earliest()?;
        let last = self.latest()?;
        if first.value == 0.0 || self.points.len() < 2 {
            return None;
        }
        Some((last.value - first.value) / first.value.abs())
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .map(|p| p.value)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
    }

    pub fn time_range(&self) -> Option<(i64, i64)> {
        Some((self.earliest()?.timestamp, self.latest()?.timestamp))
    }
}
