//! One component for every metric group: a tab strip, a window selector, the
//! latest value headline, the chart and a newest-first history table.

use eframe::egui::{Grid, RichText, ScrollArea, Ui};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::metrics::TabSpec;
use crate::domain::{ChartSeries, SeriesOrder, TimeWindow};
use crate::gateway::{ChainContext, ComputationGateway, SeriesCall, SeriesResult};
use crate::ui::config::{UI_CONFIG, UI_TEXT};
use crate::ui::stat_card::metric_input;
use crate::ui::styles::UiStyleExt;
use crate::ui::ui_panels::{Panel, WindowSelector, show_call_state};
use crate::ui::ui_plot_view::ChartView;
use crate::ui::utils::{card_frame, change_color};
use crate::utils::format::format_percent;
use crate::utils::time_utils::epoch_sec_to_utc;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

/// Which tab and window a group shows. Persisted with the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabSelection {
    pub tab: usize,
    #[serde(default)]
    pub window: TimeWindow,
}

/// Series shaped for the two consumers of one result.
struct DerivedSeries {
    revision: u64,
    chart: ChartSeries,
    table: ChartSeries,
    failed_samples: usize,
}

struct TabChart {
    spec: &'static TabSpec,
    call: SeriesCall,
    derived: Option<DerivedSeries>,
}

impl TabChart {
    fn new(spec: &'static TabSpec) -> Self {
        Self {
            spec,
            call: SeriesCall::series(),
            derived: None,
        }
    }

    /// Rebuilds the derived series when the call has moved on.
    fn sync(&mut self) {
        let revision = self.call.revision();
        if self.derived.as_ref().is_some_and(|d| d.revision == revision) {
            return;
        }
        self.derived = self.call.state().result().map(|result| derive(self.spec, result, revision));
    }
}

fn derive(spec: &TabSpec, result: &SeriesResult, revision: u64) -> DerivedSeries {
    DerivedSeries {
        revision,
        chart: ChartSeries::from_metric(&spec.metric, result, SeriesOrder::Ascending),
        table: ChartSeries::from_metric(&spec.metric, result, SeriesOrder::Descending),
        failed_samples: result.errors.len(),
    }
}

pub struct TabGroup {
    id: &'static str,
    tabs: Vec<TabChart>,
    chart_view: ChartView,
}

impl TabGroup {
    pub fn new(id: &'static str, specs: &'static [TabSpec]) -> Self {
        Self {
            id,
            tabs: specs.iter().map(TabChart::new).collect(),
            chart_view: ChartView::new(),
        }
    }

    fn selected_index(&self, selection: &TabSelection) -> Option<usize> {
        if self.tabs.is_empty() {
            None
        } else {
            Some(selection.tab.min(self.tabs.len() - 1))
        }
    }

    /// Issues the historical run for the selected tab and window. Safe to call
    /// every frame; a window change supersedes the in-flight run and hidden
    /// tabs are cancelled.
    pub fn ensure(
        &mut self,
        gateway: &Arc<dyn ComputationGateway>,
        context: &ChainContext,
        selection: &TabSelection,
    ) {
        let Some(index) = self.selected_index(selection) else {
            return;
        };
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            if i != index {
                tab.call.cancel();
            }
        }
        let tab = &mut self.tabs[index];
        let metric = &tab.spec.metric;
        tab.call.run_historical_computation(
            gateway,
            metric.slug,
            metric_input(metric),
            context.clone(),
            &selection.window.historical(),
        );
    }

    pub fn refresh(&mut self, gateway: &Arc<dyn ComputationGateway>, selection: &TabSelection) {
        if let Some(index) = self.selected_index(selection) {
            self.tabs[index].call.refresh(gateway);
        }
    }

    /// Page left: cancel every in-flight run.
    pub fn cancel(&mut self) {
        for tab in &mut self.tabs {
            tab.call.cancel();
        }
    }

    /// Polls every tab. Returns `true` if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for tab in &mut self.tabs {
            if tab.call.poll() {
                changed = true;
            }
            tab.sync();
        }
        changed
    }

    pub fn is_loading(&self) -> bool {
        self.tabs.iter().any(|tab| tab.call.is_loading())
    }

    /// Latest value of the selected tab, formatted.
    pub fn headline(&self, selection: &TabSelection) -> Option<String> {
        let tab = &self.tabs[self.selected_index(selection)?];
        let latest = tab.derived.as_ref()?.chart.latest()?;
        Some(tab.spec.metric.format.format(latest.value))
    }

    /// Returns `true` if the selection changed.
    pub fn show(&self, ui: &mut Ui, selection: &mut TabSelection) -> bool {
        let Some(index) = self.selected_index(selection) else {
            return false;
        };
        let mut changed = false;

        card_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                for (i, tab) in self.tabs.iter().enumerate() {
                    if ui.selectable_label(i == index, tab.spec.label).clicked() && i != index {
                        #[cfg(debug_assertions)]
                        if DEBUG_FLAGS.print_ui_interactions {
                            log::info!("[{}] tab selected: {}", self.id, tab.spec.key);
                        }
                        selection.tab = i;
                        changed = true;
                    }
                }
                ui.separator();
                for window in WindowSelector::new(selection.window).render(ui) {
                    #[cfg(debug_assertions)]
                    if DEBUG_FLAGS.print_ui_interactions {
                        log::info!("[{}] window selected: {}", self.id, window);
                    }
                    selection.window = window;
                    changed = true;
                }
            });
            ui.add_space(6.0);

            let tab = &self.tabs[index];
            let id_salt = format!("{}_{}", self.id, tab.spec.key);
            show_call_state(ui, &id_salt, tab.call.state(), |ui, _result| match &tab.derived {
                Some(derived) if !derived.chart.is_empty() => {
                    self.show_headline(ui, tab, derived);
                    self.chart_view
                        .show(ui, &id_salt, &derived.chart, tab.spec.metric.format);
                    self.show_history(ui, &id_salt, tab, derived);
                }
                _ => ui.label_warning(UI_TEXT.no_data),
            });
        });

        changed
    }

    fn show_headline(&self, ui: &mut Ui, tab: &TabChart, derived: &DerivedSeries) {
        let metric = &tab.spec.metric;
        ui.horizontal(|ui| {
            if let Some(latest) = derived.chart.latest() {
                ui.label_subdued(UI_TEXT.chart_latest);
                ui.label_value(metric.format.format(latest.value), metric.color);
            }
            if let Some(change) = derived.chart.change() {
                ui.add_space(12.0);
                ui.metric(UI_TEXT.chart_change, &format_percent(change), change_color(change));
            }
            if derived.failed_samples > 0 {
                ui.add_space(12.0);
                ui.label_warning(format!("{} {}", derived.failed_samples, UI_TEXT.history_errors_suffix));
            }
        });
    }

    fn show_history(&self, ui: &mut Ui, id_salt: &str, tab: &TabChart, derived: &DerivedSeries) {
        ui.add_space(6.0);
        ui.label_subheader(UI_TEXT.history_heading);
        ScrollArea::vertical()
            .id_salt(("history", id_salt))
            .max_height(180.0)
            .show(ui, |ui| {
                Grid::new(("history_grid", id_salt))
                    .num_columns(2)
                    .spacing([40.0, 4.0])
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label_subdued(UI_TEXT.history_date);
                        ui.label_subdued(UI_TEXT.history_value);
                        ui.end_row();
                        for point in derived.table.points.iter().take(UI_CONFIG.history_rows) {
                            ui.label(RichText::new(epoch_sec_to_utc(point.timestamp)).monospace());
                            ui.label(tab.spec.metric.format.format(point.value));
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::METRICS;
    use crate::gateway::{GatewayOutcome, testing::ScriptedGateway};
    use crate::utils::TimeUtils;
    use serde_json::{Value, json};
    use std::time::Duration;

    const START: i64 = 1_700_006_400;

    fn price_series(days: i64) -> Value {
        let series: Vec<Value> = (0..days)
            .map(|day| {
                json!({
                    "sampleTimestamp": START + day * TimeUtils::SECS_IN_D,
                    "blockNumber": 18_000_000 + day,
                    "output": {"usdc_price": format!("{:.2}", 1.0 + day as f64 / 100.0)}
                })
            })
            .collect();
        json!({"series": series, "errors": []})
    }

    async fn settle(group: &mut TabGroup) {
        for _ in 0..300 {
            group.poll();
            if !group.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn selected_tab_loads_and_orders_per_consumer() {
        let scripted = Arc::new(ScriptedGateway::new().respond(
            "cmk-price",
            Duration::from_millis(5),
            GatewayOutcome::Success(price_series(30)),
        ));
        let gateway: Arc<dyn ComputationGateway> = scripted.clone();
        let mut group = TabGroup::new("token", METRICS.token_tabs);
        let selection = TabSelection::default();

        group.ensure(&gateway, &ChainContext::latest(1), &selection);
        settle(&mut group).await;

        let derived = group.tabs[0].derived.as_ref().expect("derived series");
        assert_eq!(derived.chart.points.first().map(|p| p.timestamp), Some(START));
        assert_eq!(
            derived.table.points.first().map(|p| p.timestamp),
            Some(START + 29 * TimeUtils::SECS_IN_D)
        );
        assert_eq!(group.headline(&selection).as_deref(), Some("$1.29"));
        assert_eq!(scripted.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn changing_window_issues_a_new_run() {
        let scripted = Arc::new(ScriptedGateway::new().respond(
            "cmk-price",
            Duration::from_millis(5),
            GatewayOutcome::Success(price_series(7)),
        ));
        let gateway: Arc<dyn ComputationGateway> = scripted.clone();
        let mut group = TabGroup::new("token", METRICS.token_tabs);
        let mut selection = TabSelection::default();

        group.ensure(&gateway, &ChainContext::latest(1), &selection);
        selection.window = TimeWindow::Week;
        group.ensure(&gateway, &ChainContext::latest(1), &selection);
        settle(&mut group).await;

        let last = scripted.requests().last().map(|r| r.input()["window"].clone());
        assert_eq!(last, Some(json!("7 days")));
        // Only the superseding run becomes visible
        assert_eq!(group.tabs[0].call.revision(), 1);
        assert_eq!(group.tabs[0].derived.as_ref().map(|d| d.chart.points.len()), Some(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn switching_tabs_cancels_the_hidden_run() {
        let scripted = Arc::new(ScriptedGateway::new().respond_to_all(
            Duration::from_millis(50),
            GatewayOutcome::Success(price_series(3)),
        ));
        let gateway: Arc<dyn ComputationGateway> = scripted.clone();
        let mut group = TabGroup::new("token", METRICS.token_tabs);
        let mut selection = TabSelection::default();

        group.ensure(&gateway, &ChainContext::latest(1), &selection);
        selection.tab = 1;
        group.ensure(&gateway, &ChainContext::latest(1), &selection);
        assert!(!group.tabs[0].call.is_loading());

        tokio::time::sleep(Duration::from_millis(150)).await;
        settle(&mut group).await;
        assert_eq!(group.tabs[0].call.revision(), 0);
        assert!(group.tabs[0].derived.is_none());
        assert_eq!(group.tabs[1].call.revision(), 1);

        selection.tab = 0;
        group.ensure(&gateway, &ChainContext::latest(1), &selection);
        assert!(group.tabs[0].call.is_loading());
        settle(&mut group).await;
        assert_eq!(group.tabs[0].call.revision(), 1);
    }

    #[test]
    fn out_of_range_selection_is_clamped() {
        let group = TabGroup::new("lending", METRICS.lending_tabs);
        let selection = TabSelection {
            tab: 99,
            window: TimeWindow::Month,
        };
        assert_eq!(group.selected_index(&selection), Some(METRICS.lending_tabs.len() - 1));
        assert_eq!(TabGroup::new("empty", &[]).selected_index(&selection), None);
    }
}
