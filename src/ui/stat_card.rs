use eframe::egui::Ui;
use serde_json::Value;
use std::sync::Arc;

use crate::config::metrics::MetricSpec;
use crate::domain::chart_series::extract_number;
use crate::gateway::{ChainContext, ComputationGateway, PointCall};
use crate::ui::config::{UI_CONFIG, UI_TEXT};
use crate::ui::styles::UiStyleExt;
use crate::ui::ui_panels::show_call_state;
use crate::ui::utils::card_frame;

/// Parses a catalogue input literal. A broken literal becomes `null`, which
/// the gateway rejects with a model error the card then shows.
pub fn metric_input(metric: &MetricSpec) -> Value {
    serde_json::from_str(metric.input).unwrap_or_else(|e| {
        log::error!("Bad input literal for {}: {}", metric.key, e);
        Value::Null
    })
}

/// Label plus latest value of one point-mode model.
pub struct StatCard {
    metric: &'static MetricSpec,
    call: PointCall,
}

impl StatCard {
    pub fn new(metric: &'static MetricSpec) -> Self {
        Self {
            metric,
            call: PointCall::point(),
        }
    }

    pub fn metric(&self) -> &'static MetricSpec {
        self.metric
    }

    /// Issues the card's request. Safe to call every frame.
    pub fn ensure(&mut self, gateway: &Arc<dyn ComputationGateway>, context: &ChainContext) {
        self.call
            .run_computation(gateway, self.metric.slug, metric_input(self.metric), context.clone());
    }

    pub fn refresh(&mut self, gateway: &Arc<dyn ComputationGateway>) {
        self.call.refresh(gateway);
    }

    /// Page left: drop whatever is in flight.
    pub fn cancel(&mut self) {
        self.call.cancel();
    }

    pub fn poll(&mut self) -> bool {
        self.call.poll()
    }

    pub fn is_loading(&self) -> bool {
        self.call.is_loading()
    }

    /// Formatted value, `None` until loaded or if the output has no number
    /// where the catalogue says it is.
    pub fn display_value(&self) -> Option<String> {
        let output = self.call.state().result()?;
        extract_number(output, self.metric.value_pointer).map(|v| self.metric.format.format(v))
    }

    pub fn show(&self, ui: &mut Ui) {
        card_frame().show(ui, |ui| {
            ui.set_width(UI_CONFIG.card_width);
            ui.label_subdued(self.metric.label);
            show_call_state(ui, self.metric.key, self.call.state(), |ui, _output| {
                match self.display_value() {
                    Some(value) => ui.label_value(value, self.metric.color),
                    None => ui.label_warning(UI_TEXT.no_data),
                }
            });
        });
    }
}

/// Cards shown side by side on one page.
pub struct StatCardRow {
    cards: Vec<StatCard>,
}

impl StatCardRow {
    pub fn new(metrics: &'static [MetricSpec]) -> Self {
        Self {
            cards: metrics.iter().map(StatCard::new).collect(),
        }
    }

    pub fn ensure(&mut self, gateway: &Arc<dyn ComputationGateway>, context: &ChainContext) {
        for card in &mut self.cards {
            card.ensure(gateway, context);
        }
    }

    pub fn refresh(&mut self, gateway: &Arc<dyn ComputationGateway>) {
        for card in &mut self.cards {
            card.refresh(gateway);
        }
    }

    pub fn cancel(&mut self) {
        self.cards.iter_mut().for_each(StatCard::cancel);
    }

    /// Returns `true` if any card changed.
    pub fn poll(&mut self) -> bool {
        self.cards.iter_mut().fold(false, |changed, card| card.poll() | changed)
    }

    pub fn is_loading(&self) -> bool {
        self.cards.iter().any(StatCard::is_loading)
    }

    pub fn show(&self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            for card in &self.cards {
                card.show(ui);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::METRICS;
    use crate::gateway::{GatewayOutcome, ModelError, testing::ScriptedGateway};
    use serde_json::json;
    use std::time::Duration;

    async fn settle(card: &mut StatCard) {
        for _ in 0..300 {
            card.poll();
            if !card.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn card_formats_the_catalogued_value() {
        let metric = &METRICS.token_cards[0];
        let gateway: Arc<dyn ComputationGateway> = Arc::new(ScriptedGateway::new().respond(
            metric.slug,
            Duration::from_millis(5),
            GatewayOutcome::Success(json!({"usdc_price": "1.23"})),
        ));

        let mut card = StatCard::new(metric);
        card.ensure(&gateway, &ChainContext::latest(1));
        assert!(card.is_loading());
        settle(&mut card).await;

        assert_eq!(card.display_value().as_deref(), Some("$1.23"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn ensuring_every_frame_sends_one_request() {
        let metric = &METRICS.token_cards[0];
        let scripted = Arc::new(ScriptedGateway::new().respond(
            metric.slug,
            Duration::from_millis(5),
            GatewayOutcome::Success(json!({"usdc_price": 2})),
        ));
        let gateway: Arc<dyn ComputationGateway> = scripted.clone();

        let mut card = StatCard::new(metric);
        for _ in 0..5 {
            card.ensure(&gateway, &ChainContext::latest(1));
        }
        settle(&mut card).await;
        card.ensure(&gateway, &ChainContext::latest(1));

        assert_eq!(scripted.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn model_error_leaves_no_value() {
        let metric = &METRICS.lending_cards[0];
        let gateway: Arc<dyn ComputationGateway> = Arc::new(ScriptedGateway::new().respond(
            metric.slug,
            Duration::from_millis(5),
            GatewayOutcome::DomainError(ModelError {
                message: "No pool data".to_string(),
                code: Some(json!("ModelDataError")),
                details: None,
                stack: None,
            }),
        ));

        let mut card = StatCard::new(metric);
        card.ensure(&gateway, &ChainContext::latest(1));
        settle(&mut card).await;

        assert_eq!(card.display_value(), None);
        assert!(card.call.state().error().is_some_and(|e| e.is_domain()));
    }

    #[test]
    fn catalogue_inputs_parse() {
        for metric in METRICS.token_cards.iter().chain(METRICS.lending_cards.iter()) {
            assert!(!metric_input(metric).is_null(), "{}", metric.key);
        }
    }
}
