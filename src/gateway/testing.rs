//! Scripted gateway for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::client::ComputationGateway;
use super::request::ComputationRequest;
use super::response::GatewayOutcome;
use crate::config::GATEWAY;

/// Answers by model slug after a fixed delay. Historical requests are
/// looked up by the wrapped model's slug.
pub struct ScriptedGateway {
    script: HashMap<String, (Duration, GatewayOutcome)>,
    fallback: Option<(Duration, GatewayOutcome)>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    requests: Mutex<Vec<ComputationRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, slug: &str, delay: Duration, outcome: GatewayOutcome) -> Self {
        self.script.insert(slug.to_string(), (delay, outcome));
        self
    }

    /// Answer for every slug without its own script.
    pub fn respond_to_all(mut self, delay: Duration, outcome: GatewayOutcome) -> Self {
        self.fallback = Some((delay, outcome));
        self
    }

    /// Requests that reached the gateway.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests that ran to completion (not cancelled mid-flight).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ComputationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn lookup_slug(request: &ComputationRequest) -> String {
        if request.slug() == GATEWAY.historical_slug {
            request.input()["model_slug"].as_str().unwrap_or_default().to_string()
        } else {
            request.slug().to_string()
        }
    }
}

#[async_trait]
impl ComputationGateway for ScriptedGateway {
    async fn run(&self, request: &ComputationRequest) -> GatewayOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self.script.get(&Self::lookup_slug(request)).or(self.fallback.as_ref());
        let Some((delay, outcome)) = scripted.cloned() else {
            return GatewayOutcome::TransportError(format!("no script for {}", request.slug()));
        };
        tokio::time::sleep(delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    fn signature(&self) -> &'static str {
        "Scripted gateway"
    }
}
