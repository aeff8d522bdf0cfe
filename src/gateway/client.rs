use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

use super::request::ComputationRequest;
use super::response::{GatewayOutcome, parse_gateway_response};

/// Anything that can run a named model. The HTTP gateway in production,
/// scripted fakes in tests.
#[async_trait]
pub trait ComputationGateway: Send + Sync {
    async fn run(&self, request: &ComputationRequest) -> GatewayOutcome;

    /// A unique identifier for this implementation (so the logs say which one answered).
    fn signature(&self) -> &'static str;
}

/// `POST {url}` with a JSON body, one request per call, no retries.
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build gateway HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ComputationGateway for HttpGateway {
    async fn run(&self, request: &ComputationRequest) -> GatewayOutcome {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_gateway_bodies {
            log::info!(
                "POST {} {}",
                self.url,
                serde_json::to_string(&request.wire_body()).unwrap_or_default()
            );
        }

        let response = match self
            .client
            .post(&self.url)
            .json(&request.wire_body())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return GatewayOutcome::TransportError(e.to_string()),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => parse_gateway_response(status, &body),
            Err(e) => GatewayOutcome::TransportError(format!("failed to read body: {}", e)),
        }
    }

    fn signature(&self) -> &'static str {
        "HTTP gateway"
    }
}
