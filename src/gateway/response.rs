use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::GATEWAY;

/// Error object the gateway embeds when the model itself failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelError {
    pub message: String,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub stack: Option<Value>,
}

impl ModelError {
    /// `code` is a string on most deployments, a number on some.
    pub fn code_label(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    /// Flattens the stack (array of frames or a plain string) to display lines.
    pub fn stack_lines(&self) -> Vec<String> {
        match &self.stack {
            Some(Value::Array(frames)) => frames
                .iter()
                .map(|frame| match frame {
                    Value::String(s) => s.clone(),
                    Value::Object(map) => {
                        let slug = map.get("slug").and_then(Value::as_str).unwrap_or("?");
                        let version = map.get("version").and_then(Value::as_str).unwrap_or("?");
                        match map.get("blockNumber") {
                            Some(block) => format!("{} v{} @ {}", slug, version, block),
                            None => format!("{} v{}", slug, version),
                        }
                    }
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) => s.lines().map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code_label() {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// What came back from one gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome<T = Value> {
    Success(T),
    /// The gateway ran but the model failed
    DomainError(ModelError),
    /// The gateway could not be reached or answered with something unusable
    TransportError(String),
}

impl GatewayOutcome<Value> {
    /// Decodes a successful output. A shape mismatch is reported as a
    /// transport error: the gateway answered, but not with what we asked for.
    pub fn decode_with<T>(self, decode: fn(Value) -> Result<T, String>) -> GatewayOutcome<T> {
        match self {
            GatewayOutcome::Success(value) => match decode(value) {
                Ok(decoded) => GatewayOutcome::Success(decoded),
                Err(e) => GatewayOutcome::TransportError(format!("unexpected output shape: {}", e)),
            },
            GatewayOutcome::DomainError(e) => GatewayOutcome::DomainError(e),
            GatewayOutcome::TransportError(e) => GatewayOutcome::TransportError(e),
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<ModelError>,
}

/// Interprets a gateway HTTP response.
///
/// An embedded `error` object wins regardless of status; `output` is only
/// accepted on a 2xx; anything else is a transport error.
pub fn parse_gateway_response(status: u16, body: &str) -> GatewayOutcome {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<WireResponse>(body) {
        Ok(WireResponse {
            error: Some(error), ..
        }) => GatewayOutcome::DomainError(error),
        Ok(WireResponse {
            output: Some(output),
            ..
        }) if success => GatewayOutcome::Success(output),
        Ok(_) if success => {
            GatewayOutcome::TransportError("response carried neither output nor error".to_string())
        }
        Ok(_) => GatewayOutcome::TransportError(format!("gateway returned HTTP {}", status)),
        Err(_) if !success => {
            GatewayOutcome::TransportError(format!("gateway returned HTTP {}", status))
        }
        Err(e) => GatewayOutcome::TransportError(format!("malformed response body: {}", e)),
    }
}

/// One sample of a historical run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSample {
    /// Seconds since epoch
    pub sample_timestamp: i64,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: Option<i64>,
    pub output: Value,
}

/// A sample the wrapper model could not compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesItemError {
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub sample_timestamp: Option<i64>,
    pub error: ModelError,
}

/// Output of the historical wrapper model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    #[serde(default)]
    pub series: Vec<SeriesSample>,
    #[serde(default)]
    pub errors: Vec<SeriesItemError>,
}

impl SeriesResult {
    pub fn decode(value: Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

/// Point-mode outputs are kept opaque.
pub fn decode_point(value: Value) -> Result<Value, String> {
    Ok(value)
}

/// Error surfaced to a view through its Call State.
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// Rejected before any network traffic (e.g. empty slug)
    InvalidRequest(String),
    /// The model failed; shown verbatim
    Domain(ModelError),
    /// Network / HTTP / decoding failure; the detail is for the log only
    Transport(String),
}

impl CallError {
    pub fn is_domain(&self) -> bool {
        matches!(self, CallError::Domain(_))
    }

    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            CallError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::InvalidRequest(reason) => write!(f, "Invalid request: {}", reason),
            CallError::Domain(e) => write!(f, "{}", e),
            CallError::Transport(_) => write!(f, "{}", GATEWAY.transport_error_message),
        }
    }
}

impl std::error::Error for CallError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn output_on_success_is_success() {
        let outcome = parse_gateway_response(200, r#"{"slug":"cmk-price","output":{"usdc_price":"1.23"}}"#);
        assert_eq!(outcome, GatewayOutcome::Success(json!({"usdc_price": "1.23"})));
    }

    #[test]
    fn embedded_error_is_domain_error_even_on_2xx() {
        let body = r#"{"error":{"message":"No price for CMK","code":"ModelDataError","stack":[{"slug":"cmk-price","version":"1.0","blockNumber":123}]}}"#;
        match parse_gateway_response(200, body) {
            GatewayOutcome::DomainError(e) => {
                assert_eq!(e.message, "No price for CMK");
                assert_eq!(e.code_label().as_deref(), Some("ModelDataError"));
                assert_eq!(e.stack_lines(), vec!["cmk-price v1.0 @ 123".to_string()]);
            }
            other => panic!("expected domain error, got {:?}", other),
        }
    }

    #[test]
    fn structured_error_on_4xx_is_still_domain() {
        let body = r#"{"error":{"message":"Missing input","code":400}}"#;
        match parse_gateway_response(400, body) {
            GatewayOutcome::DomainError(e) => assert_eq!(e.code_label().as_deref(), Some("400")),
            other => panic!("expected domain error, got {:?}", other),
        }
    }

    #[test]
    fn unstructured_failures_are_transport_errors() {
        assert!(matches!(
            parse_gateway_response(502, "<html>Bad Gateway</html>"),
            GatewayOutcome::TransportError(_)
        ));
        assert!(matches!(
            parse_gateway_response(200, "not json"),
            GatewayOutcome::TransportError(_)
        ));
        assert!(matches!(
            parse_gateway_response(200, r#"{"slug":"x"}"#),
            GatewayOutcome::TransportError(_)
        ));
        assert!(matches!(
            parse_gateway_response(500, r#"{"output":{}}"#),
            GatewayOutcome::TransportError(_)
        ));
    }

    #[test]
    fn series_decodes_with_errors() {
        let output = json!({
            "series": [
                {"sampleTimestamp": 1700000000, "blockNumber": 1, "output": {"usdc_price": "1.23"}},
                {"sampleTimestamp": 1700086400, "blockNumber": 2, "blockTimestamp": 1700086399, "output": {"usdc_price": 1.3}}
            ],
            "errors": [
                {"blockNumber": 3, "sampleTimestamp": 1700172800, "error": {"message": "boom"}}
            ]
        });
        let series = SeriesResult::decode(output).unwrap();
        assert_eq!(series.series.len(), 2);
        assert_eq!(series.series[1].block_timestamp, Some(1_700_086_399));
        assert_eq!(series.errors[0].error.message, "boom");
    }

    #[test]
    fn decode_failure_becomes_transport_error() {
        let outcome = GatewayOutcome::Success(json!({"series": "nope"})).decode_with(SeriesResult::decode);
        assert!(matches!(outcome, GatewayOutcome::TransportError(_)));
    }

    #[test]
    fn transport_error_displays_generic_message() {
        let error = CallError::Transport("connection refused".to_string());
        assert_eq!(error.to_string(), GATEWAY.transport_error_message);
        let domain = CallError::Domain(ModelError {
            message: "bad".into(),
            code: None,
            details: None,
            stack: None,
        });
        assert_eq!(domain.to_string(), "bad");
    }
}
