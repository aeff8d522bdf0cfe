use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

use crate::config::GATEWAY;
use crate::utils::TimeUtils;

/// Block the model is evaluated at. Serialises as `"latest"` or a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockNumber {
    #[default]
    Latest,
    Number(u64),
}

impl Serialize for BlockNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockNumber::Latest => serializer.serialize_str("latest"),
            BlockNumber::Number(n) => serializer.serialize_u64(*n),
        }
    }
}

impl FromStr for BlockNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("latest") {
            return Ok(BlockNumber::Latest);
        }
        s.parse::<u64>()
            .map(BlockNumber::Number)
            .map_err(|_| format!("block must be a number or \"latest\", got {:?}", s))
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockNumber::Latest => write!(f, "latest"),
            BlockNumber::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Which chain, which block and (optionally) which model version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainContext {
    pub chain_id: u64,
    pub block_number: BlockNumber,
    pub version: Option<String>,
}

impl ChainContext {
    pub fn latest(chain_id: u64) -> Self {
        Self {
            chain_id,
            block_number: BlockNumber::Latest,
            version: None,
        }
    }

    pub fn at_block(mut self, block_number: BlockNumber) -> Self {
        self.block_number = block_number;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl Default for ChainContext {
    fn default() -> Self {
        Self::latest(GATEWAY.default_chain_id)
    }
}

/// Window + sampling interval for a historical run, already in gateway
/// duration syntax (`"30 days"`, `"1 day"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoricalWindow {
    pub window: String,
    pub interval: String,
}

impl HistoricalWindow {
    pub fn new(window: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            window: window.into(),
            interval: interval.into(),
        }
    }

    pub fn from_days(window_days: i64, interval_days: i64) -> Self {
        Self::new(
            TimeUtils::duration_string(window_days * TimeUtils::SECS_IN_D),
            TimeUtils::duration_string(interval_days * TimeUtils::SECS_IN_D),
        )
    }
}

/// Canonical identity of a request: its wire body as a JSON string with
/// object keys sorted at every level, so equal requests give equal keys.
pub type RequestKey = String;

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = serde_json::Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// The body that goes over the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest<'a> {
    pub slug: &'a str,
    pub chain_id: u64,
    pub block_number: BlockNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    pub input: &'a Value,
}

/// A named model run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputationRequest {
    slug: String,
    input: Value,
    context: ChainContext,
}

impl ComputationRequest {
    pub fn new(slug: impl Into<String>, input: Value, context: ChainContext) -> Self {
        Self {
            slug: slug.into(),
            input,
            context,
        }
    }

    /// Wraps `base` in the historical wrapper model. The wrapper runs at the
    /// same chain/block; a pinned base version travels inside the input.
    pub fn historical(base: &ComputationRequest, window: &HistoricalWindow) -> Self {
        let mut input = json!({
            "model_slug": base.slug,
            "model_input": base.input,
            "window": window.window,
            "interval": window.interval,
        });
        if let (Some(version), Some(map)) = (&base.context.version, input.as_object_mut()) {
            map.insert("model_version".to_string(), Value::String(version.clone()));
        }

        Self {
            slug: GATEWAY.historical_slug.to_string(),
            input,
            context: ChainContext {
                chain_id: base.context.chain_id,
                block_number: base.context.block_number,
                version: None,
            },
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn context(&self) -> &ChainContext {
        &self.context
    }

    /// Slug must be non-empty. Input is a `serde_json::Value`, so it is
    /// serialisable by construction.
    pub fn validate(&self) -> Result<(), String> {
        if self.slug.trim().is_empty() {
            return Err("model slug must not be empty".to_string());
        }
        Ok(())
    }

    pub fn wire_body(&self) -> WireRequest<'_> {
        WireRequest {
            slug: &self.slug,
            chain_id: self.context.chain_id,
            block_number: self.context.block_number,
            version: self.context.version.as_deref(),
            input: &self.input,
        }
    }

    pub fn key(&self) -> RequestKey {
        match serde_json::to_value(self.wire_body()) {
            Ok(body) => canonicalize(&body).to_string(),
            Err(_) => format!(
                "{}@{}:{}:{}",
                self.slug, self.context.chain_id, self.context.block_number, self.input
            ),
        }
    }
}
