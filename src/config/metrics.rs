//! Catalogue of the metrics the terminal renders.
//!
//! Each entry names a gateway model, the input it is run with, and where the
//! number lives inside the (otherwise opaque) model output.

use eframe::egui::Color32;

use crate::utils::format::ValueFormat;

pub struct MetricSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub slug: &'static str,
    /// JSON literal, parsed when the request is built
    pub input: &'static str,
    /// JSON pointer into the model output (RFC 6901)
    pub value_pointer: &'static str,
    pub format: ValueFormat,
    pub color: Color32,
}

/// One tab of a tab group: a label plus the chart it shows.
pub struct TabSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub metric: MetricSpec,
}

pub struct MetricsCatalogue {
    pub token_cards: &'static [MetricSpec],
    pub token_tabs: &'static [TabSpec],
    pub lending_cards: &'static [MetricSpec],
    pub lending_tabs: &'static [TabSpec],
}

const CMK_PRICE: MetricSpec = MetricSpec {
    key: "cmk_price",
    label: "CMK Price",
    slug: "cmk-price",
    input: "{}",
    value_pointer: "/usdc_price",
    format: ValueFormat::Usd,
    color: Color32::from_rgb(0, 191, 255),
};

const CMK_STAKED: MetricSpec = MetricSpec {
    key: "cmk_staked",
    label: "CMK Staked",
    slug: "xcmk.cmk-staked",
    input: "{}",
    value_pointer: "/value",
    format: ValueFormat::Token("CMK"),
    color: Color32::from_rgb(130, 200, 140),
};

const XCMK_SUPPLY: MetricSpec = MetricSpec {
    key: "xcmk_supply",
    label: "xCMK Supply",
    slug: "xcmk.total-supply",
    input: "{}",
    value_pointer: "/value",
    format: ValueFormat::Token("xCMK"),
    color: Color32::from_rgb(180, 160, 230),
};

const STAKING_APR: MetricSpec = MetricSpec {
    key: "staking_apr",
    label: "Staking APR",
    slug: "xcmk.staking-apr",
    input: "{}",
    value_pointer: "/apr",
    format: ValueFormat::Percent,
    color: Color32::from_rgb(255, 215, 0),
};

const CIRCULATING_SUPPLY: MetricSpec = MetricSpec {
    key: "circulating_supply",
    label: "Circulating Supply",
    slug: "cmk.circulating-supply",
    input: "{}",
    value_pointer: "/result",
    format: ValueFormat::Token("CMK"),
    color: Color32::from_rgb(255, 165, 0),
};

const AAVE_LCR: MetricSpec = MetricSpec {
    key: "aave_lcr",
    label: "Aave V2 LCR",
    slug: "aave-v2.lcr",
    input: "{}",
    value_pointer: "/lcr",
    format: ValueFormat::Ratio,
    color: Color32::from_rgb(182, 80, 158),
};

const AAVE_VAR: MetricSpec = MetricSpec {
    key: "aave_var",
    label: "Aave V2 VaR",
    slug: "aave-v2.var",
    input: r#"{"window": "30 days", "confidence": 0.99}"#,
    value_pointer: "/var",
    format: ValueFormat::Usd,
    color: Color32::from_rgb(255, 145, 164),
};

const COMPOUND_LCR: MetricSpec = MetricSpec {
    key: "compound_lcr",
    label: "Compound V2 LCR",
    slug: "compound-v2.lcr",
    input: "{}",
    value_pointer: "/lcr",
    format: ValueFormat::Ratio,
    color: Color32::from_rgb(0, 211, 149),
};

const COMPOUND_VAR: MetricSpec = MetricSpec {
    key: "compound_var",
    label: "Compound V2 VaR",
    slug: "compound-v2.var",
    input: r#"{"window": "30 days", "confidence": 0.99}"#,
    value_pointer: "/var",
    format: ValueFormat::Usd,
    color: Color32::from_rgb(0, 255, 255),
};

pub const METRICS: MetricsCatalogue = MetricsCatalogue {
    token_cards: &[CMK_PRICE, CMK_STAKED, STAKING_APR, CIRCULATING_SUPPLY],
    token_tabs: &[
        TabSpec {
            key: "price",
            label: "Price",
            metric: CMK_PRICE,
        },
        TabSpec {
            key: "staked",
            label: "Staked CMK",
            metric: CMK_STAKED,
        },
        TabSpec {
            key: "xcmk",
            label: "xCMK Supply",
            metric: XCMK_SUPPLY,
        },
        TabSpec {
            key: "apr",
            label: "Staking APR",
            metric: STAKING_APR,
        },
    ],
    lending_cards: &[AAVE_LCR, AAVE_VAR, COMPOUND_LCR, COMPOUND_VAR],
    lending_tabs: &[
        TabSpec {
            key: "aave_lcr",
            label: "Aave LCR",
            metric: AAVE_LCR,
        },
        TabSpec {
            key: "aave_var",
            label: "Aave VaR",
            metric: AAVE_VAR,
        },
        TabSpec {
            key: "compound_lcr",
            label: "Compound LCR",
            metric: COMPOUND_LCR,
        },
        TabSpec {
            key: "compound_var",
            label: "Compound VaR",
            metric: COMPOUND_VAR,
        },
    ],
};

/// Looks a metric up by slug across the whole catalogue.
pub fn find_metric(slug: &str) -> Option<&'static MetricSpec> {
    METRICS
        .token_cards
        .iter()
        .chain(METRICS.lending_cards.iter())
        .chain(METRICS.token_tabs.iter().map(|tab| &tab.metric))
        .chain(METRICS.lending_tabs.iter().map(|tab| &tab.metric))
        .find(|metric| metric.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_metric_input_is_valid_json() {
        for tab in METRICS.token_tabs.iter().chain(METRICS.lending_tabs.iter()) {
            let parsed: Result<serde_json::Value, _> = serde_json::from_str(tab.metric.input);
            assert!(parsed.is_ok(), "bad input literal for {}", tab.key);
            assert!(tab.metric.value_pointer.starts_with('/'));
        }
    }

    #[test]
    fn tab_keys_are_unique_within_a_group() {
        for group in [METRICS.token_tabs, METRICS.lending_tabs] {
            let mut keys: Vec<&str> = group.iter().map(|t| t.key).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), group.len());
        }
    }

    #[test]
    fn finds_price_metric_by_slug() {
        let metric = find_metric("cmk-price").expect("price metric");
        assert_eq!(metric.value_pointer, "/usdc_price");
        assert!(find_metric("does-not-exist").is_none());
    }
}
