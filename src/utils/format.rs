//! Number formatting shared by stat cards, chart headlines and wallet balances.

use ethers::types::Address;

/// How a metric value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Dollar amount, shortened above a thousand
    Usd,
    /// Fraction rendered as a percentage (0.1234 -> 12.34%)
    Percent,
    /// Plain ratio with two decimals (LCR-style)
    Ratio,
    /// Plain shortened number
    Number,
    /// Shortened number followed by a token symbol
    Token(&'static str),
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Usd => format_usd(value),
            ValueFormat::Percent => format_percent(value),
            ValueFormat::Ratio => format!("{:.2}", value),
            ValueFormat::Number => shorten_number(value, 2),
            ValueFormat::Token(symbol) => format!("{} {}", shorten_number(value, 2), symbol),
        }
    }

    /// Shorter variant for axis labels.
    pub fn format_axis(&self, value: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{:.1}%", value * 100.0),
            ValueFormat::Ratio => format!("{:.2}", value),
            ValueFormat::Usd => format!("${}", shorten_number(value, 1)),
            ValueFormat::Number | ValueFormat::Token(_) => shorten_number(value, 1),
        }
    }
}

/// 1234.5 -> `1.23K`, 5_600_000 -> `5.60M`. Values below a thousand keep `decimals`.
pub fn shorten_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    const SCALES: [(f64, &str); 5] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

    // The suffix follows the printed value: 999_999 is `1.00M`, not `1000.00K`
    let abs = value.abs();
    let (divisor, suffix) = SCALES
        .iter()
        .copied()
        .find(|(divisor, _)| round_to(abs / divisor, decimals) < 1000.0)
        .unwrap_or(SCALES[SCALES.len() - 1]);
    format!("{:.*}{}", decimals, value / divisor, suffix)
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Dollar formatting with "trader precision" for small values.
/// - Large (>= 1000): shortened ($95.12K)
/// - Normal (>= 1): 2 decimals ($1.23)
/// - Pennies (>= 0.01): 4 decimals ($0.0123)
/// - Sub-penny: 8 decimals
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    if value == 0.0 {
        return "$0.00".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let body = if round_to(abs, 2) >= 1000.0 {
        shorten_number(abs, 2)
    } else if round_to(abs, 2) >= 1.0 {
        format!("{:.2}", abs)
    } else if round_to(abs, 4) >= 0.01 {
        format!("{:.4}", abs)
    } else {
        format!("{:.8}", abs)
    };
    format!("{}${}", sign, body)
}

pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return "-".to_string();
    }
    format!("{:.2}%", fraction * 100.0)
}

/// `0x68cf…533e`
pub fn shorten_address(address: &Address) -> String {
    let full = format!("{:?}", address);
    if full.len() <= 12 {
        return full;
    }
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}
