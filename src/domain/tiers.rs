//! Subscription tiers shown on the comparison page. Static data.

pub struct Tier {
    pub name: &'static str,
    pub price: &'static str,
    pub blurb: &'static str,
}

pub struct TierFeature {
    pub label: &'static str,
    /// Availability per tier, same order as [`TIERS`]
    pub included: [bool; 3],
}

pub const TIERS: [Tier; 3] = [
    Tier {
        name: "Community",
        price: "Free",
        blurb: "Public dashboards and the model catalogue",
    },
    Tier {
        name: "Access Key",
        price: "Pay in CMK, xCMK or USDC",
        blurb: "An NFT key that meters gateway usage against deposited CMK",
    },
    Tier {
        name: "Enterprise",
        price: "Contact us",
        blurb: "Dedicated capacity, custom models and support",
    },
];

pub const TIER_FEATURES: &[TierFeature] = &[
    TierFeature {
        label: "Terminal dashboards",
        included: [true, true, true],
    },
    TierFeature {
        label: "Model catalogue",
        included: [true, true, true],
    },
    TierFeature {
        label: "Gateway API calls",
        included: [false, true, true],
    },
    TierFeature {
        label: "Historical runs",
        included: [false, true, true],
    },
    TierFeature {
        label: "Custom models",
        included: [false, false, true],
    },
    TierFeature {
        label: "Dedicated support",
        included: [false, false, true],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_tiers_include_everything_below() {
        for feature in TIER_FEATURES {
            for pair in feature.included.windows(2) {
                assert!(!pair[0] || pair[1], "{} dropped by a higher tier", feature.label);
            }
        }
    }
}
