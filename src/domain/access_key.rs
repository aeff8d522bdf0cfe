use ethers::types::U256;

use super::asset::Asset;
use crate::utils::TimeUtils;

/// An access key NFT held by the connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub token_id: U256,
    /// CMK locked in the key, base units
    pub cmk_value: U256,
    /// Subscription fees accrued so far, base units of CMK
    pub fees_accumulated: U256,
}

impl AccessKey {
    /// Value left after fees. Zero once the fees exceed the deposit.
    pub fn net_value(&self) -> U256 {
        self.cmk_value.saturating_sub(self.fees_accumulated)
    }
}

/// Per-second price of extending a key's expiry, per payment asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionRates {
    pub cmk_per_sec: U256,
    pub xcmk_per_sec: U256,
    pub usdc_per_sec: U256,
}

impl ExtensionRates {
    pub fn per_sec(&self, asset: Asset) -> U256 {
        match asset {
            Asset::Cmk => self.cmk_per_sec,
            Asset::Xcmk => self.xcmk_per_sec,
            Asset::Usdc => self.usdc_per_sec,
        }
    }

    /// `perSec * days * 86400`, saturating.
    pub fn cost(&self, asset: Asset, days: u64) -> U256 {
        self.per_sec(asset)
            .saturating_mul(U256::from(days))
            .saturating_mul(U256::from(TimeUtils::SECS_IN_D as u64))
    }
}
