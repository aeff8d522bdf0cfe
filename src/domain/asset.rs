use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// ERC-20s the wallet flows move around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Asset {
    #[strum(to_string = "CMK")]
    Cmk,
    #[strum(to_string = "xCMK")]
    Xcmk,
    #[strum(to_string = "USDC")]
    Usdc,
}

impl Asset {
    pub fn decimals(&self) -> u32 {
        match self {
            Asset::Cmk | Asset::Xcmk => 18,
            Asset::Usdc => 6,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Cmk => "CMK",
            Asset::Xcmk => "xCMK",
            Asset::Usdc => "USDC",
        }
    }
}
