//! Human-readable ABIs and calldata for the handful of contracts the terminal touches.

use anyhow::{Context, Result};
use ethers::abi::{Abi, Token, parse_abi};
use ethers::types::{Address, Bytes, U256};

use crate::domain::Asset;

const ERC20_ABI: &[&str] = &[
    "function approve(address spender, uint256 amount) returns (bool)",
    "function allowance(address owner, address spender) view returns (uint256)",
    "function balanceOf(address owner) view returns (uint256)",
    "function totalSupply() view returns (uint256)",
];

const STAKING_ABI: &[&str] = &[
    "function balanceOf(address owner) view returns (uint256)",
    "function totalSupply() view returns (uint256)",
    "function createShare(uint256 cmkAmount) returns (uint256)",
    "function removeShare(uint256 shareAmount) returns (uint256)",
    "function cmkToShares(uint256 cmkAmount) view returns (uint256)",
    "function sharesToCmk(uint256 shareAmount) view returns (uint256)",
];

const ACCESS_KEY_ABI: &[&str] = &[
    "function balanceOf(address owner) view returns (uint256)",
    "function totalSupply() view returns (uint256)",
    "function tokenOfOwnerByIndex(address owner, uint256 index) view returns (uint256)",
    "function mint(uint256 amount)",
    "function burn(uint256 tokenId)",
    "function addCmk(uint256 tokenId, uint256 amount)",
    "function cmkValue(uint256 tokenId) view returns (uint256)",
    "function feesAccumulated(uint256 tokenId) view returns (uint256)",
];

const ACCESS_FACTORY_ABI: &[&str] = &[
    "function extendTokenExpiry(uint256 tokenId, uint256 cmkAmount, uint256 xcmkAmount, uint256 usdcAmount)",
    "function cmkPerSec() view returns (uint256)",
    "function xcmkPerSec() view returns (uint256)",
    "function usdcPerSec() view returns (uint256)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Erc20,
    /// xCMK: an ERC-20 share token wrapping staked CMK
    Staking,
    AccessKey,
    /// Prices and collects access key expiry extensions
    AccessFactory,
}

impl ContractKind {
    fn human_readable(&self) -> &'static [&'static str] {
        match self {
            ContractKind::Erc20 => ERC20_ABI,
            ContractKind::Staking => STAKING_ABI,
            ContractKind::AccessKey => ACCESS_KEY_ABI,
            ContractKind::AccessFactory => ACCESS_FACTORY_ABI,
        }
    }

    pub fn abi(&self) -> Result<Abi> {
        parse_abi(self.human_readable()).with_context(|| format!("failed to parse {:?} ABI", self))
    }
}

/// One contract function invocation, encodable to calldata.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub to: Address,
    pub kind: ContractKind,
    pub function: &'static str,
    pub args: Vec<Token>,
}

impl ContractCall {
    pub fn new(to: Address, kind: ContractKind, function: &'static str, args: Vec<Token>) -> Self {
        Self {
            to,
            kind,
            function,
            args,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let abi = self.kind.abi()?;
        let function = abi
            .function(self.function)
            .with_context(|| format!("{:?} has no function {}", self.kind, self.function))?;
        let data = function
            .encode_input(&self.args)
            .with_context(|| format!("failed to encode {}", self.describe()))?;
        Ok(data.into())
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>> {
        let abi = self.kind.abi()?;
        let function = abi
            .function(self.function)
            .with_context(|| format!("{:?} has no function {}", self.kind, self.function))?;
        function
            .decode_output(data)
            .with_context(|| format!("failed to decode output of {}", self.describe()))
    }

    /// `mint(1000000000000000000)`
    pub fn describe(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|token| match token {
                Token::Address(a) => format!("{:?}", a),
                Token::Uint(v) => v.to_string(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.function, args)
    }

    // ERC-20

    pub fn approve(token: Address, spender: Address, amount: U256) -> Self {
        Self::new(
            token,
            ContractKind::Erc20,
            "approve",
            vec![Token::Address(spender), Token::Uint(amount)],
        )
    }

    pub fn allowance(token: Address, owner: Address, spender: Address) -> Self {
        Self::new(
            token,
            ContractKind::Erc20,
            "allowance",
            vec![Token::Address(owner), Token::Address(spender)],
        )
    }

    pub fn balance_of(token: Address, kind: ContractKind, owner: Address) -> Self {
        Self::new(token, kind, "balanceOf", vec![Token::Address(owner)])
    }

    pub fn total_supply(token: Address, kind: ContractKind) -> Self {
        Self::new(token, kind, "totalSupply", Vec::new())
    }

    // Staking

    pub fn create_share(staking: Address, cmk_amount: U256) -> Self {
        Self::new(staking, ContractKind::Staking, "createShare", vec![Token::Uint(cmk_amount)])
    }

    pub fn remove_share(staking: Address, shares: U256) -> Self {
        Self::new(staking, ContractKind::Staking, "removeShare", vec![Token::Uint(shares)])
    }

    pub fn cmk_to_shares(staking: Address, cmk_amount: U256) -> Self {
        Self::new(staking, ContractKind::Staking, "cmkToShares", vec![Token::Uint(cmk_amount)])
    }

    pub fn shares_to_cmk(staking: Address, shares: U256) -> Self {
        Self::new(staking, ContractKind::Staking, "sharesToCmk", vec![Token::Uint(shares)])
    }

    // Access key

    pub fn mint_key(access_key: Address, cmk_amount: U256) -> Self {
        Self::new(access_key, ContractKind::AccessKey, "mint", vec![Token::Uint(cmk_amount)])
    }

    pub fn burn_key(access_key: Address, token_id: U256) -> Self {
        Self::new(access_key, ContractKind::AccessKey, "burn", vec![Token::Uint(token_id)])
    }

    pub fn add_cmk(access_key: Address, token_id: U256, cmk_amount: U256) -> Self {
        Self::new(
            access_key,
            ContractKind::AccessKey,
            "addCmk",
            vec![Token::Uint(token_id), Token::Uint(cmk_amount)],
        )
    }

    pub fn token_of_owner_by_index(access_key: Address, owner: Address, index: U256) -> Self {
        Self::new(
            access_key,
            ContractKind::AccessKey,
            "tokenOfOwnerByIndex",
            vec![Token::Address(owner), Token::Uint(index)],
        )
    }

    pub fn cmk_value(access_key: Address, token_id: U256) -> Self {
        Self::new(access_key, ContractKind::AccessKey, "cmkValue", vec![Token::Uint(token_id)])
    }

    pub fn fees_accumulated(access_key: Address, token_id: U256) -> Self {
        Self::new(
            access_key,
            ContractKind::AccessKey,
            "feesAccumulated",
            vec![Token::Uint(token_id)],
        )
    }

    // Access factory

    /// Exactly one of the three payment slots carries `amount`.
    pub fn extend_expiry(factory: Address, token_id: U256, payment: Asset, amount: U256) -> Self {
        let slot = |asset: Asset| {
            if asset == payment {
                Token::Uint(amount)
            } else {
                Token::Uint(U256::zero())
            }
        };
        Self::new(
            factory,
            ContractKind::AccessFactory,
            "extendTokenExpiry",
            vec![Token::Uint(token_id), slot(Asset::Cmk), slot(Asset::Xcmk), slot(Asset::Usdc)],
        )
    }

    pub fn per_sec(factory: Address, asset: Asset) -> Self {
        let function = match asset {
            Asset::Cmk => "cmkPerSec",
            Asset::Xcmk => "xcmkPerSec",
            Asset::Usdc => "usdcPerSec",
        };
        Self::new(factory, ContractKind::AccessFactory, function, Vec::new())
    }
}
