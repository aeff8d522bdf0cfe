//! Read-only contract queries, batched per refresh.

use anyhow::{Context, Result};
use ethers::abi::Token;
use ethers::types::{Address, U256};
use futures::future::try_join_all;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

use super::abi::{ContractCall, ContractKind};
use super::addresses::ChainAddresses;
use super::provider::WalletProvider;
use crate::config::CONTRACTS;
use crate::domain::{AccessKey, Asset, ExtensionRates};

/// Runs `call` and takes its single uint256 output.
pub async fn read_uint(wallet: &dyn WalletProvider, call: &ContractCall) -> Result<U256> {
    let data = call.encode()?;
    let raw = wallet
        .call(call.to, data)
        .await
        .with_context(|| format!("eth_call {} failed", call.describe()))?;
    call.decode_output(&raw)?
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .with_context(|| format!("{} did not return a uint", call.describe()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Token balances and the allowances the action flows check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    pub cmk: U256,
    pub xcmk: U256,
    pub usdc: U256,
    pub allowances: Vec<Allowance>,
}

impl Balances {
    pub fn of(&self, asset: Asset) -> U256 {
        match asset {
            Asset::Cmk => self.cmk,
            Asset::Xcmk => self.xcmk,
            Asset::Usdc => self.usdc,
        }
    }

    /// Unknown pairs read as zero.
    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.allowances
            .iter()
            .find(|a| a.token == token && a.spender == spender)
            .map(|a| a.amount)
            .unwrap_or_default()
    }
}

/// (token, spender) pairs that gate an action.
fn allowance_pairs(addresses: &ChainAddresses) -> Vec<(Address, Address)> {
    vec![
        (addresses.cmk, addresses.xcmk),
        (addresses.cmk, addresses.access_key),
        (addresses.cmk, addresses.access_factory),
        (addresses.xcmk, addresses.access_factory),
        (addresses.usdc, addresses.access_factory),
    ]
}

pub async fn read_balances(
    wallet: &dyn WalletProvider,
    addresses: &ChainAddresses,
    owner: Address,
) -> Result<Balances> {
    let cmk_call = ContractCall::balance_of(addresses.cmk, ContractKind::Erc20, owner);
    let xcmk_call = ContractCall::balance_of(addresses.xcmk, ContractKind::Staking, owner);
    let usdc_call = ContractCall::balance_of(addresses.usdc, ContractKind::Erc20, owner);
    let allowance_calls: Vec<(Address, Address, ContractCall)> = allowance_pairs(addresses)
        .into_iter()
        .map(|(token, spender)| (token, spender, ContractCall::allowance(token, owner, spender)))
        .collect();

    let (cmk, xcmk, usdc, allowances) = futures::try_join!(
        read_uint(wallet, &cmk_call),
        read_uint(wallet, &xcmk_call),
        read_uint(wallet, &usdc_call),
        try_join_all(allowance_calls.iter().map(|(token, spender, call)| async move {
            Ok::<_, anyhow::Error>(Allowance {
                token: *token,
                spender: *spender,
                amount: read_uint(wallet, call).await?,
            })
        })),
    )?;

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_wallet_reads {
        log::info!("[wallet] balances for {:?}: CMK {} xCMK {} USDC {}", owner, cmk, xcmk, usdc);
    }

    Ok(Balances {
        cmk,
        xcmk,
        usdc,
        allowances,
    })
}

/// Keys owned by `owner`, capped at the configured listing limit.
pub async fn read_access_keys(
    wallet: &dyn WalletProvider,
    addresses: &ChainAddresses,
    owner: Address,
) -> Result<Vec<AccessKey>> {
    let access_key = addresses.access_key;
    let count_call = ContractCall::balance_of(access_key, ContractKind::AccessKey, owner);
    let count = read_uint(wallet, &count_call).await?;
    let listed = count.min(U256::from(CONTRACTS.max_access_keys_listed as u64)).as_usize();

    let token_ids = try_join_all((0..listed).map(|index| async move {
        let call = ContractCall::token_of_owner_by_index(access_key, owner, U256::from(index as u64));
        read_uint(wallet, &call).await
    }))
    .await?;

    let keys = try_join_all(token_ids.into_iter().map(|token_id| async move {
        let value_call = ContractCall::cmk_value(access_key, token_id);
        let fees_call = ContractCall::fees_accumulated(access_key, token_id);
        let (cmk_value, fees_accumulated) =
            futures::try_join!(read_uint(wallet, &value_call), read_uint(wallet, &fees_call))?;
        Ok::<_, anyhow::Error>(AccessKey {
            token_id,
            cmk_value,
            fees_accumulated,
        })
    }))
    .await?;

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_wallet_reads {
        log::info!("[wallet] {} of {} access keys listed for {:?}", keys.len(), count, owner);
    }

    Ok(keys)
}

pub async fn read_extension_rates(
    wallet: &dyn WalletProvider,
    addresses: &ChainAddresses,
) -> Result<ExtensionRates> {
    let factory = addresses.access_factory;
    let cmk_call = ContractCall::per_sec(factory, Asset::Cmk);
    let xcmk_call = ContractCall::per_sec(factory, Asset::Xcmk);
    let usdc_call = ContractCall::per_sec(factory, Asset::Usdc);
    let (cmk_per_sec, xcmk_per_sec, usdc_per_sec) = futures::try_join!(
        read_uint(wallet, &cmk_call),
        read_uint(wallet, &xcmk_call),
        read_uint(wallet, &usdc_call),
    )?;
    Ok(ExtensionRates {
        cmk_per_sec,
        xcmk_per_sec,
        usdc_per_sec,
    })
}

/// Staking pool figures shown next to the stake form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakingInfo {
    pub total_shares: U256,
    /// CMK redeemable for one whole xCMK
    pub cmk_per_share: U256,
    /// xCMK minted for one whole CMK
    pub shares_per_cmk: U256,
}

pub async fn read_staking_info(
    wallet: &dyn WalletProvider,
    addresses: &ChainAddresses,
) -> Result<StakingInfo> {
    let one = U256::exp10(Asset::Cmk.decimals() as usize);
    let supply_call = ContractCall::total_supply(addresses.xcmk, ContractKind::Staking);
    let redeem_call = ContractCall::shares_to_cmk(addresses.xcmk, one);
    let mint_call = ContractCall::cmk_to_shares(addresses.xcmk, one);
    let (total_shares, cmk_per_share, shares_per_cmk) = futures::try_join!(
        read_uint(wallet, &supply_call),
        read_uint(wallet, &redeem_call),
        read_uint(wallet, &mint_call),
    )?;
    Ok(StakingInfo {
        total_shares,
        cmk_per_share,
        shares_per_cmk,
    })
}

/// Everything the wallet pages show for one account, read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletSnapshot {
    pub balances: Balances,
    pub access_keys: Vec<AccessKey>,
    pub rates: ExtensionRates,
    pub staking: StakingInfo,
}

pub async fn read_snapshot(
    wallet: &dyn WalletProvider,
    addresses: &ChainAddresses,
    owner: Address,
) -> Result<WalletSnapshot> {
    let (balances, access_keys, rates, staking) = futures::try_join!(
        read_balances(wallet, addresses, owner),
        read_access_keys(wallet, addresses, owner),
        read_extension_rates(wallet, addresses),
        read_staking_info(wallet, addresses),
    )?;
    Ok(WalletSnapshot {
        balances,
        access_keys,
        rates,
        staking,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::wallet::testing::MockWallet;

    pub(crate) fn sample_addresses() -> ChainAddresses {
        ChainAddresses {
            cmk: Address::from_low_u64_be(0x10),
            xcmk: Address::from_low_u64_be(0x11),
            usdc: Address::from_low_u64_be(0x12),
            access_key: Address::from_low_u64_be(0x13),
            access_factory: Address::from_low_u64_be(0x14),
        }
    }

    fn owner() -> Address {
        Address::from_low_u64_be(0xaa)
    }

    fn funded_wallet(addresses: &ChainAddresses) -> MockWallet {
        let mut wallet = MockWallet::new(owner(), 1)
            .with_uint(&ContractCall::balance_of(addresses.cmk, ContractKind::Erc20, owner()), U256::from(100))
            .with_uint(&ContractCall::balance_of(addresses.xcmk, ContractKind::Staking, owner()), U256::from(50))
            .with_uint(&ContractCall::balance_of(addresses.usdc, ContractKind::Erc20, owner()), U256::from(7));
        for (token, spender) in allowance_pairs(addresses) {
            let amount = if spender == addresses.xcmk { U256::from(30) } else { U256::zero() };
            wallet = wallet.with_uint(&ContractCall::allowance(token, owner(), spender), amount);
        }
        wallet
    }

    #[tokio::test]
    async fn reads_balances_and_allowances() {
        let addresses = sample_addresses();
        let wallet = funded_wallet(&addresses);

        let balances = read_balances(&wallet, &addresses, owner()).await.unwrap();
        assert_eq!(balances.of(Asset::Cmk), U256::from(100));
        assert_eq!(balances.of(Asset::Xcmk), U256::from(50));
        assert_eq!(balances.allowance(addresses.cmk, addresses.xcmk), U256::from(30));
        assert_eq!(balances.allowance(addresses.cmk, addresses.access_key), U256::zero());
    }

    #[tokio::test]
    async fn lists_access_keys() {
        let addresses = sample_addresses();
        let mut wallet = MockWallet::new(owner(), 1).with_uint(
            &ContractCall::balance_of(addresses.access_key, ContractKind::AccessKey, owner()),
            U256::from(2),
        );
        for (index, token_id) in [(0u64, 7u64), (1, 9)] {
            wallet = wallet
                .with_uint(
                    &ContractCall::token_of_owner_by_index(addresses.access_key, owner(), U256::from(index)),
                    U256::from(token_id),
                )
                .with_uint(&ContractCall::cmk_value(addresses.access_key, U256::from(token_id)), U256::from(token_id * 100))
                .with_uint(&ContractCall::fees_accumulated(addresses.access_key, U256::from(token_id)), U256::from(token_id));
        }

        let keys = read_access_keys(&wallet, &addresses, owner()).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].token_id, U256::from(9));
        assert_eq!(keys[1].cmk_value, U256::from(900));
        assert_eq!(keys[0].fees_accumulated, U256::from(7));
    }

    #[tokio::test]
    async fn failed_read_is_an_error() {
        let addresses = sample_addresses();
        let wallet = MockWallet::new(owner(), 1);
        assert!(read_extension_rates(&wallet, &addresses).await.is_err());
    }
}
