use anyhow::{Context, Result, bail};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::CONTRACTS;
use crate::config::contracts::BuiltinChain;
use crate::domain::Asset;

/// Every contract the wallet flows need on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAddresses {
    pub cmk: Address,
    pub xcmk: Address,
    pub usdc: Address,
    pub access_key: Address,
    pub access_factory: Address,
}

impl ChainAddresses {
    pub fn token(&self, asset: Asset) -> Address {
        match asset {
            Asset::Cmk => self.cmk,
            Asset::Xcmk => self.xcmk,
            Asset::Usdc => self.usdc,
        }
    }
}

/// Partial entry as found in the built-in table or the overrides file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct PartialAddresses {
    cmk: Option<Address>,
    xcmk: Option<Address>,
    usdc: Option<Address>,
    access_key: Option<Address>,
    access_factory: Option<Address>,
}

impl PartialAddresses {
    fn from_builtin(entry: &BuiltinChain) -> Result<Self> {
        let parse = |field: &str, value: Option<&'static str>| -> Result<Option<Address>> {
            value
                .map(|s| {
                    s.parse::<Address>()
                        .with_context(|| format!("bad built-in {} address on chain {}", field, entry.chain_id))
                })
                .transpose()
        };
        Ok(Self {
            cmk: parse("cmk", entry.cmk)?,
            xcmk: parse("xcmk", entry.xcmk)?,
            usdc: parse("usdc", entry.usdc)?,
            access_key: parse("access_key", entry.access_key)?,
            access_factory: parse("access_factory", entry.access_factory)?,
        })
    }

    /// Fields present in `other` win.
    fn merge(&mut self, other: PartialAddresses) {
        self.cmk = other.cmk.or(self.cmk);
        self.xcmk = other.xcmk.or(self.xcmk);
        self.usdc = other.usdc.or(self.usdc);
        self.access_key = other.access_key.or(self.access_key);
        self.access_factory = other.access_factory.or(self.access_factory);
    }

    fn complete(&self) -> Option<ChainAddresses> {
        Some(ChainAddresses {
            cmk: self.cmk?,
            xcmk: self.xcmk?,
            usdc: self.usdc?,
            access_key: self.access_key?,
            access_factory: self.access_factory?,
        })
    }
}

/// `chain_id -> addresses`. A chain is supported only once every address is known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressBook {
    chains: BTreeMap<u64, PartialAddresses>,
}

impl AddressBook {
    pub fn builtin() -> Result<Self> {
        let mut chains = BTreeMap::new();
        for entry in CONTRACTS.builtin {
            chains.insert(entry.chain_id, PartialAddresses::from_builtin(entry)?);
        }
        Ok(Self { chains })
    }

    /// Built-ins overlaid with a JSON file keyed by chain id:
    /// `{"1": {"xcmk": "0x…", "access_key": "0x…", "access_factory": "0x…"}}`
    pub fn with_overrides_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read contracts file {}", path.display()))?;
        let mut book = Self::builtin()?;
        book.apply_overrides(&text)
            .with_context(|| format!("failed to load contracts file {}", path.display()))?;
        Ok(book)
    }

    pub fn apply_overrides(&mut self, json: &str) -> Result<()> {
        let overrides: BTreeMap<String, PartialAddresses> =
            serde_json::from_str(json).context("contracts file is not valid JSON")?;
        for (key, partial) in overrides {
            let Ok(chain_id) = key.trim().parse::<u64>() else {
                bail!("chain id {:?} is not a number", key);
            };
            self.chains.entry(chain_id).or_default().merge(partial);
        }
        Ok(())
    }

    pub fn chain(&self, chain_id: u64) -> Option<ChainAddresses> {
        self.chains.get(&chain_id).and_then(PartialAddresses::complete)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.chain(chain_id).is_some()
    }

    pub fn supported_chains(&self) -> Vec<u64> {
        self.chains
            .iter()
            .filter(|(_, partial)| partial.complete().is_some())
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERRIDES: &str = r#"{
        "1": {
            "xcmk": "0x0000000000000000000000000000000000000002",
            "access_key": "0x0000000000000000000000000000000000000003",
            "access_factory": "0x0000000000000000000000000000000000000004"
        },
        "5": {
            "cmk": "0x0000000000000000000000000000000000000011"
        }
    }"#;

    #[test]
    fn builtin_mainnet_is_incomplete() {
        let book = AddressBook::builtin().unwrap();
        assert!(!book.is_supported(1));
        assert!(book.chain(137).is_none());
    }

    #[test]
    fn overrides_complete_mainnet() {
        let mut book = AddressBook::builtin().unwrap();
        book.apply_overrides(OVERRIDES).unwrap();

        let mainnet = book.chain(1).expect("mainnet complete");
        assert_eq!(
            mainnet.cmk,
            "0x68CFb82Eacb9f198d508B514d898a403c449533E".parse::<Address>().unwrap()
        );
        assert_eq!(mainnet.token(Asset::Xcmk), Address::from_low_u64_be(2));
        assert!(!book.is_supported(5));
        assert_eq!(book.supported_chains(), vec![1]);
    }

    #[test]
    fn rejects_non_numeric_chain_ids() {
        let mut book = AddressBook::default();
        assert!(book.apply_overrides(r#"{"mainnet": {}}"#).is_err());
        assert!(book.apply_overrides("[1, 2]").is_err());
    }
}
