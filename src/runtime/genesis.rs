//! Genesis description consumed by the state initializer.
//!
//! The JSON layout follows the geth genesis format. Numeric fields accept
//! `0x`-prefixed hex strings, decimal strings or plain JSON numbers.

use crate::{Result, RunError};
use alloy_primitives::{Address, Bytes, B256, U256};
use revm::primitives::SpecId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Initial chain parameters and account state.
///
/// A zero-valued `Genesis` (the [`Default`]) is used when no genesis file is
/// given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    #[serde(default)]
    pub config: Option<ChainConfig>,
    #[serde(default, deserialize_with = "quantity::u64")]
    pub timestamp: u64,
    #[serde(default, deserialize_with = "quantity::u64")]
    pub gas_limit: u64,
    #[serde(default, deserialize_with = "quantity::u256")]
    pub difficulty: U256,
    #[serde(default)]
    pub coinbase: Address,
    #[serde(default)]
    pub alloc: BTreeMap<Address, GenesisAccount>,
    #[serde(default, deserialize_with = "quantity::u64")]
    pub number: u64,
}

/// A pre-funded or pre-deployed account in the genesis `alloc` map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisAccount {
    #[serde(default, deserialize_with = "quantity::u256")]
    pub balance: U256,
    #[serde(default, deserialize_with = "quantity::u64")]
    pub nonce: u64,
    #[serde(default)]
    pub code: Bytes,
    #[serde(default)]
    pub storage: BTreeMap<B256, B256>,
}

/// Fork schedule. Block-numbered forks activate at `number >= block`,
/// time-based forks at `timestamp >= time`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    #[serde(default, deserialize_with = "quantity::u64")]
    pub chain_id: u64,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub homestead_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub eip150_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub eip155_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub eip158_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub byzantium_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub constantinople_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub petersburg_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub istanbul_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub muir_glacier_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub berlin_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub london_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub arrow_glacier_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub gray_glacier_block: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub merge_netsplit_block: Option<u64>,
    #[serde(default)]
    pub terminal_total_difficulty_passed: bool,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub shanghai_time: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub cancun_time: Option<u64>,
}

impl ChainConfig {
    /// Every block-numbered fork up to Gray Glacier active from genesis, on a
    /// private chain id. Used when no genesis config is supplied.
    pub fn all_protocol_changes() -> Self {
        Self {
            chain_id: 1337,
            homestead_block: Some(0),
            eip150_block: Some(0),
            eip155_block: Some(0),
            eip158_block: Some(0),
            byzantium_block: Some(0),
            constantinople_block: Some(0),
            petersburg_block: Some(0),
            istanbul_block: Some(0),
            muir_glacier_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
            arrow_glacier_block: Some(0),
            gray_glacier_block: Some(0),
            ..Self::default()
        }
    }

    /// Newest fork active at the given block.
    pub fn spec_id(&self, number: u64, timestamp: u64) -> SpecId {
        let block = |fork: Option<u64>| fork.is_some_and(|at| number >= at);
        let time = |fork: Option<u64>| fork.is_some_and(|at| timestamp >= at);

        if time(self.cancun_time) {
            SpecId::CANCUN
        } else if time(self.shanghai_time) {
            SpecId::SHANGHAI
        } else if self.terminal_total_difficulty_passed || block(self.merge_netsplit_block) {
            SpecId::MERGE
        } else if block(self.gray_glacier_block) {
            SpecId::GRAY_GLACIER
        } else if block(self.arrow_glacier_block) {
            SpecId::ARROW_GLACIER
        } else if block(self.london_block) {
            SpecId::LONDON
        } else if block(self.berlin_block) {
            SpecId::BERLIN
        } else if block(self.muir_glacier_block) {
            SpecId::MUIR_GLACIER
        } else if block(self.istanbul_block) {
            SpecId::ISTANBUL
        } else if block(self.petersburg_block) {
            SpecId::PETERSBURG
        } else if block(self.constantinople_block) {
            SpecId::CONSTANTINOPLE
        } else if block(self.byzantium_block) {
            SpecId::BYZANTIUM
        } else if block(self.eip158_block) {
            SpecId::SPURIOUS_DRAGON
        } else if block(self.eip150_block) {
            SpecId::TANGERINE
        } else if block(self.homestead_block) {
            SpecId::HOMESTEAD
        } else {
            SpecId::FRONTIER
        }
    }
}

/// Read and parse a genesis JSON file.
#[tracing::instrument]
pub fn read_genesis(path: &Path) -> Result<Genesis> {
    let raw = std::fs::read(path).map_err(|source| RunError::GenesisRead {
        path: path.to_path_buf(),
        source,
    })?;
    let genesis: Genesis = serde_json::from_slice(&raw)?;
    info!(
        accounts = genesis.alloc.len(),
        gas_limit = genesis.gas_limit,
        "Loaded genesis"
    );
    Ok(genesis)
}

/// Hex-or-decimal numeric fields.
mod quantity {
    use alloy_primitives::U256;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    fn parse_u256<E: Error>(raw: Raw) -> Result<U256, E> {
        match raw {
            Raw::Number(n) => Ok(U256::from(n)),
            Raw::Text(s) => {
                let s = s.trim();
                match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some("") => Ok(U256::ZERO),
                    Some(digits) => U256::from_str_radix(digits, 16),
                    None => U256::from_str_radix(s, 10),
                }
                .map_err(|e| E::custom(format!("invalid quantity '{}': {}", s, e)))
            }
        }
    }

    pub fn u256<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        parse_u256(Raw::deserialize(d)?)
    }

    pub fn opt_u256<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
        Option::<Raw>::deserialize(d)?.map(parse_u256).transpose()
    }

    pub fn u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let value = u256(d)?;
        u64::try_from(value).map_err(|_| D::Error::custom(format!("quantity {} overflows u64", value)))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        opt_u256(d)?
            .map(|value| {
                u64::try_from(value)
                    .map_err(|_| D::Error::custom(format!("quantity {} overflows u64", value)))
            })
            .transpose()
    }
}
