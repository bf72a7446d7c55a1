//! Bank module types.
use std::collections::BTreeMap;

use crate::types::{address::Address, token::Coins};

/// A unit of a denomination, `1 denom = 10^exponent base units`.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
    #[cbor(optional)]
    pub aliases: Vec<String>,
}

/// Metadata describing a denomination.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct Metadata {
    #[cbor(optional)]
    pub description: String,
    pub denom_units: Vec<DenomUnit>,
    /// Base (smallest) denomination.
    pub base: String,
    /// Denomination shown to users.
    pub display: String,
    #[cbor(optional)]
    pub name: String,
    #[cbor(optional)]
    pub symbol: String,
}

impl Metadata {
    /// Exponent of the given unit, if it is part of this metadata.
    pub fn exponent_of(&self, denom: &str) -> Option<u32> {
        self.denom_units
            .iter()
            .find(|unit| unit.denom == denom || unit.aliases.iter().any(|a| a == denom))
            .map(|unit| unit.exponent)
    }
}

/// Genesis state for the bank module.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct Genesis {
    pub balances: BTreeMap<Address, Coins>,
    pub supply: Coins,
    #[cbor(optional)]
    pub denom_metadata: Vec<Metadata>,
}
