//! Precise bank module types.
use std::collections::BTreeSet;

use evm_runtime_sdk::types::{
    address::Address,
    token::{Coin, Int},
};

use crate::Error;

/// Check that the given amount is a valid fractional amount, i.e. within
/// `(0, conversion_factor)`.
pub fn validate_fractional_amount(amount: &Int, conversion_factor: &Int) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::NonPositiveAmount(amount.clone()));
    }
    if amount >= conversion_factor {
        return Err(Error::AmountExceedsMax {
            amount: amount.clone(),
            max: conversion_factor - Int::one(),
        });
    }
    Ok(())
}

/// Fractional balance of an account.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct FractionalBalance {
    pub address: Address,
    pub amount: Int,
}

impl FractionalBalance {
    /// Check the balance amount.
    pub fn validate(&self, conversion_factor: &Int) -> Result<(), Error> {
        validate_fractional_amount(&self.amount, conversion_factor)
    }
}

/// Body of the event emitted on every fractional balance change.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct FractionalBalanceChange {
    pub address: Address,
    /// Signed change of the fractional balance.
    pub delta: Int,
}

/// Genesis state for the precise bank module.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct Genesis {
    #[cbor(optional)]
    pub balances: Vec<FractionalBalance>,
    #[cbor(optional)]
    pub remainder: Int,
}

impl Genesis {
    /// Check the genesis state against the given conversion factor.
    pub fn validate(&self, conversion_factor: &Int) -> Result<(), Error> {
        let mut seen = BTreeSet::new();
        for balance in &self.balances {
            if !seen.insert(balance.address) {
                return Err(Error::DuplicateAddress(balance.address));
            }
            balance
                .validate(conversion_factor)
                .map_err(|err| Error::InvalidBalance(balance.address, Box::new(err)))?;
        }

        if self.remainder.is_negative() {
            return Err(Error::NegativeRemainder(self.remainder.clone()));
        }
        if &self.remainder >= conversion_factor {
            return Err(Error::AmountExceedsMax {
                amount: self.remainder.clone(),
                max: conversion_factor - Int::one(),
            });
        }

        let sum = self.total_amount();
        if !(&(&sum + &self.remainder) % conversion_factor).is_zero() {
            return Err(Error::UnbalancedTotal {
                sum,
                remainder: self.remainder.clone(),
                conversion_factor: conversion_factor.clone(),
            });
        }

        Ok(())
    }

    /// Sum of all fractional balances.
    pub fn total_amount(&self) -> Int {
        self.balances
            .iter()
            .fold(Int::zero(), |sum, balance| sum + &balance.amount)
    }
}

/// Arguments of the `precisebank.FractionalBalance` query.
#[derive(Clone, Debug, Default, cbor::Encode, cbor::Decode)]
pub struct FractionalBalanceQuery {
    /// Bech32-encoded account address.
    pub address: String,
}

/// Result of the `precisebank.FractionalBalance` query.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct FractionalBalanceResponse {
    pub fractional_balance: Coin,
}

/// Result of the `precisebank.Remainder` query.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct RemainderResponse {
    pub remainder: Coin,
}
