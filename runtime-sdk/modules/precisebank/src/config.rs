//! Coin configuration.
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;

use evm_runtime_sdk::types::token::{self, Int};

/// Maximum number of decimals of the extended denomination.
pub const MAX_EXTENDED_DECIMALS: u32 = 18;

/// Errors emitted while configuring coin information.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid denomination: {0}")]
    InvalidDenom(#[from] token::Error),

    #[error("invalid decimals: {0}")]
    InvalidDecimals(String),

    #[error("coin info already initialized")]
    AlreadyInitialized,
}

/// Description of the native denomination and its extended counterpart.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct CoinInfo {
    /// Integer denomination held by the native bank (e.g. `uatom`).
    pub denom: String,
    /// Extended denomination exposed to EVM consumers (e.g. `aatom`).
    pub extended_denom: String,
    /// Decimals of the integer denomination.
    pub decimals: u32,
    /// Decimals of the extended denomination.
    pub extended_decimals: u32,
}

impl CoinInfo {
    /// Check the coin information for consistency.
    pub fn validate(&self) -> Result<(), Error> {
        token::validate_denom(&self.denom)?;
        token::validate_denom(&self.extended_denom)?;

        if self.extended_decimals > MAX_EXTENDED_DECIMALS {
            return Err(Error::InvalidDecimals(format!(
                "extended decimals {} exceed max of {}",
                self.extended_decimals, MAX_EXTENDED_DECIMALS
            )));
        }
        if self.denom == self.extended_denom {
            if self.decimals != self.extended_decimals {
                return Err(Error::InvalidDecimals(format!(
                    "denom {} is used with both {} and {} decimals",
                    self.denom, self.decimals, self.extended_decimals
                )));
            }
            return Ok(());
        }
        if self.decimals >= self.extended_decimals {
            return Err(Error::InvalidDecimals(format!(
                "decimals {} must be lower than extended decimals {}",
                self.decimals, self.extended_decimals
            )));
        }

        Ok(())
    }

    /// Number of extended units in one integer unit.
    pub fn conversion_factor(&self) -> Int {
        Int::pow10(self.extended_decimals - self.decimals.min(self.extended_decimals))
    }
}

/// Shared, set-once holder of the chain's coin information.
#[derive(Clone, Debug, Default)]
pub struct CoinInfoResolver {
    info: Arc<OnceCell<CoinInfo>>,
}

impl CoinInfoResolver {
    /// Create an unconfigured resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver configured with the given coin information.
    pub fn with_coin_info(info: CoinInfo) -> Result<Self, Error> {
        let resolver = Self::new();
        resolver.configure(info)?;
        Ok(resolver)
    }

    /// Set the coin information. It can only be set once.
    pub fn configure(&self, info: CoinInfo) -> Result<(), Error> {
        info.validate()?;
        self.info.set(info).map_err(|_| Error::AlreadyInitialized)
    }

    /// Whether the coin information has been set.
    pub fn is_configured(&self) -> bool {
        self.info.get().is_some()
    }

    /// Configured coin information.
    ///
    /// # Panics
    ///
    /// This method will panic when called before the resolver is configured.
    pub fn coin_info(&self) -> &CoinInfo {
        self.info.get().expect("coin info not initialized")
    }

    pub fn integer_denom(&self) -> &str {
        &self.coin_info().denom
    }

    pub fn extended_denom(&self) -> &str {
        &self.coin_info().extended_denom
    }

    pub fn decimals(&self) -> u32 {
        self.coin_info().decimals
    }

    /// Conversion factor between the integer and the extended denomination.
    ///
    /// A fresh value is returned on every call.
    pub fn conversion_factor(&self) -> Int {
        self.coin_info().conversion_factor()
    }

    /// Whether both denominations coincide, in which case no fractional accounting is needed.
    pub fn is_same_denom(&self) -> bool {
        let info = self.coin_info();
        info.denom == info.extended_denom
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn atom() -> CoinInfo {
        CoinInfo {
            denom: "uatom".to_string(),
            extended_denom: "aatom".to_string(),
            decimals: 6,
            extended_decimals: 18,
        }
    }

    #[test]
    fn test_conversion_factor() {
        let resolver = CoinInfoResolver::with_coin_info(atom()).unwrap();
        assert_eq!(resolver.conversion_factor(), Int::pow10(12));
        assert_eq!(resolver.integer_denom(), "uatom");
        assert_eq!(resolver.extended_denom(), "aatom");
        assert_eq!(resolver.decimals(), 6);
        assert!(!resolver.is_same_denom());

        // Mutating the returned value does not affect the resolver.
        let mut cf = resolver.conversion_factor();
        cf += Int::one();
        assert_eq!(resolver.conversion_factor(), Int::pow10(12));
    }

    #[test]
    fn test_same_denom() {
        let resolver = CoinInfoResolver::with_coin_info(CoinInfo {
            denom: "atest".to_string(),
            extended_denom: "atest".to_string(),
            decimals: 18,
            extended_decimals: 18,
        })
        .unwrap();
        assert!(resolver.is_same_denom());
        assert_eq!(resolver.conversion_factor(), Int::one());
    }

    #[test]
    #[should_panic(expected = "coin info not initialized")]
    fn test_unconfigured() {
        CoinInfoResolver::new().conversion_factor();
    }

    #[test]
    fn test_configure_once() {
        let resolver = CoinInfoResolver::new();
        assert!(!resolver.is_configured());
        resolver.configure(atom()).unwrap();
        assert!(resolver.is_configured());
        assert_eq!(resolver.configure(atom()), Err(Error::AlreadyInitialized));

        // Clones share the configuration.
        let clone = resolver.clone();
        assert_eq!(clone.coin_info(), &atom());
    }

    #[test]
    fn test_validate() {
        let mut info = atom();
        info.decimals = 18;
        assert!(matches!(info.validate(), Err(Error::InvalidDecimals(_))));

        let mut info = atom();
        info.extended_decimals = 19;
        assert!(matches!(info.validate(), Err(Error::InvalidDecimals(_))));

        let mut info = atom();
        info.extended_denom = "1atom".to_string();
        assert!(matches!(info.validate(), Err(Error::InvalidDenom(_))));

        let mut info = atom();
        info.extended_denom = "uatom".to_string();
        assert!(matches!(info.validate(), Err(Error::InvalidDecimals(_))));
    }
}
