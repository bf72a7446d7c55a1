//! Account address type.
use std::{convert::TryFrom, fmt};

use bech32::{Bech32, Hrp};
use sha2::{Digest, Sha256};
use thiserror::Error;

const ADDRESS_SIZE: usize = 20;

/// Human readable part for Bech32-encoded addresses.
pub const ADDRESS_BECH32_HRP: &str = "cosmos";

/// Error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed address")]
    MalformedAddress,
}

/// An account address.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Size of an address in bytes.
    pub const SIZE: usize = ADDRESS_SIZE;

    /// Creates a new address by hashing the given data.
    pub fn new(data: &[u8]) -> Self {
        let h = Sha256::digest(data);

        let mut a = [0; ADDRESS_SIZE];
        a.copy_from_slice(&h[..ADDRESS_SIZE]);

        Address(a)
    }

    /// Tries to create a new address from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != ADDRESS_SIZE {
            return Err(Error::MalformedAddress);
        }

        let mut a = [0; ADDRESS_SIZE];
        a.copy_from_slice(data);

        Ok(Address(a))
    }

    /// Convert the address into raw bytes.
    pub fn into_bytes(self) -> [u8; ADDRESS_SIZE] {
        self.0
    }

    /// Creates the address of the given module account.
    pub fn from_module(module: &str) -> Self {
        Address::new(module.as_bytes())
    }

    /// Tries to create a new address from Bech32-encoded string.
    pub fn from_bech32(data: &str) -> Result<Self, Error> {
        let (hrp, data) = bech32::decode(data).map_err(|_| Error::MalformedAddress)?;
        if hrp.as_str() != ADDRESS_BECH32_HRP {
            return Err(Error::MalformedAddress);
        }

        Address::from_bytes(&data)
    }

    /// Converts an address to Bech32 representation.
    pub fn to_bech32(self) -> String {
        let hrp = Hrp::parse_unchecked(ADDRESS_BECH32_HRP);
        bech32::encode::<Bech32>(hrp, &self.0).expect("address should fit into bech32")
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in &self.0[..] {
            write!(f, "{:02x}", i)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())?;
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())?;
        Ok(())
    }
}

impl slog::Value for Address {
    fn serialize(
        &self,
        _record: &slog::Record<'_>,
        key: slog::Key,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        serializer.emit_str(key, &self.to_bech32())
    }
}

impl cbor::Encode for Address {
    fn into_cbor_value(self) -> cbor::Value {
        cbor::Value::ByteString(self.as_ref().to_vec())
    }
}

impl cbor::Decode for Address {
    fn try_from_cbor_value(value: cbor::Value) -> Result<Self, cbor::DecodeError> {
        match value {
            cbor::Value::ByteString(data) => {
                Self::from_bytes(&data).map_err(|_| cbor::DecodeError::UnexpectedType)
            }
            _ => Err(cbor::DecodeError::UnexpectedType),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_address_from_module() {
        assert_eq!(
            Address::from_module("fee_collector").to_bech32(),
            "cosmos17xpfvakm2amg962yls6f84z3kell8c5lserqta"
        );
        assert_eq!(
            Address::from_module("gov").to_bech32(),
            "cosmos10d07y265gmmuvt4z0w9aw880jnsr700j6zn9kn"
        );
    }

    #[test]
    fn test_address_bech32_roundtrip() {
        let addr = Address::from_bytes(&[42u8; ADDRESS_SIZE]).unwrap();
        let encoded = addr.to_bech32();
        assert!(encoded.starts_with("cosmos1"));
        assert_eq!(Address::from_bech32(&encoded).unwrap(), addr);
        assert_eq!(format!("{}", addr), encoded);
    }

    #[test]
    fn test_address_try_from_bytes() {
        let bytes_fixture = vec![42u8; ADDRESS_SIZE + 1];
        assert_eq!(
            Address::try_from(&bytes_fixture[0..ADDRESS_SIZE]).unwrap(),
            Address::from_bytes(&bytes_fixture[0..ADDRESS_SIZE]).unwrap()
        );
        assert!(matches!(
            Address::try_from(bytes_fixture.as_slice()).unwrap_err(),
            Error::MalformedAddress
        ));
    }

    #[test]
    fn test_address_from_bech32_invalid() {
        let hrp = Hrp::parse("osmo").unwrap();
        let other = bech32::encode::<Bech32>(hrp, &[42u8; ADDRESS_SIZE]).unwrap();
        assert!(matches!(
            Address::from_bech32(&other).unwrap_err(),
            Error::MalformedAddress,
        ));
        assert!(matches!(
            Address::from_bech32("cosmos1invalid").unwrap_err(),
            Error::MalformedAddress,
        ));
    }

    #[test]
    fn test_address_cbor() {
        let addr = Address::from_module("bank");
        let enc = cbor::to_vec(addr);
        let dec: Address = cbor::from_slice(&enc).unwrap();
        assert_eq!(dec, addr);
    }
}
