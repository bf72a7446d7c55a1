//! Token types.
use std::{collections::BTreeMap, fmt, ops, str::FromStr};

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Maximum length of a denomination.
pub const MAX_DENOM_LENGTH: usize = 128;

/// Error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("malformed amount: {0}")]
    MalformedAmount(String),

    #[error("invalid denom: {0}")]
    InvalidDenomination(String),

    #[error("malformed coin: {0}")]
    MalformedCoin(String),
}

/// Validate a denomination.
///
/// A valid denomination starts with a letter followed by 2 to 127 letters, digits or any of
/// `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), Error> {
    let mut chars = denom.chars();
    let valid = denom.len() >= 3
        && denom.len() <= MAX_DENOM_LENGTH
        && chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if !valid {
        return Err(Error::InvalidDenomination(denom.to_string()));
    }
    Ok(())
}

/// An arbitrary precision signed integer amount.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int(BigInt);

impl Int {
    /// The zero amount.
    pub fn zero() -> Self {
        Int(BigInt::zero())
    }

    /// The unit amount.
    pub fn one() -> Self {
        Int(BigInt::from(1u8))
    }

    /// Returns `10^exp`.
    pub fn pow10(exp: u32) -> Self {
        Int(num_traits::pow(BigInt::from(10u8), exp as usize))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Converts the amount into an `u128` if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Int {
                fn from(v: $t) -> Self {
                    Int(BigInt::from(v))
                }
            }
        )*
    };
}

impl_from_primitive!(u8, u32, u64, u128, i32, i64, i128);

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident) => {
        impl ops::$trait<Int> for Int {
            type Output = Int;

            fn $method(self, rhs: Int) -> Int {
                Int(ops::$trait::$method(self.0, rhs.0))
            }
        }

        impl ops::$trait<&Int> for Int {
            type Output = Int;

            fn $method(self, rhs: &Int) -> Int {
                Int(ops::$trait::$method(self.0, &rhs.0))
            }
        }

        impl ops::$trait<Int> for &Int {
            type Output = Int;

            fn $method(self, rhs: Int) -> Int {
                Int(ops::$trait::$method(&self.0, rhs.0))
            }
        }

        impl ops::$trait<&Int> for &Int {
            type Output = Int;

            fn $method(self, rhs: &Int) -> Int {
                Int(ops::$trait::$method(&self.0, &rhs.0))
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);
impl_binary_op!(Rem, rem);

macro_rules! impl_assign_op {
    ($trait:ident, $method:ident) => {
        impl ops::$trait<Int> for Int {
            fn $method(&mut self, rhs: Int) {
                ops::$trait::$method(&mut self.0, rhs.0)
            }
        }

        impl ops::$trait<&Int> for Int {
            fn $method(&mut self, rhs: &Int) {
                ops::$trait::$method(&mut self.0, &rhs.0)
            }
        }
    };
}

impl_assign_op!(AddAssign, add_assign);
impl_assign_op!(SubAssign, sub_assign);

impl ops::Neg for Int {
    type Output = Int;

    fn neg(self) -> Int {
        Int(-self.0)
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Int {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigInt::from_str(s)
            .map(Int)
            .map_err(|_| Error::MalformedAmount(s.to_string()))
    }
}

impl slog::Value for Int {
    fn serialize(
        &self,
        _record: &slog::Record<'_>,
        key: slog::Key,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        serializer.emit_arguments(key, &format_args!("{}", self))
    }
}

impl cbor::Encode for Int {
    fn into_cbor_value(self) -> cbor::Value {
        cbor::Value::ByteString(self.0.to_signed_bytes_be())
    }
}

impl cbor::Decode for Int {
    fn try_default() -> Result<Self, cbor::DecodeError> {
        Ok(Int::zero())
    }

    fn try_from_cbor_value(value: cbor::Value) -> Result<Self, cbor::DecodeError> {
        match value {
            cbor::Value::ByteString(data) => Ok(Int(BigInt::from_signed_bytes_be(&data))),
            _ => Err(cbor::DecodeError::UnexpectedType),
        }
    }
}

/// An amount of a given denomination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, cbor::Encode, cbor::Decode)]
pub struct Coin {
    pub denom: String,
    pub amount: Int,
}

impl Coin {
    /// Creates a new coin of the given denomination.
    pub fn new<A: Into<Int>>(denom: &str, amount: A) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.into(),
        }
    }

    /// Whether the coin has a valid denomination and a non-negative amount.
    pub fn is_valid(&self) -> bool {
        validate_denom(&self.denom).is_ok() && !self.amount.is_negative()
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_positive()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '-'))
            .ok_or_else(|| Error::MalformedCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(Error::MalformedCoin(s.to_string()));
        }
        validate_denom(denom)?;

        Ok(Coin {
            denom: denom.to_string(),
            amount: amount.parse()?,
        })
    }
}

/// A set of coins.
///
/// Sets created via [`Coins::new`] are sanitized: zero amounts are dropped, duplicate
/// denominations merged and entries sorted by denomination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Creates a sanitized set of coins.
    pub fn new(coins: Vec<Coin>) -> Self {
        let mut merged: BTreeMap<String, Int> = BTreeMap::new();
        for coin in coins {
            *merged.entry(coin.denom).or_default() += coin.amount;
        }

        Coins(
            merged
                .into_iter()
                .filter(|(_, amount)| !amount.is_zero())
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        )
    }

    /// Creates a set of coins exactly as given, without sanitization.
    pub fn from_unchecked(coins: Vec<Coin>) -> Self {
        Coins(coins)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// Amount of the given denomination, zero when not present.
    pub fn amount_of(&self, denom: &str) -> Int {
        self.0
            .iter()
            .find(|coin| coin.denom == denom)
            .map(|coin| coin.amount.clone())
            .unwrap_or_default()
    }

    /// Whether the set is sorted, free of duplicates and contains only positive amounts of
    /// valid denominations.
    pub fn is_valid(&self) -> bool {
        let mut previous: Option<&str> = None;
        for coin in &self.0 {
            if validate_denom(&coin.denom).is_err() || !coin.amount.is_positive() {
                return false;
            }
            if let Some(previous) = previous {
                if coin.denom.as_str() <= previous {
                    return false;
                }
            }
            previous = Some(&coin.denom);
        }
        true
    }

    /// Returns the sanitized sum of both sets.
    pub fn add(&self, other: &Coins) -> Coins {
        Coins::new(self.0.iter().chain(other.0.iter()).cloned().collect())
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Coins::new(vec![coin])
    }
}

impl IntoIterator for Coins {
    type Item = Coin;
    type IntoIter = std::vec::IntoIter<Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", coin)?;
        }
        Ok(())
    }
}

impl FromStr for Coins {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Coins::default());
        }
        let coins = s
            .split(',')
            .map(Coin::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Coins::new(coins))
    }
}

impl cbor::Encode for Coins {
    fn into_cbor_value(self) -> cbor::Value {
        cbor::Encode::into_cbor_value(self.0)
    }
}

impl cbor::Decode for Coins {
    fn try_default() -> Result<Self, cbor::DecodeError> {
        Ok(Default::default())
    }

    fn try_from_cbor_value(value: cbor::Value) -> Result<Self, cbor::DecodeError> {
        <Vec<Coin> as cbor::Decode>::try_from_cbor_value(value).map(Coins)
    }
}
