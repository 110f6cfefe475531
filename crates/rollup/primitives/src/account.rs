use std::{fmt, str::FromStr};

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{FieldElement, PrimitivesError};

/// Case-normalized account identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Normalizes `raw` to lowercase. Empty or all-whitespace input is rejected.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PrimitivesError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PrimitivesError::invalid_identifier(raw.as_ref()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// Non-negative account balance, always strictly below the field order so
/// that distinct balances commit to distinct leaves.
///
/// Serialized as a decimal string. Deserialization also accepts a plain JSON
/// integer so that snapshots written with numeric balances still load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Balance(BigUint);

impl Balance {
    pub fn new(value: BigUint) -> Result<Self, PrimitivesError> {
        if value >= FieldElement::modulus() {
            return Err(PrimitivesError::BalanceOutOfRange(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Largest representable balance, `r - 1`.
    pub fn max_value() -> Self {
        Self(FieldElement::modulus() - 1u32)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::from(0u32)
    }

    pub fn checked_sub(&self, rhs: &Balance) -> Option<Balance> {
        (self.0 >= rhs.0).then(|| Balance(&self.0 - &rhs.0))
    }

    /// `None` if the sum would reach the field order.
    pub fn checked_add(&self, rhs: &Balance) -> Option<Balance> {
        Self::new(&self.0 + &rhs.0).ok()
    }

    /// The balance as a field element. Exact, since balances are below `r`.
    pub fn to_field(&self) -> FieldElement {
        FieldElement::from_biguint(&self.0)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for Balance {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl TryFrom<BigUint> for Balance {
    type Error = PrimitivesError;

    fn try_from(value: BigUint) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Balance {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitivesError::InvalidBalance(s.to_owned()));
        }
        let value = BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| PrimitivesError::InvalidBalance(s.to_owned()))?;
        Self::new(value)
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BalanceVisitor)
    }
}

struct BalanceVisitor;

impl de::Visitor<'_> for BalanceVisitor {
    type Value = Balance;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Balance, E> {
        Ok(Balance::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Balance, E> {
        u64::try_from(v)
            .map(Balance::from)
            .map_err(|_| E::custom(format!("negative balance {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Balance, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
            Ok(Balance::from(v as u64))
        } else {
            Err(E::custom(format!("balance must be a non-negative integer, got {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Balance, E> {
        v.parse().map_err(E::custom)
    }
}
