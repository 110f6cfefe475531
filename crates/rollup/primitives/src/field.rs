//! Canonical field-element representation.
//!
//! All hash inputs and outputs pass through [`FieldElement`]. Textual form is
//! always `0x` followed by 64 lowercase hex digits, big-endian. Parsing also
//! accepts decimal numerals since circom tooling emits public signals that way.

use std::{fmt, str::FromStr};

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::PrimitivesError;

/// Element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The zero sentinel used for padding and for the empty-tree root.
    pub fn zero() -> Self {
        Self(Fr::from(0u64))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Reduces an arbitrary-precision integer modulo the field order.
    pub fn from_biguint(value: &BigUint) -> Self {
        Self(Fr::from_be_bytes_mod_order(&value.to_bytes_be()))
    }

    /// Order of the scalar field, `r`.
    pub fn modulus() -> BigUint {
        BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be())
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_be_bytes())
    }

    /// Big-endian, fixed 32-byte encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Decimal representation, as expected by circom witness generators.
    pub fn to_decimal_string(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    pub(crate) fn inner(&self) -> Fr {
        self.0
    }

    pub(crate) fn from_inner(fr: Fr) -> Self {
        Self(fr)
    }
}

impl Default for FieldElement {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for b in self.to_be_bytes() {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({self})")
    }
}

impl FromStr for FieldElement {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => BigUint::parse_bytes(hex.as_bytes(), 16),
            Some(_) => None,
            None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                BigUint::parse_bytes(s.as_bytes(), 10)
            }
            None => None,
        };

        parsed
            .map(|v| Self::from_biguint(&v))
            .ok_or_else(|| PrimitivesError::InvalidFieldElement(s.to_owned()))
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
