//! Arbitrary-precision quantities.
//!
//! Token amounts and share counts are unbounded integers on-chain (`uint256`)
//! and can legitimately exceed any fixed-width Rust integer once summed, so
//! every aggregate goes through [`BigInt`]. Decimal figures (returns, ratios)
//! use [`BigDecimal`]. Both serialize as decimal strings, which keeps stored
//! records readable by consumers that don't share our number types.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

pub use bigdecimal::BigDecimal;
use num_traits::{Signed, ToPrimitive, Zero};
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};

/// A signed integer of arbitrary size.
#[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigInt(num_bigint::BigInt);

impl BigInt {
    pub fn zero() -> Self {
        Self(num_bigint::BigInt::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Decodes an unsigned big-endian integer, e.g. an ABI-encoded
    /// `uint256` word.
    pub fn from_unsigned_bytes_be(bytes: &[u8]) -> Self {
        Self(num_bigint::BigInt::from_bytes_be(
            num_bigint::Sign::Plus,
            bytes,
        ))
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.0.to_u32()
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BigInt {
                fn from(value: $t) -> Self {
                    Self(num_bigint::BigInt::from(value))
                }
            }
        )*
    };
}

impl_from_primitive!(i32, i64, u32, u64, u128);

impl From<num_bigint::BigInt> for BigInt {
    fn from(value: num_bigint::BigInt) -> Self {
        Self(value)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BigInt {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        num_bigint::BigInt::from_str(s).map(Self)
    }
}

impl Add<&BigInt> for &BigInt {
    type Output = BigInt;

    fn add(self, rhs: &BigInt) -> BigInt {
        BigInt(&self.0 + &rhs.0)
    }
}

impl Add for BigInt {
    type Output = BigInt;

    fn add(self, rhs: BigInt) -> BigInt {
        BigInt(self.0 + rhs.0)
    }
}

impl Sub<&BigInt> for &BigInt {
    type Output = BigInt;

    fn sub(self, rhs: &BigInt) -> BigInt {
        BigInt(&self.0 - &rhs.0)
    }
}

impl Sub for BigInt {
    type Output = BigInt;

    fn sub(self, rhs: BigInt) -> BigInt {
        BigInt(self.0 - rhs.0)
    }
}

impl AddAssign<&BigInt> for BigInt {
    fn add_assign(&mut self, rhs: &BigInt) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&BigInt> for BigInt {
    fn sub_assign(&mut self, rhs: &BigInt) {
        self.0 -= &rhs.0;
    }
}

impl Neg for BigInt {
    type Output = BigInt;

    fn neg(self) -> BigInt {
        BigInt(-self.0)
    }
}

impl std::iter::Sum for BigInt {
    fn sum<I: Iterator<Item = BigInt>>(iter: I) -> Self {
        iter.fold(BigInt::zero(), |acc, x| acc + x)
    }
}

impl<'a> std::iter::Sum<&'a BigInt> for BigInt {
    fn sum<I: Iterator<Item = &'a BigInt>>(iter: I) -> Self {
        iter.fold(BigInt::zero(), |acc, x| &acc + x)
    }
}

impl Serialize for BigInt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept plain JSON numbers as well, it makes hand-written event
        // files a lot less noisy.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            String(String),
            Unsigned(u64),
            Signed(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::String(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Unsigned(n) => Ok(n.into()),
            Repr::Signed(n) => Ok(n.into()),
        }
    }
}

impl schemars::JsonSchema for BigInt {
    fn schema_name() -> String {
        "BigInt".to_owned()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        gen.subschema_for::<String>()
    }
}

impl Arbitrary for BigInt {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        // Two 64-bit limbs go well past u64::MAX, which is what we care about.
        let high = u64::arbitrary(g) as u128;
        let low = u64::arbitrary(g) as u128;
        let magnitude = BigInt::from((high << 64) | low);
        if bool::arbitrary(g) {
            -magnitude
        } else {
            magnitude
        }
    }
}
