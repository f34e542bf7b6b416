use core::fmt;
use std::fmt::Display;
use std::str::FromStr;

use hex::FromHex;
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};

/// A [`serde`]-compatible wrapper around a hex-encoded byte sequence with `0x`
/// prefix. Parsing and deserializing from hex strings without the `0x` prefix
/// is also allowed, and so is upper-case input; the [`Display`] form is always
/// lower-case, which makes it usable as a canonical entity key.
///
/// You should generally try to avoid using this type directly, and instead
/// alias it to something more descriptive for its intended use case, possibly
/// by enforcing a specific length.
#[derive(
    Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From,
)]
pub struct HexString<T>(pub T);

impl<T: AsRef<[u8]>> HexString<T> {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// True if every byte is zero, e.g. the null address.
    pub fn is_zero(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }
}

impl<T: AsRef<[u8]>> Display for HexString<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_ref()))
    }
}

impl<T: AsRef<[u8]>> Serialize for HexString<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self)
    }
}

impl<T: FromHex> FromStr for HexString<T> {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The `0x` prefix is optional.
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        FromHex::from_hex(stripped)
            .map(Self)
            .map_err(|_| "invalid hex string")
    }
}

impl<'a, T: FromHex> Deserialize<'a> for HexString<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl<T> schemars::JsonSchema for HexString<T> {
    fn schema_name() -> String {
        "HexString".to_owned()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        gen.subschema_for::<String>()
    }
}

impl<T: Arbitrary> Arbitrary for HexString<T> {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self(T::arbitrary(g))
    }
}
