//! Account addresses.
//!
//! Addresses are opaque 43-character strings (base64url encodings of 32-byte
//! hashes on the host network). The contract only checks the exact length;
//! any further format validation belongs to the host. Equality is exact
//! string equality, so two spellings of the same key are two accounts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::ADDRESS_LEN;
use crate::error::ContractError;

/// A validated account address.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(String);

impl Address {
    /// Parse an address, rejecting anything that is not exactly
    /// [`ADDRESS_LEN`] characters long.
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        if !is_well_formed(s) {
            return Err(ContractError::InvalidIdentity(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `s` has the shape of an address or content reference.
///
/// Length is counted in characters, not bytes.
pub fn is_well_formed(s: &str) -> bool {
    s.chars().count() == ADDRESS_LEN
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn parse_accepts_exact_length() {
        let addr = Address::parse(ALICE).unwrap();
        assert_eq!(addr.as_str(), ALICE);
        assert_eq!(addr.to_string(), ALICE);
    }

    #[test]
    fn parse_rejects_short_and_long() {
        let short = &ALICE[..42];
        let long = format!("{ALICE}a");
        assert_eq!(
            Address::parse(short),
            Err(ContractError::InvalidIdentity(short.to_string()))
        );
        assert!(Address::parse(&long).is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn length_counts_characters() {
        // 43 two-byte characters: 86 bytes, still a well-formed address.
        let wide = "é".repeat(ADDRESS_LEN);
        assert!(is_well_formed(&wide));
    }

    #[test]
    fn from_str_matches_parse() {
        let parsed: Address = ALICE.parse().unwrap();
        assert_eq!(parsed, Address::parse(ALICE).unwrap());
    }

    #[test]
    fn serde_json_roundtrip() {
        let addr = Address::parse(ALICE).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{ALICE}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn deserialize_rejects_malformed() {
        let result: Result<Address, _> = serde_json::from_str("\"too-short\"");
        assert!(result.is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Address::parse(ALICE).unwrap();
        let b = Address::parse(&"b".repeat(ADDRESS_LEN)).unwrap();
        assert!(a < b);
    }
}
