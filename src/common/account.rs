//! # Storage Account Identifiers
//!
//! The target account is an opaque base58 address handed to us by whatever
//! account-selection UI sits upstream. It is untrusted: [`AccountId::parse`]
//! checks that it is base58 and decodes to at most 32 bytes before the address
//! is ever passed to a storage client. Shorter keys are accepted, the network
//! left-pads them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Public keys on the storage network are 32 bytes.
const KEY_LEN: usize = 32;

/// A validated storage account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validate an untrusted address string.
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    /// - [`ValidationError::NoAccount`] if the string is empty
    /// - [`ValidationError::InvalidAccount`] on a non-base58 character or a key
    ///   wider than 32 bytes
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::NoAccount);
        }

        match decoded_width(trimmed) {
            Some(width) if width <= KEY_LEN => Ok(Self(trimmed.to_string())),
            _ => Err(ValidationError::InvalidAccount),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Number of significant bytes `s` decodes to, or `None` if it is not base58.
fn decoded_width(s: &str) -> Option<usize> {
    // little-endian base-256 accumulator
    let mut bytes: Vec<u8> = Vec::with_capacity(KEY_LEN + 1);

    for c in s.chars() {
        let mut carry = BASE58_ALPHABET.find(c)? as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
        if bytes.len() > KEY_LEN {
            return Some(bytes.len());
        }
    }

    // each leading '1' encodes a zero byte
    let zeros = s.chars().take_while(|&c| c == '1').count();
    Some(zeros + bytes.len())
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    #[test]
    fn accepts_base58_address() {
        let id = AccountId::parse(ACCOUNT).unwrap();
        assert_eq!(id.as_str(), ACCOUNT);
    }

    #[test]
    fn trims_whitespace() {
        let id = AccountId::parse(&format!("  {}\n", ACCOUNT)).unwrap();
        assert_eq!(id.to_string(), ACCOUNT);
    }

    #[test]
    fn empty_is_missing_not_invalid() {
        assert_eq!(AccountId::parse("   "), Err(ValidationError::NoAccount));
    }

    #[test]
    fn accepts_short_keys() {
        assert_eq!(AccountId::parse("Abc123").unwrap().as_str(), "Abc123");
    }

    #[test]
    fn rejects_non_base58() {
        // '0', 'O', 'I' and 'l' are not in the base58 alphabet
        let bad = "0xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
        assert_eq!(AccountId::parse(bad), Err(ValidationError::InvalidAccount));
        assert_eq!(AccountId::parse("not an address"), Err(ValidationError::InvalidAccount));
    }

    #[test]
    fn rejects_keys_wider_than_32_bytes() {
        let wide = "z".repeat(45);
        assert_eq!(AccountId::parse(&wide), Err(ValidationError::InvalidAccount));
    }

    #[test]
    fn deserializes_through_validation() {
        let ok: AccountId = serde_json::from_str(&format!("\"{}\"", ACCOUNT)).unwrap();
        assert_eq!(ok.as_str(), ACCOUNT);
        assert!(serde_json::from_str::<AccountId>("\"no-pe\"").is_err());
    }
}
