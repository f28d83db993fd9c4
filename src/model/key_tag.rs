use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifier of a key pair inside the key store.
///
/// Tags are usually built from a reverse-DNS string
/// (`net.example.app.key`), but any non-empty byte sequence is accepted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyTag(Vec<u8>);

impl KeyTag {
    pub fn new(tag: Vec<u8>) -> Result<Self, KeyTagError> {
        if tag.is_empty() {
            return Err(KeyTagError::Empty);
        }
        Ok(Self(tag))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex form, safe to use as a file name.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(encoded: &str) -> Result<Self, KeyTagError> {
        let bytes = hex::decode(encoded).map_err(|e| KeyTagError::InvalidHex {
            reason: e.to_string(),
        })?;
        Self::new(bytes)
    }
}

impl FromStr for KeyTag {
    type Err = KeyTagError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::new(tag.as_bytes().to_vec())
    }
}

impl fmt::Display for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyTag({:?})", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyTagError {
    #[error("keyTag cannot be empty")]
    Empty,

    #[error("keyTag is not valid hex: {reason}")]
    InvalidHex { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tag_valid() {
        let tag: KeyTag = "net.example.key".parse().unwrap();
        assert_eq!(tag.as_bytes(), b"net.example.key");
        assert_eq!(tag.to_string(), "net.example.key");
    }

    #[test]
    fn test_key_tag_empty() {
        assert_eq!("".parse::<KeyTag>().unwrap_err(), KeyTagError::Empty);
        assert_eq!(KeyTag::new(Vec::new()).unwrap_err(), KeyTagError::Empty);
    }

    #[test]
    fn test_key_tag_hex_round_trip() {
        let tag = KeyTag::new(vec![0x00, 0xff, 0x10]).unwrap();
        assert_eq!(tag.to_hex(), "00ff10");
        assert_eq!(KeyTag::from_hex("00ff10").unwrap(), tag);
    }

    #[test]
    fn test_key_tag_from_bad_hex() {
        assert!(matches!(
            KeyTag::from_hex("zz").unwrap_err(),
            KeyTagError::InvalidHex { .. }
        ));
        assert_eq!(KeyTag::from_hex("").unwrap_err(), KeyTagError::Empty);
    }
}
