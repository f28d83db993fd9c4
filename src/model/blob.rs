//! Owned byte buffers passed through encrypt/decrypt
//!
//! Plaintext is wiped from memory when dropped; ciphertext is not secret
//! but is owned the same way so a pending decryption releases it exactly
//! once, whichever way the operation ends.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

/// Ciphertext produced by the crypto engine
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    pub fn new(data: Vec<u8>) -> Result<Self, DataError> {
        if data.is_empty() {
            return Err(DataError::Empty);
        }
        Ok(Self(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBlob({} bytes)", self.0.len())
    }
}

/// Cleartext going into encrypt or coming out of decrypt
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextBlob(Zeroizing<Vec<u8>>);

impl PlaintextBlob {
    pub fn new(data: Vec<u8>) -> Result<Self, DataError> {
        if data.is_empty() {
            return Err(DataError::Empty);
        }
        Ok(Self(Zeroizing::new(data)))
    }

    /// Wraps engine output; an authenticated empty payload is still a result.
    pub(crate) fn from_engine(data: Zeroizing<Vec<u8>>) -> Self {
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PlaintextBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlaintextBlob([REDACTED; {} bytes])", self.0.len())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataError {
    #[error("data cannot be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_data_rejected() {
        assert_eq!(EncryptedBlob::new(Vec::new()).unwrap_err(), DataError::Empty);
        assert_eq!(PlaintextBlob::new(Vec::new()).unwrap_err(), DataError::Empty);
    }

    #[test]
    fn test_plaintext_debug_redacted() {
        let blob = PlaintextBlob::new(b"hello".to_vec()).unwrap();
        let debug_str = format!("{:?}", blob);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hello"));
    }

    #[test]
    fn test_encrypted_hex() {
        let blob = EncryptedBlob::new(vec![0xde, 0xad]).unwrap();
        assert_eq!(blob.to_hex(), "dead");
        assert_eq!(blob.len(), 2);
    }
}
