//! Runtime configuration for [`SecureEnclave`](crate::SecureEnclave)

use std::time::Duration;

use crate::adapters::P256_KEY_SIZE_BITS;
use crate::model::{Scheme, TokenScope};

/// What happens when a decrypt arrives for a tag that already has one in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameTagPolicy {
    /// Queue it until the earlier request for the tag has finished
    #[default]
    Serialize,
    /// Start it immediately, each with its own prompt
    Concurrent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclaveConfig {
    /// Where keys are created and looked up
    pub token: TokenScope,
    pub scheme: Scheme,
    pub key_size_bits: u32,
    /// Fail a decrypt with `AuthenticationTimedOut` when the authenticator
    /// stays silent this long. `None` waits forever.
    pub auth_timeout: Option<Duration>,
    pub same_tag_policy: SameTagPolicy,
}

impl Default for EnclaveConfig {
    fn default() -> Self {
        Self {
            token: TokenScope::SecureEnclave,
            scheme: Scheme::default(),
            key_size_bits: P256_KEY_SIZE_BITS,
            auth_timeout: None,
            same_tag_policy: SameTagPolicy::default(),
        }
    }
}

impl EnclaveConfig {
    pub fn with_token(mut self, token: TokenScope) -> Self {
        self.token = token;
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = Some(timeout);
        self
    }

    pub fn with_same_tag_policy(mut self, policy: SameTagPolicy) -> Self {
        self.same_tag_policy = policy;
        self
    }

    pub fn with_key_size_bits(mut self, bits: u32) -> Self {
        self.key_size_bits = bits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnclaveConfig::default();
        assert_eq!(config.token, TokenScope::SecureEnclave);
        assert_eq!(config.key_size_bits, 256);
        assert_eq!(config.auth_timeout, None);
        assert_eq!(config.same_tag_policy, SameTagPolicy::Serialize);
    }

    #[test]
    fn test_builders() {
        let config = EnclaveConfig::default()
            .with_token(TokenScope::Keychain)
            .with_auth_timeout(Duration::from_secs(30))
            .with_same_tag_policy(SameTagPolicy::Concurrent);

        assert_eq!(config.token, TokenScope::Keychain);
        assert_eq!(config.auth_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.same_tag_policy, SameTagPolicy::Concurrent);
    }
}
