//! Authenticator trait - asynchronous biometric prompt

use std::fmt;
use std::sync::Arc;

use crate::model::{AuthenticationOutcome, KeyQueryAttributes, PromptMessage};

/// Receiver of an authentication outcome
///
/// Cheap to clone and safe to invoke from any thread. A well-behaved
/// authenticator invokes it exactly once per request; receivers must
/// tolerate (and ignore) further invocations.
#[derive(Clone)]
pub struct OutcomeCallback {
    deliver: Arc<dyn Fn(AuthenticationOutcome) + Send + Sync>,
}

impl OutcomeCallback {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(AuthenticationOutcome) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    pub fn deliver(&self, outcome: AuthenticationOutcome) {
        (self.deliver)(outcome)
    }
}

impl fmt::Debug for OutcomeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutcomeCallback")
    }
}

/// Capability to ask the user for a biometric confirmation
pub trait Authenticator: Send + Sync {
    /// Whether biometric authentication is available right now.
    ///
    /// Queried on every operation, never cached.
    fn is_supported(&self) -> bool;

    /// Show a prompt for the key described by `scope`
    ///
    /// Must return without waiting for the user. `on_outcome` is invoked
    /// later, on any thread, once the user has answered. No retries: a
    /// rejected prompt is reported once and the request is over.
    fn request_authentication(
        &self,
        prompt: &PromptMessage,
        scope: &KeyQueryAttributes,
        on_outcome: OutcomeCallback,
    );
}
