//! Lifecycle of a single authenticated decryption

use std::fmt;

/// ```text
/// Idle -> Requested -> AwaitingAuthentication -+-> Authenticated -> Decrypting -> Completed
///                                              |                        |
///                                              +-> Rejected ------------+-> Failed
/// ```
///
/// `Requested` may also fail directly (shutdown, watchdog), and
/// `Authenticated` fails when the key is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecryptState {
    Idle,
    Requested,
    AwaitingAuthentication,
    Authenticated,
    Decrypting,
    Completed,
    Rejected,
    Failed,
}

impl DecryptState {
    pub fn can_transition_to(self, next: DecryptState) -> bool {
        use DecryptState::*;

        matches!(
            (self, next),
            (Idle, Requested)
                | (Requested, AwaitingAuthentication)
                | (Requested, Failed)
                | (AwaitingAuthentication, Authenticated)
                | (AwaitingAuthentication, Rejected)
                | (AwaitingAuthentication, Failed)
                | (Authenticated, Decrypting)
                | (Authenticated, Failed)
                | (Decrypting, Completed)
                | (Decrypting, Failed)
                | (Rejected, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DecryptState::Completed | DecryptState::Failed)
    }
}

impl fmt::Display for DecryptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
