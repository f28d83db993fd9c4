//! Decryption requests and their in-flight bookkeeping

use std::time::Instant;

use tracing::{debug, warn};

use super::state::DecryptState;
use crate::completion::Completer;
use crate::error::EnclaveResult;
use crate::model::{EncryptedBlob, KeyQueryAttributes, KeyTag, PlaintextBlob, PromptMessage};

/// What the caller asked for: decrypt `ciphertext` with the key tagged
/// `tag` once the user confirms `prompt`
#[derive(Debug, Clone)]
pub struct DecryptionRequest {
    pub tag: KeyTag,
    pub ciphertext: EncryptedBlob,
    pub prompt: PromptMessage,
}

/// Coordinator-assigned identifier of one in-flight request
pub(crate) type RequestId = u64;

/// State of one decrypt call, owned by the coordinator worker
///
/// Holds the ciphertext, the query and the caller's completer until
/// [`finish`](Self::finish) consumes it. That is the only way out: the
/// result is delivered and the owned buffers released together.
#[derive(Debug)]
pub(crate) struct PendingDecryption {
    pub(crate) id: RequestId,
    pub(crate) query: KeyQueryAttributes,
    pub(crate) ciphertext: EncryptedBlob,
    pub(crate) prompt: PromptMessage,
    pub(crate) deadline: Option<Instant>,
    state: DecryptState,
    completer: Completer<PlaintextBlob>,
}

impl PendingDecryption {
    pub(crate) fn new(
        id: RequestId,
        request: DecryptionRequest,
        query: KeyQueryAttributes,
        completer: Completer<PlaintextBlob>,
    ) -> Self {
        let mut pending = Self {
            id,
            query,
            ciphertext: request.ciphertext,
            prompt: request.prompt,
            deadline: None,
            state: DecryptState::Idle,
            completer,
        };
        pending.advance(DecryptState::Requested);
        pending
    }

    pub(crate) fn tag(&self) -> &KeyTag {
        &self.query.tag
    }

    pub(crate) fn state(&self) -> DecryptState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: DecryptState) {
        if !self.state.can_transition_to(next) {
            warn!(
                "Request {} for {}: unexpected transition {} -> {}",
                self.id, self.query.tag, self.state, next
            );
        }
        debug!("Request {} for {}: {} -> {}", self.id, self.query.tag, self.state, next);
        self.state = next;
    }

    /// Deliver the terminal result and release everything this request owns.
    pub(crate) fn finish(mut self, result: EnclaveResult<PlaintextBlob>) -> DecryptState {
        let terminal = if result.is_ok() {
            DecryptState::Completed
        } else {
            DecryptState::Failed
        };
        self.advance(terminal);
        self.completer.complete(result);
        terminal
    }
}
