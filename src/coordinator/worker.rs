//! The coordinator's worker thread
//!
//! All `PendingDecryption` bookkeeping lives here, on one thread. Callers
//! and authenticator callbacks only ever post [`Message`]s; the worker is
//! the single consumer and the only code that resumes a request or
//! touches its completer.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use super::request::{DecryptionRequest, PendingDecryption, RequestId};
use super::state::DecryptState;
use super::Counters;
use crate::completion::Completer;
use crate::config::SameTagPolicy;
use crate::error::{EnclaveError, EnclaveResult};
use crate::model::{AuthenticationOutcome, KeyTag, PlaintextBlob};
use crate::ports::{Authenticator, CryptoEngine, KeyStore, OutcomeCallback};
use crate::use_cases::{CryptoEngineAdapter, KeyStoreAdapter};

pub(crate) enum Message {
    Submit {
        request: DecryptionRequest,
        completer: Completer<PlaintextBlob>,
    },
    Outcome {
        id: RequestId,
        outcome: AuthenticationOutcome,
    },
    Shutdown,
}

pub(crate) struct Worker<S, E, A> {
    keys: KeyStoreAdapter<S>,
    engine: CryptoEngineAdapter<E>,
    authenticator: Arc<A>,
    auth_timeout: Option<Duration>,
    policy: SameTagPolicy,
    counters: Arc<Counters>,
    inbox: Receiver<Message>,
    outbox: Sender<Message>,
    next_id: RequestId,
    in_flight: HashMap<RequestId, PendingDecryption>,
    /// Tags with a request in flight, and the requests queued behind it
    busy_tags: HashMap<KeyTag, VecDeque<PendingDecryption>>,
}

impl<S, E, A> Worker<S, E, A>
where
    S: KeyStore,
    E: CryptoEngine<S::Handle>,
    A: Authenticator,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        keys: KeyStoreAdapter<S>,
        engine: CryptoEngineAdapter<E>,
        authenticator: Arc<A>,
        auth_timeout: Option<Duration>,
        policy: SameTagPolicy,
        counters: Arc<Counters>,
        inbox: Receiver<Message>,
        outbox: Sender<Message>,
    ) -> Self {
        Self {
            keys,
            engine,
            authenticator,
            auth_timeout,
            policy,
            counters,
            inbox,
            outbox,
            next_id: 1,
            in_flight: HashMap::new(),
            busy_tags: HashMap::new(),
        }
    }

    pub(crate) fn run(mut self) {
        debug!("Decrypt coordinator started");
        loop {
            let message = match self.next_deadline() {
                Some(deadline) => self.inbox.recv_deadline(deadline),
                None => self
                    .inbox
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match message {
                Ok(Message::Submit { request, completer }) => self.submit(request, completer),
                Ok(Message::Outcome { id, outcome }) => self.on_outcome(id, outcome),
                Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => self.expire(Instant::now()),
            }
        }

        let abandoned = self.in_flight.len()
            + self.busy_tags.values().map(VecDeque::len).sum::<usize>();
        if abandoned > 0 {
            info!("Decrypt coordinator stopping with {} unfinished requests", abandoned);
        }
        // dropping the remaining requests resolves their callers with Shutdown
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.in_flight.values().filter_map(|p| p.deadline).min()
    }

    fn submit(&mut self, request: DecryptionRequest, completer: Completer<PlaintextBlob>) {
        let id = self.next_id;
        self.next_id += 1;

        let query = self.keys.query(&request.tag);
        let pending = PendingDecryption::new(id, request, query, completer);

        if self.policy == SameTagPolicy::Serialize {
            if let Some(queue) = self.busy_tags.get_mut(pending.tag()) {
                debug!(
                    "Request {} for {} queued behind {} others",
                    id,
                    pending.tag(),
                    queue.len() + 1
                );
                queue.push_back(pending);
                return;
            }
            self.busy_tags.insert(pending.tag().clone(), VecDeque::new());
        }

        self.start(pending);
    }

    /// Requested -> AwaitingAuthentication. No key store access here.
    fn start(&mut self, mut pending: PendingDecryption) {
        pending.advance(DecryptState::AwaitingAuthentication);
        let id = pending.id;
        pending.deadline = self.auth_timeout.and_then(|timeout| {
            let deadline = Instant::now().checked_add(timeout);
            if deadline.is_none() {
                warn!(
                    "Authentication timeout {:?} is out of range, request {} has no deadline",
                    timeout, id
                );
            }
            deadline
        });

        let outbox = self.outbox.clone();
        let on_outcome = OutcomeCallback::new(move |outcome| {
            // the worker may already be gone; the request resolved with Shutdown then
            let _ = outbox.send(Message::Outcome { id, outcome });
        });

        self.authenticator
            .request_authentication(&pending.prompt, &pending.query, on_outcome);
        self.in_flight.insert(id, pending);
    }

    fn on_outcome(&mut self, id: RequestId, outcome: AuthenticationOutcome) {
        let Some(mut pending) = self.in_flight.remove(&id) else {
            self.counters.ignored_outcomes.fetch_add(1, Ordering::Relaxed);
            if id < self.next_id {
                warn!(
                    "Ignoring authentication outcome for request {}: already finished",
                    id
                );
            } else {
                warn!("Ignoring authentication outcome for unknown request {}", id);
            }
            return;
        };

        let result = if outcome.approved {
            pending.advance(DecryptState::Authenticated);
            self.decrypt(&mut pending)
        } else {
            pending.advance(DecryptState::Rejected);
            debug!(
                "Authentication for {} rejected with code {}",
                pending.tag(),
                outcome.error_code
            );
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            Err(EnclaveError::AuthenticationRejected {
                code: outcome.error_code,
            })
        };

        self.finish(pending, result);
    }

    /// Authenticated -> Decrypting. The key is looked up only now.
    fn decrypt(&self, pending: &mut PendingDecryption) -> EnclaveResult<PlaintextBlob> {
        let private = self.keys.private_key(&pending.query)?;
        pending.advance(DecryptState::Decrypting);
        self.engine.decrypt(&private, &pending.ciphertext)
    }

    fn expire(&mut self, now: Instant) {
        let expired: Vec<RequestId> = self
            .in_flight
            .values()
            .filter(|p| p.deadline.is_some_and(|deadline| deadline <= now))
            .map(|p| p.id)
            .collect();

        for id in expired {
            if let Some(pending) = self.in_flight.remove(&id) {
                warn!(
                    "No authentication outcome for {} in time, failing request {}",
                    pending.tag(),
                    id
                );
                self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                self.finish(pending, Err(EnclaveError::AuthenticationTimedOut));
            }
        }
    }

    fn finish(&mut self, pending: PendingDecryption, result: EnclaveResult<PlaintextBlob>) {
        let tag = pending.tag().clone();
        let counter = match pending.finish(result) {
            DecryptState::Completed => &self.counters.completed,
            _ => &self.counters.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if self.policy == SameTagPolicy::Serialize {
            self.release_tag(&tag);
        }
    }

    fn release_tag(&mut self, tag: &KeyTag) {
        let next = match self.busy_tags.get_mut(tag) {
            Some(queue) => queue.pop_front(),
            None => return,
        };
        match next {
            Some(next) => self.start(next),
            None => {
                self.busy_tags.remove(tag);
            }
        }
    }
}
