//! Authenticated decryption coordinator
//!
//! A decrypt call becomes a [`PendingDecryption`](request::PendingDecryption)
//! owned by a dedicated worker thread. The worker asks the authenticator
//! for confirmation, and only once an approving outcome has come back does
//! it look up the private key and decrypt. Authenticator callbacks may fire
//! on any thread: they post the outcome to the worker's queue and never
//! touch request state themselves.
//!
//! Per request the result is delivered exactly once. A second callback for
//! the same request is logged and counted in
//! [`CoordinatorStats::ignored_outcomes`], never acted on.

mod request;
mod state;
mod worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use tracing::{debug, warn};

use crate::completion::{self, Pending};
use crate::config::EnclaveConfig;
use crate::error::EnclaveResult;
use crate::model::PlaintextBlob;
use crate::ports::{Authenticator, CryptoEngine, KeyStore};
use crate::use_cases::{CryptoEngineAdapter, KeyStoreAdapter};

pub use request::DecryptionRequest;
pub use state::DecryptState;

use worker::{Message, Worker};

#[derive(Debug, Default)]
pub(crate) struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    timed_out: AtomicU64,
    ignored_outcomes: AtomicU64,
}

/// Snapshot of what the coordinator has done so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorStats {
    pub completed: u64,
    /// Includes rejected and timed out requests
    pub failed: u64,
    pub rejected: u64,
    pub timed_out: u64,
    /// Authenticator callbacks that arrived for no pending request
    pub ignored_outcomes: u64,
}

pub struct DecryptCoordinator {
    outbox: Sender<Message>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl DecryptCoordinator {
    /// Start the worker thread.
    pub fn spawn<S, E, A>(
        keys: KeyStoreAdapter<S>,
        engine: CryptoEngineAdapter<E>,
        authenticator: Arc<A>,
        config: &EnclaveConfig,
    ) -> EnclaveResult<Self>
    where
        S: KeyStore + 'static,
        E: CryptoEngine<S::Handle> + 'static,
        A: Authenticator + 'static,
    {
        let (outbox, inbox) = unbounded();
        let counters = Arc::new(Counters::default());

        let worker = Worker::new(
            keys,
            engine,
            authenticator,
            config.auth_timeout,
            config.same_tag_policy,
            Arc::clone(&counters),
            inbox,
            outbox.clone(),
        );
        let handle = thread::Builder::new()
            .name("enclave-decrypt".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            outbox,
            worker: Some(handle),
            counters,
        })
    }

    /// Queue `request`; the returned handle resolves once it is terminal.
    pub fn submit(&self, request: DecryptionRequest) -> Pending<PlaintextBlob> {
        let (completer, pending) = completion::channel();
        debug!("Submitting decrypt request for {}", request.tag);

        // a failed send hands the completer back; dropping it reports Shutdown
        if self
            .outbox
            .send(Message::Submit { request, completer })
            .is_err()
        {
            warn!("Decrypt coordinator is not running");
        }
        pending
    }

    pub fn stats(&self) -> CoordinatorStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        CoordinatorStats {
            completed: load(&self.counters.completed),
            failed: load(&self.counters.failed),
            rejected: load(&self.counters.rejected),
            timed_out: load(&self.counters.timed_out),
            ignored_outcomes: load(&self.counters.ignored_outcomes),
        }
    }
}

impl Drop for DecryptCoordinator {
    fn drop(&mut self) {
        let _ = self.outbox.send(Message::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Decrypt coordinator thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake_platform::{AuthBehaviour, InstrumentedKeyStore, ScriptedAuthenticator};
    use crate::adapters::SoftwareKeychain;
    use crate::config::SameTagPolicy;
    use crate::error::EnclaveError;
    use crate::model::{AuthenticationOutcome, EncryptedBlob, KeyTag, PlaintextBlob};
    use std::time::{Duration, Instant};

    type Store = InstrumentedKeyStore<SoftwareKeychain>;

    struct Harness {
        store: Arc<Store>,
        keys: KeyStoreAdapter<Store>,
        engine: CryptoEngineAdapter<Store>,
        auth: Arc<ScriptedAuthenticator>,
        coordinator: DecryptCoordinator,
    }

    fn harness(behaviour: AuthBehaviour, config: EnclaveConfig) -> Harness {
        let store = Arc::new(InstrumentedKeyStore::new(SoftwareKeychain::in_memory()));
        let keys = KeyStoreAdapter::new(Arc::clone(&store), &config);
        let engine = CryptoEngineAdapter::new(Arc::clone(&store), config.scheme);
        let auth = Arc::new(ScriptedAuthenticator::new(behaviour));
        let coordinator =
            DecryptCoordinator::spawn(keys.clone(), engine.clone(), Arc::clone(&auth), &config)
                .unwrap();
        Harness {
            store,
            keys,
            engine,
            auth,
            coordinator,
        }
    }

    impl Harness {
        fn encrypt_for(&self, tag: &str, data: &[u8]) -> DecryptionRequest {
            let tag: KeyTag = tag.parse().unwrap();
            if self.keys.find_key_pair(&tag).unwrap().is_none() {
                self.keys.create_key_pair(&tag).unwrap();
            }
            let public = self.keys.public_key(&tag).unwrap();
            let ciphertext = self
                .engine
                .encrypt(&public, &PlaintextBlob::new(data.to_vec()).unwrap())
                .unwrap();
            DecryptionRequest {
                tag,
                ciphertext,
                prompt: "unlock".parse().unwrap(),
            }
        }
    }

    fn eventually(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_approved_request_decrypts() {
        let h = harness(AuthBehaviour::Approve, EnclaveConfig::default());
        let request = h.encrypt_for("t1", b"hello");

        let plaintext = h.coordinator.submit(request).wait().unwrap();
        assert_eq!(plaintext.as_bytes(), b"hello");
        assert_eq!(h.coordinator.stats().completed, 1);
    }

    #[test]
    fn test_rejection_never_touches_the_store() {
        let h = harness(AuthBehaviour::Reject(-2), EnclaveConfig::default());
        let request = h.encrypt_for("t1", b"hello");
        let finds_before = h.store.finds();

        let err = h.coordinator.submit(request).wait().unwrap_err();
        assert!(matches!(err, EnclaveError::AuthenticationRejected { code: -2 }));
        assert_eq!(h.store.finds(), finds_before);
        assert_eq!(h.store.decrypts(), 0);
        assert_eq!(h.coordinator.stats().rejected, 1);
    }

    #[test]
    fn test_key_deleted_while_awaiting_authentication() {
        let h = harness(AuthBehaviour::Manual, EnclaveConfig::default());
        let request = h.encrypt_for("t1", b"hello");
        let tag = request.tag.clone();

        let pending = h.coordinator.submit(request);
        eventually(|| h.auth.requests() == 1);
        assert!(h.keys.delete_key_pair(&tag).unwrap());

        for callback in h.auth.take_pending() {
            callback.deliver(AuthenticationOutcome::approved());
        }
        assert!(matches!(pending.wait(), Err(EnclaveError::NotFound)));
    }

    #[test]
    fn test_second_callback_is_ignored() {
        let h = harness(AuthBehaviour::ApproveTwice, EnclaveConfig::default());
        let request = h.encrypt_for("t1", b"hello");

        let plaintext = h.coordinator.submit(request).wait().unwrap();
        assert_eq!(plaintext.as_bytes(), b"hello");

        eventually(|| h.coordinator.stats().ignored_outcomes == 1);
        let stats = h.coordinator.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(h.store.decrypts(), 1);
    }

    #[test]
    fn test_watchdog_fails_silent_requests() {
        let config = EnclaveConfig::default().with_auth_timeout(Duration::from_millis(50));
        let h = harness(AuthBehaviour::Manual, config);
        let request = h.encrypt_for("t1", b"hello");

        let err = h.coordinator.submit(request).wait().unwrap_err();
        assert!(matches!(err, EnclaveError::AuthenticationTimedOut));
        assert_eq!(h.coordinator.stats().timed_out, 1);

        for callback in h.auth.take_pending() {
            callback.deliver(AuthenticationOutcome::approved());
        }
        eventually(|| h.coordinator.stats().ignored_outcomes == 1);
        assert_eq!(h.store.decrypts(), 0);
    }

    #[test]
    fn test_unrepresentable_timeout_means_no_deadline() {
        let config = EnclaveConfig::default().with_auth_timeout(Duration::from_secs(u64::MAX));
        let h = harness(AuthBehaviour::Reject(-2), config);

        let first = h.coordinator.submit(h.encrypt_for("t1", b"hello")).wait();
        assert!(matches!(
            first,
            Err(EnclaveError::AuthenticationRejected { code: -2 })
        ));

        let second = h.coordinator.submit(h.encrypt_for("t1", b"hello")).wait();
        assert!(matches!(
            second,
            Err(EnclaveError::AuthenticationRejected { code: -2 })
        ));
        assert_eq!(h.coordinator.stats().timed_out, 0);
    }

    #[test]
    fn test_shutdown_resolves_unfinished_requests() {
        let h = harness(AuthBehaviour::Never, EnclaveConfig::default());
        let request = h.encrypt_for("t1", b"hello");

        let pending = h.coordinator.submit(request);
        let pending = pending
            .wait_timeout(Duration::from_millis(20))
            .expect_err("nobody answered the prompt");
        drop(h);

        assert!(matches!(pending.wait(), Err(EnclaveError::Shutdown)));
    }

    #[test]
    fn test_same_tag_requests_are_serialized() {
        let h = harness(AuthBehaviour::Manual, EnclaveConfig::default());
        let first = h.coordinator.submit(h.encrypt_for("t1", b"one"));
        let second = h.coordinator.submit(h.encrypt_for("t1", b"two"));

        eventually(|| h.auth.requests() == 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(h.auth.requests(), 1);

        for callback in h.auth.take_pending() {
            callback.deliver(AuthenticationOutcome::approved());
        }
        assert_eq!(first.wait().unwrap().as_bytes(), b"one");

        eventually(|| h.auth.requests() == 2);
        for callback in h.auth.take_pending() {
            callback.deliver(AuthenticationOutcome::approved());
        }
        assert_eq!(second.wait().unwrap().as_bytes(), b"two");
    }

    #[test]
    fn test_concurrent_policy_prompts_immediately() {
        let config = EnclaveConfig::default().with_same_tag_policy(SameTagPolicy::Concurrent);
        let h = harness(AuthBehaviour::Manual, config);
        let first = h.coordinator.submit(h.encrypt_for("t1", b"one"));
        let second = h.coordinator.submit(h.encrypt_for("t1", b"two"));

        eventually(|| h.auth.requests() == 2);
        let callbacks = h.auth.take_pending();
        callbacks[1].deliver(AuthenticationOutcome::approved());
        callbacks[0].deliver(AuthenticationOutcome::rejected(-2));

        assert_eq!(second.wait().unwrap().as_bytes(), b"two");
        assert!(matches!(
            first.wait(),
            Err(EnclaveError::AuthenticationRejected { code: -2 })
        ));
    }

    #[test]
    fn test_different_tags_do_not_wait_for_each_other() {
        let h = harness(AuthBehaviour::Manual, EnclaveConfig::default());
        let _a = h.coordinator.submit(h.encrypt_for("t1", b"one"));
        let _b = h.coordinator.submit(h.encrypt_for("t2", b"two"));

        eventually(|| h.auth.requests() == 2);
    }

    #[test]
    fn test_bad_ciphertext_is_engine_error_after_approval() {
        let h = harness(AuthBehaviour::Approve, EnclaveConfig::default());
        let mut request = h.encrypt_for("t1", b"hello");
        request.ciphertext = EncryptedBlob::new(b"broken".to_vec()).unwrap();

        let err = h.coordinator.submit(request).wait().unwrap_err();
        assert!(matches!(err, EnclaveError::Engine { op: "decrypt", .. }));
        assert_eq!(h.coordinator.stats().failed, 1);
    }
}
