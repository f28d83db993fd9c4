//! Test doubles for the platform ports
//!
//! `InstrumentedKeyStore` wraps a real store and counts calls so tests can
//! assert what the coordinator touched. `ScriptedAuthenticator` replays a
//! fixed authentication behaviour, including misbehaving ones.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::model::{
    AuthenticationOutcome, KeyClass, KeyGenerationAttributes, KeyOperation, KeyQueryAttributes, OsStatus,
    PromptMessage, Scheme,
};
use crate::ports::{Authenticator, CryptoEngine, KeyStore, OutcomeCallback};

#[derive(Debug)]
pub struct InstrumentedKeyStore<S> {
    inner: S,
    pub find_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
    find_failure: Mutex<Option<OsStatus>>,
    public_delete_failure: Mutex<Option<OsStatus>>,
    create_replaces: AtomicBool,
    engine_unsupported: AtomicBool,
}

impl<S> InstrumentedKeyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            find_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
            find_failure: Mutex::new(None),
            public_delete_failure: Mutex::new(None),
            create_replaces: AtomicBool::new(false),
            engine_unsupported: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Every following `find` fails with `status`
    pub fn fail_find_with(&self, status: OsStatus) {
        *self.find_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
    }

    /// Every following `delete` of a public key item fails with `status`
    pub fn fail_public_delete_with(&self, status: OsStatus) {
        *self
            .public_delete_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(status);
    }

    /// `create` generates a fresh pair even when the tag is taken, the way
    /// platform key generation does
    pub fn set_create_replaces(&self, replaces: bool) {
        self.create_replaces.store(replaces, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// The engine reports no key as supporting any operation
    pub fn set_engine_unsupported(&self, unsupported: bool) {
        self.engine_unsupported.store(unsupported, Ordering::SeqCst);
    }

    pub fn finds(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn decrypts(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

impl<S: KeyStore> KeyStore for InstrumentedKeyStore<S> {
    type Handle = S::Handle;

    fn create(&self, attrs: &KeyGenerationAttributes) -> Result<S::Handle, OsStatus> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.create_replaces.load(Ordering::SeqCst) {
            let query = attrs.query();
            self.inner.delete(&query)?;
            self.inner.delete(&query.with_class(KeyClass::Public))?;
        }
        self.inner.create(attrs)
    }

    fn find(&self, query: &KeyQueryAttributes) -> Result<Option<S::Handle>, OsStatus> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.find_failure.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(status);
        }
        self.inner.find(query)
    }

    fn delete(&self, query: &KeyQueryAttributes) -> Result<bool, OsStatus> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if query.class == KeyClass::Public {
            let failure = *self
                .public_delete_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(status) = failure {
                return Err(status);
            }
        }
        self.inner.delete(query)
    }

    fn copy_public(&self, handle: &S::Handle) -> Option<S::Handle> {
        self.inner.copy_public(handle)
    }

    fn export_public(&self, handle: &S::Handle) -> Result<Vec<u8>, OsStatus> {
        self.inner.export_public(handle)
    }
}

impl<S, H> CryptoEngine<H> for InstrumentedKeyStore<S>
where
    S: CryptoEngine<H>,
{
    fn supports(&self, handle: &H, op: KeyOperation, scheme: Scheme) -> bool {
        !self.engine_unsupported.load(Ordering::SeqCst) && self.inner.supports(handle, op, scheme)
    }

    fn encrypt(&self, handle: &H, scheme: Scheme, plaintext: &[u8]) -> Result<Vec<u8>, OsStatus> {
        self.inner.encrypt(handle, scheme, plaintext)
    }

    fn decrypt(
        &self,
        handle: &H,
        scheme: Scheme,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, OsStatus> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decrypt(handle, scheme, ciphertext)
    }
}

/// How a [`ScriptedAuthenticator`] answers each request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBehaviour {
    Approve,
    Reject(i64),
    /// Fires the approving callback twice
    ApproveTwice,
    /// Approves after the given delay
    ApproveAfter(Duration),
    /// Never answers; the callback is dropped
    Never,
    /// Keeps the callback for the test to fire via `take_pending`
    Manual,
}

#[derive(Debug)]
pub struct ScriptedAuthenticator {
    behaviour: AuthBehaviour,
    supported: bool,
    requests: AtomicUsize,
    held: Mutex<Vec<OutcomeCallback>>,
}

impl ScriptedAuthenticator {
    pub fn new(behaviour: AuthBehaviour) -> Self {
        Self {
            behaviour,
            supported: true,
            requests: AtomicUsize::new(0),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(AuthBehaviour::Approve)
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Callbacks held back by [`AuthBehaviour::Manual`], oldest first
    pub fn take_pending(&self) -> Vec<OutcomeCallback> {
        std::mem::take(&mut *self.held.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Authenticator for ScriptedAuthenticator {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn request_authentication(
        &self,
        _prompt: &PromptMessage,
        _scope: &KeyQueryAttributes,
        on_outcome: OutcomeCallback,
    ) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (outcome, repeat, delay) = match self.behaviour {
            AuthBehaviour::Approve => (AuthenticationOutcome::approved(), 1, None),
            AuthBehaviour::Reject(code) => (AuthenticationOutcome::rejected(code), 1, None),
            AuthBehaviour::ApproveTwice => (AuthenticationOutcome::approved(), 2, None),
            AuthBehaviour::ApproveAfter(d) => (AuthenticationOutcome::approved(), 1, Some(d)),
            AuthBehaviour::Never => return,
            AuthBehaviour::Manual => {
                self.held
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(on_outcome);
                return;
            }
        };

        thread::spawn(move || {
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            for _ in 0..repeat {
                on_outcome.deliver(outcome);
            }
        });
    }
}
