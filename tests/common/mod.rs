//! Collaborators shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use enclave_keys::fake_platform::{AuthBehaviour, InstrumentedKeyStore, ScriptedAuthenticator};
use enclave_keys::model::AuthenticationOutcome;
use enclave_keys::{EnclaveConfig, SecureEnclave, SoftwareKeychain};

pub type Store = InstrumentedKeyStore<SoftwareKeychain>;
pub type TestEnclave = SecureEnclave<Store, Store, ScriptedAuthenticator>;

pub fn enclave(behaviour: AuthBehaviour) -> (Arc<Store>, Arc<ScriptedAuthenticator>, TestEnclave) {
    enclave_with(behaviour, EnclaveConfig::default())
}

pub fn enclave_with(
    behaviour: AuthBehaviour,
    config: EnclaveConfig,
) -> (Arc<Store>, Arc<ScriptedAuthenticator>, TestEnclave) {
    let store = Arc::new(InstrumentedKeyStore::new(SoftwareKeychain::in_memory()));
    let auth = Arc::new(ScriptedAuthenticator::new(behaviour));
    let enclave =
        SecureEnclave::new(Arc::clone(&store), Arc::clone(&store), Arc::clone(&auth), config)
            .expect("enclave should start");
    (store, auth, enclave)
}

/// Answers every prompt held by a `Manual` authenticator
pub fn release(auth: &ScriptedAuthenticator, outcome: AuthenticationOutcome) {
    for callback in auth.take_pending() {
        callback.deliver(outcome);
    }
}
