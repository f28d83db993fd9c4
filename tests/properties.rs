mod common;

use common::enclave;
use enclave_keys::fake_platform::AuthBehaviour;
use enclave_keys::EnclaveError;
use proptest::prelude::*;

fn tag_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.]{0,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn create_then_find_returns_same_public_key(tag in tag_strategy()) {
        let (_, _, enclave) = enclave(AuthBehaviour::Approve);

        let created = enclave.create_key_pair(&tag).wait().unwrap();
        let found = enclave.find_key_pair(&tag).wait().unwrap();
        prop_assert_eq!(found, Some(created));
    }

    #[test]
    fn create_on_existing_tag_fails_and_keeps_key(tag in tag_strategy()) {
        let (_, _, enclave) = enclave(AuthBehaviour::Approve);
        let created = enclave.create_key_pair(&tag).wait().unwrap();

        let second = enclave.create_key_pair(&tag).wait();
        prop_assert!(matches!(second, Err(EnclaveError::AlreadyExists)));
        prop_assert_eq!(enclave.find_key_pair(&tag).wait().unwrap(), Some(created));
    }

    #[test]
    fn delete_reports_presence(tag in tag_strategy(), create_first in any::<bool>()) {
        let (_, _, enclave) = enclave(AuthBehaviour::Approve);
        if create_first {
            enclave.create_key_pair(&tag).wait().unwrap();
        }

        prop_assert_eq!(enclave.delete_key_pair(&tag).wait().unwrap(), create_first);
        prop_assert!(enclave.find_key_pair(&tag).wait().unwrap().is_none());
    }

    #[test]
    fn approved_decrypt_round_trips(
        tag in tag_strategy(),
        plaintext in proptest::collection::vec(any::<u8>(), 1..512),
    ) {
        let (_, _, enclave) = enclave(AuthBehaviour::Approve);
        enclave.create_key_pair(&tag).wait().unwrap();

        let ciphertext = enclave.encrypt(&tag, &plaintext).wait().unwrap();
        let decrypted = enclave
            .decrypt(&tag, ciphertext.as_bytes(), "Decrypt?")
            .wait()
            .unwrap();
        prop_assert_eq!(decrypted.as_bytes(), plaintext.as_slice());
    }
}
