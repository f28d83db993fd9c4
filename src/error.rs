//! Error types for enclave-keys
//!
//! Every caller-facing operation ends in a single terminal outcome: a value,
//! an explicit "absent" result (for find/delete), or one of these errors.
//! Nothing is retried automatically.

use thiserror::Error;

use crate::model::{DataError, KeyTagError, OsStatus, PromptError};

/// Result type alias for enclave-keys operations
pub type EnclaveResult<T> = Result<T, EnclaveError>;

/// Top-level error type for all enclave-keys operations
#[derive(Error, Debug)]
pub enum EnclaveError {
    /// The platform lacks biometric hardware or the required APIs
    #[error("Biometric auth is not supported")]
    NotSupported,

    #[error("A key with this keyTag already exists, please delete it first")]
    AlreadyExists,

    #[error("Key not found in Secure Enclave")]
    NotFound,

    /// The platform rejected one of the parameters of `op`
    #[error("{op}: bad parameter")]
    BadParameter { op: &'static str },

    #[error("Algorithm not supported")]
    AlgorithmUnsupported,

    /// The user refused or failed biometric authentication
    #[error("User refused to authenticate (code {code})")]
    AuthenticationRejected { code: i64 },

    /// No authentication outcome arrived before the configured deadline
    #[error("Authentication timed out")]
    AuthenticationTimedOut,

    #[error("{}", describe(op, *code))]
    Store { op: &'static str, code: i64 },

    #[error("{}", describe(op, *code))]
    Engine { op: &'static str, code: i64 },

    /// Caller input failed validation before any store access
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] DomainError),

    /// The decrypt coordinator stopped before the request finished
    #[error("Decrypt coordinator shut down before the request completed")]
    Shutdown,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    KeyTag(#[from] KeyTagError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

fn describe(op: &str, code: i64) -> String {
    if code == OsStatus::SUCCESS.code() {
        format!("{op}: unknown error without error code")
    } else {
        format!("{op}: error code {code}")
    }
}

impl EnclaveError {
    /// Maps a key store status to the error taxonomy.
    pub fn from_store_status(status: OsStatus, op: &'static str) -> Self {
        match status {
            OsStatus::ITEM_NOT_FOUND => EnclaveError::NotFound,
            OsStatus::DUPLICATE_ITEM => EnclaveError::AlreadyExists,
            OsStatus::PARAM => EnclaveError::BadParameter { op },
            other => EnclaveError::Store {
                op,
                code: other.code(),
            },
        }
    }

    /// Maps a crypto engine status to the error taxonomy.
    ///
    /// Codes meaning "authentication required but not granted" become
    /// [`EnclaveError::AuthenticationRejected`] so callers can offer a retry.
    pub fn from_engine_status(status: OsStatus, op: &'static str) -> Self {
        match status {
            s if s.is_authentication_not_granted() => EnclaveError::AuthenticationRejected {
                code: s.code(),
            },
            OsStatus::ITEM_NOT_FOUND => EnclaveError::NotFound,
            OsStatus::PARAM => EnclaveError::BadParameter { op },
            other => EnclaveError::Engine {
                op,
                code: other.code(),
            },
        }
    }

    /// Platform status code carried by this error, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            EnclaveError::AuthenticationRejected { code }
            | EnclaveError::Store { code, .. }
            | EnclaveError::Engine { code, .. } => Some(*code),
            EnclaveError::NotFound => Some(OsStatus::ITEM_NOT_FOUND.code()),
            EnclaveError::BadParameter { .. } => Some(OsStatus::PARAM.code()),
            _ => None,
        }
    }

    /// True for failures the user can fix by simply trying again.
    pub fn is_user_retryable(&self) -> bool {
        matches!(
            self,
            EnclaveError::AuthenticationRejected { .. } | EnclaveError::AuthenticationTimedOut
        )
    }
}

impl From<KeyTagError> for EnclaveError {
    fn from(err: KeyTagError) -> Self {
        EnclaveError::InvalidArgument(DomainError::KeyTag(err))
    }
}

impl From<DataError> for EnclaveError {
    fn from(err: DataError) -> Self {
        EnclaveError::InvalidArgument(DomainError::Data(err))
    }
}

impl From<PromptError> for EnclaveError {
    fn from(err: PromptError) -> Self {
        EnclaveError::InvalidArgument(DomainError::Prompt(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            EnclaveError::NotFound.to_string(),
            "Key not found in Secure Enclave"
        );
        assert_eq!(
            EnclaveError::AlreadyExists.to_string(),
            "A key with this keyTag already exists, please delete it first"
        );
    }

    #[test]
    fn test_store_status_mapping() {
        assert!(matches!(
            EnclaveError::from_store_status(OsStatus::ITEM_NOT_FOUND, "find_key"),
            EnclaveError::NotFound
        ));
        assert!(matches!(
            EnclaveError::from_store_status(OsStatus::DUPLICATE_ITEM, "create_key"),
            EnclaveError::AlreadyExists
        ));

        let err = EnclaveError::from_store_status(OsStatus::PARAM, "delete_key");
        assert_eq!(err.to_string(), "delete_key: bad parameter");

        let err = EnclaveError::from_store_status(OsStatus(-34018), "find_key");
        assert_eq!(err.to_string(), "find_key: error code -34018");
        assert_eq!(err.code(), Some(-34018));
    }

    #[test]
    fn test_status_without_code() {
        let err = EnclaveError::from_store_status(OsStatus::SUCCESS, "copy_public_key");
        assert_eq!(
            err.to_string(),
            "copy_public_key: unknown error without error code"
        );
    }

    #[test]
    fn test_engine_auth_code_is_distinguished() {
        let err = EnclaveError::from_engine_status(OsStatus::AUTH_FAILED, "decrypt");
        assert!(matches!(
            err,
            EnclaveError::AuthenticationRejected { code: -25293 }
        ));
        assert!(err.is_user_retryable());

        let err = EnclaveError::from_engine_status(OsStatus::DECODE, "decrypt");
        assert!(matches!(err, EnclaveError::Engine { op: "decrypt", .. }));
        assert!(!err.is_user_retryable());
        assert!(err.to_string().contains("decrypt"));
    }

    #[test]
    fn test_validation_conversion() {
        let err: EnclaveError = KeyTagError::Empty.into();
        assert!(err.to_string().contains("keyTag cannot be empty"));

        let err: EnclaveError = DataError::Empty.into();
        assert!(matches!(
            err,
            EnclaveError::InvalidArgument(DomainError::Data(DataError::Empty))
        ));
    }
}
