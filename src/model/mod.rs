mod blob;
mod key_tag;
mod outcome;
mod prompt;
mod public_key;
mod query;
mod scheme;
mod status;

pub use blob::{DataError, EncryptedBlob, PlaintextBlob};
pub use key_tag::{KeyTag, KeyTagError};
pub use outcome::AuthenticationOutcome;
pub use prompt::{PromptError, PromptMessage};
pub use public_key::PublicKeyBytes;
pub use query::{
    AccessControl, Accessibility, KeyClass, KeyGenerationAttributes, KeyQueryAttributes, KeyType,
    TokenScope,
};
pub use scheme::{KeyOperation, Scheme};
pub use status::OsStatus;
