//! Status codes reported by the platform collaborators
//!
//! Values follow the Security framework / LocalAuthentication numbering so
//! a native backend can pass its codes through unchanged.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OsStatus(pub i64);

impl OsStatus {
    pub const SUCCESS: OsStatus = OsStatus(0);
    /// One or more parameters passed to a function were not valid
    pub const PARAM: OsStatus = OsStatus(-50);
    /// User canceled the operation
    pub const USER_CANCELED: OsStatus = OsStatus(-128);
    /// Authorization/authentication failed
    pub const AUTH_FAILED: OsStatus = OsStatus(-25293);
    /// The item already exists
    pub const DUPLICATE_ITEM: OsStatus = OsStatus(-25299);
    /// The item cannot be found
    pub const ITEM_NOT_FOUND: OsStatus = OsStatus(-25300);
    /// User interaction is not allowed
    pub const INTERACTION_NOT_ALLOWED: OsStatus = OsStatus(-25308);
    /// Unable to decode the provided data
    pub const DECODE: OsStatus = OsStatus(-26275);
    /// Internal error in the store or engine
    pub const INTERNAL: OsStatus = OsStatus(-26276);

    /// LocalAuthentication: the user failed to provide valid credentials
    pub const LA_AUTHENTICATION_FAILED: OsStatus = OsStatus(-1);
    /// LocalAuthentication: the user tapped cancel
    pub const LA_USER_CANCEL: OsStatus = OsStatus(-2);
    /// LocalAuthentication: biometry is not available on the device
    pub const LA_BIOMETRY_NOT_AVAILABLE: OsStatus = OsStatus(-6);

    pub fn code(self) -> i64 {
        self.0
    }

    /// Codes the engine returns when a key operation needed a user
    /// authentication that was not granted.
    pub fn is_authentication_not_granted(self) -> bool {
        matches!(
            self,
            OsStatus::AUTH_FAILED | OsStatus::INTERACTION_NOT_ALLOWED | OsStatus::USER_CANCELED
        )
    }
}

impl fmt::Debug for OsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OsStatus({})", self.0)
    }
}

impl fmt::Display for OsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_not_granted_codes() {
        assert!(OsStatus::AUTH_FAILED.is_authentication_not_granted());
        assert!(OsStatus::INTERACTION_NOT_ALLOWED.is_authentication_not_granted());
        assert!(!OsStatus::ITEM_NOT_FOUND.is_authentication_not_granted());
        assert!(!OsStatus::DECODE.is_authentication_not_granted());
    }
}
