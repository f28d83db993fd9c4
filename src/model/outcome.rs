/// Result reported by the biometric authenticator, once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationOutcome {
    pub approved: bool,
    pub error_code: i64,
}

impl AuthenticationOutcome {
    pub fn approved() -> Self {
        Self {
            approved: true,
            error_code: 0,
        }
    }

    pub fn rejected(error_code: i64) -> Self {
        Self {
            approved: false,
            error_code,
        }
    }

    /// Builds an outcome from a platform status where `0` means success.
    pub fn from_status(code: i64) -> Self {
        if code == 0 {
            Self::approved()
        } else {
            Self::rejected(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(AuthenticationOutcome::from_status(0), AuthenticationOutcome::approved());
        let rejected = AuthenticationOutcome::from_status(-2);
        assert!(!rejected.approved);
        assert_eq!(rejected.error_code, -2);
    }
}
