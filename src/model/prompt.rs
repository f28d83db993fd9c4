use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// User-facing reason shown in the biometric prompt.
#[derive(Clone, PartialEq, Eq)]
pub struct PromptMessage(String);

impl PromptMessage {
    pub fn new(message: String) -> Result<Self, PromptError> {
        if message.is_empty() {
            return Err(PromptError::Empty);
        }
        Ok(Self(message))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PromptMessage {
    type Err = PromptError;

    fn from_str(message: &str) -> Result<Self, Self::Err> {
        Self::new(message.to_string())
    }
}

impl fmt::Display for PromptMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PromptMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PromptMessage({:?})", self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptError {
    #[error("touchIdPrompt cannot be empty")]
    Empty,
}
