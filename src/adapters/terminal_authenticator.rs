//! Authenticator that asks for confirmation on a terminal
//!
//! Used by the `sekeys` binary on machines without biometric hardware. The
//! prompt runs on its own thread so `request_authentication` returns
//! immediately, like a platform biometric sheet would.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, warn};

use crate::model::{AuthenticationOutcome, KeyQueryAttributes, OsStatus, PromptMessage};
use crate::ports::{Authenticator, OutcomeCallback};

type SharedReader = Arc<Mutex<Box<dyn BufRead + Send>>>;
type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub struct TerminalAuthenticator {
    input: SharedReader,
    output: SharedWriter,
}

impl TerminalAuthenticator {
    /// Prompts on stderr and reads the answer from stdin
    pub fn new() -> Self {
        Self::with_io(io::stdin(), io::stderr())
    }

    pub fn with_io<R, W>(input: R, output: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            input: Arc::new(Mutex::new(Box::new(BufReader::new(input)))),
            output: Arc::new(Mutex::new(Box::new(output))),
        }
    }
}

impl Default for TerminalAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

fn ask(input: &SharedReader, output: &SharedWriter, question: &str) -> AuthenticationOutcome {
    {
        let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write!(output, "{} [y/N] ", question).and_then(|_| output.flush()) {
            warn!("Failed to show authentication prompt: {}", e);
            return AuthenticationOutcome::rejected(OsStatus::LA_AUTHENTICATION_FAILED.code());
        }
    }

    let mut answer = String::new();
    let mut input = input.lock().unwrap_or_else(PoisonError::into_inner);
    match input.read_line(&mut answer) {
        Ok(0) => AuthenticationOutcome::rejected(OsStatus::LA_USER_CANCEL.code()),
        Ok(_) => match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => AuthenticationOutcome::approved(),
            _ => AuthenticationOutcome::rejected(OsStatus::LA_USER_CANCEL.code()),
        },
        Err(e) => {
            warn!("Failed to read authentication answer: {}", e);
            AuthenticationOutcome::rejected(OsStatus::LA_AUTHENTICATION_FAILED.code())
        }
    }
}

impl Authenticator for TerminalAuthenticator {
    fn is_supported(&self) -> bool {
        true
    }

    fn request_authentication(
        &self,
        prompt: &PromptMessage,
        scope: &KeyQueryAttributes,
        on_outcome: OutcomeCallback,
    ) {
        let input = Arc::clone(&self.input);
        let output = Arc::clone(&self.output);
        let question = format!("{} (key {})", prompt, scope.tag);

        debug!("Requesting terminal confirmation for {}", scope.tag);
        let spawned = thread::Builder::new()
            .name("terminal-auth".to_string())
            .spawn({
                let on_outcome = on_outcome.clone();
                move || on_outcome.deliver(ask(&input, &output, &question))
            });

        if let Err(e) = spawned {
            warn!("Failed to start authentication prompt: {}", e);
            on_outcome.deliver(AuthenticationOutcome::rejected(
                OsStatus::LA_AUTHENTICATION_FAILED.code(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_tests_for;
    use crate::model::TokenScope;
    use crate::ports::contract_tests::authenticator_contract;
    use std::io::Cursor;
    use std::time::Duration;

    contract_tests_for!(
        terminal_authenticator_contract,
        make = || TerminalAuthenticator::with_io(Cursor::new(b"y\n".to_vec()), io::sink()),
        tests = {
            test_delivers_single_approval => authenticator_contract::test_delivers_single_approval,
        }
    );

    fn outcome_for(answer: &'static [u8]) -> AuthenticationOutcome {
        let auth = TerminalAuthenticator::with_io(Cursor::new(answer.to_vec()), io::sink());
        let (tx, rx) = crossbeam_channel::unbounded();
        let scope =
            KeyQueryAttributes::private_key("net.example.tty".parse().unwrap(), TokenScope::Keychain);

        auth.request_authentication(
            &"decrypt secret".parse().unwrap(),
            &scope,
            OutcomeCallback::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_yes_approves() {
        assert!(outcome_for(b"yes\n").approved);
        assert!(outcome_for(b"Y\n").approved);
    }

    #[test]
    fn test_anything_else_rejects() {
        let outcome = outcome_for(b"no\n");
        assert!(!outcome.approved);
        assert_eq!(outcome.error_code, OsStatus::LA_USER_CANCEL.code());
    }

    #[test]
    fn test_eof_rejects() {
        assert!(!outcome_for(b"").approved);
    }
}
