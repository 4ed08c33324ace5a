use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use super::CustodianError;

/// Something that can confirm a user is physically present
pub trait PresenceVerifier: Send + Sync {
    /// Ask for confirmation; `Ok(false)` means the user declined
    fn confirm(&self, reason: &str) -> io::Result<bool>;
}

/// Confirms every request without asking
///
/// For non-interactive use (`--yes`) and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumePresent;

impl PresenceVerifier for AssumePresent {
    fn confirm(&self, _reason: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Asks on stderr and reads a y/N answer from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl PresenceVerifier for TerminalPrompt {
    fn confirm(&self, reason: &str) -> io::Result<bool> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "secrypt wants to {}. Allow? [y/N] ", reason)?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes"))
    }
}

/// Authentication context passed into every custodian call
///
/// Callers build one per operation; nothing about authentication is kept in
/// global state.
#[derive(Clone)]
pub struct AuthContext {
    verifier: Arc<dyn PresenceVerifier>,
    reason: String,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    pub fn new(verifier: impl PresenceVerifier + 'static) -> Self {
        Self {
            verifier: Arc::new(verifier),
            reason: "use your sealing key".to_string(),
        }
    }

    /// Override the text shown to the user when presence is requested
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Run the presence check; denial and I/O failure both abort the caller
    pub fn confirm_presence(&self) -> Result<(), CustodianError> {
        tracing::debug!(reason = %self.reason, "requesting user presence");
        if self.verifier.confirm(&self.reason)? {
            Ok(())
        } else {
            tracing::warn!("user presence denied");
            Err(CustodianError::PresenceDenied)
        }
    }
}
