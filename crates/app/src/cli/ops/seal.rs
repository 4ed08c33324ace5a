use std::path::PathBuf;

use clap::Args;

use common::prelude::{seal, SealError};

use crate::state::StateError;

/// Seal a file to a new key held by this device
#[derive(Args, Debug, Clone)]
pub struct Seal {
    /// File to seal
    pub input: PathBuf,

    /// Where to write the envelope
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SealOpError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("seal failed: {0}")]
    Seal(#[from] SealError),
    #[error("seal task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Seal {
    type Error = SealOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let custodian = state.custodian()?;
        // seal agrees from the ephemeral side, so nothing here prompts
        let auth = state.auth_context(false, "create a sealing key");

        let plaintext = tokio::fs::read(&self.input)
            .await
            .map_err(|source| SealOpError::Read {
                path: self.input.clone(),
                source,
            })?;
        let plaintext_len = plaintext.len();

        tracing::info!(input = %self.input.display(), len = plaintext_len, "sealing");
        let envelope =
            tokio::task::spawn_blocking(move || seal(&custodian, &auth, &plaintext)).await??;

        super::write_output(&self.output, &envelope).map_err(|source| SealOpError::Write {
            path: self.output.clone(),
            source,
        })?;

        Ok(format!(
            "Sealed {} ({} bytes) to {} ({} bytes)",
            self.input.display(),
            plaintext_len,
            self.output.display(),
            envelope.len()
        ))
    }
}
