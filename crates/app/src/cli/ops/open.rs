use std::path::PathBuf;

use clap::Args;

use common::prelude::{open, OpenError};

use crate::state::StateError;

/// Open an envelope sealed on this device
#[derive(Args, Debug, Clone)]
pub struct Open {
    /// Envelope to open
    pub input: PathBuf,

    /// Where to write the plaintext
    pub output: PathBuf,

    /// Skip presence prompts
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenOpError {
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
    #[error("open failed: {0}")]
    Open(#[from] OpenError),
    #[error("open task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Open {
    type Error = OpenOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let custodian = state.custodian()?;
        let auth = state.auth_context(self.yes, "open a sealed file");

        let envelope = tokio::fs::read(&self.input)
            .await
            .map_err(|source| OpenOpError::Read {
                path: self.input.clone(),
                source,
            })?;

        tracing::info!(input = %self.input.display(), len = envelope.len(), "opening");
        // may block on the presence prompt
        let plaintext =
            tokio::task::spawn_blocking(move || open(&custodian, &auth, &envelope)).await??;

        super::write_output(&self.output, &plaintext).map_err(|source| OpenOpError::Write {
            path: self.output.clone(),
            source,
        })?;

        Ok(format!(
            "Opened {} to {} ({} bytes)",
            self.input.display(),
            self.output.display(),
            plaintext.len()
        ))
    }
}
