use clap::Args;

use crate::state::{AppConfig, AppState, PresenceMode};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Never prompt for presence when opening (unattended hosts)
    #[arg(long)]
    pub assume_presence: bool,

    /// Default log level written to the config
    #[arg(long, default_value = "warn")]
    pub default_log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            presence: if self.assume_presence {
                PresenceMode::Assume
            } else {
                PresenceMode::Prompt
            },
            log_level: self.default_log_level.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized secrypt directory at: {}\n\
             - Device key: {}\n\
             - Config: {}\n\
             - Presence: {:?}",
            state.secrypt_dir.display(),
            state.key_path.display(),
            state.config_path.display(),
            state.config.presence,
        );

        Ok(output)
    }
}
