//! Restore-password command - Reset a forgotten credential.

use crate::cli::args::RestoreArgs;
use crate::config::Config;
use crate::errors::FlowResult;
use crate::services::{AccountService, Outcome};

/// Execute the restore-password command
pub async fn execute(args: RestoreArgs, config: Config) -> FlowResult<()> {
    let engine = super::build_engine(&config).await?;

    match engine.restore_password(&args.email).await? {
        Outcome::PasswordReset => {
            tracing::info!(email = %args.email, "password reset; the new password was mailed");
        }
        Outcome::NotFound => {
            tracing::warn!(email = %args.email, "no registered user for this email address");
        }
        outcome => tracing::error!(?outcome, "unexpected restore outcome"),
    }

    Ok(())
}
