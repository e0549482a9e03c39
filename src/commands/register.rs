//! Register command - One-shot account registration.

use crate::cli::args::RegisterArgs;
use crate::config::Config;
use crate::errors::FlowResult;
use crate::services::{AccountService, Outcome};

/// Execute the register command
pub async fn execute(args: RegisterArgs, config: Config) -> FlowResult<()> {
    let engine = super::build_engine(&config).await?;

    match engine
        .register(&args.username, &args.email, &args.password)
        .await?
    {
        Outcome::Created => {
            tracing::info!(username = %args.username, "account registered");
        }
        Outcome::AlreadyExists => {
            tracing::warn!(
                username = %args.username,
                "a login with this username is already registered"
            );
        }
        outcome => tracing::error!(?outcome, "unexpected registration outcome"),
    }

    Ok(())
}
