//! Migrate command - Database migration management.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{FlowError, FlowResult, StoreError};
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> FlowResult<()> {
    let db = Database::connect(&config).await.map_err(to_flow)?;

    match args.action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            db.run_migrations().await.map_err(to_flow)?;
            tracing::info!("Migrations completed successfully");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            db.rollback_migration().await.map_err(to_flow)?;
            tracing::info!("Rollback completed successfully");
        }
    }

    Ok(())
}

fn to_flow(err: sea_orm::DbErr) -> FlowError {
    FlowError::from(StoreError::from(err))
}
