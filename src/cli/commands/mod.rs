//! Command implementations for bibrecon CLI
//!
//! This module contains the command execution logic, progress reporting and
//! error handling for the CLI interface. Each command is implemented in its
//! own module.

pub mod process;
pub mod shared;
pub mod templates;

pub use shared::RunStats;

use crate::Result;
use crate::cli::args::{Args, Commands};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Dispatches to the subcommand handler:
/// - `process`: batch reconciliation with partitioned output
/// - `templates`: template store management
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<RunStats> {
    match args.command {
        Commands::Process(process_args) => {
            process::run_process(process_args, cancellation_token).await
        }
        Commands::Templates(templates_args) => templates::run_templates(templates_args).await,
    }
}
