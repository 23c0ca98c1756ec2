//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is its own strategy type with its own input type, so
//! dispatch in `main` is monomorphized and needs no boxing.

use std::process::ExitCode;

mod init;
mod run;
mod status;
mod version;

pub use init::{InitInput, InitStrategy};
pub use run::{RunInput, RunStrategy};
pub use status::{StatusInput, StatusStrategy};
pub use version::VersionStrategy;

/// Exit status of a run that visited every record.
pub const EXIT_COMPLETE: u8 = 0;

/// Exit status of a run that stopped early but can be resumed. Fatal errors
/// returned from `main` exit with 1.
pub const EXIT_INTERRUPTED: u8 = 2;

/// Contract shared by all command strategies.
///
/// # Example
/// ```rust,ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<ExitCode> {
///         Ok(ExitCode::SUCCESS)
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command. Fatal failures are errors; anything the user
    /// can act on by re-running is reported through the exit code.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<ExitCode>;
}
