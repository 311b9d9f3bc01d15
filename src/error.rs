use std::io;
use thiserror::Error;

/// User-facing failures raised while dispatching a command.
///
/// These are reported with their message and exit code 1; they never abort an
/// interactive session. Handlers may return them too (through `anyhow`) to get
/// the same treatment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The invocation is missing something mandatory, e.g. the command name.
    #[error("{0}")]
    InvalidUsage(String),
    /// The requested command is not registered.
    #[error("command not found: {0}")]
    CommandNotFound(String),
}

/// Failure while printing usage and help.
#[derive(Debug, Error)]
pub enum HelpError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("failed to write help: {0}")]
    Io(#[from] io::Error),
}

impl CommandError {
    pub(crate) fn command_required() -> Self {
        CommandError::InvalidUsage("A command is required! See --help-commands.".to_string())
    }
}
