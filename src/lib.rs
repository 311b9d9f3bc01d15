//! Building blocks for command-line applications made of named sub-commands.
//!
//! An [`App`] owns a set of [`Command`]s. Running it parses the application
//! options, picks the command named on the command line, parses that
//! command's own options and calls its handler. The same commands can also be
//! typed at an interactive prompt with completion and history, see
//! [`App::interact`].
//!
//! Every registered command is documented by its usage and help text, which
//! `--help-commands` and the built-in `help` command print.

mod app;
mod builtin;
pub mod command;
pub mod completion;
pub mod config;
mod editor;
pub mod error;
pub mod help;
pub mod interactive;
pub mod lexer;
pub mod registry;

pub use app::App;
pub use command::{
    Command, EXIT_COMMAND_ERROR, EXIT_INTERNAL_ERROR, EXIT_SUCCESS, ExecutionState, ExitCode,
};
pub use completion::Complete;
pub use config::{AppConfig, CompletionKey};
pub use editor::{CompletionHelper, RustylineEditor};
pub use error::{CommandError, HelpError};
pub use interactive::{LineEditor, ReadEvent};
pub use registry::CommandRegistry;
