//! Commands every application gets for free.

use crate::command::Command;

/// `help`: print the usage and help of every registered command.
pub(crate) fn help_command() -> Command {
    Command::new("help", |state, out| {
        state.app.print_all_commands(out)?;
        Ok(())
    })
    .help_text("Print help about the available commands.")
}
