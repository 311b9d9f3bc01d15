use crate::app::App;
use crate::completion::Complete;
use anyhow::Result;
use clap::{Arg, ArgMatches};
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// The command ran fine.
pub const EXIT_SUCCESS: ExitCode = 0;
/// Invalid usage or unknown command.
pub const EXIT_COMMAND_ERROR: ExitCode = 1;
/// Something unexpected went wrong while running a command.
pub const EXIT_INTERNAL_ERROR: ExitCode = 127;

/// Values a command handler may return on success.
///
/// `()` and `None` both mean "nothing to report", which the dispatcher turns
/// into [`EXIT_SUCCESS`].
pub trait IntoExitCode {
    fn into_exit_code(self) -> Option<ExitCode>;
}

impl IntoExitCode for () {
    fn into_exit_code(self) -> Option<ExitCode> {
        None
    }
}

impl IntoExitCode for ExitCode {
    fn into_exit_code(self) -> Option<ExitCode> {
        Some(self)
    }
}

impl IntoExitCode for Option<ExitCode> {
    fn into_exit_code(self) -> Option<ExitCode> {
        self
    }
}

/// Type-erased command handler as stored in the registry.
pub type Handler =
    Box<dyn Fn(&ExecutionState<'_>, &mut dyn Write) -> Result<Option<ExitCode>>>;

/// Everything a handler gets to know about the current invocation.
///
/// A fresh state is built for every dispatch and dropped once the handler
/// returns.
pub struct ExecutionState<'a> {
    /// The application that dispatched the command.
    pub app: &'a App,
    /// Result of parsing the application-level options.
    pub global_options: ArgMatches,
    /// Name of the command being executed.
    pub command: String,
    /// Result of parsing the command's own options.
    pub options: ArgMatches,
    /// Positional arguments left over after option parsing.
    pub arguments: Vec<String>,
}

/// A named sub-command: handler plus the metadata used for parsing, help and
/// completion.
///
/// ```
/// use cliapp::Command;
/// use std::io::Write;
///
/// let cmd = Command::new("hello", |state, out| {
///     writeln!(out, "Hello, {}", state.arguments.first().map_or("world", |s| s.as_str()))?;
///     Ok(())
/// })
/// .usage("[<name>]")
/// .help_text("Greets somebody or the whole world");
/// assert_eq!(cmd.name(), "hello");
/// ```
pub struct Command {
    name: String,
    usage: String,
    help_text: Option<String>,
    options: Vec<Arg>,
    completer: Option<Rc<dyn Complete>>,
    handler: Handler,
}

impl Command {
    /// Create a command with an explicit name.
    pub fn new<F, R>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ExecutionState<'_>, &mut dyn Write) -> Result<R> + 'static,
        R: IntoExitCode,
    {
        let handler: Handler = Box::new(
            move |state: &ExecutionState<'_>, out: &mut dyn Write| {
                handler(state, out).map(IntoExitCode::into_exit_code)
            },
        );
        Self {
            name: name.into(),
            usage: String::new(),
            help_text: None,
            options: Vec::new(),
            completer: None,
            handler,
        }
    }

    /// Create a command named after the handler function itself.
    ///
    /// Only meaningful for plain `fn` items: closures have no usable name and
    /// should go through [`Command::new`].
    pub fn from_fn<F, R>(handler: F) -> Self
    where
        F: Fn(&ExecutionState<'_>, &mut dyn Write) -> Result<R> + 'static,
        R: IntoExitCode,
    {
        Self::new(handler_name::<F>(), handler)
    }

    /// Short usage fragment shown after the name, e.g. `"[<name>]"`.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Longer description shown beneath the usage line.
    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    /// Add one option understood by this command's parser.
    pub fn option(mut self, arg: Arg) -> Self {
        self.options.push(arg);
        self
    }

    pub fn options(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.options.extend(args);
        self
    }

    /// Attach a completion function used for this command's arguments in
    /// interactive mode.
    pub fn completer(mut self, completer: impl Complete + 'static) -> Self {
        self.completer = Some(Rc::new(completer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn help(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    pub fn option_specs(&self) -> &[Arg] {
        &self.options
    }

    pub fn completion(&self) -> Option<Rc<dyn Complete>> {
        self.completer.clone()
    }

    pub(crate) fn call(
        &self,
        state: &ExecutionState<'_>,
        out: &mut dyn Write,
    ) -> Result<Option<ExitCode>> {
        (self.handler)(state, out)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("help_text", &self.help_text)
            .field("options", &self.options.len())
            .field("completer", &self.completer.is_some())
            .finish_non_exhaustive()
    }
}

fn handler_name<F>() -> String {
    let full = std::any::type_name::<F>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ArgAction;

    fn hello_world(_state: &ExecutionState<'_>, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "Hello, world!")?;
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let cmd = Command::new("plain", |_state, _out| Ok(()));
        assert_eq!(cmd.name(), "plain");
        assert_eq!(cmd.usage_text(), "");
        assert_eq!(cmd.help(), None);
        assert!(cmd.option_specs().is_empty());
        assert!(cmd.completion().is_none());
    }

    #[test]
    fn test_builder_keeps_supplied_fields() {
        let cmd = Command::new("hello", |_state, _out| Ok(3))
            .usage("[<name>]")
            .help_text("Greets somebody")
            .option(Arg::new("shout").long("shout").action(ArgAction::SetTrue))
            .completer(|_: &str, _: &str, _: usize, _: usize| Vec::<String>::new());

        assert_eq!(cmd.usage_text(), "[<name>]");
        assert_eq!(cmd.help(), Some("Greets somebody"));
        assert_eq!(cmd.option_specs().len(), 1);
        assert_eq!(cmd.option_specs()[0].get_id(), "shout");
        assert!(cmd.completion().is_some());
    }

    #[test]
    fn test_from_fn_uses_function_name() {
        let cmd = Command::from_fn(hello_world);
        assert_eq!(cmd.name(), "hello_world");
    }

    #[test]
    fn test_into_exit_code() {
        assert_eq!(().into_exit_code(), None);
        assert_eq!(4_i32.into_exit_code(), Some(4));
        assert_eq!(None::<ExitCode>.into_exit_code(), None);
        assert_eq!(Some(2_i32).into_exit_code(), Some(2));
    }
}
