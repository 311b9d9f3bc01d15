use crate::builtin;
use crate::command::{
    Command, EXIT_COMMAND_ERROR, EXIT_INTERNAL_ERROR, EXIT_SUCCESS, ExecutionState, ExitCode,
};
use crate::completion::CompletionTable;
use crate::config::AppConfig;
use crate::error::{CommandError, HelpError};
use crate::help;
use crate::registry::CommandRegistry;
use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use colored::Colorize;
use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

const HELP_COMMANDS: &str = "help-commands";
const INTERACTIVE: &str = "interactive";
const COMMAND_LINE: &str = "__command_line";
const ARGUMENTS: &str = "__arguments";

/// Where an invocation comes from.
///
/// Invocations typed at the interactive prompt never start another prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Process,
    Interactive,
}

/// What a command line asks for, decided before any handler runs.
enum Decision {
    ShowCommands,
    Interactive,
    /// The option parser printed its own help or rejected the input.
    EarlyExit(clap::Error),
    Run {
        global_options: ArgMatches,
        name: String,
        args: Vec<String>,
    },
}

/// A command-line application made of named sub-commands.
///
/// The application owns the global options, the registered commands and the
/// configuration. See [`App::run`] for how a command line is dispatched.
///
/// Example
/// ```
/// use cliapp::{App, AppConfig, Command};
/// use std::io::Write;
///
/// let mut app = App::with_config("greeter", AppConfig { use_colors: false, ..AppConfig::default() });
/// app.register_command(
///     Command::new("hello", |state, out| {
///         writeln!(out, "Hello, {}", state.arguments.join(" "))?;
///         Ok(())
///     })
///     .usage("[<name>]"),
/// );
///
/// let mut out: Vec<u8> = Vec::new();
/// assert_eq!(app.run_with_output(["hello", "Sam"], &mut out), 0);
/// assert_eq!(String::from_utf8(out).unwrap(), "Hello, Sam\n");
/// ```
pub struct App {
    name: String,
    config: AppConfig,
    global_options: Vec<Arg>,
    registry: CommandRegistry,
}

impl App {
    /// Create an application with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, AppConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: AppConfig) -> Self {
        let mut app = Self {
            name: name.into(),
            config,
            global_options: Vec::new(),
            registry: CommandRegistry::new(),
        };
        if app.config.enable_commands_help {
            app.registry.register(builtin::help_command());
        }
        app
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Register a command, replacing any command with the same name.
    pub fn register_command(&mut self, command: Command) -> &mut Self {
        self.registry.register(command);
        self
    }

    /// Add an application-level option, accepted before the command name.
    pub fn global_option(&mut self, arg: Arg) -> &mut Self {
        self.global_options.push(arg);
        self
    }

    pub fn lookup(&self, name: &str) -> Result<&Command, CommandError> {
        self.registry.lookup(name)
    }

    /// Run one invocation, writing to standard output.
    ///
    /// `args` excludes the program name. Returns the exit code: the handler's
    /// own code, 0 when it returned nothing, 1 for command errors and 127 for
    /// anything unexpected.
    pub fn run<I, T>(&self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let code = self.run_with_output(args, &mut out);
        let _ = out.flush();
        code
    }

    /// Run with the arguments this process was started with.
    pub fn run_from_env(&self) -> ExitCode {
        self.run(std::env::args().skip(1))
    }

    /// Same as [`App::run`], writing everything to `out`.
    pub fn run_with_output<I, T>(&self, args: I, out: &mut dyn Write) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.invoke(&args, Mode::Process, out)
    }

    /// Print the usage and help of every registered command.
    pub fn print_all_commands(&self, out: &mut dyn Write) -> Result<(), HelpError> {
        help::print_all_commands(&self.registry, self.config.use_colors, out)
    }

    /// Print the usage and help of a single command.
    pub fn print_command(&self, name: &str, out: &mut dyn Write) -> Result<(), HelpError> {
        help::print_command(&self.registry, name, self.config.use_colors, out)
    }

    /// Completion candidates for `text`, spanning `begin..end` of `line`.
    pub fn complete(&self, text: &str, line: &str, begin: usize, end: usize) -> Vec<String> {
        CompletionTable::from_registry(&self.registry).complete(text, line, begin, end)
    }

    /// The prompt shown by the interactive loop.
    pub fn prompt(&self) -> String {
        match &self.config.prompt {
            Some(prompt) => prompt.clone(),
            None if self.config.use_colors => format!("{}> ", self.name.bold().green()),
            None => format!("{}> ", self.name),
        }
    }

    /// Dispatch a single invocation. Errors are reported to `out` and turned
    /// into exit codes here; nothing escapes.
    ///
    /// Panics raised while building or running the parsers (clap rejects
    /// clashing option names that way) are reported like any other internal
    /// failure.
    pub(crate) fn invoke(&self, args: &[String], mode: Mode, out: &mut dyn Write) -> ExitCode {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_invoke(args, mode, &mut *out)));
        match outcome {
            Ok(Ok(code)) => code,
            Ok(Err(err)) => report(err, out),
            Err(payload) => report(
                anyhow!(
                    "dispatching '{}' panicked: {}",
                    args.join(" "),
                    panic_message(payload.as_ref())
                ),
                out,
            ),
        }
    }

    fn try_invoke(&self, args: &[String], mode: Mode, out: &mut dyn Write) -> Result<ExitCode> {
        match self.decide(args, mode)? {
            Decision::ShowCommands => {
                debug!("showing commands help");
                self.print_all_commands(out)?;
                Ok(EXIT_SUCCESS)
            }
            Decision::Interactive => {
                self.interact_on(out)?;
                Ok(EXIT_SUCCESS)
            }
            Decision::EarlyExit(err) => {
                write!(out, "{}", err.render())?;
                Ok(if err.use_stderr() {
                    EXIT_COMMAND_ERROR
                } else {
                    EXIT_SUCCESS
                })
            }
            Decision::Run {
                global_options,
                name,
                args,
            } => self.execute(global_options, name, args, out),
        }
    }

    fn decide(&self, args: &[String], mode: Mode) -> Result<Decision, CommandError> {
        let interactive_allowed = mode == Mode::Process && self.config.enable_interactive;
        if args.is_empty() && interactive_allowed && self.config.auto_interactive {
            return Ok(Decision::Interactive);
        }

        let matches = match self.global_parser(interactive_allowed).try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) => return Ok(Decision::EarlyExit(err)),
        };
        if matches.get_flag(HELP_COMMANDS) {
            return Ok(Decision::ShowCommands);
        }

        let mut command_line: Vec<String> = matches
            .get_many::<String>(COMMAND_LINE)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        if command_line.is_empty() {
            if interactive_allowed && matches.get_flag(INTERACTIVE) {
                return Ok(Decision::Interactive);
            }
            return Err(CommandError::command_required());
        }

        let name = command_line.remove(0);
        Ok(Decision::Run {
            global_options: matches,
            name,
            args: command_line,
        })
    }

    fn execute(
        &self,
        global_options: ArgMatches,
        name: String,
        args: Vec<String>,
        out: &mut dyn Write,
    ) -> Result<ExitCode> {
        let command = self.registry.lookup(&name)?;
        let options = match command_parser(command).try_get_matches_from(&args) {
            Ok(options) => options,
            Err(err) => {
                write!(out, "{}", err.render())?;
                return Ok(if err.use_stderr() {
                    EXIT_COMMAND_ERROR
                } else {
                    EXIT_SUCCESS
                });
            }
        };
        let arguments = options
            .get_many::<String>(ARGUMENTS)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        let state = ExecutionState {
            app: self,
            global_options,
            command: name,
            options,
            arguments,
        };
        debug!(command = %state.command, arguments = ?state.arguments, "dispatching command");

        match panic::catch_unwind(AssertUnwindSafe(|| command.call(&state, out))) {
            Ok(result) => Ok(result?.unwrap_or(EXIT_SUCCESS)),
            Err(payload) => Err(anyhow!(
                "command '{}' panicked: {}",
                state.command,
                panic_message(payload.as_ref())
            )),
        }
    }

    /// Parser for everything before the command name. The command name and
    /// whatever follows it are collected verbatim.
    fn global_parser(&self, with_interactive: bool) -> ClapCommand {
        let mut parser = ClapCommand::new(self.name.clone())
            .no_binary_name(true)
            .override_usage(format!("{} [OPTIONS] <command> [<args>...]", self.name))
            .arg(
                Arg::new(HELP_COMMANDS)
                    .long("help-commands")
                    .action(ArgAction::SetTrue)
                    .help("Print commands usage help"),
            );
        if with_interactive {
            parser = parser.arg(
                Arg::new(INTERACTIVE)
                    .long("interactive")
                    .action(ArgAction::SetTrue)
                    .help("Start an interactive prompt"),
            );
        }
        parser
            .args(self.global_options.iter().cloned())
            .arg(
                Arg::new(COMMAND_LINE)
                    .value_name("COMMAND")
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .trailing_var_arg(true),
            )
    }
}

/// Parser for a command's own options; leftover words become positional
/// arguments.
fn command_parser(command: &Command) -> ClapCommand {
    let mut parser = ClapCommand::new(command.name().to_string())
        .no_binary_name(true)
        .override_usage(help::render_usage(command, false))
        .args(command.option_specs().iter().cloned())
        .arg(
            Arg::new(ARGUMENTS)
                .value_name("ARGS")
                .num_args(0..)
                .action(ArgAction::Append),
        );
    if let Some(text) = command.help() {
        parser = parser.about(text.to_string());
    }
    parser
}

fn report(err: anyhow::Error, out: &mut dyn Write) -> ExitCode {
    if let Some(command_error) = user_error(&err) {
        warn!(error = %command_error, "command error");
        let _ = writeln!(out, "{command_error}");
        return EXIT_COMMAND_ERROR;
    }
    error!(error = ?err, "unexpected failure while running a command");
    let _ = writeln!(out, "{err:?}");
    EXIT_INTERNAL_ERROR
}

fn user_error(err: &anyhow::Error) -> Option<&CommandError> {
    err.downcast_ref::<CommandError>()
        .or_else(|| match err.downcast_ref::<HelpError>() {
            Some(HelpError::Command(inner)) => Some(inner),
            _ => None,
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
