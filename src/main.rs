use anyhow::Result;
use clap::{Arg, ArgAction};
use cliapp::{App, AppConfig, Command, ExecutionState};
use std::io::Write;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const FRIENDS: [&str; 4] = ["Alice", "Anna", "Bob", "New York"];

fn hello_world(_state: &ExecutionState<'_>, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Hello, world!")?;
    Ok(())
}

fn hello(state: &ExecutionState<'_>, out: &mut dyn Write) -> Result<()> {
    if state.global_options.get_flag("debug") {
        writeln!(out, "hello called with {:?}", state.arguments)?;
    }
    let name = match state.arguments.as_slice() {
        [] => "world".to_string(),
        names => names.join(" "),
    };
    let greeting = format!("Hello, {name}!");
    if state.options.get_flag("shout") {
        writeln!(out, "{}", greeting.to_uppercase())?;
    } else {
        writeln!(out, "{greeting}")?;
    }
    Ok(())
}

fn complete_friend(text: &str, _line: &str, _begin: usize, _end: usize) -> Vec<String> {
    FRIENDS
        .iter()
        .filter(|name| name.starts_with(text))
        .map(|name| name.to_string())
        .collect()
}

/// `RUST_LOG`-style directives, falling back to `warn` when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

fn main() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_writer(std::io::stderr)
        .init();

    let mut app = App::with_config(
        "example_app",
        AppConfig {
            enable_interactive: true,
            auto_interactive: true,
            ..AppConfig::default()
        },
    );
    app.global_option(
        Arg::new("debug")
            .long("debug")
            .action(ArgAction::SetTrue)
            .help("Print what the commands receive"),
    )
    .register_command(
        Command::new("hello", hello)
            .usage("[--shout] [<name>...]")
            .help_text(
                "
                Greets somebody or the whole world.

                With --shout the greeting is printed in capitals.
                ",
            )
            .option(
                Arg::new("shout")
                    .long("shout")
                    .action(ArgAction::SetTrue)
                    .help("Greet loudly"),
            )
            .completer(complete_friend),
    )
    .register_command(Command::from_fn(hello_world).help_text("Greets the whole world"));

    std::process::exit(app.run_from_env());
}
