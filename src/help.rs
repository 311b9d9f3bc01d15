//! Usage and help text rendering.

use crate::command::Command;
use crate::error::HelpError;
use crate::registry::CommandRegistry;
use colored::Colorize;
use regex::{Captures, Regex};
use std::io::{self, Write};
use std::sync::LazyLock;

/// Help text is indented by this many columns beneath the usage line.
pub const HELP_INDENT: usize = 8;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^<>\s]+>").expect("placeholder pattern is valid")
});

/// `"<name> <usage>"`, with the name in bold and `<placeholders>` underlined
/// when `colors` is set.
pub fn render_usage(command: &Command, colors: bool) -> String {
    let usage = command.usage_text().trim();
    let name = if colors {
        command.name().bold().to_string()
    } else {
        command.name().to_string()
    };
    if usage.is_empty() {
        return name;
    }

    let usage = if colors {
        PLACEHOLDER
            .replace_all(usage, |caps: &Captures<'_>| {
                caps[0].underline().cyan().to_string()
            })
            .into_owned()
    } else {
        usage.to_string()
    };
    format!("{name} {usage}")
}

/// The command's help text, dedented and indented by [`HELP_INDENT`] columns.
pub fn render_help(command: &Command) -> Option<String> {
    let text = command.help()?;
    let margin = " ".repeat(HELP_INDENT);
    let lines: Vec<String> = dedent(text)
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                line
            } else {
                format!("{margin}{line}")
            }
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Print the usage line and help of every command, in registration order.
pub fn print_all_commands(
    registry: &CommandRegistry,
    colors: bool,
    out: &mut dyn Write,
) -> Result<(), HelpError> {
    writeln!(out, "Accepted commands:")?;
    writeln!(out)?;
    for command in registry.list() {
        print_usage(command, colors, out)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Print the usage line and help of the command called `name`.
pub fn print_command(
    registry: &CommandRegistry,
    name: &str,
    colors: bool,
    out: &mut dyn Write,
) -> Result<(), HelpError> {
    let command = registry.lookup(name)?;
    print_usage(command, colors, out)?;
    Ok(())
}

fn print_usage(command: &Command, colors: bool, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", render_usage(command, colors))?;
    if let Some(help) = render_help(command) {
        writeln!(out, "{help}")?;
    }
    Ok(())
}

/// Remove the indentation shared by all non-blank lines, along with leading
/// and trailing blank lines. Blank lines inside come back empty.
fn dedent(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };
    let body = &lines[first..=last];

    // Longest whitespace prefix shared verbatim: a tab and a space never
    // count as the same indentation.
    let common = body
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| &l[..l.len() - l.trim_start_matches([' ', '\t']).len()])
        .reduce(|shared, indent| {
            let len = shared
                .bytes()
                .zip(indent.bytes())
                .take_while(|(a, b)| a == b)
                .count();
            &shared[..len]
        })
        .map_or(0, str::len);

    body.iter()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                l[common..].to_string()
            }
        })
        .collect()
}
