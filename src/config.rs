use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Application-wide settings.
///
/// Fields are public so a configuration can be written with struct update
/// syntax:
///
/// ```
/// use cliapp::AppConfig;
/// let config = AppConfig {
///     enable_interactive: true,
///     auto_interactive: true,
///     ..AppConfig::default()
/// };
/// assert!(config.use_colors);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Highlight usage lines and the prompt. Still subject to `NO_COLOR`,
    /// `CLICOLOR` and terminal detection.
    pub use_colors: bool,
    /// Register the built-in `help` command.
    pub enable_commands_help: bool,
    /// Allow the interactive prompt (`--interactive` or auto start).
    pub enable_interactive: bool,
    /// Start the interactive prompt when the program is run without arguments.
    pub auto_interactive: bool,
    /// Prompt string; `None` means `"<program>> "`.
    pub prompt: Option<String>,
    /// Key that triggers completion at the prompt.
    pub completion_key: CompletionKey,
    /// Where interactive history is loaded from and saved to.
    pub history_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            enable_commands_help: true,
            enable_interactive: false,
            auto_interactive: false,
            prompt: None,
            completion_key: CompletionKey::Tab,
            history_file: None,
        }
    }
}

/// A key the line editor binds to its complete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKey {
    Tab,
    Ctrl(char),
    Alt(char),
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid completion key: {0:?}")]
pub struct InvalidKey(String);

impl FromStr for CompletionKey {
    type Err = InvalidKey;

    /// Accepts `tab`, `ctrl-x` / `^x`, `alt-x` / `meta-x` or a single character.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "tab" {
            return Ok(CompletionKey::Tab);
        }

        let single = |rest: &str| {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(InvalidKey(s.to_string())),
            }
        };

        if let Some(rest) = lower
            .strip_prefix("ctrl-")
            .or_else(|| lower.strip_prefix("c-"))
            .or_else(|| lower.strip_prefix('^'))
        {
            return single(rest).map(CompletionKey::Ctrl);
        }
        if let Some(rest) = lower
            .strip_prefix("alt-")
            .or_else(|| lower.strip_prefix("meta-"))
            .or_else(|| lower.strip_prefix("m-"))
        {
            return single(rest).map(CompletionKey::Alt);
        }
        // Plain characters keep their case.
        single(s).map(CompletionKey::Char)
    }
}

impl fmt::Display for CompletionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionKey::Tab => write!(f, "tab"),
            CompletionKey::Ctrl(c) => write!(f, "ctrl-{c}"),
            CompletionKey::Alt(c) => write!(f, "alt-{c}"),
            CompletionKey::Char(c) => write!(f, "{c}"),
        }
    }
}
