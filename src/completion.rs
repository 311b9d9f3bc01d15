//! Tab completion for the interactive prompt.

use crate::registry::CommandRegistry;
use std::rc::Rc;
use tracing::trace;

/// Completion function attached to a single command.
///
/// Receives the partially typed word, the whole line and the byte range of the
/// word inside the line; returns the candidates replacing that word.
pub trait Complete {
    fn complete(&self, text: &str, line: &str, begin: usize, end: usize) -> Vec<String>;
}

impl<F> Complete for F
where
    F: Fn(&str, &str, usize, usize) -> Vec<String>,
{
    fn complete(&self, text: &str, line: &str, begin: usize, end: usize) -> Vec<String> {
        self(text, line, begin, end)
    }
}

/// Callback handed to the line editor.
///
/// Given the line and the cursor position, returns where the replaced word
/// starts and the candidates for it.
pub trait LineCompleter {
    fn complete_line(&self, line: &str, pos: usize) -> (usize, Vec<String>);
}

/// Snapshot of the registered commands, taken when an interactive session
/// starts.
pub struct CompletionTable {
    entries: Vec<(String, Option<Rc<dyn Complete>>)>,
}

impl CompletionTable {
    pub fn from_registry(registry: &CommandRegistry) -> Self {
        Self {
            entries: registry
                .list()
                .map(|cmd| (cmd.name().to_string(), cmd.completion()))
                .collect(),
        }
    }

    /// Candidates for `text`, the word spanning `begin..end` of `line`.
    ///
    /// While the command name itself is being typed, every command starting
    /// with `text` is offered, in registration order. After that the command's
    /// own completer decides; unknown commands and commands without a
    /// completer yield nothing.
    pub fn complete(&self, text: &str, line: &str, begin: usize, end: usize) -> Vec<String> {
        let preceding = line.get(..begin).unwrap_or_default();
        let candidates = match preceding.split_whitespace().next() {
            None => self
                .entries
                .iter()
                .filter(|(name, _)| name.starts_with(text))
                .map(|(name, _)| name.clone())
                .collect(),
            Some(command) => self
                .entries
                .iter()
                .find(|(name, _)| name == command)
                .and_then(|(_, completer)| completer.as_ref())
                .map(|completer| completer.complete(text, line, begin, end))
                .unwrap_or_default(),
        };
        trace!(text, line, begin, end, found = candidates.len(), "completion");
        candidates
    }
}

impl LineCompleter for CompletionTable {
    fn complete_line(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let head = line.get(..pos).unwrap_or(line);
        let begin = head
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8());
        let text = &head[begin..];
        (begin, self.complete(text, line, begin, head.len()))
    }
}
