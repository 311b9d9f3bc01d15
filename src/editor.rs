//! Terminal line editing backed by rustyline.

use crate::completion::LineCompleter;
use crate::config::CompletionKey;
use crate::interactive::{LineEditor, ReadEvent};
use anyhow::{Context as _, Result};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Cmd, Context, Editor, EventHandler, Helper, KeyCode, KeyEvent, Modifiers};
use std::path::Path;
use std::rc::Rc;

/// rustyline helper forwarding completion requests to whatever completer is
/// currently installed.
#[derive(Default)]
pub struct CompletionHelper {
    completer: Option<Rc<dyn LineCompleter>>,
}

impl Completer for CompletionHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(match &self.completer {
            Some(completer) => completer.complete_line(line, pos),
            None => (pos, Vec::new()),
        })
    }
}

impl Hinter for CompletionHelper {
    type Hint = String;
}

impl Highlighter for CompletionHelper {}

impl Validator for CompletionHelper {}

impl Helper for CompletionHelper {}

/// The default [`LineEditor`], reading from the terminal.
pub struct RustylineEditor {
    editor: Editor<CompletionHelper, DefaultHistory>,
    // Handlers displaced by our completion bindings, restored on unbind.
    saved_bindings: Vec<(CompletionKey, Option<EventHandler>)>,
}

impl RustylineEditor {
    pub fn new() -> Result<Self> {
        let mut editor = Editor::new().context("failed to initialize the line editor")?;
        editor.set_helper(Some(CompletionHelper::default()));
        Ok(Self {
            editor,
            saved_bindings: Vec::new(),
        })
    }
}

fn key_event(key: CompletionKey) -> KeyEvent {
    match key {
        CompletionKey::Tab => KeyEvent(KeyCode::Tab, Modifiers::NONE),
        CompletionKey::Ctrl(c) => KeyEvent::ctrl(c),
        CompletionKey::Alt(c) => KeyEvent::alt(c),
        CompletionKey::Char(c) => KeyEvent::new(c, Modifiers::NONE),
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(err) => Err(err).context("failed to read a line"),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            tracing::debug!(error = %err, "history entry dropped");
        }
    }

    fn swap_completer(
        &mut self,
        completer: Option<Rc<dyn LineCompleter>>,
    ) -> Option<Rc<dyn LineCompleter>> {
        match self.editor.helper_mut() {
            Some(helper) => std::mem::replace(&mut helper.completer, completer),
            None => {
                self.editor.set_helper(Some(CompletionHelper { completer }));
                None
            }
        }
    }

    fn bind_completion_key(&mut self, key: CompletionKey) {
        let previous = self
            .editor
            .bind_sequence(key_event(key), EventHandler::Simple(Cmd::Complete));
        self.saved_bindings.push((key, previous));
    }

    fn unbind_completion_key(&mut self, key: CompletionKey) {
        let Some(index) = self.saved_bindings.iter().rposition(|(bound, _)| *bound == key) else {
            return;
        };
        let (_, previous) = self.saved_bindings.remove(index);
        match previous {
            Some(handler) => {
                self.editor.bind_sequence(key_event(key), handler);
            }
            None => {
                self.editor.unbind_sequence(key_event(key));
            }
        }
    }

    fn load_history(&mut self, path: &Path) -> Result<()> {
        self.editor
            .load_history(path)
            .with_context(|| format!("failed to load history from {}", path.display()))
    }

    fn save_history(&mut self, path: &Path) -> Result<()> {
        self.editor
            .save_history(path)
            .with_context(|| format!("failed to save history to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_events() {
        assert_eq!(
            key_event(CompletionKey::Tab),
            KeyEvent(KeyCode::Tab, Modifiers::NONE)
        );
        assert_eq!(key_event(CompletionKey::Ctrl('n')), KeyEvent::ctrl('n'));
        assert_eq!(key_event(CompletionKey::Alt('c')), KeyEvent::alt('c'));
        assert_eq!(
            key_event(CompletionKey::Char('?')),
            KeyEvent(KeyCode::Char('?'), Modifiers::NONE)
        );
    }

    #[test]
    fn test_helper_without_completer_offers_nothing() {
        let helper = CompletionHelper::default();
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, candidates) = helper.complete("he", 2, &ctx).unwrap();
        assert_eq!(start, 2);
        assert!(candidates.is_empty());
    }
}
