//! The interactive prompt: read a line, split it, dispatch it, repeat.

use crate::app::{App, Mode};
use crate::completion::{CompletionTable, LineCompleter};
use crate::config::CompletionKey;
use crate::editor::RustylineEditor;
use crate::lexer::split_into_words;
use anyhow::Result;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

/// Outcome of asking the line editor for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    Line(String),
    /// The user pressed the interrupt key while typing.
    Interrupted,
    /// No more input.
    Eof,
}

/// The line-editing collaborator used by the interactive loop.
///
/// [`RustylineEditor`] is the terminal implementation; tests drive the loop
/// with scripted editors.
pub trait LineEditor {
    /// Show `prompt` and read one line.
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent>;

    fn add_history(&mut self, _line: &str) {}

    /// Install `completer` as the completion callback, returning the one it
    /// replaces.
    fn swap_completer(
        &mut self,
        completer: Option<Rc<dyn LineCompleter>>,
    ) -> Option<Rc<dyn LineCompleter>>;

    /// Make `key` trigger completion.
    fn bind_completion_key(&mut self, _key: CompletionKey) {}

    /// Undo the matching [`LineEditor::bind_completion_key`].
    fn unbind_completion_key(&mut self, _key: CompletionKey) {}

    fn load_history(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn save_history(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Completion callback installed on a line editor for as long as the guard
/// lives.
///
/// Dropping the guard unbinds the trigger key and puts back whatever callback
/// was installed before, whichever way the loop ends.
pub struct CompletionBinding<'e, E: LineEditor + ?Sized> {
    editor: &'e mut E,
    previous: Option<Rc<dyn LineCompleter>>,
    key: CompletionKey,
}

impl<'e, E: LineEditor + ?Sized> CompletionBinding<'e, E> {
    pub fn acquire(editor: &'e mut E, completer: Rc<dyn LineCompleter>, key: CompletionKey) -> Self {
        let previous = editor.swap_completer(Some(completer));
        editor.bind_completion_key(key);
        Self {
            editor,
            previous,
            key,
        }
    }
}

impl<E: LineEditor + ?Sized> Deref for CompletionBinding<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.editor
    }
}

impl<E: LineEditor + ?Sized> DerefMut for CompletionBinding<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.editor
    }
}

impl<E: LineEditor + ?Sized> Drop for CompletionBinding<'_, E> {
    fn drop(&mut self) {
        self.editor.unbind_completion_key(self.key);
        self.editor.swap_completer(self.previous.take());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Reading,
    Terminated,
}

impl App {
    /// Run the interactive prompt on the terminal until `exit`, `quit` or
    /// end of input.
    pub fn interact(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.interact_on(&mut out)
    }

    pub(crate) fn interact_on(&self, out: &mut dyn Write) -> Result<()> {
        let mut editor = RustylineEditor::new()?;
        let history = self.config().history_file.as_deref();
        if let Some(path) = history {
            if let Err(err) = editor.load_history(path) {
                debug!(path = %path.display(), error = %err, "no history loaded");
            }
        }

        let result = self.interact_with(&mut editor, out);

        if let Some(path) = history {
            if let Err(err) = editor.save_history(path) {
                warn!(path = %path.display(), error = ?err, "failed to save history");
            }
        }
        result
    }

    /// Run the interactive prompt on any line editor, writing command output
    /// to `out`.
    ///
    /// Only failures of the editor itself end the session with an error;
    /// command failures are reported and the prompt comes back.
    pub fn interact_with<E: LineEditor + ?Sized>(
        &self,
        editor: &mut E,
        out: &mut dyn Write,
    ) -> Result<()> {
        let completer: Rc<dyn LineCompleter> = Rc::new(CompletionTable::from_registry(self.registry()));
        let mut editor = CompletionBinding::acquire(editor, completer, self.config().completion_key);
        let prompt = self.prompt();

        debug!(app = self.name(), "interactive session started");
        let mut state = LoopState::Reading;
        while state == LoopState::Reading {
            state = match editor.read_line(&prompt)? {
                ReadEvent::Line(line) => self.handle_line(&mut *editor, &line, out)?,
                ReadEvent::Interrupted => {
                    writeln!(out, "Interrupted")?;
                    LoopState::Reading
                }
                ReadEvent::Eof => {
                    writeln!(out, "EOF")?;
                    LoopState::Terminated
                }
            };
            out.flush()?;
        }
        debug!(app = self.name(), "interactive session ended");
        Ok(())
    }

    fn handle_line<E: LineEditor + ?Sized>(
        &self,
        editor: &mut E,
        line: &str,
        out: &mut dyn Write,
    ) -> Result<LoopState> {
        if line.trim().is_empty() {
            return Ok(LoopState::Reading);
        }
        editor.add_history(line);

        let words = match split_into_words(line) {
            Ok(words) => words,
            Err(err) => {
                writeln!(out, "{err}")?;
                return Ok(LoopState::Reading);
            }
        };

        match words.first().map(String::as_str) {
            None => Ok(LoopState::Reading),
            Some("exit" | "quit") => Ok(LoopState::Terminated),
            Some(_) => {
                let code = self.invoke(&words, Mode::Interactive, out);
                debug!(code, "command finished");
                Ok(LoopState::Reading)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::AppConfig;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Plays back a fixed list of read events, then reports end of input.
    #[derive(Default)]
    struct ScriptedEditor {
        events: VecDeque<Result<ReadEvent>>,
        completer: Option<Rc<dyn LineCompleter>>,
        bound: Vec<CompletionKey>,
        history: Vec<String>,
        prompts: Vec<String>,
        completions_seen: Vec<(usize, Vec<String>)>,
    }

    impl ScriptedEditor {
        fn with_lines(lines: &[&str]) -> Self {
            Self {
                events: lines
                    .iter()
                    .map(|line| Ok(ReadEvent::Line(line.to_string())))
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl LineEditor for ScriptedEditor {
        fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
            self.prompts.push(prompt.to_string());
            if let Some(completer) = &self.completer {
                self.completions_seen.push(completer.complete_line("he", 2));
            }
            self.events.pop_front().unwrap_or(Ok(ReadEvent::Eof))
        }

        fn add_history(&mut self, line: &str) {
            self.history.push(line.to_string());
        }

        fn swap_completer(
            &mut self,
            completer: Option<Rc<dyn LineCompleter>>,
        ) -> Option<Rc<dyn LineCompleter>> {
            std::mem::replace(&mut self.completer, completer)
        }

        fn bind_completion_key(&mut self, key: CompletionKey) {
            self.bound.push(key);
        }

        fn unbind_completion_key(&mut self, key: CompletionKey) {
            self.bound.retain(|bound| *bound != key);
        }
    }

    struct Sentinel;

    impl LineCompleter for Sentinel {
        fn complete_line(&self, _line: &str, pos: usize) -> (usize, Vec<String>) {
            (pos, vec!["sentinel".to_string()])
        }
    }

    fn recording_app(calls: Rc<RefCell<Vec<Vec<String>>>>) -> App {
        let mut app = App::with_config(
            "demo",
            AppConfig {
                use_colors: false,
                enable_commands_help: false,
                enable_interactive: true,
                ..AppConfig::default()
            },
        );
        app.register_command(Command::new("hello", move |state, out| {
            calls.borrow_mut().push(state.arguments.clone());
            writeln!(out, "Hello, {}", state.arguments.join(" "))?;
            Ok(())
        }))
        .register_command(Command::new("help", |_state, _out| Ok(())));
        app
    }

    fn session(app: &App, editor: &mut ScriptedEditor) -> (Result<()>, String) {
        let mut out: Vec<u8> = Vec::new();
        let result = app.interact_with(editor, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_ends_session_without_dispatch() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls.clone());
        let mut editor = ScriptedEditor::with_lines(&["exit", "hello Sam"]);

        let (result, out) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert!(calls.borrow().is_empty());
        assert_eq!(out, "");
        assert_eq!(editor.events.len(), 1);
    }

    #[test]
    fn test_quit_ends_session() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls.clone());
        let mut editor = ScriptedEditor::with_lines(&["hello", "quit now", "hello again"]);

        let (result, _) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_eof_ends_session_like_exit() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls.clone());
        let mut editor = ScriptedEditor::default();

        let (result, out) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert_eq!(out, "EOF\n");
        assert_eq!(editor.prompts, vec!["demo> "]);
    }

    #[test]
    fn test_quoted_words_reach_handler_as_one_argument() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls.clone());
        let mut editor = ScriptedEditor::with_lines(&[r#"hello "New York""#]);

        let (result, out) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert_eq!(*calls.borrow(), vec![vec!["New York".to_string()]]);
        assert_eq!(out, "Hello, New York\nEOF\n");
        assert_eq!(editor.history, vec![r#"hello "New York""#]);
    }

    #[test]
    fn test_interrupt_and_errors_keep_session_alive() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut app = recording_app(calls.clone());
        app.register_command(Command::new("fail", |_state, _out| -> Result<()> {
            Err(anyhow!("broken"))
        }))
        .register_command(Command::new("boom", |_state, _out| -> Result<()> {
            panic!("kaboom")
        }));

        let mut editor = ScriptedEditor::with_lines(&[
            "nosuchcmd",
            "fail",
            "boom",
            "hello 'unfinished",
            "   ",
            "hello Sam",
        ]);
        editor.events.push_front(Ok(ReadEvent::Interrupted));

        let (result, out) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert!(out.starts_with("Interrupted\ncommand not found: nosuchcmd\n"));
        assert!(out.contains("broken"));
        assert!(out.contains("command 'boom' panicked: kaboom"));
        assert!(out.contains("unfinished quote\n"));
        assert!(out.ends_with("Hello, Sam\nEOF\n"));
        assert_eq!(*calls.borrow(), vec![vec!["Sam".to_string()]]);
        assert_eq!(editor.history.len(), 5);
    }

    #[test]
    fn test_session_survives_clashing_command_options() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut app = recording_app(calls.clone());
        app.register_command(
            Command::new("connect", |_state, _out| Ok(()))
                .option(clap::Arg::new("host").short('h').long("host")),
        );
        let mut editor = ScriptedEditor::with_lines(&["connect -h example.org", "hello Sam"]);

        let (result, out) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert!(out.contains("dispatching 'connect -h example.org' panicked"));
        assert!(out.ends_with("Hello, Sam\nEOF\n"));
        assert_eq!(*calls.borrow(), vec![vec!["Sam".to_string()]]);
    }

    #[test]
    fn test_no_nested_interactive_mode() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls.clone());
        let mut editor = ScriptedEditor::with_lines(&["--interactive"]);

        let (result, out) = session(&app, &mut editor);
        assert!(result.is_ok());
        assert!(out.contains("--interactive"));
        assert!(out.ends_with("EOF\n"));
    }

    #[test]
    fn test_completion_installed_during_session_and_restored_after() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls);
        let mut editor = ScriptedEditor::with_lines(&["hello"]);
        editor.completer = Some(Rc::new(Sentinel));

        let (result, _) = session(&app, &mut editor);
        assert!(result.is_ok());

        let expected = (0, vec!["hello".to_string(), "help".to_string()]);
        assert_eq!(editor.completions_seen, vec![expected.clone(), expected]);
        assert!(editor.bound.is_empty());
        let restored = editor.completer.as_ref().map(|c| c.complete_line("x", 1));
        assert_eq!(restored, Some((1, vec!["sentinel".to_string()])));
    }

    #[test]
    fn test_completion_restored_when_editor_fails() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let app = recording_app(calls);
        let mut editor = ScriptedEditor::default();
        editor.events.push_back(Err(anyhow!("terminal went away")));

        let (result, _) = session(&app, &mut editor);
        assert!(result.is_err());
        assert!(editor.completer.is_none());
        assert!(editor.bound.is_empty());
    }

    #[test]
    fn test_binding_guard_binds_configured_key() {
        let mut editor = ScriptedEditor::default();
        {
            let guard = CompletionBinding::acquire(&mut editor, Rc::new(Sentinel), CompletionKey::Ctrl('n'));
            assert_eq!(guard.bound, vec![CompletionKey::Ctrl('n')]);
            assert!(guard.completer.is_some());
        }
        assert!(editor.bound.is_empty());
        assert!(editor.completer.is_none());
    }
}
