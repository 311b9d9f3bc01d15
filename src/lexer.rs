//! Shell-style splitting of an interactive input line into words.

use thiserror::Error;

/// Errors that can occur while splitting a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unfinished quote")]
    UnfinishedQuote,
    /// The line ends with a backslash that escapes nothing.
    #[error("no character after escape")]
    DanglingEscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
    Escaping,
    EscapingInDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    // `Some` as soon as a word has started, even if it is still empty (`""`).
    current_word: Option<String>,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            current_word: None,
        }
    }

    /// Runs the machine over the whole input.
    ///
    /// Whitespace separates words. Single quotes keep everything literally,
    /// double quotes only honour backslash before `"`, `\`, `$` and `` ` ``,
    /// and a bare backslash escapes whatever follows. Quoted and unquoted
    /// pieces that touch are joined into one word.
    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start | LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
                LexingState::Escaping => {
                    self.push(ch);
                    self.state = LexingState::ReadingWord;
                }
                LexingState::EscapingInDoubleQuote => {
                    if !matches!(ch, '"' | '\\' | '$' | '`') {
                        self.push('\\');
                    }
                    self.push(ch);
                    self.state = LexingState::ReadingDoubleQuote;
                }
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote
            | LexingState::ReadingDoubleQuote
            | LexingState::EscapingInDoubleQuote => return Err(LexingError::UnfinishedQuote),
            LexingState::Escaping => return Err(LexingError::DanglingEscape),
            LexingState::Start | LexingState::ReadingWord => {}
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn push(&mut self, ch: char) {
        self.current_word.get_or_insert_with(String::new).push(ch);
    }

    fn start_word(&mut self) {
        self.current_word.get_or_insert_with(String::new);
    }

    fn finish_word(&mut self, out: &mut Vec<String>) {
        if let Some(word) = self.current_word.take() {
            out.push(word);
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            c if c.is_whitespace() => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '\'' => {
                self.start_word();
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.start_word();
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => self.state = LexingState::Escaping,
            c => {
                self.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => self.state = LexingState::EscapingInDoubleQuote,
            c => self.push(c),
        }
    }
}

/// Split `line` into words the way a POSIX shell would, without any
/// expansion.
///
/// ```
/// # use cliapp::lexer::split_into_words;
/// let words = split_into_words(r#"hello "New York" it\'s"#).unwrap();
/// assert_eq!(words, vec!["hello", "New York", "it's"]);
/// ```
pub fn split_into_words(line: &str) -> Result<Vec<String>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_words()
}
