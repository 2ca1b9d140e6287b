//! Email, name and password prompts for sign-up and sign-in

use rustyline::completion::Completer;
use rustyline::config::{ColorMode, Configurer};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{DefaultEditor, Editor, Helper};
use std::borrow::Cow;
use std::io::{self, BufRead};

/// Line-editor helper that renders every typed character as `*`.
struct MaskingHelper;

impl Highlighter for MaskingHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(mask(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

impl Completer for MaskingHelper {
    type Candidate = String;
}

impl Hinter for MaskingHelper {
    type Hint = String;
}

impl Validator for MaskingHelper {}

impl Helper for MaskingHelper {}

fn mask(line: &str) -> String {
    "*".repeat(line.chars().count())
}

/// Prompt for a single visible line.
pub fn prompt_line(prompt: &str) -> Result<String, ReadlineError> {
    let mut rl = DefaultEditor::new()?;
    Ok(rl.readline(prompt)?.trim().to_string())
}

/// Prompt for a password without echoing it.
pub fn prompt_password(prompt: &str) -> Result<String, ReadlineError> {
    let mut rl: Editor<MaskingHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(MaskingHelper));
    rl.set_color_mode(ColorMode::Forced);
    rl.set_auto_add_history(false);
    rl.readline(prompt)
}

/// Read a password from the first line of `reader`, without its line ending.
pub fn read_password_from<R: BufRead>(mut reader: R) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a password piped on stdin.
pub fn read_password_stdin() -> io::Result<String> {
    read_password_from(io::stdin().lock())
}
