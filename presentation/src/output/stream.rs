//! Incremental printing of streamed replies

use std::io::{self, Write};
use xylos_application::StreamSubscriber;

/// Prints each accumulated snapshot by writing only what is new.
///
/// Snapshots are cumulative, so the printer remembers how much has already
/// been written and emits the remaining suffix.
pub struct StreamPrinter<W: Write + Send = io::Stdout> {
    out: W,
    printed: String,
}

impl StreamPrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: String::new(),
        }
    }

    /// Whether any reply text has been written.
    pub fn has_output(&self) -> bool {
        !self.printed.is_empty()
    }

    /// End the reply line, if one was started.
    pub fn finish(&mut self) {
        if self.has_output() {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
        self.printed.clear();
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> StreamSubscriber for StreamPrinter<W> {
    fn on_text(&mut self, text: &str) {
        let new = match text.strip_prefix(self.printed.as_str()) {
            Some(suffix) => suffix,
            None => {
                // Snapshot diverged from what is on screen; start a fresh line.
                let _ = writeln!(self.out);
                self.printed.clear();
                text
            }
        };
        if new.is_empty() {
            return;
        }
        let _ = self.out.write_all(new.as_bytes());
        let _ = self.out.flush();
        self.printed.push_str(new);
    }
}
