//! Running concatenation of content fragments for one assistant reply.

/// Append-only text owned by a single streaming response.
///
/// Every mutation returns the full text so the caller can hand a snapshot to
/// its subscriber; the text never shrinks or reorders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedMessage {
    text: String,
    fragments: usize,
}

impl AccumulatedMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the updated text.
    pub fn append(&mut self, fragment: &str) -> &str {
        self.text.push_str(fragment);
        self.fragments += 1;
        &self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of fragments appended so far.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
