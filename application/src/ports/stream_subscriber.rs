//! Stream subscriber port
//!
//! Receives the accumulated assistant text every time a streamed reply grows.

/// Observer of a streamed reply.
///
/// `on_text` is called with the whole text accumulated so far, never with
/// the bare fragment. Successive snapshots are each a prefix of the next.
pub trait StreamSubscriber: Send {
    fn on_text(&mut self, text: &str);
}

impl<F> StreamSubscriber for F
where
    F: FnMut(&str) + Send,
{
    fn on_text(&mut self, text: &str) {
        self(text)
    }
}

/// Subscriber that drops every snapshot.
pub struct NoSubscriber;

impl StreamSubscriber for NoSubscriber {
    fn on_text(&mut self, _text: &str) {}
}
