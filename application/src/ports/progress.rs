//! Progress notification port
//!
//! Defines the interface for reporting progress while a reply is requested
//! and streamed.

/// Callback for progress updates during a chat exchange
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, nothing).
pub trait ChatProgressNotifier: Send + Sync {
    /// Called after the request has been sent, before the first byte.
    fn on_request_sent(&self) {}

    /// Called when the first content fragment arrives.
    fn on_first_fragment(&self) {}

    /// Called when the reply finished, successfully or not.
    fn on_reply_finished(&self, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoChatProgress;

impl ChatProgressNotifier for NoChatProgress {}
