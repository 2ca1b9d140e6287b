//! Lifecycle of one streaming response.

use std::fmt;

/// Where a streaming response is in its lifecycle.
///
/// ```text
/// Idle -> Streaming -> Finalizing -> Done
///             |  \
///             |   `-> Done        (transport error, nothing accumulated)
///             `-> Cancelled       (caller tore the stream down)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    #[default]
    Idle,
    Streaming,
    Finalizing,
    Done,
    Cancelled,
}

impl StreamPhase {
    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_advance_to(self, next: StreamPhase) -> bool {
        use StreamPhase::*;
        matches!(
            (self, next),
            (Idle, Streaming)
                | (Streaming, Finalizing)
                | (Streaming, Done)
                | (Streaming, Cancelled)
                | (Finalizing, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StreamPhase::Done | StreamPhase::Cancelled)
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamPhase::Idle => "idle",
            StreamPhase::Streaming => "streaming",
            StreamPhase::Finalizing => "finalizing",
            StreamPhase::Done => "done",
            StreamPhase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
