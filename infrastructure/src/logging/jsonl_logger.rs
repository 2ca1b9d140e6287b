//! JSONL file writer for conversation events.
//!
//! Each [`ConversationEvent`] is serialized as a single JSON line carrying
//! `type`, `timestamp` and a per-process `session` id. The file is opened
//! in append mode so one transcript can span many runs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;
use xylos_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};

/// JSONL conversation logger that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    session: String,
}

impl JsonlConversationLogger {
    /// Open (or create) the transcript at `path`.
    ///
    /// Parent directories are created as needed. Returns `None` when the
    /// file cannot be opened; transcript logging is then simply off.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create transcript directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open transcript file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            session: Uuid::new_v4().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier stamped on every record written by this logger.
    pub fn session(&self) -> &str {
        &self.session
    }

    fn record(&self, event: ConversationEvent) -> serde_json::Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut map = match event.payload {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), event.event_type.into());
        map.insert("timestamp".to_string(), timestamp.into());
        map.insert("session".to_string(), self.session.clone().into());
        serde_json::Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(line) = serde_json::to_string(&self.record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}
