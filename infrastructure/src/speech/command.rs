//! Speech recognition delegated to an external command.
//!
//! The configured command records one utterance and prints the transcript
//! on stdout. A non-zero exit or empty output is reported as a recognition
//! error; `stop()` kills the command.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xylos_application::{SpeechError, SpeechListener, SpeechRecognizer};

type Running = Arc<Mutex<Option<(u64, CancellationToken)>>>;

pub struct CommandSpeechRecognizer {
    program: String,
    args: Vec<String>,
    running: Running,
    next_run: AtomicU64,
}

impl CommandSpeechRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            running: Arc::new(Mutex::new(None)),
            next_run: AtomicU64::new(0),
        }
    }
}

fn lock(running: &Running) -> std::sync::MutexGuard<'_, Option<(u64, CancellationToken)>> {
    running
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_once(
    program: &str,
    args: &[String],
    cancel: &CancellationToken,
) -> Result<String, SpeechError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SpeechError::Unsupported(format!("{}: {}", program, e)))?;

    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SpeechError::Stopped),
        output = child.wait_with_output() => output,
    }
    .map_err(|e| SpeechError::Recognition(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(SpeechError::Recognition(if stderr.is_empty() {
            format!("{} exited with {}", program, output.status)
        } else {
            stderr
        }));
    }

    let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if transcript.is_empty() {
        return Err(SpeechError::Recognition("no speech detected".to_string()));
    }
    Ok(transcript)
}

impl SpeechRecognizer for CommandSpeechRecognizer {
    fn start(&self, listener: Arc<dyn SpeechListener>) -> Result<(), SpeechError> {
        let cancel = CancellationToken::new();
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        {
            let mut running = lock(&self.running);
            if running.is_some() {
                return Err(SpeechError::Busy);
            }
            *running = Some((run, cancel.clone()));
        }

        let program = self.program.clone();
        let args = self.args.clone();
        let running = self.running.clone();
        debug!("Starting speech command: {} {:?}", program, args);

        tokio::spawn(async move {
            let outcome = run_once(&program, &args, &cancel).await;
            {
                let mut guard = lock(&running);
                if guard.as_ref().is_some_and(|(id, _)| *id == run) {
                    *guard = None;
                }
            }
            match outcome {
                Ok(transcript) => listener.on_result(transcript),
                Err(e) => {
                    warn!("Speech recognition failed: {}", e);
                    listener.on_error(e);
                }
            }
        });
        Ok(())
    }

    fn stop(&self) {
        if let Some((_, cancel)) = lock(&self.running).take() {
            cancel.cancel();
        }
    }
}
