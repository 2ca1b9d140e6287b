//! Dictation helpers.

/// Append a recognised transcript to the draft input, separated by a single
/// space when the draft already has text.
pub fn append_transcript(draft: &str, transcript: &str) -> String {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return draft.to_string();
    }
    if draft.is_empty() {
        transcript.to_string()
    } else {
        format!("{} {}", draft, transcript)
    }
}
