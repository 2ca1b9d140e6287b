//! Outbound request to the completion endpoint.

use serde::{Deserialize, Serialize};

use super::entities::{ChatMessage, ContentPart, MessageContent, Role};
use crate::media::image::ImageAttachment;

/// Body of a completion request: the ordered message history.
///
/// ```
/// use xylos_domain::chat::entities::ChatMessage;
/// use xylos_domain::chat::request::CompletionRequest;
///
/// let history = vec![ChatMessage::user("hi")];
/// let request = CompletionRequest::from_history(&history, None);
/// assert_eq!(
///     serde_json::to_string(&request).unwrap(),
///     r#"{"messages":[{"role":"user","content":"hi"}]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Build a request from the transcript, whose last entry is the new user
    /// message.
    ///
    /// With an attachment, that last user message is sent as
    /// `[text, image_url]` parts; earlier messages keep their content.
    pub fn from_history(history: &[ChatMessage], attachment: Option<&ImageAttachment>) -> Self {
        let mut messages = history.to_vec();

        if let Some(image) = attachment
            && let Some(last) = messages.last_mut()
            && last.role == Role::User
        {
            let text = last.content.as_text();
            last.content = MessageContent::Parts(vec![
                ContentPart::text(text),
                ContentPart::image_url(image.data_url()),
            ]);
        }

        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
