//! Tutoring chat session.
//!
//! The transcript is append-only. A user turn is recorded before the tutor is
//! asked, and whatever the tutor returns (including its canned fallback) is
//! recorded as the assistant turn.

use crate::ai::Tutor;
use crate::profile::Profile;
use crate::quiz::DEFAULT_GRADE_LEVEL;
use crate::state::{ChatMessage, Ignored, Step};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct ChatState {
    messages: Vec<ChatMessage>,
    sending: bool,
}

pub struct ChatSession {
    tutor: Arc<Tutor>,
    grade_level: String,
    subject: Mutex<String>,
    state: Mutex<ChatState>,
}

impl ChatSession {
    /// Starts on the learner's first preferred subject.
    pub fn new(tutor: Arc<Tutor>, profile: Option<&Profile>) -> Self {
        let grade_level = profile
            .map(|p| p.grade_level.clone())
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GRADE_LEVEL.to_string());
        let subject = profile
            .map(|p| p.subjects())
            .and_then(|s| s.into_iter().next())
            .unwrap_or_else(|| "Math".to_string());

        Self {
            tutor,
            grade_level,
            subject: Mutex::new(subject),
            state: Mutex::new(ChatState::default()),
        }
    }

    pub async fn subject(&self) -> String {
        self.subject.lock().await.clone()
    }

    pub async fn set_subject(&self, subject: impl Into<String>) {
        *self.subject.lock().await = subject.into();
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.state.lock().await.messages.clone()
    }

    pub async fn is_sending(&self) -> bool {
        self.state.lock().await.sending
    }

    /// Sends `text` as the learner's next turn.
    pub async fn send(&self, text: &str) -> Step {
        let transcript = {
            let mut state = self.state.lock().await;
            if text.trim().is_empty() {
                return Step::Ignored(Ignored::BlankInput);
            }
            if state.sending {
                return Step::Ignored(Ignored::Busy);
            }
            state.messages.push(ChatMessage::user(text));
            state.sending = true;
            state.messages.clone()
        };

        let subject = self.subject().await;
        debug!(turns = transcript.len(), subject = %subject, "asking tutor");
        let reply = self
            .tutor
            .converse(&transcript, &subject, &self.grade_level)
            .await;

        let mut state = self.state.lock().await;
        state.messages.push(ChatMessage::assistant(reply));
        state.sending = false;
        Step::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ChatBackend, ChatRequest, CHAT_FALLBACK_REPLY};
    use crate::config::CompletionConfig;
    use crate::error::{LearnError, Result};
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the last user turn; fails on demand.
    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChatBackend for Echo {
        async fn complete(&self, _config: &CompletionConfig, request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LearnError::Transport("offline".into()));
            }
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("echo: {} ({} turns)", last, request.messages.len()))
        }
    }

    fn chat(backend: Arc<Echo>) -> ChatSession {
        let tutor = Tutor::new(backend, CompletionConfig::new(Some("sk-test".into()), None));
        let mut profile = Profile::new("Ada", "2nd Grade");
        profile.preferred_subjects = vec!["Science".into()];
        ChatSession::new(Arc::new(tutor), Some(&profile))
    }

    #[tokio::test]
    async fn test_blank_send_is_noop() {
        let backend = Arc::new(Echo::default());
        let chat = chat(backend.clone());

        assert_eq!(chat.send("   \n").await, Step::Ignored(Ignored::BlankInput));
        assert!(chat.transcript().await.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_send_appends_user_then_assistant() {
        let chat = chat(Arc::new(Echo::default()));
        assert_eq!(chat.subject().await, "Science");

        chat.send("Why is the sky blue?").await;
        chat.send("And sunsets?").await;

        let transcript = chat.transcript().await;
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0], ChatMessage::user("Why is the sky blue?"));
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        // persona prompt plus three turns
        assert_eq!(transcript[3].content, "echo: And sunsets? (4 turns)");
        assert!(!chat.is_sending().await);
    }

    #[tokio::test]
    async fn test_failure_appends_fallback_as_normal_reply() {
        let chat = chat(Arc::new(Echo {
            fail: true,
            ..Default::default()
        }));
        assert_eq!(chat.send("hello").await, Step::Applied);

        let transcript = chat.transcript().await;
        assert_eq!(transcript[1], ChatMessage::assistant(CHAT_FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn test_defaults_without_profile() {
        let tutor = Tutor::new(Arc::new(Echo::default()), CompletionConfig::default());
        let chat = ChatSession::new(Arc::new(tutor), None);
        assert_eq!(chat.subject().await, "Math");
        chat.set_subject("Art").await;
        assert_eq!(chat.subject().await, "Art");
    }
}
