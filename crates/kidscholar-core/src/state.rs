//! UI-agnostic message and notice types
//!
//! Shared by the orchestrators and whatever front-end renders them; nothing
//! here depends on a UI framework.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// A chat message in a tutoring conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short user-visible message, rendered by the front-end as it sees fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }
}

/// Optional channel the caller drains to show notices.
pub type NoticeSender = UnboundedSender<Notice>;

/// Outcome of a user-triggered session action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Applied,
    Ignored(Ignored),
}

impl Step {
    pub fn is_applied(&self) -> bool {
        matches!(self, Step::Applied)
    }
}

/// Why an action was dropped without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// No learner profile is attached.
    NoProfile,
    /// Another call of the same session is still in flight.
    Busy,
    /// Input was empty or whitespace.
    BlankInput,
    /// There is no question to answer yet.
    NoQuestion,
    /// The current answer was already judged correct.
    AlreadyCorrect,
    /// The policy only advances after a correct answer.
    NeedsCorrectAnswer,
    /// The policy has no difficulty selection.
    DifficultyUnsupported,
}
