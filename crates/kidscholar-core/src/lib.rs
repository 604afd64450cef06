pub mod ai;
pub mod chat;
pub mod config;
pub mod error;
pub mod profile;
pub mod quiz;
pub mod setup;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use ai::{AnswerVerdict, ChatBackend, ChatRequest, GeneratedQuestion, OpenAIClient, Tutor};
pub use chat::ChatSession;
pub use config::{CompletionConfig, Config};
pub use error::{LearnError, Result, SetupError};
pub use profile::Profile;
pub use quiz::{Difficulty, QuizPhase, QuizPolicy, QuizSession, QuizState, SubjectChoice};
pub use setup::{CredentialRequirement, SetupStep, SetupWizard};
pub use state::{ChatMessage, ChatRole, Ignored, Notice, NoticeLevel, Step};
pub use store::{FileStorage, MemoryStorage, ProfileStore, Storage};
