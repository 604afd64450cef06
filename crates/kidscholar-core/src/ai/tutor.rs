//! The completion client used by the quiz and chat sessions.
//!
//! Chat degrades to a canned reply on any failure. Question generation and
//! answer checking have no sensible fallback, so they report the failure to
//! the caller after raising a notice.

use super::decode::{AnswerVerdict, GeneratedQuestion};
use super::prompts;
use super::{ChatBackend, ChatRequest};
use crate::config::CompletionConfig;
use crate::error::{LearnError, Result};
use crate::quiz::Difficulty;
use crate::state::{ChatMessage, Notice, NoticeSender};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const MISSING_KEY_REPLY: &str = "I need an API key to help you. Please set it in your profile.";
pub const CHAT_FALLBACK_REPLY: &str =
    "I'm having trouble connecting to my brain right now. Please try again later!";

const MISSING_KEY_NOTICE: &str = "API key is not set";
const CHAT_FAILED_NOTICE: &str = "Couldn't connect to AI service";
const QUESTION_FAILED_NOTICE: &str = "Couldn't generate a question";
const CHECK_FAILED_NOTICE: &str = "Couldn't check your answer";

pub struct Tutor {
    backend: Arc<dyn ChatBackend>,
    config: CompletionConfig,
    notices: Option<NoticeSender>,
}

impl Tutor {
    pub fn new(backend: Arc<dyn ChatBackend>, config: CompletionConfig) -> Self {
        Self {
            backend,
            config,
            notices: None,
        }
    }

    /// Routes user-visible notices to `sender`.
    pub fn with_notices(mut self, sender: NoticeSender) -> Self {
        self.notices = Some(sender);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.config.api_key().is_some()
    }

    /// Free-form tutoring reply to `transcript`. Never fails.
    pub async fn converse(&self, transcript: &[ChatMessage], subject: &str, grade_level: &str) -> String {
        if !self.has_credentials() {
            self.notify(MISSING_KEY_NOTICE);
            return MISSING_KEY_REPLY.to_string();
        }

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(prompts::tutor_persona(subject, grade_level)));
        messages.extend_from_slice(transcript);

        let request = ChatRequest::text(
            messages,
            self.config.chat_temperature,
            Some(self.config.chat_max_tokens),
        );

        match self.backend.complete(&self.config, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "error generating response");
                self.notify(CHAT_FAILED_NOTICE);
                CHAT_FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Asks the model for a new question, avoiding `previous_questions`.
    pub async fn generate_question(
        &self,
        subject: &str,
        grade_level: &str,
        previous_questions: &[String],
        difficulty: Option<Difficulty>,
    ) -> Result<GeneratedQuestion> {
        self.require_credentials()?;

        let instruction =
            prompts::question_instruction(subject, grade_level, previous_questions, difficulty);
        let request = ChatRequest::json(
            vec![ChatMessage::system(instruction)],
            self.config.question_temperature,
        );

        let result = match self.backend.complete(&self.config, &request).await {
            Ok(content) => GeneratedQuestion::decode(&content),
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            error!(error = %e, subject, "error generating question");
            self.notify(QUESTION_FAILED_NOTICE);
            e
        })
    }

    /// Asks the model whether `user_answer` answers `question`.
    pub async fn check_answer(
        &self,
        question: &str,
        user_answer: &str,
        correct_answer: &str,
        subject: &str,
        grade_level: &str,
    ) -> Result<AnswerVerdict> {
        self.require_credentials()?;

        let request = ChatRequest::json(
            vec![
                ChatMessage::system(prompts::check_instruction(subject, grade_level)),
                ChatMessage::user(prompts::check_context(question, correct_answer, user_answer)),
            ],
            self.config.check_temperature,
        );

        let result = match self.backend.complete(&self.config, &request).await {
            Ok(content) => AnswerVerdict::decode(&content),
            Err(e) => Err(e),
        };

        match result {
            Ok(verdict) => {
                debug!(is_correct = verdict.is_correct, "answer checked");
                Ok(verdict)
            }
            Err(e) => {
                error!(error = %e, "error checking answer");
                self.notify(CHECK_FAILED_NOTICE);
                Err(e)
            }
        }
    }

    fn require_credentials(&self) -> Result<()> {
        if self.has_credentials() {
            Ok(())
        } else {
            self.notify(MISSING_KEY_NOTICE);
            Err(LearnError::MissingCredentials)
        }
    }

    fn notify(&self, message: &str) {
        if let Some(sender) = &self.notices {
            if sender.send(Notice::error(message)).is_err() {
                warn!(message, "notice receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Records requests and answers from a fixed script.
    struct Scripted {
        replies: Mutex<Vec<Result<String>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for Scripted {
        async fn complete(&self, _config: &CompletionConfig, request: &ChatRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn keyed() -> CompletionConfig {
        CompletionConfig::new(Some("sk-test".into()), None)
    }

    #[tokio::test]
    async fn test_converse_without_key_skips_network() {
        let backend = Scripted::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tutor = Tutor::new(backend.clone(), CompletionConfig::default()).with_notices(tx);

        let reply = tutor.converse(&[ChatMessage::user("hi")], "Math", "K").await;
        assert_eq!(reply, MISSING_KEY_REPLY);
        assert_eq!(backend.calls(), 0);
        assert_eq!(rx.try_recv().unwrap().message, "API key is not set");
    }

    #[tokio::test]
    async fn test_converse_prepends_persona() {
        let backend = Scripted::new(vec![Ok("Ahoy!".into())]);
        let tutor = Tutor::new(backend.clone(), keyed());

        let reply = tutor.converse(&[ChatMessage::user("hi")], "Science", "2nd Grade").await;
        assert_eq!(reply, "Ahoy!");

        let seen = backend.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert!(request.messages[0].content.contains("2nd Grade students learning Science"));
        assert_eq!(request.messages[1], ChatMessage::user("hi"));
        assert_eq!(request.max_tokens, Some(500));
        assert!(!request.json_mode);
    }

    #[tokio::test]
    async fn test_converse_failure_returns_fallback() {
        let backend = Scripted::new(vec![Err(LearnError::Transport("refused".into()))]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tutor = Tutor::new(backend, keyed()).with_notices(tx);

        let reply = tutor.converse(&[], "Math", "K").await;
        assert_eq!(reply, CHAT_FALLBACK_REPLY);
        assert_eq!(rx.try_recv().unwrap().message, "Couldn't connect to AI service");
    }

    #[tokio::test]
    async fn test_generate_question_without_key_rejects() {
        let backend = Scripted::new(vec![]);
        let tutor = Tutor::new(backend.clone(), CompletionConfig::default());
        let err = tutor.generate_question("Math", "K", &[], None).await.unwrap_err();
        assert!(err.is_missing_credentials());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_question_requests_json() {
        let backend = Scripted::new(vec![Ok(r#"{"question":"Q2","correctAnswer":"A2"}"#.into())]);
        let tutor = Tutor::new(backend.clone(), keyed());
        let previous = vec!["Q1".to_string()];

        let q = tutor
            .generate_question("Math", "K", &previous, Some(Difficulty::Easy))
            .await
            .unwrap();
        assert_eq!(q.question, "Q2");

        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].json_mode);
        assert!(seen[0].messages[0].content.contains("Avoid repeating these questions: Q1."));
    }

    #[tokio::test]
    async fn test_generate_question_malformed_raises_notice() {
        let backend = Scripted::new(vec![Ok("not json".into())]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tutor = Tutor::new(backend, keyed()).with_notices(tx);

        let err = tutor.generate_question("Math", "K", &[], None).await.unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(rx.try_recv().unwrap().message, "Couldn't generate a question");
    }

    #[tokio::test]
    async fn test_check_answer_sends_context() {
        let backend = Scripted::new(vec![Ok(r#"{"isCorrect":true,"explanation":"Yes!"}"#.into())]);
        let tutor = Tutor::new(backend.clone(), keyed());

        let verdict = tutor
            .check_answer("2+2?", "4", "4", "Math", "1st Grade")
            .await
            .unwrap();
        assert!(verdict.is_correct);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.3);
        assert_eq!(
            seen[0].messages[1].content,
            "Question: 2+2?\nCorrect answer: 4\nStudent's answer: 4"
        );
    }

    #[tokio::test]
    async fn test_check_answer_endpoint_error_propagates() {
        let backend = Scripted::new(vec![Err(LearnError::Endpoint {
            status: 401,
            message: "Invalid API key".into(),
        })]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tutor = Tutor::new(backend, keyed()).with_notices(tx);

        let err = tutor.check_answer("q", "a", "b", "Math", "K").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(rx.try_recv().unwrap().message, "Couldn't check your answer");
    }

    #[tokio::test]
    async fn test_check_answer_without_key_rejects() {
        let backend = Scripted::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tutor = Tutor::new(backend.clone(), CompletionConfig::default()).with_notices(tx);

        let err = tutor.check_answer("2+2?", "4", "4", "Math", "K").await.unwrap_err();
        assert!(err.is_missing_credentials());
        assert_eq!(backend.calls(), 0);
        assert_eq!(rx.try_recv().unwrap().message, "API key is not set");
    }
}
