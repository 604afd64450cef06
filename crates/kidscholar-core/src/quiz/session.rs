//! Quiz orchestration.
//!
//! State is kept behind an async mutex that is released before every call to
//! the tutor, so a second trigger arriving while one is in flight sees the
//! in-flight phase and is dropped rather than queued.

use super::policy::{AdvanceGate, Difficulty, QuizPolicy, SubjectChoice, SubjectSelection};
use crate::ai::Tutor;
use crate::error::Result;
use crate::profile::{Profile, FALLBACK_SUBJECTS};
use crate::state::{Ignored, Step};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Grade level used for answer checking when no profile is attached.
pub const DEFAULT_GRADE_LEVEL: &str = "5th Grade";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Generating,
    AwaitingAnswer,
    Checking,
    Answered,
}

/// Everything the front-end needs to render the quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizState {
    pub phase: QuizPhase,
    pub current_question: String,
    /// Paired with `current_question`; never shown to the learner.
    pub correct_answer: String,
    pub user_answer: String,
    pub feedback: Option<String>,
    pub next_hint: Option<String>,
    pub is_answer_correct: Option<bool>,
    pub previous_questions: Vec<String>,
    pub subject: SubjectChoice,
    pub subject_queue: Vec<String>,
    pub subject_index: usize,
    pub question_count: u32,
    pub difficulty: Difficulty,
}

impl QuizState {
    fn new(policy: &QuizPolicy, subjects: Vec<String>) -> Self {
        let subject = match policy.subject_selection {
            SubjectSelection::Fixed => subjects
                .first()
                .cloned()
                .map(SubjectChoice::Named)
                .unwrap_or(SubjectChoice::All),
            SubjectSelection::Rotating { .. } => SubjectChoice::All,
        };

        Self {
            phase: QuizPhase::Idle,
            current_question: String::new(),
            correct_answer: String::new(),
            user_answer: String::new(),
            feedback: None,
            next_hint: None,
            is_answer_correct: None,
            previous_questions: Vec::new(),
            subject,
            subject_queue: subjects,
            subject_index: 0,
            question_count: 0,
            difficulty: Difficulty::default(),
        }
    }

    /// The subject the next question is about.
    pub fn active_subject(&self) -> String {
        match &self.subject {
            SubjectChoice::Named(name) => name.clone(),
            SubjectChoice::All => self
                .subject_queue
                .get(self.subject_index % self.subject_queue.len().max(1))
                .cloned()
                .unwrap_or_else(|| FALLBACK_SUBJECTS[0].to_string()),
        }
    }

    pub fn has_question(&self) -> bool {
        !self.current_question.is_empty() && !self.correct_answer.is_empty()
    }

    fn reset_answer(&mut self) {
        self.user_answer.clear();
        self.feedback = None;
        self.next_hint = None;
        self.is_answer_correct = None;
    }

    fn is_busy(&self) -> bool {
        matches!(self.phase, QuizPhase::Generating | QuizPhase::Checking)
    }
}

pub struct QuizSession {
    tutor: Arc<Tutor>,
    policy: QuizPolicy,
    profile: Option<Profile>,
    state: Mutex<QuizState>,
}

impl QuizSession {
    pub fn new(tutor: Arc<Tutor>, profile: Option<Profile>, policy: QuizPolicy) -> Self {
        let subjects = match &profile {
            Some(profile) => profile.subjects(),
            None => FALLBACK_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        };
        let state = QuizState::new(&policy, subjects);

        Self {
            tutor,
            policy,
            profile,
            state: Mutex::new(state),
        }
    }

    pub fn policy(&self) -> &QuizPolicy {
        &self.policy
    }

    pub async fn snapshot(&self) -> QuizState {
        self.state.lock().await.clone()
    }

    /// First question of the session.
    pub async fn start(&self) -> Result<Step> {
        self.request_question(Trigger::Fresh).await
    }

    /// Requests a fresh question for the active subject.
    ///
    /// Dropped while a question or a verdict is in flight, and under the
    /// `RequireCorrect` gate while an unsolved question is on screen. On
    /// failure the session falls back to `Idle` with no question set.
    pub async fn generate_question(&self) -> Result<Step> {
        self.request_question(Trigger::Fresh).await
    }

    /// Switches subject and asks for a question about it.
    pub async fn on_subject_changed(&self, subject: SubjectChoice) -> Result<Step> {
        self.request_question(Trigger::Subject(subject)).await
    }

    /// Switches difficulty and asks for a question at that level.
    pub async fn on_difficulty_changed(&self, difficulty: Difficulty) -> Result<Step> {
        if !self.policy.difficulty_enabled {
            return Ok(Step::Ignored(Ignored::DifficultyUnsupported));
        }
        self.request_question(Trigger::Difficulty(difficulty)).await
    }

    /// Records what the learner has typed so far.
    pub async fn set_answer(&self, answer: impl Into<String>) -> Step {
        let mut state = self.state.lock().await;
        match state.phase {
            QuizPhase::AwaitingAnswer | QuizPhase::Answered => {
                state.user_answer = answer.into();
                Step::Applied
            }
            QuizPhase::Generating | QuizPhase::Checking => Step::Ignored(Ignored::Busy),
            QuizPhase::Idle => Step::Ignored(Ignored::NoQuestion),
        }
    }

    /// Sends the learner's answer for judging.
    ///
    /// A wrong answer may be edited and submitted again.
    pub async fn submit_answer(&self) -> Result<Step> {
        let (question, correct_answer, user_answer, subject, resume_phase) = {
            let mut state = self.state.lock().await;
            if state.is_busy() {
                return Ok(Step::Ignored(Ignored::Busy));
            }
            if !state.has_question()
                || !matches!(state.phase, QuizPhase::AwaitingAnswer | QuizPhase::Answered)
            {
                return Ok(Step::Ignored(Ignored::NoQuestion));
            }
            if state.user_answer.trim().is_empty() {
                return Ok(Step::Ignored(Ignored::BlankInput));
            }
            if state.is_answer_correct == Some(true) {
                return Ok(Step::Ignored(Ignored::AlreadyCorrect));
            }

            let resume_phase = state.phase;
            state.phase = QuizPhase::Checking;
            (
                state.current_question.clone(),
                state.correct_answer.clone(),
                state.user_answer.clone(),
                state.active_subject(),
                resume_phase,
            )
        };

        let grade_level = self
            .profile
            .as_ref()
            .map(|p| p.grade_level.as_str())
            .unwrap_or(DEFAULT_GRADE_LEVEL);

        let result = self
            .tutor
            .check_answer(&question, &user_answer, &correct_answer, &subject, grade_level)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(verdict) => {
                info!(is_correct = verdict.is_correct, "answer judged");
                state.feedback = Some(verdict.explanation);
                state.next_hint = verdict.next_hint;
                state.is_answer_correct = Some(verdict.is_correct);
                state.phase = QuizPhase::Answered;
                Ok(Step::Applied)
            }
            Err(e) => {
                warn!(error = %e, "answer check failed");
                state.phase = resume_phase;
                Err(e)
            }
        }
    }

    /// Moves on to the next question, rotating subjects if the policy says so.
    ///
    /// If the new question cannot be fetched the session is left exactly as it
    /// was, so the learner can simply try again.
    pub async fn next_question(&self) -> Result<Step> {
        self.request_question(Trigger::Advance).await
    }

    async fn request_question(&self, trigger: Trigger) -> Result<Step> {
        let Some(profile) = &self.profile else {
            return Ok(Step::Ignored(Ignored::NoProfile));
        };

        let (subject, history, difficulty, restore) = {
            let mut state = self.state.lock().await;
            if state.is_busy() {
                return Ok(Step::Ignored(Ignored::Busy));
            }

            let gated = self.policy.advance_gate == AdvanceGate::RequireCorrect
                && state.is_answer_correct != Some(true);
            match &trigger {
                Trigger::Advance if gated => {
                    return Ok(Step::Ignored(Ignored::NeedsCorrectAnswer));
                }
                Trigger::Fresh if gated && state.has_question() => {
                    return Ok(Step::Ignored(Ignored::NeedsCorrectAnswer));
                }
                _ => {}
            }

            let restore = matches!(trigger, Trigger::Advance).then(|| state.clone());
            match trigger {
                Trigger::Fresh => {}
                Trigger::Subject(choice) => {
                    let queue_pos = match &choice {
                        SubjectChoice::Named(name) => {
                            state.subject_queue.iter().position(|s| s == name)
                        }
                        SubjectChoice::All => None,
                    };
                    if let Some(pos) = queue_pos {
                        state.subject_index = pos;
                    }
                    state.subject = choice;
                    state.question_count = 0;
                }
                Trigger::Difficulty(difficulty) => state.difficulty = difficulty,
                Trigger::Advance => {
                    if let SubjectSelection::Rotating { per_subject } = self.policy.subject_selection {
                        state.question_count += 1;
                        if state.question_count >= per_subject {
                            state.question_count = 0;
                            state.subject_index =
                                (state.subject_index + 1) % state.subject_queue.len().max(1);
                            info!(subject = %state.active_subject(), "rotating subject");
                        }
                    }
                }
            }

            state.reset_answer();
            state.current_question.clear();
            state.correct_answer.clear();
            state.phase = QuizPhase::Generating;

            let history = self.policy.history_window.apply(&state.previous_questions).to_vec();
            let difficulty = self.policy.difficulty_enabled.then_some(state.difficulty);
            (state.active_subject(), history, difficulty, restore)
        };

        let result = self
            .tutor
            .generate_question(&subject, &profile.grade_level, &history, difficulty)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(generated) => {
                info!(subject = %subject, "question ready");
                state.current_question = generated.question.clone();
                state.correct_answer = generated.correct_answer;
                state.previous_questions.push(generated.question);
                state.phase = QuizPhase::AwaitingAnswer;
                Ok(Step::Applied)
            }
            Err(e) => {
                warn!(error = %e, subject = %subject, "question generation failed");
                match restore {
                    Some(before) => *state = before,
                    None => state.phase = QuizPhase::Idle,
                }
                Err(e)
            }
        }
    }
}

/// What prompted a new question.
enum Trigger {
    Fresh,
    Subject(SubjectChoice),
    Difficulty(Difficulty),
    /// Next question; may rotate the subject cursor.
    Advance,
}
