pub mod policy;
pub mod session;

pub use policy::{
    AdvanceGate, Difficulty, HistoryWindow, QuizPolicy, SubjectChoice, SubjectSelection,
    QUESTIONS_PER_SUBJECT,
};
pub use session::{QuizPhase, QuizSession, QuizState, DEFAULT_GRADE_LEVEL};
