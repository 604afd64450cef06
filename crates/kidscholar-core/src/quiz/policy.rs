//! Quiz behaviour knobs and the two named presets.

use std::fmt;
use std::str::FromStr;

/// Questions asked per subject before rotation moves on.
pub const QUESTIONS_PER_SUBJECT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subject picker value. `All` lets the rotation cursor choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectChoice {
    All,
    Named(String),
}

impl SubjectChoice {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            SubjectChoice::All
        } else {
            SubjectChoice::Named(value.to_string())
        }
    }
}

impl fmt::Display for SubjectChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectChoice::All => f.write_str("All"),
            SubjectChoice::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectSelection {
    /// Stay on the chosen subject; start on the first preferred one.
    Fixed,
    /// Start on `All` and move the cursor after `per_subject` questions.
    Rotating { per_subject: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceGate {
    /// "Next question" is always available.
    Always,
    /// "Next question" waits for a correct verdict.
    RequireCorrect,
}

/// How much of the question history is shown to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    Unbounded,
    Recent(usize),
}

impl HistoryWindow {
    pub fn apply<'a>(&self, history: &'a [String]) -> &'a [String] {
        match self {
            HistoryWindow::Unbounded => history,
            HistoryWindow::Recent(n) => &history[history.len().saturating_sub(*n)..],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizPolicy {
    pub subject_selection: SubjectSelection,
    pub advance_gate: AdvanceGate,
    pub history_window: HistoryWindow,
    pub difficulty_enabled: bool,
}

impl QuizPolicy {
    /// Fixed subject with difficulty selection; the learner may move on at
    /// any time.
    pub fn practice() -> Self {
        Self {
            subject_selection: SubjectSelection::Fixed,
            advance_gate: AdvanceGate::Always,
            history_window: HistoryWindow::Unbounded,
            difficulty_enabled: true,
        }
    }

    /// Rotates through the preferred subjects and only moves on once the
    /// answer is correct.
    pub fn adventure() -> Self {
        Self {
            subject_selection: SubjectSelection::Rotating {
                per_subject: QUESTIONS_PER_SUBJECT,
            },
            advance_gate: AdvanceGate::RequireCorrect,
            history_window: HistoryWindow::Unbounded,
            difficulty_enabled: false,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "practice" => Some(Self::practice()),
            "adventure" => Some(Self::adventure()),
            _ => None,
        }
    }

    pub fn preset_names() -> [&'static str; 2] {
        ["practice", "adventure"]
    }
}

impl Default for QuizPolicy {
    fn default() -> Self {
        Self::practice()
    }
}
