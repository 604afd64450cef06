//! Step-by-step profile setup.
//!
//! The wizard owns the draft answers, validates each step before moving on,
//! and only touches the [`ProfileStore`] once the whole profile passes.

use crate::error::{Result, SetupError};
use crate::profile::{suggest_grade_level, Profile, AVATARS};
use crate::store::ProfileStore;
use tracing::info;

/// Subject stored when the learner leaves the subject step empty.
pub const DEFAULT_SUBJECT: &str = "Math";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Name,
    Age,
    GradeLevel,
    Avatar,
    Subjects,
    Themes,
    Character,
    LearningStyle,
    Credentials,
}

impl SetupStep {
    pub fn all() -> [SetupStep; 9] {
        [
            SetupStep::Name,
            SetupStep::Age,
            SetupStep::GradeLevel,
            SetupStep::Avatar,
            SetupStep::Subjects,
            SetupStep::Themes,
            SetupStep::Character,
            SetupStep::LearningStyle,
            SetupStep::Credentials,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|s| s == self).unwrap_or(0)
    }

    fn next(&self) -> SetupStep {
        let all = Self::all();
        all[(self.index() + 1).min(all.len() - 1)]
    }

    fn prev(&self) -> SetupStep {
        Self::all()[self.index().saturating_sub(1)]
    }
}

/// Whether a submitted profile must carry completion credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialRequirement {
    #[default]
    Required,
    Optional,
}

/// Draft answers collected by the setup flow.
#[derive(Debug, Clone)]
pub struct SetupWizard {
    pub step: SetupStep,
    pub name: String,
    pub age: String,
    pub grade_level: String,
    pub avatar: String,
    pub preferred_subjects: Vec<String>,
    pub favorite_themes: Vec<String>,
    pub character_preference: String,
    pub learning_style: String,
    pub api_key: String,
    pub api_base_url: String,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self {
            step: SetupStep::Name,
            name: String::new(),
            age: String::new(),
            grade_level: String::new(),
            avatar: AVATARS[0].to_string(),
            preferred_subjects: Vec::new(),
            favorite_themes: Vec::new(),
            character_preference: String::new(),
            learning_style: String::new(),
            api_key: String::new(),
            api_base_url: String::new(),
        }
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefills the draft from an existing profile for editing.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            step: SetupStep::Name,
            name: profile.name.clone(),
            age: profile.age.clone().unwrap_or_default(),
            grade_level: profile.grade_level.clone(),
            avatar: profile.avatar.clone(),
            preferred_subjects: profile.preferred_subjects.clone(),
            favorite_themes: profile.favorite_themes.clone().unwrap_or_default(),
            character_preference: profile.character_preference.clone().unwrap_or_default(),
            learning_style: profile.learning_style.clone().unwrap_or_default(),
            api_key: profile.api_key.clone().unwrap_or_default(),
            api_base_url: profile.api_base_url.clone().unwrap_or_default(),
        }
    }

    /// Sets the age and replaces the grade level with the suggested one.
    pub fn set_age(&mut self, age: impl Into<String>) {
        self.age = age.into();
        self.grade_level = suggest_grade_level(&self.age);
    }

    pub fn toggle_subject(&mut self, subject: &str) {
        toggle(&mut self.preferred_subjects, subject);
    }

    pub fn toggle_theme(&mut self, theme: &str) {
        toggle(&mut self.favorite_themes, theme);
    }

    /// Advances one step if the current step's answer is present.
    pub fn next_step(&mut self) -> std::result::Result<SetupStep, SetupError> {
        match self.step {
            SetupStep::Name if self.name.trim().is_empty() => return Err(SetupError::MissingName),
            SetupStep::Age if self.age.trim().is_empty() => return Err(SetupError::MissingAge),
            SetupStep::GradeLevel if self.grade_level.trim().is_empty() => {
                return Err(SetupError::MissingGradeLevel)
            }
            _ => {}
        }
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn prev_step(&mut self) -> SetupStep {
        self.step = self.step.prev();
        self.step
    }

    /// Validates the draft into a profile without saving it.
    pub fn build(
        &self,
        requirement: CredentialRequirement,
    ) -> std::result::Result<Profile, SetupError> {
        if self.name.trim().is_empty() {
            return Err(SetupError::MissingName);
        }
        if self.grade_level.trim().is_empty() {
            return Err(SetupError::MissingGradeLevel);
        }
        if requirement == CredentialRequirement::Required
            && (self.api_key.trim().is_empty() || self.api_base_url.trim().is_empty())
        {
            return Err(SetupError::MissingCredentials);
        }

        let preferred_subjects = if self.preferred_subjects.is_empty() {
            vec![DEFAULT_SUBJECT.to_string()]
        } else {
            self.preferred_subjects.clone()
        };

        Ok(Profile {
            name: self.name.clone(),
            grade_level: self.grade_level.clone(),
            avatar: self.avatar.clone(),
            preferred_subjects,
            favorite_themes: Some(self.favorite_themes.clone()),
            character_preference: Some(self.character_preference.clone()),
            learning_style: Some(self.learning_style.clone()),
            age: non_empty(&self.age),
            api_key: non_empty(&self.api_key),
            api_base_url: non_empty(&self.api_base_url),
        })
    }

    /// Validates and persists the profile. Storage is untouched on failure.
    pub fn submit(
        &self,
        store: &mut ProfileStore,
        requirement: CredentialRequirement,
    ) -> Result<Profile> {
        let profile = self.build(requirement)?;
        store.save(profile.clone())?;
        info!(name = %profile.name, grade = %profile.grade_level, "profile saved");
        Ok(profile)
    }
}

fn toggle(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    } else {
        list.push(value.to_string());
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
