//! Learner profile and the catalogues the setup wizard offers.

use serde::{Deserialize, Serialize};

/// Subjects used when a learner picked none.
pub const FALLBACK_SUBJECTS: [&str; 3] = ["Math", "Science", "English"];

pub const SUBJECTS: [&str; 8] = [
    "Math",
    "Science",
    "English",
    "History",
    "Geography",
    "Literature",
    "Computer Science",
    "Art",
];

pub const GRADE_LEVELS: [&str; 13] = [
    "K",
    "1st Grade",
    "2nd Grade",
    "3rd Grade",
    "4th Grade",
    "5th Grade",
    "6th Grade",
    "7th Grade",
    "8th Grade",
    "9th Grade",
    "10th Grade",
    "11th Grade",
    "12th Grade",
];

pub const AVATARS: [&str; 6] = ["1", "2", "3", "4", "5", "6"];

pub const THEMES: [&str; 6] = [
    "Space",
    "Pirates",
    "Superheroes",
    "Animals",
    "Fantasy",
    "Science",
];

pub const CHARACTERS: [&str; 9] = [
    "Spider-Man",
    "Wonder Woman",
    "Iron Man",
    "Princess Elsa",
    "Harry Potter",
    "Mickey Mouse",
    "Sonic",
    "Mario",
    "Bluey",
];

/// A learner's persisted preferences and completion-service credentials.
///
/// Field names serialize in camelCase so records written by earlier
/// revisions stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub grade_level: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub preferred_subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_themes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

fn default_avatar() -> String {
    AVATARS[0].to_string()
}

impl Profile {
    pub fn new(name: impl Into<String>, grade_level: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grade_level: grade_level.into(),
            avatar: default_avatar(),
            preferred_subjects: Vec::new(),
            favorite_themes: None,
            character_preference: None,
            learning_style: None,
            age: None,
            api_key: None,
            api_base_url: None,
        }
    }

    /// Preferred subjects, or the fallback list when none were chosen.
    pub fn subjects(&self) -> Vec<String> {
        if self.preferred_subjects.is_empty() {
            FALLBACK_SUBJECTS.iter().map(|s| s.to_string()).collect()
        } else {
            self.preferred_subjects.clone()
        }
    }

    /// True when both an API key and a base URL are present and non-blank.
    pub fn has_credentials(&self) -> bool {
        non_blank(&self.api_key) && non_blank(&self.api_base_url)
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Suggest a grade level from an age typed by the learner.
///
/// Returns an empty string when the age is not a number or is above 18.
pub fn suggest_grade_level(age: &str) -> String {
    let Ok(age) = age.trim().parse::<i32>() else {
        return String::new();
    };

    if age < 5 {
        return "K".to_string();
    }
    if age > 18 {
        return String::new();
    }

    match age - 5 {
        0 => "K".to_string(),
        grade if grade <= 12 => format!("{}{} Grade", grade, ordinal_suffix(grade)),
        _ => String::new(),
    }
}

fn ordinal_suffix(n: i32) -> &'static str {
    let j = n % 10;
    let k = n % 100;
    match (j, k) {
        (1, k) if k != 11 => "st",
        (2, k) if k != 12 => "nd",
        (3, k) if k != 13 => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects_fallback_when_empty() {
        let profile = Profile::new("Ada", "3rd Grade");
        assert_eq!(profile.subjects(), vec!["Math", "Science", "English"]);
    }

    #[test]
    fn test_subjects_keep_order() {
        let mut profile = Profile::new("Ada", "3rd Grade");
        profile.preferred_subjects = vec!["Art".into(), "Math".into()];
        assert_eq!(profile.subjects(), vec!["Art", "Math"]);
    }

    #[test]
    fn test_suggest_grade_level() {
        assert_eq!(suggest_grade_level("4"), "K");
        assert_eq!(suggest_grade_level("5"), "K");
        assert_eq!(suggest_grade_level("6"), "1st Grade");
        assert_eq!(suggest_grade_level("7"), "2nd Grade");
        assert_eq!(suggest_grade_level("8"), "3rd Grade");
        assert_eq!(suggest_grade_level("9"), "4th Grade");
        assert_eq!(suggest_grade_level("16"), "11th Grade");
        assert_eq!(suggest_grade_level("17"), "12th Grade");
        assert_eq!(suggest_grade_level("18"), "");
        assert_eq!(suggest_grade_level("forty"), "");
    }

    #[test]
    fn test_camel_case_record_is_readable() {
        let json = r#"{"name":"Ada","gradeLevel":"2nd Grade","avatar":"3","preferredSubjects":["Math"],"apiKey":"sk-1"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.grade_level, "2nd Grade");
        assert_eq!(profile.api_key.as_deref(), Some("sk-1"));
        assert!(profile.api_base_url.is_none());
        assert!(!profile.has_credentials());
    }
}
