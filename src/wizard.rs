//! Interactive profile setup on the terminal.

use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect, Password, Select};
use kidscholar_core::config::DEFAULT_BASE_URL;
use kidscholar_core::profile::{AVATARS, CHARACTERS, GRADE_LEVELS, SUBJECTS, THEMES};
use kidscholar_core::{CredentialRequirement, LearnError, ProfileStore, SetupStep, SetupWizard};

pub fn run(store: &mut ProfileStore, requirement: CredentialRequirement) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut wizard = store
        .profile()
        .map(SetupWizard::from_profile)
        .unwrap_or_default();

    println!("\n{}", "✨ Let's build your learner profile!".bold().blue());

    loop {
        ask(&theme, &mut wizard, requirement)?;

        if wizard.step == SetupStep::Credentials {
            match wizard.submit(store, requirement) {
                Ok(_) => {
                    println!(
                        "{}",
                        "Your awesome profile is saved! Let's start learning!".green().bold()
                    );
                    return Ok(());
                }
                Err(LearnError::Setup(e)) => {
                    println!("{}", e.to_string().red());
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Err(e) = wizard.next_step() {
            println!("{}", e.to_string().red());
        }
    }
}

fn ask(theme: &ColorfulTheme, wizard: &mut SetupWizard, requirement: CredentialRequirement) -> Result<()> {
    match wizard.step {
        SetupStep::Name => {
            wizard.name = Input::<String>::with_theme(theme)
                .with_prompt("What's your name?")
                .with_initial_text(wizard.name.clone())
                .allow_empty(true)
                .interact_text()?;
        }
        SetupStep::Age => {
            let age = Input::<String>::with_theme(theme)
                .with_prompt("How old are you?")
                .with_initial_text(wizard.age.clone())
                .allow_empty(true)
                .interact_text()?;
            wizard.set_age(age);
        }
        SetupStep::GradeLevel => {
            let default = GRADE_LEVELS
                .iter()
                .position(|g| *g == wizard.grade_level)
                .unwrap_or(0);
            let idx = Select::with_theme(theme)
                .with_prompt("Which grade are you in?")
                .items(&GRADE_LEVELS)
                .default(default)
                .interact()?;
            wizard.grade_level = GRADE_LEVELS[idx].to_string();
        }
        SetupStep::Avatar => {
            let default = AVATARS.iter().position(|a| *a == wizard.avatar).unwrap_or(0);
            let idx = Select::with_theme(theme)
                .with_prompt("Pick an avatar")
                .items(&AVATARS)
                .default(default)
                .interact()?;
            wizard.avatar = AVATARS[idx].to_string();
        }
        SetupStep::Subjects => {
            let picked = pick_many(theme, "Which subjects do you like?", &SUBJECTS, &wizard.preferred_subjects)?;
            for subject in changed_options(&SUBJECTS, &wizard.preferred_subjects, &picked) {
                wizard.toggle_subject(subject);
            }
        }
        SetupStep::Themes => {
            let picked = pick_many(theme, "Favourite adventure themes?", &THEMES, &wizard.favorite_themes)?;
            for favorite in changed_options(&THEMES, &wizard.favorite_themes, &picked) {
                wizard.toggle_theme(favorite);
            }
        }
        SetupStep::Character => {
            let mut items = vec!["(none)"];
            items.extend(CHARACTERS);
            let default = items
                .iter()
                .position(|c| *c == wizard.character_preference)
                .unwrap_or(0);
            let idx = Select::with_theme(theme)
                .with_prompt("Who should join your adventures?")
                .items(&items)
                .default(default)
                .interact()?;
            wizard.character_preference = if idx == 0 {
                String::new()
            } else {
                items[idx].to_string()
            };
        }
        SetupStep::LearningStyle => {
            wizard.learning_style = Input::<String>::with_theme(theme)
                .with_prompt("How do you like to learn? (optional)")
                .with_initial_text(wizard.learning_style.clone())
                .allow_empty(true)
                .interact_text()?;
        }
        SetupStep::Credentials => {
            let initial = if wizard.api_base_url.is_empty() {
                DEFAULT_BASE_URL.to_string()
            } else {
                wizard.api_base_url.clone()
            };
            wizard.api_base_url = Input::<String>::with_theme(theme)
                .with_prompt("API base URL")
                .with_initial_text(initial)
                .allow_empty(requirement == CredentialRequirement::Optional)
                .interact_text()?;

            let prompt = if wizard.api_key.is_empty() {
                "API key"
            } else {
                "API key (leave empty to keep the current one)"
            };
            let key = Password::with_theme(theme)
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()?;
            if !key.trim().is_empty() {
                wizard.api_key = key;
            }
        }
    }
    Ok(())
}

/// Indices of the options ticked in the prompt.
fn pick_many(
    theme: &ColorfulTheme,
    prompt: &str,
    options: &[&str],
    current: &[String],
) -> Result<Vec<usize>> {
    let defaults: Vec<bool> = options
        .iter()
        .map(|o| current.iter().any(|c| c == o))
        .collect();
    let picked = MultiSelect::with_theme(theme)
        .with_prompt(prompt)
        .items(options)
        .defaults(&defaults)
        .interact()?;
    Ok(picked)
}

/// Options whose ticked state differs from `current`. Toggling them keeps the
/// learner's existing order and appends new picks at the end.
fn changed_options<'a>(options: &[&'a str], current: &[String], picked: &[usize]) -> Vec<&'a str> {
    options
        .iter()
        .enumerate()
        .filter(|(i, option)| picked.contains(i) != current.iter().any(|c| c == *option))
        .map(|(_, option)| *option)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(option: &str) -> usize {
        SUBJECTS.iter().position(|s| *s == option).unwrap()
    }

    #[test]
    fn test_selection_keeps_existing_order() {
        let mut wizard = SetupWizard::default();
        wizard.toggle_subject("Science");
        wizard.toggle_subject("Math");

        let picked = vec![index_of("Math"), index_of("Science"), index_of("History")];
        for subject in changed_options(&SUBJECTS, &wizard.preferred_subjects, &picked) {
            wizard.toggle_subject(subject);
        }
        assert_eq!(wizard.preferred_subjects, vec!["Science", "Math", "History"]);
    }

    #[test]
    fn test_unticked_option_is_removed() {
        let mut wizard = SetupWizard::default();
        wizard.toggle_subject("Art");
        wizard.toggle_subject("Math");

        let picked = vec![index_of("Math")];
        assert_eq!(
            changed_options(&SUBJECTS, &wizard.preferred_subjects, &picked),
            vec!["Art"]
        );
        wizard.toggle_subject("Art");
        assert_eq!(wizard.preferred_subjects, vec!["Math"]);
    }
}
