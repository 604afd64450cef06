use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

mod learn;
mod wizard;

use kidscholar_core::{
    CompletionConfig, Config, CredentialRequirement, Difficulty, FileStorage, Notice,
    NoticeLevel, OpenAIClient, Profile, ProfileStore, QuizPolicy, Tutor,
};

#[derive(Parser)]
#[command(name = "kidscholar")]
#[command(about = "Learn with quizzes and a friendly AI tutor")]
struct Cli {
    /// Directory holding the saved profile (defaults to the user config dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or edit your learner profile
    Setup {
        /// Save the profile even without API credentials
        #[arg(long)]
        allow_missing_credentials: bool,
    },
    /// Show the saved profile
    Profile,
    /// Delete the saved profile
    Reset,
    /// Answer quiz questions
    Quiz {
        /// Quiz style: practice or adventure
        #[arg(short, long)]
        preset: Option<String>,
        /// Subject to start on ("All" lets the quiz rotate)
        #[arg(short, long)]
        subject: Option<String>,
        /// Starting difficulty (practice only)
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
    /// Chat with the tutor
    Chat {
        /// Subject to talk about
        #[arg(short, long)]
        subject: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default settings");
        Config::new()
    });

    let storage = match cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location()?,
    };
    let mut store = ProfileStore::open(Box::new(storage));

    match cli.command {
        Commands::Setup {
            allow_missing_credentials,
        } => {
            let requirement = if allow_missing_credentials {
                CredentialRequirement::Optional
            } else {
                CredentialRequirement::Required
            };
            wizard::run(&mut store, requirement)?;
        }
        Commands::Profile => show_profile(store.profile()),
        Commands::Reset => {
            store.clear()?;
            println!("{}", "Profile cleared.".green());
        }
        Commands::Quiz {
            preset,
            subject,
            difficulty,
        } => {
            let profile = require_profile(&store)?;
            let preset_name = preset
                .or_else(|| config.default_preset.clone())
                .unwrap_or_else(|| "practice".to_string());
            let policy = QuizPolicy::preset(&preset_name).ok_or_else(|| {
                anyhow!(
                    "unknown preset '{}' (choose one of: {})",
                    preset_name,
                    QuizPolicy::preset_names().join(", ")
                )
            })?;
            let (tutor, notices) = build_tutor(&profile, &config);
            learn::run_quiz(tutor, profile, policy, subject, difficulty, notices).await?;
        }
        Commands::Chat { subject } => {
            let profile = require_profile(&store)?;
            let (tutor, notices) = build_tutor(&profile, &config);
            learn::run_chat(tutor, profile, subject, notices).await?;
        }
    }

    Ok(())
}

fn require_profile(store: &ProfileStore) -> Result<Profile> {
    store.profile().cloned().ok_or_else(|| {
        anyhow!(
            "No profile yet. Run {} first.",
            "kidscholar setup".bold()
        )
    })
}

/// Profile credentials win; environment variables fill the gaps.
fn build_tutor(profile: &Profile, config: &Config) -> (Arc<Tutor>, UnboundedReceiver<Notice>) {
    let api_key = profile
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());
    let base_url = profile
        .api_base_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| std::env::var("OPENAI_BASE_URL").ok());

    let completion = CompletionConfig::new(api_key, base_url).with_model(config.model());
    let (tx, rx) = mpsc::unbounded_channel();
    let tutor = Tutor::new(Arc::new(OpenAIClient::new()), completion).with_notices(tx);
    (Arc::new(tutor), rx)
}

pub(crate) fn print_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.level {
            NoticeLevel::Success => println!("{} {}", "✓".green(), notice.message.green()),
            NoticeLevel::Error => println!("{} {}", "!".red().bold(), notice.message.red()),
        }
    }
}

fn show_profile(profile: Option<&Profile>) {
    let Some(profile) = profile else {
        println!("{}", "No profile saved yet.".yellow());
        return;
    };

    println!("\n{}", "🎒 Learner Profile".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    println!("{:<18} {}", "Name:".bold(), profile.name);
    println!("{:<18} {}", "Grade:".bold(), profile.grade_level);
    println!("{:<18} {}", "Avatar:".bold(), profile.avatar);
    if let Some(age) = &profile.age {
        println!("{:<18} {}", "Age:".bold(), age);
    }
    println!("{:<18} {}", "Subjects:".bold(), profile.subjects().join(", "));
    if let Some(themes) = profile.favorite_themes.as_ref().filter(|t| !t.is_empty()) {
        println!("{:<18} {}", "Themes:".bold(), themes.join(", "));
    }
    if let Some(character) = profile.character_preference.as_ref().filter(|c| !c.is_empty()) {
        println!("{:<18} {}", "Character:".bold(), character);
    }
    if let Some(style) = profile.learning_style.as_ref().filter(|s| !s.is_empty()) {
        println!("{:<18} {}", "Learning style:".bold(), style);
    }
    println!(
        "{:<18} {}",
        "API base URL:".bold(),
        profile.api_base_url.as_deref().unwrap_or("(default)")
    );
    println!(
        "{:<18} {}",
        "API key:".bold(),
        profile.api_key.as_deref().map(mask_key).unwrap_or_else(|| "(not set)".to_string())
    );
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("••••{}", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key_shows_last_four() {
        assert_eq!(mask_key("sk-abcdef1234"), "••••1234");
        assert_eq!(mask_key("ab"), "••••ab");
    }

    #[test]
    fn test_cli_parses_quiz_flags() {
        let cli = Cli::parse_from([
            "kidscholar",
            "--data-dir",
            "/tmp/ks",
            "quiz",
            "--preset",
            "adventure",
            "--difficulty",
            "hard",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/ks")));
        match cli.command {
            Commands::Quiz {
                preset, difficulty, ..
            } => {
                assert_eq!(preset.as_deref(), Some("adventure"));
                assert_eq!(difficulty, Some(Difficulty::Hard));
            }
            _ => panic!("expected quiz command"),
        }
    }
}
