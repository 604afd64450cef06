//! Quiz and chat loops on the terminal.

use crate::print_notices;
use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use kidscholar_core::quiz::{AdvanceGate, QuizPhase, QuizState};
use kidscholar_core::{
    ChatSession, Difficulty, Ignored, Notice, Profile, QuizPolicy, QuizSession, Step,
    SubjectChoice, Tutor,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// A line typed during the quiz.
#[derive(Debug, PartialEq)]
enum QuizCommand {
    Quit,
    Next,
    New,
    Subject(String),
    Difficulty(String),
    Answer(String),
}

fn parse_quiz_command(line: &str) -> QuizCommand {
    let trimmed = line.trim();
    let (head, rest) = match trimmed.split_once(' ') {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };
    match head {
        ":quit" | ":q" => QuizCommand::Quit,
        ":next" | ":n" => QuizCommand::Next,
        ":new" => QuizCommand::New,
        ":subject" => QuizCommand::Subject(rest.to_string()),
        ":difficulty" => QuizCommand::Difficulty(rest.to_string()),
        _ => QuizCommand::Answer(line.to_string()),
    }
}

pub async fn run_quiz(
    tutor: Arc<Tutor>,
    profile: Profile,
    policy: QuizPolicy,
    subject: Option<String>,
    difficulty: Option<Difficulty>,
    mut notices: UnboundedReceiver<Notice>,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let name = profile.name.clone();
    let quiz = QuizSession::new(tutor, Some(profile), policy);

    println!(
        "\n{} {}",
        "🧩 Quiz time,".bold().blue(),
        format!("{}!", name).bold().blue()
    );
    println!(
        "{}",
        "Type an answer, or :next, :new, :subject <name|All>, :difficulty <easy|medium|hard>, :quit"
            .dimmed()
    );

    if let Some(d) = difficulty {
        report(quiz.on_difficulty_changed(d).await, &mut notices);
    }
    match subject {
        Some(s) => report(quiz.on_subject_changed(SubjectChoice::parse(&s)).await, &mut notices),
        None => {
            if !quiz.snapshot().await.has_question() {
                report(quiz.start().await, &mut notices);
            }
        }
    }

    loop {
        let state = quiz.snapshot().await;
        render_quiz(&state, quiz.policy());

        let line = Input::<String>::with_theme(&theme)
            .with_prompt("›")
            .allow_empty(true)
            .interact_text()?;

        match parse_quiz_command(&line) {
            QuizCommand::Quit => break,
            QuizCommand::Next => report(quiz.next_question().await, &mut notices),
            QuizCommand::New => report(quiz.generate_question().await, &mut notices),
            QuizCommand::Subject(s) => {
                report(quiz.on_subject_changed(SubjectChoice::parse(&s)).await, &mut notices)
            }
            QuizCommand::Difficulty(d) => match d.parse::<Difficulty>() {
                Ok(d) => report(quiz.on_difficulty_changed(d).await, &mut notices),
                Err(e) => println!("{}", e.red()),
            },
            QuizCommand::Answer(answer) => {
                let step = quiz.set_answer(answer).await;
                if step.is_applied() {
                    println!("{}", "🔮 Checking your answer...".dimmed());
                    report(quiz.submit_answer().await, &mut notices);
                } else {
                    explain(step);
                }
            }
        }
    }

    let state = quiz.snapshot().await;
    println!(
        "\n{} {} questions this session. Bye!",
        "👋".bold(),
        state.previous_questions.len().to_string().bold()
    );
    Ok(())
}

fn render_quiz(state: &QuizState, policy: &QuizPolicy) {
    let subject = match &state.subject {
        SubjectChoice::All => format!("All → {}", state.active_subject()),
        SubjectChoice::Named(name) => name.clone(),
    };
    let mut header = format!("{} Question", subject);
    if policy.difficulty_enabled {
        header.push_str(&format!(" ({})", state.difficulty));
    }

    println!("\n{}", header.bold().cyan());
    println!("{}", "=".repeat(40).dimmed());

    if state.current_question.is_empty() {
        println!("{}", "Loading a new question... (try :new)".dimmed());
        return;
    }
    println!("{}", state.current_question);

    if let Some(feedback) = &state.feedback {
        println!();
        if state.is_answer_correct == Some(true) {
            println!("{}", "Correct! 🎉".green().bold());
        } else {
            println!("{}", "Not quite right 🤔".yellow().bold());
        }
        println!("{}", feedback);
        if let Some(hint) = &state.next_hint {
            println!("{} {}", "Hint:".bold(), hint.italic());
        }
        if state.phase == QuizPhase::Answered && state.is_answer_correct != Some(true) {
            match policy.advance_gate {
                AdvanceGate::Always => println!("{}", "Try again or see the next question!".dimmed()),
                AdvanceGate::RequireCorrect => println!("{}", "Try again!".dimmed()),
            }
        }
    }
}

fn report(result: kidscholar_core::Result<Step>, notices: &mut UnboundedReceiver<Notice>) {
    match result {
        Ok(step) => explain(step),
        Err(e) => tracing::debug!(error = %e, "action failed"),
    }
    print_notices(notices);
}

fn explain(step: Step) {
    let Step::Ignored(reason) = step else {
        return;
    };
    let message = match reason {
        Ignored::NoProfile => "Set up your profile first.",
        Ignored::Busy => "Hang on, still thinking...",
        Ignored::BlankInput => "Type an answer first.",
        Ignored::NoQuestion => "There's no question yet. Try :new.",
        Ignored::AlreadyCorrect => "You already got this one! Try :next.",
        Ignored::NeedsCorrectAnswer => "Solve this riddle before moving on!",
        Ignored::DifficultyUnsupported => "This quiz style has no difficulty setting.",
    };
    println!("{}", message.yellow());
}

pub async fn run_chat(
    tutor: Arc<Tutor>,
    profile: Profile,
    subject: Option<String>,
    mut notices: UnboundedReceiver<Notice>,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let chat = ChatSession::new(tutor, Some(&profile));
    if let Some(subject) = subject {
        chat.set_subject(subject).await;
    }

    println!(
        "\n{} {}",
        "🧙 Rune the Riddle Master is here to help with".bold().blue(),
        chat.subject().await.bold().blue()
    );
    println!("{}", "Ask anything. Type :quit to leave.".dimmed());

    loop {
        let line = Input::<String>::with_theme(&theme)
            .with_prompt(profile.name.as_str())
            .allow_empty(true)
            .interact_text()?;
        if matches!(line.trim(), ":quit" | ":q") {
            break;
        }

        println!("{}", "Thinking...".dimmed());
        if chat.send(&line).await.is_applied() {
            if let Some(reply) = chat.transcript().await.last() {
                println!("{} {}", "Rune:".bold().magenta(), reply.content);
            }
        }
        print_notices(&mut notices);
    }

    Ok(())
}
