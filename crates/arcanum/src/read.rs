// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `arcanum read` command implementation.
//!
//! Drives a full reading session: create (or resume), select a layout, draw
//! cards, wait for the interpretation behind a spinner, print it, then drop
//! into a follow-up REPL.

use std::sync::Arc;
use std::time::Duration;

use arcanum_config::ArcanumConfig;
use arcanum_core::types::{Interpretation, LayoutId, Reading, ReadingId};
use arcanum_core::{ArcanumError, Orientation};
use arcanum_session::{PollPolicy, ReadingSession};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

/// Runs a reading end to end.
pub async fn run(
    config: &ArcanumConfig,
    layout: Option<String>,
    question: Option<String>,
    resume: Option<String>,
) -> Result<(), ArcanumError> {
    let gateway = crate::gateway(config)?;
    let backend: Arc<dyn arcanum_core::TarotBackend> = gateway;
    let policy = PollPolicy::from(&config.poller);

    let session = match resume {
        Some(id) => {
            let session =
                ReadingSession::resume(backend, policy, &ReadingId(id.clone())).await?;
            println!("resumed reading {}", id.cyan());
            session
        }
        None => ReadingSession::begin(backend, policy).await?,
    };

    // Layout selection (skipped when the resumed reading already drew).
    if session.stage().await < arcanum_session::ReadingStage::LayoutSelected {
        let layout_id = match layout {
            Some(id) => LayoutId(id),
            None => prompt_layout(&session).await?,
        };
        session.select_layout(&layout_id).await?;
    }

    if session.stage().await < arcanum_session::ReadingStage::AwaitingInterpretation {
        let reading = session.draw_cards(question.as_deref()).await?;
        print_cards(&reading);
    } else {
        print_cards(&session.reading().await);
    }

    let interpretation = wait_with_spinner(&session).await?;
    print_interpretation(&interpretation);

    follow_up_repl(&session).await
}

/// Prompts the user to pick a layout from the catalog.
async fn prompt_layout(session: &ReadingSession) -> Result<LayoutId, ArcanumError> {
    let catalog = session.layouts().await?;
    println!("{}", "Choose a spread:".bold());
    for (index, layout) in catalog.iter().enumerate() {
        println!(
            "  {}. {} ({} cards) - {}",
            index + 1,
            layout.name.cyan(),
            layout.card_count,
            layout.description.dimmed()
        );
    }

    let mut editor = DefaultEditor::new()
        .map_err(|e| ArcanumError::Internal(format!("readline init failed: {e}")))?;
    loop {
        match editor.readline("spread> ") {
            Ok(line) => {
                let choice = line.trim();
                if let Ok(index) = choice.parse::<usize>()
                    && index >= 1
                    && index <= catalog.len()
                {
                    return Ok(catalog[index - 1].id.clone());
                }
                if let Some(layout) = catalog.iter().find(|l| l.id.0 == choice) {
                    return Ok(layout.id.clone());
                }
                println!("enter a number 1-{} or a layout id", catalog.len());
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                return Err(ArcanumError::Cancelled);
            }
            Err(e) => {
                return Err(ArcanumError::Internal(format!("readline failed: {e}")));
            }
        }
    }
}

/// Waits for the interpretation behind a spinner, offering to keep waiting
/// when the polling budget runs out.
async fn wait_with_spinner(session: &ReadingSession) -> Result<Interpretation, ArcanumError> {
    loop {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("generating your interpretation (this can take 30-60s)...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = session.wait_for_interpretation().await;
        spinner.finish_and_clear();

        match result {
            Ok(interpretation) => return Ok(interpretation),
            Err(ArcanumError::InterpretationUnavailable { attempts }) => {
                debug!(attempts, "polling budget exhausted, asking to continue");
                println!(
                    "{}",
                    "the interpretation is taking longer than expected".yellow()
                );
                if !confirm("keep waiting? [y/N] ")? {
                    return Err(ArcanumError::InterpretationUnavailable { attempts });
                }
            }
            Err(err) => return Err(err),
        }
    }
}

fn confirm(prompt: &str) -> Result<bool, ArcanumError> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| ArcanumError::Internal(format!("readline init failed: {e}")))?;
    match editor.readline(prompt) {
        Ok(line) => Ok(matches!(line.trim(), "y" | "Y" | "yes")),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(e) => Err(ArcanumError::Internal(format!("readline failed: {e}"))),
    }
}

fn print_cards(reading: &Reading) {
    if let Some(question) = &reading.question {
        println!("\n{} {}", "Your question:".bold(), question.italic());
    }
    let Some(cards) = &reading.cards else { return };
    println!("\n{}", "Your cards".bold().underline());
    for card in cards {
        let orientation = match card.orientation {
            Orientation::Upright => "upright".green(),
            Orientation::Reversed => "reversed".yellow(),
        };
        println!(
            "  [{}] {} ({orientation}) - {}",
            card.position,
            card.name.cyan().bold(),
            card.position_name
        );
        println!("      {}", card.position_description.dimmed());
    }
}

fn print_interpretation(interpretation: &Interpretation) {
    println!("\n{}", "Your interpretation".bold().underline());
    println!("\n{} {}", "Theme:".bold(), interpretation.overall_theme);

    for card in &interpretation.card_interpretations {
        println!(
            "\n{} - {}",
            card.card_name.cyan().bold(),
            card.position_name
        );
        println!("  {}", card.interpretation);
    }

    println!("\n{}", "Narrative".bold());
    for paragraph in interpretation.narrative.split("\n\n") {
        println!("{paragraph}\n");
    }
}

/// Follow-up REPL: each line is one question; empty line or EOF exits.
async fn follow_up_repl(session: &ReadingSession) -> Result<(), ArcanumError> {
    println!(
        "{}",
        "ask follow-up questions (empty line to finish)".dimmed()
    );
    let mut editor = DefaultEditor::new()
        .map_err(|e| ArcanumError::Internal(format!("readline init failed: {e}")))?;

    loop {
        match editor.readline("ask> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    return Ok(());
                }
                let _ = editor.add_history_entry(question);
                match session.ask_follow_up(question).await {
                    Ok(message) => println!("\n{}\n", message.answer),
                    Err(err) => eprintln!("{}", format!("error: {err}").red()),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => {
                return Err(ArcanumError::Internal(format!("readline failed: {e}")));
            }
        }
    }
}
