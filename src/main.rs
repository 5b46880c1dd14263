//! Grant Scout - search session orchestrator
//!
//! Drives a grant search against the agent-backed API: one generation-
//! guarded session at a time, with a cosmetic progress display and timed
//! interstitial questions while the search runs.

mod backend;
mod interstitial;
mod notify;
mod progress;
mod session;
mod store;
mod timer;

use backend::types::SearchQuery;
use backend::HttpBackend;
use session::{SessionStatus, UiEvent};
use store::{FileStore, PrefStore};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grant_scout=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let api_url = std::env::var("GRANT_SCOUT_API_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());

    let store_path = std::env::var("GRANT_SCOUT_STORE_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.grant-scout/store.json")
    });

    let query_text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query_text.trim().is_empty() {
        eprintln!("usage: grant_scout <what you are looking for>");
        std::process::exit(2);
    }

    tracing::info!(path = %store_path, "Opening preference store");
    let store = FileStore::open(&store_path)?;
    if let Ok(email) = std::env::var("GRANT_SCOUT_DIGEST_EMAIL") {
        store.set_digest_email(Some(email)).await?;
    }

    tracing::info!(url = %api_url, "Connecting to search service");
    let backend = HttpBackend::new(api_url);

    let handle = session::spawn(backend, store);
    let mut ui = handle.subscribe();
    handle.submit(SearchQuery::chat(query_text)).await;

    let mut last_stage: Option<String> = None;
    let mut shown_question: Option<usize> = None;
    let mut clarification_handled = false;

    loop {
        let event = match ui.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "UI channel lagged; snapshots dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let snapshot = match event {
            UiEvent::Snapshot(snapshot) => snapshot,
            UiEvent::Rejected { message } => {
                eprintln!("! {message}");
                continue;
            }
        };

        let stage = snapshot.progress.label().map(str::to_string);
        if snapshot.progress.active && stage != last_stage {
            if let Some(label) = &stage {
                println!("  ... {label}");
            }
            last_stage = stage;
        }

        if snapshot.interstitial.phase == interstitial::Phase::Presented
            && snapshot.interstitial.current != shown_question
        {
            shown_question = snapshot.interstitial.current;
            if let Some(index) = shown_question {
                let question = &interstitial::QUESTIONS[index];
                println!("\n  While we search: {}", question.prompt);
                for option in question.options {
                    println!("    - {option}");
                }
                println!("  (skipping automatically in a few seconds)\n");
            }
        }

        match snapshot.status {
            SessionStatus::AwaitingClarification if !clarification_handled => {
                clarification_handled = true;
                if let Some(clarification) = &snapshot.clarification {
                    println!("\n  {}", clarification.question);
                    // Non-interactive run: take the first option.
                    if let Some(choice) = clarification.options.first() {
                        println!("  -> {choice}");
                        handle.resolve_clarification(choice.clone()).await;
                    } else {
                        handle.cancel_clarification().await;
                    }
                }
            }
            SessionStatus::Completed => {
                println!();
                if snapshot.results.is_empty() {
                    println!("No grants matched. Try broadening your criteria.");
                } else {
                    println!("Found {} grants:", snapshot.results.len());
                    for grant in &snapshot.results {
                        let deadline = grant.deadline.as_deref().unwrap_or("no deadline listed");
                        println!("  {} - {} ({deadline})", grant.title, grant.amount);
                        if !grant.apply_link.is_empty() {
                            println!("    {}", grant.apply_link);
                        }
                    }
                }
                return Ok(());
            }
            SessionStatus::Failed => {
                if let Some(error) = &snapshot.error {
                    eprintln!("\nSearch failed ({}): {error}", error.kind.label());
                }
                std::process::exit(1);
            }
            _ => {}
        }
    }

    Ok(())
}
