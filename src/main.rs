//! voice-interview-rs: voice interview sessions with a live reconciled
//! transcript and post-call feedback.

mod assistant;
mod config;
mod display;
mod error;
mod events;
mod feedback;
mod history;
mod reconciler;
mod session;
mod transcript;
mod turn;

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::display::CaptionView;
use crate::feedback::FeedbackRequester;
use crate::history::{HistoryStore, SessionRecord};
use crate::session::InterviewSession;
use crate::transcript::ReviewTranscript;

#[derive(Parser, Debug)]
#[command(name = "voice-interview", about = "Voice interview session with live transcript")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines speech event stream through a session
    Run {
        /// Event file (reads stdin when omitted)
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Candidate name shown next to their caption
        #[arg(short, long, default_value = "Candidate")]
        name: String,

        /// Request feedback once the call ends
        #[arg(long)]
        feedback: bool,
    },

    /// Request feedback for the latest saved session
    Feedback {
        /// History date (YYYY-MM-DD)
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Print the interviewer assistant payload
    Assistant,

    /// List history dates, or print the transcripts of one date
    History {
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref());

    match args.command {
        Command::Run {
            events,
            name,
            feedback,
        } => run_session(&config, events.as_deref(), &name, feedback).await,
        Command::Feedback { date } => feedback_for_saved(&config, &date).await,
        Command::Assistant => {
            let payload = assistant::start_payload(&config.voice, &config.job);
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Command::History { date } => {
            print_history(&config, date.as_deref());
            Ok(())
        }
    }
}

async fn run_session(
    config: &Config,
    events_path: Option<&Path>,
    candidate_name: &str,
    want_feedback: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = InterviewSession::from_config(config);
    session.start(config.voice.resolved_public_key().as_deref())?;

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match events_path {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (tx, rx) = mpsc::channel(64);
    let reader_task = tokio::spawn(events::read_events(reader, tx));

    let color = std::io::stdout().is_terminal();
    let mut last_view: Option<CaptionView> = None;
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    info!("Session ready, waiting for speech events");
    session
        .run(rx, shutdown, |s| {
            let view = CaptionView::from_session(s, candidate_name);
            if last_view.as_ref() != Some(&view) {
                println!("{}", view.render(color));
                last_view = Some(view);
            }
        })
        .await;

    // The reader may still be parked on stdin after the call ended.
    if !reader_task.is_finished() {
        reader_task.abort();
    }
    match reader_task.await {
        Ok(Err(e)) => warn!("Event reader failed: {e}"),
        Err(e) if !e.is_cancelled() => warn!("Event reader task panicked: {e}"),
        _ => {}
    }

    let review = session.serialize_for_review();
    if review.is_empty() {
        println!("--- No conversation recorded ---");
    } else {
        println!("--- Transcript ({} entries) ---\n{review}", review.count);
    }

    let feedback = if want_feedback {
        Some(request_feedback(config, &review).await)
    } else {
        None
    };

    if config.history.enabled {
        if let Some(store) = HistoryStore::from_config(config.history.dir.as_deref()) {
            let record = SessionRecord::new(&config.job.title, &review, feedback);
            match store.save(&record) {
                Ok(path) => info!("Session saved to {}", path.display()),
                Err(e) => warn!("Failed to save session history: {e}"),
            }
        }
    }

    Ok(())
}

/// Request feedback and print it. Failures print their user-facing message
/// in place of the feedback.
async fn request_feedback(config: &Config, review: &ReviewTranscript) -> String {
    let result = match FeedbackRequester::new(config.feedback.clone()) {
        Ok(requester) => {
            let api_key = config.feedback.resolved_api_key();
            requester
                .request(api_key.as_deref(), &config.job, review)
                .await
        }
        Err(e) => Err(e),
    };

    let text = match result {
        Ok(text) => text,
        Err(e) => {
            warn!("Error generating feedback: {e}");
            e.user_message().to_string()
        }
    };

    println!("--- Feedback Summary ---\n{text}");
    text
}

async fn feedback_for_saved(config: &Config, date: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = HistoryStore::from_config(config.history.dir.as_deref())
        .ok_or("no history directory available")?;
    let record = store
        .latest(date)
        .ok_or_else(|| format!("no saved sessions for {date} in {}", store.dir().display()))?;

    request_feedback(config, &record.review()).await;
    Ok(())
}

fn print_history(config: &Config, date: Option<&str>) {
    let Some(store) = HistoryStore::from_config(config.history.dir.as_deref()) else {
        warn!("No history directory available");
        return;
    };

    let Some(date) = date else {
        for date in store.list_dates() {
            println!("{date}");
        }
        return;
    };

    for record in store.load(date) {
        println!(
            "# {} ({}, {} entries)\n{}",
            record.timestamp,
            record.job_title,
            record.count,
            record.review()
        );
    }
}
