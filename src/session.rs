//! Interview session orchestration with a lifecycle state machine.
//!
//! IDLE → CONNECTING → ACTIVE → STOPPED
//!
//! The session owns the turn tracker and two conversation logs: the display
//! log, which is cleared every time a speaker stops talking, and the review
//! log, which is reconciled the same way but never cleared so the whole call
//! is still available for feedback.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{Config, ReviewSource};
use crate::error::SessionError;
use crate::events::{SpeechEvent, SpeechEventHandler};
use crate::reconciler::TranscriptReconciler;
use crate::transcript::{ConversationLog, ReviewTranscript, Speaker, Utterance};
use crate::turn::TurnTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

pub struct InterviewSession {
    state: SessionState,
    turns: TurnTracker,
    reconciler: TranscriptReconciler,
    display_log: ConversationLog,
    review_log: ConversationLog,
    review_source: ReviewSource,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new(TranscriptReconciler::default(), ReviewSource::default())
    }
}

impl InterviewSession {
    pub fn new(reconciler: TranscriptReconciler, review_source: ReviewSource) -> Self {
        Self {
            state: SessionState::Idle,
            turns: TurnTracker::new(),
            reconciler,
            display_log: ConversationLog::new(),
            review_log: ConversationLog::new(),
            review_source,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TranscriptReconciler::new(config.reconciler.threshold()),
            config.review.source,
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!("State: {} → {}", self.state, next);
            self.state = next;
        }
    }

    /// Begin connecting to the voice service.
    pub fn start(&mut self, public_key: Option<&str>) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(self.state.to_string().to_lowercase()));
        }
        if public_key.map_or(true, |k| k.trim().is_empty()) {
            return Err(SessionError::MissingPublicKey);
        }

        self.transition(SessionState::Connecting);
        Ok(())
    }

    /// Stop accepting events. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.transition(SessionState::Stopped);
        info!(
            "Session stopped with {} reviewable entries",
            self.review_log.len()
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SessionState::Stopped
    }

    /// Apply one event from the voice service.
    pub fn handle(&mut self, event: SpeechEvent) {
        if self.is_stopped() {
            debug!("Ignoring event after stop: {event:?}");
            return;
        }

        if event.dispatch(self) {
            return;
        }

        match event {
            SpeechEvent::CallConnecting => info!("Voice call connecting..."),
            SpeechEvent::CallStart => {
                info!("Voice call started");
                self.transition(SessionState::Active);
            }
            SpeechEvent::CallConnected => {
                info!("Voice call connected");
                self.transition(SessionState::Active);
            }
            SpeechEvent::CallEnd => {
                info!("Voice call ended");
                self.stop();
            }
            SpeechEvent::Error { error } => warn!("Voice service error: {error}"),
            other => debug!("Unhandled event: {other:?}"),
        }
    }

    /// Drain `events` one at a time until the stream closes, the call ends,
    /// or `shutdown` resolves. `on_update` runs after every handled event.
    pub async fn run<S, F>(
        &mut self,
        mut events: mpsc::Receiver<SpeechEvent>,
        shutdown: S,
        mut on_update: F,
    ) where
        S: Future<Output = ()>,
        F: FnMut(&Self),
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            self.handle(event);
                            on_update(self);
                            if self.is_stopped() {
                                break;
                            }
                        }
                        None => {
                            info!("Event stream closed");
                            break;
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        events.close();
        self.stop();
    }

    pub fn is_speaking(&self, speaker: Speaker) -> bool {
        self.turns.is_speaking(speaker)
    }

    pub fn latest_utterance_for(&self, speaker: Speaker) -> Option<&Utterance> {
        self.display_log.latest_for(speaker)
    }

    pub fn latest_utterance_overall(&self) -> Option<&Utterance> {
        self.display_log.latest()
    }

    pub fn display_log(&self) -> &ConversationLog {
        &self.display_log
    }

    pub fn review_log(&self) -> &ConversationLog {
        &self.review_log
    }

    pub fn serialize_for_review(&self) -> ReviewTranscript {
        match self.review_source {
            ReviewSource::Durable => self.review_log.serialize_for_review(),
            ReviewSource::Display => self.display_log.serialize_for_review(),
        }
    }
}

impl SpeechEventHandler for InterviewSession {
    fn on_speech_start(&mut self, speaker: &str) {
        if self.is_stopped() {
            return;
        }
        match Speaker::parse(speaker) {
            Some(speaker) => {
                self.turns.speech_started(speaker);
                debug!("{} started speaking", speaker.role_label());
            }
            None => warn!("Speech started for unknown speaker '{speaker}'"),
        }
    }

    fn on_speech_end(&mut self, speaker: &str) {
        if self.is_stopped() {
            return;
        }
        match Speaker::parse(speaker) {
            Some(speaker) => {
                self.turns.speech_ended(speaker);
                self.display_log.clear();
                debug!("{} stopped speaking, display log cleared", speaker.role_label());
            }
            None => warn!("Speech ended for unknown speaker '{speaker}'"),
        }
    }

    fn on_transcript(&mut self, speaker: &str, text: &str) {
        if self.is_stopped() {
            return;
        }
        let Some(speaker) = Speaker::parse(speaker) else {
            warn!("Dropping transcript from unknown speaker '{speaker}'");
            return;
        };

        let fragment = Utterance::new(speaker, text);
        self.reconciler.reconcile(&mut self.review_log, fragment.clone());
        self.reconciler.reconcile(&mut self.display_log, fragment);
    }
}
