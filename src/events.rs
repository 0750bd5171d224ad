//! Speech events from the real-time voice service.
//!
//! Events arrive as JSON lines tagged by `event`, e.g.
//! `{"event":"transcript","speaker":"user","transcript":"I think"}`.
//! A reader task decodes them and forwards them over an mpsc channel so the
//! session handles them one at a time in arrival order.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Speaker identifier used when the service leaves it out.
pub const UNKNOWN_SPEAKER: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SpeechEvent {
    CallConnecting,
    CallStart,
    CallConnected,
    CallEnd,
    SpeechStart {
        #[serde(default)]
        speaker: Option<String>,
    },
    SpeechEnd {
        #[serde(default)]
        speaker: Option<String>,
    },
    Transcript {
        #[serde(default)]
        speaker: Option<String>,
        #[serde(default)]
        transcript: Option<String>,
    },
    /// Completed-transcript and other service messages.
    Message {
        #[serde(default, rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        transcript: Option<String>,
    },
    Error {
        #[serde(default)]
        error: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Callback interface the voice service drives.
///
/// Speaker identifiers are passed through raw so implementors can log
/// the ones they do not recognise.
pub trait SpeechEventHandler {
    fn on_speech_start(&mut self, speaker: &str);
    fn on_speech_end(&mut self, speaker: &str);
    fn on_transcript(&mut self, speaker: &str, text: &str);
}

impl SpeechEvent {
    /// Decode one line. Blank and malformed lines yield `None`.
    pub fn decode(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<SpeechEvent>(line) {
            Ok(SpeechEvent::Unknown) => {
                debug!("Skipping unrecognised event: {line}");
                None
            }
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed event line: {e}");
                None
            }
        }
    }

    /// Forward speech and transcript events to `handler`.
    ///
    /// Returns `false` for lifecycle and error events, which the caller
    /// handles itself.
    pub fn dispatch<H: SpeechEventHandler + ?Sized>(&self, handler: &mut H) -> bool {
        match self {
            Self::SpeechStart { speaker } => {
                handler.on_speech_start(speaker.as_deref().unwrap_or(UNKNOWN_SPEAKER));
            }
            Self::SpeechEnd { speaker } => {
                handler.on_speech_end(speaker.as_deref().unwrap_or(UNKNOWN_SPEAKER));
            }
            Self::Transcript {
                speaker,
                transcript,
            } => {
                handler.on_transcript(
                    speaker.as_deref().unwrap_or(UNKNOWN_SPEAKER),
                    transcript.as_deref().unwrap_or(""),
                );
            }
            Self::Message {
                kind,
                role,
                transcript,
            } => match (kind.as_deref(), transcript.as_deref()) {
                (Some("transcript"), Some(text)) if !text.is_empty() => {
                    handler.on_transcript(role.as_deref().unwrap_or(UNKNOWN_SPEAKER), text);
                }
                _ => debug!("Ignoring message event of type {kind:?}"),
            },
            _ => return false,
        }
        true
    }
}

/// Read JSON-lines events from `reader` into `tx` until EOF or until the
/// receiving side goes away. Returns the number of events forwarded.
pub async fn read_events<R>(reader: R, tx: mpsc::Sender<SpeechEvent>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(event) = SpeechEvent::decode(&line) else {
            continue;
        };
        if tx.send(event).await.is_err() {
            debug!("Session stopped listening, closing event reader");
            break;
        }
        forwarded += 1;
    }

    info!("Event stream finished ({forwarded} events)");
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SpeechEventHandler for Recorder {
        fn on_speech_start(&mut self, speaker: &str) {
            self.calls.push(format!("start:{speaker}"));
        }
        fn on_speech_end(&mut self, speaker: &str) {
            self.calls.push(format!("end:{speaker}"));
        }
        fn on_transcript(&mut self, speaker: &str, text: &str) {
            self.calls.push(format!("text:{speaker}:{text}"));
        }
    }

    #[test]
    fn decodes_lifecycle_and_speech_events() {
        assert_eq!(
            SpeechEvent::decode(r#"{"event":"call-start"}"#),
            Some(SpeechEvent::CallStart)
        );
        assert_eq!(
            SpeechEvent::decode(r#"{"event":"speech-start","speaker":"agent"}"#),
            Some(SpeechEvent::SpeechStart {
                speaker: Some("agent".into())
            })
        );
        assert_eq!(
            SpeechEvent::decode(r#"{"event":"transcript","speaker":"user","transcript":"hi"}"#),
            Some(SpeechEvent::Transcript {
                speaker: Some("user".into()),
                transcript: Some("hi".into())
            })
        );
    }

    #[test]
    fn skips_blank_malformed_and_unknown_lines() {
        assert_eq!(SpeechEvent::decode("   "), None);
        assert_eq!(SpeechEvent::decode("{not json"), None);
        assert_eq!(SpeechEvent::decode(r#"{"event":"volume-level","volume":0.3}"#), None);
        assert_eq!(SpeechEvent::decode(r#"{"speaker":"user"}"#), None);
    }

    #[test]
    fn missing_fields_fall_back_to_unknown_and_empty() {
        let mut recorder = Recorder::default();
        SpeechEvent::decode(r#"{"event":"speech-end"}"#)
            .unwrap()
            .dispatch(&mut recorder);
        SpeechEvent::decode(r#"{"event":"transcript","speaker":null}"#)
            .unwrap()
            .dispatch(&mut recorder);
        assert_eq!(recorder.calls, vec!["end:unknown", "text:unknown:"]);
    }

    #[test]
    fn only_transcript_messages_reach_handler() {
        let mut recorder = Recorder::default();
        let forwarded = SpeechEvent::decode(
            r#"{"event":"message","type":"transcript","role":"assistant","transcript":"Question one"}"#,
        )
        .unwrap()
        .dispatch(&mut recorder);
        assert!(forwarded);

        SpeechEvent::decode(r#"{"event":"message","type":"status-update","status":"ended"}"#)
            .unwrap()
            .dispatch(&mut recorder);
        SpeechEvent::decode(r#"{"event":"message","type":"transcript","role":"user","transcript":""}"#)
            .unwrap()
            .dispatch(&mut recorder);

        assert_eq!(recorder.calls, vec!["text:assistant:Question one"]);
    }

    #[test]
    fn lifecycle_events_are_not_dispatched() {
        let mut recorder = Recorder::default();
        assert!(!SpeechEvent::CallEnd.dispatch(&mut recorder));
        assert!(recorder.calls.is_empty());
    }

    #[tokio::test]
    async fn reader_forwards_decoded_events_in_order() {
        let input = b"{\"event\":\"call-start\"}\n\ngarbage\n{\"event\":\"speech-start\",\"speaker\":\"user\"}\n";
        let (tx, mut rx) = mpsc::channel(8);

        let forwarded = read_events(&input[..], tx).await.unwrap();
        assert_eq!(forwarded, 2);
        assert_eq!(rx.recv().await, Some(SpeechEvent::CallStart));
        assert_eq!(
            rx.recv().await,
            Some(SpeechEvent::SpeechStart {
                speaker: Some("user".into())
            })
        );
        assert_eq!(rx.recv().await, None);
    }
}
