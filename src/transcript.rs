//! Conversation log for a two-party interview.
//!
//! The log is ordered by arrival. Only the last entry can be replaced;
//! everything before it is frozen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two parties in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    User,
}

impl Speaker {
    /// Parse a speaker identifier as sent by the voice service.
    ///
    /// `assistant` is accepted as an alias for the agent because completed
    /// transcript messages carry chat roles rather than speaker names.
    /// Anything else is unknown and yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "agent" | "assistant" => Some(Self::Agent),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// Human-readable role used in captions and review transcripts.
    pub fn role_label(self) -> &'static str {
        match self {
            Self::Agent => "Interviewer",
            Self::User => "Candidate",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Reconciled text attributed to one speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
}

impl Utterance {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    entries: Vec<Utterance>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn push(&mut self, utterance: Utterance) {
        self.entries.push(utterance);
    }

    /// Swap out the last entry. Returns the previous one, or `None` (and
    /// leaves the log untouched) when the log is empty.
    pub(crate) fn replace_last(&mut self, utterance: Utterance) -> Option<Utterance> {
        let last = self.entries.last_mut()?;
        Some(std::mem::replace(last, utterance))
    }

    /// Most recent entry spoken by `speaker`, scanning from the end.
    pub fn latest_for(&self, speaker: Speaker) -> Option<&Utterance> {
        self.entries.iter().rev().find(|u| u.speaker == speaker)
    }

    /// Last entry in the log regardless of speaker.
    pub fn latest(&self) -> Option<&Utterance> {
        self.entries.last()
    }

    /// Render the log as ordered role-labelled lines for a feedback request.
    pub fn serialize_for_review(&self) -> ReviewTranscript {
        let lines: Vec<ReviewLine> = self
            .entries
            .iter()
            .map(|u| ReviewLine {
                role: u.speaker.role_label().to_string(),
                text: u.text.clone(),
            })
            .collect();

        ReviewTranscript {
            count: lines.len(),
            lines,
        }
    }
}

/// A single `Role: text` line of a review transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLine {
    pub role: String,
    pub text: String,
}

impl fmt::Display for ReviewLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTranscript {
    pub lines: Vec<ReviewLine>,
    pub count: usize,
}

impl ReviewTranscript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for ReviewTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> ConversationLog {
        let mut log = ConversationLog::new();
        log.push(Utterance::new(Speaker::Agent, "Question one"));
        log.push(Utterance::new(Speaker::User, "My answer"));
        log.push(Utterance::new(Speaker::Agent, "Question two"));
        log
    }

    #[test]
    fn parse_known_and_unknown_speakers() {
        assert_eq!(Speaker::parse("agent"), Some(Speaker::Agent));
        assert_eq!(Speaker::parse("assistant"), Some(Speaker::Agent));
        assert_eq!(Speaker::parse("user"), Some(Speaker::User));
        assert_eq!(Speaker::parse("unknown"), None);
        assert_eq!(Speaker::parse(""), None);
        assert_eq!(Speaker::parse("Agent"), None);
    }

    #[test]
    fn latest_for_skips_other_speaker() {
        let log = sample_log();
        assert_eq!(log.latest_for(Speaker::User).unwrap().text, "My answer");
        assert_eq!(log.latest_for(Speaker::Agent).unwrap().text, "Question two");
        assert_eq!(log.latest().unwrap().speaker, Speaker::Agent);
    }

    #[test]
    fn empty_log_queries_return_none() {
        let log = ConversationLog::new();
        assert!(log.latest().is_none());
        assert!(log.latest_for(Speaker::Agent).is_none());
        assert!(log.latest_for(Speaker::User).is_none());
        assert!(log.serialize_for_review().is_empty());
    }

    #[test]
    fn replace_last_on_empty_log_is_noop() {
        let mut log = ConversationLog::new();
        assert!(log.replace_last(Utterance::new(Speaker::User, "hi")).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn review_lines_use_role_labels() {
        let review = sample_log().serialize_for_review();
        assert_eq!(review.count, 3);
        let rendered: Vec<String> = review.lines.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Interviewer: Question one",
                "Candidate: My answer",
                "Interviewer: Question two",
            ]
        );
    }
}
