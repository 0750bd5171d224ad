//! Terminal captions for a running session.
//!
//! A party's caption is its latest utterance, shown only while that party
//! is speaking. The current line is the last utterance overall, styled by
//! who said it.

use std::fmt::Write as _;

use crate::session::InterviewSession;
use crate::transcript::Speaker;

const INTERVIEWER_NAME: &str = "AI Interviewer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyCaption {
    pub name: String,
    pub speaking: bool,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentLine {
    pub speaker: Speaker,
    pub text: String,
}

impl CurrentLine {
    /// ANSI background matching the speaker's role.
    fn style(&self) -> &'static str {
        match self.speaker {
            Speaker::User => "\x1b[44;97m",
            Speaker::Agent => "\x1b[42;97m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionView {
    pub interviewer: PartyCaption,
    pub candidate: PartyCaption,
    pub current: Option<CurrentLine>,
}

impl CaptionView {
    pub fn from_session(session: &InterviewSession, candidate_name: &str) -> Self {
        let party = |speaker: Speaker, name: &str| {
            let speaking = session.is_speaking(speaker);
            let caption = session
                .latest_utterance_for(speaker)
                .map(|u| u.text.clone())
                .filter(|text| speaking && !text.is_empty());
            PartyCaption {
                name: name.to_string(),
                speaking,
                caption,
            }
        };

        Self {
            interviewer: party(Speaker::Agent, INTERVIEWER_NAME),
            candidate: party(Speaker::User, candidate_name),
            current: session.latest_utterance_overall().map(|u| CurrentLine {
                speaker: u.speaker,
                text: u.text.clone(),
            }),
        }
    }

    /// Render as terminal text. `color` enables ANSI styling.
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();

        for party in [&self.interviewer, &self.candidate] {
            let marker = if party.speaking { "●" } else { "○" };
            let _ = write!(out, "{marker} {}", party.name);
            if let Some(caption) = &party.caption {
                let _ = write!(out, "  “{caption}”");
            }
            out.push('\n');
        }

        if let Some(line) = &self.current {
            let label = line.speaker.role_label();
            if color {
                let _ = writeln!(out, "{}{label}:\x1b[0m {}", line.style(), line.text);
            } else {
                let _ = writeln!(out, "{label}: {}", line.text);
            }
        }

        out
    }
}
