//! Session history.
//!
//! Stores finished interview sessions as daily JSONL files in
//! ~/.voice-interview-history/ (or the configured directory).

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::transcript::{ReviewLine, ReviewTranscript};

/// Record of a single interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub timestamp: String,
    pub job_title: String,
    pub lines: Vec<ReviewLine>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl SessionRecord {
    pub fn new(job_title: &str, review: &ReviewTranscript, feedback: Option<String>) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            job_title: job_title.to_string(),
            lines: review.lines.clone(),
            count: review.count,
            feedback,
        }
    }

    pub fn review(&self) -> ReviewTranscript {
        ReviewTranscript {
            lines: self.lines.clone(),
            count: self.count,
        }
    }
}

pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the configured directory, or ~/.voice-interview-history.
    pub fn from_config(dir: Option<&Path>) -> Option<Self> {
        dir.map(Path::to_path_buf)
            .or_else(|| dirs::home_dir().map(|h| h.join(".voice-interview-history")))
            .map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// History file for `date` (`YYYY-MM-DD` or `today`).
    fn file_for(&self, date: &str) -> PathBuf {
        let date_str = if date == "today" {
            Local::now().format("%Y-%m-%d").to_string()
        } else {
            date.to_string()
        };
        self.dir.join(format!("{date_str}.jsonl"))
    }

    /// Append a record to today's file. Returns the file written.
    pub fn save(&self, record: &SessionRecord) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.file_for("today");
        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{json}")?;

        debug!("Saved session record to {}", path.display());
        Ok(path)
    }

    /// Load all records for a date, skipping malformed lines.
    pub fn load(&self, date: &str) -> Vec<SessionRecord> {
        let path = self.file_for(date);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let mut records = Vec::new();
        for line in std::io::BufReader::new(file).lines().map_while(Result::ok) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed history line: {e}"),
            }
        }
        records
    }

    /// Most recent record for `date`.
    pub fn latest(&self, date: &str) -> Option<SessionRecord> {
        self.load(date).pop()
    }

    /// All dates with history (newest first).
    pub fn list_dates(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut dates: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix(".jsonl").map(str::to_string)
            })
            .collect();

        dates.sort_by(|a, b| b.cmp(a));
        dates
    }
}
