//! Configuration management for voice-interview-rs.
//!
//! Loads config from YAML files in standard locations. Secrets may also
//! come from the environment, which wins over the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::reconciler::LIVE_INCLUSION_THRESHOLD;

/// Placeholder key shipped in sample configs; treated as unset.
const PLACEHOLDER_PUBLIC_KEY: &str = "YOUR_VAPI_PUBLIC_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub public_key: Option<String>,
    pub model_provider: String,
    pub model: String,
    pub temperature: f32,
    pub voice_provider: String,
    pub voice_id: String,
    pub transcriber_provider: String,
    pub transcriber_model: String,
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            model_provider: "openai".into(),
            model: "gpt-3.5-turbo".into(),
            temperature: 0.7,
            voice_provider: "11labs".into(),
            voice_id: "burt".into(),
            transcriber_provider: "deepgram".into(),
            transcriber_model: "nova-2".into(),
            language: "en-US".into(),
        }
    }
}

impl VoiceConfig {
    /// Public key from `VOICE_PUBLIC_KEY`, falling back to the file.
    pub fn resolved_public_key(&self) -> Option<String> {
        std::env::var("VOICE_PUBLIC_KEY")
            .ok()
            .or_else(|| self.public_key.clone())
            .filter(|k| !k.trim().is_empty() && k != PLACEHOLDER_PUBLIC_KEY)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub inclusion_threshold: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            inclusion_threshold: LIVE_INCLUSION_THRESHOLD,
        }
    }
}

impl ReconcilerConfig {
    /// Threshold clamped to a usable ratio.
    pub fn threshold(&self) -> f64 {
        if self.inclusion_threshold > 0.0 && self.inclusion_threshold <= 1.0 {
            self.inclusion_threshold
        } else {
            warn!(
                "inclusion_threshold {} out of range (0, 1], using {LIVE_INCLUSION_THRESHOLD}",
                self.inclusion_threshold
            );
            LIVE_INCLUSION_THRESHOLD
        }
    }
}

/// Which log feeds the feedback request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
    /// Never reset; keeps every turn of the call.
    #[default]
    Durable,
    /// The on-screen log, cleared whenever a speaker stops talking.
    Display,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub source: ReviewSource,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".into(),
            model: "gpt-4".into(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl FeedbackConfig {
    /// API key from `OPENAI_API_KEY`, falling back to the file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// Interview context shared by the interviewer and evaluator prompts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub title: String,
    pub company: String,
    pub requirements: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub voice: VoiceConfig,
    pub reconciler: ReconcilerConfig,
    pub review: ReviewConfig,
    pub feedback: FeedbackConfig,
    pub history: HistoryConfig,
    pub job: JobConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/voice-interview/config.yaml
    /// 3. /etc/voice-interview/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/voice-interview/config.yaml")),
                Some(PathBuf::from("/etc/voice-interview/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_settings() {
        let config = Config::default();
        assert_eq!(config.reconciler.threshold(), 0.7);
        assert_eq!(config.review.source, ReviewSource::Durable);
        assert_eq!(config.feedback.model, "gpt-4");
        assert_eq!(config.feedback.max_tokens, 1500);
        assert_eq!(config.voice.transcriber_model, "nova-2");
        assert!(config.history.enabled);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = Config::parse(
            r#"
reconciler:
  inclusion_threshold: 0.9
review:
  source: display
job:
  title: Backend Engineer
  company: Acme
"#,
        )
        .unwrap();

        assert_eq!(config.reconciler.threshold(), 0.9);
        assert_eq!(config.review.source, ReviewSource::Display);
        assert_eq!(config.job.title, "Backend Engineer");
        assert_eq!(config.job.requirements, "");
        assert_eq!(config.feedback.endpoint, "https://api.openai.com");
    }

    #[test]
    fn out_of_range_threshold_falls_back() {
        let config = Config::parse("reconciler:\n  inclusion_threshold: 1.5\n").unwrap();
        assert_eq!(config.reconciler.threshold(), LIVE_INCLUSION_THRESHOLD);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.yaml")));
        assert_eq!(config.feedback.timeout_secs, 60);
    }

    #[test]
    fn unparsable_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "reconciler: [not, a, map").unwrap();
        let config = Config::load(Some(&path));
        assert_eq!(config.reconciler.threshold(), LIVE_INCLUSION_THRESHOLD);
    }
}
