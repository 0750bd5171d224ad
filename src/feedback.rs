//! Post-call interview feedback via a chat-completion endpoint.
//!
//! Sends the review transcript to `{endpoint}/v1/chat/completions` once and
//! returns the model's text untouched. Failures are not retried.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{FeedbackConfig, JobConfig};
use crate::transcript::ReviewTranscript;

const NO_FEEDBACK: &str = "No feedback received.";

const EVALUATOR_PROMPT: &str = r#"You are an expert interview evaluator analyzing a technical interview conversation.

**Job Context:**
- Position: {title}
- Requirements: {requirements}

**Your Task:**
Provide comprehensive feedback on the candidate's interview performance in well-structured markdown.

**Evaluation Criteria:**
1. **Technical Knowledge** - accuracy and depth of technical responses
2. **Communication Skills** - clarity and ability to explain
3. **Problem-Solving Approach** - logical thinking and methodology
4. **Behavioral Responses** - professionalism
5. **Question Handling** - how well the interviewer's questions were addressed

**Feedback Structure:**

# Interview Feedback Report

## Overall Performance Score: [X/10]

## Strengths
- [3-5 key strengths with specific examples]

## Areas for Improvement
- [3-5 areas needing work with specific examples]

## Technical Assessment
- [Technical knowledge relevant to the role]

## Communication & Soft Skills
- [Communication effectiveness]

## Recommendations
- [3-4 specific, actionable suggestions]

## Decision Recommendation
**[HIRE/MAYBE/NO HIRE]** - [Brief justification]

Cite the conversation, stay balanced and keep the report under 600 words."#;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("no API key configured for the feedback endpoint")]
    MissingApiKey,

    #[error("API Error: 401")]
    Unauthorized,

    #[error("API Error: 429")]
    RateLimited,

    #[error("API Error: 403")]
    AccessDenied,

    #[error("API Error: {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FeedbackError {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::FORBIDDEN => Self::AccessDenied,
            other => Self::Status(other.as_u16()),
        }
    }

    /// Message shown to the user in place of the feedback.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "Please provide OpenAI key",
            Self::Unauthorized => "Invalid OpenAI API key. Please check your key and try again.",
            Self::RateLimited => "API rate limit exceeded. Please try again later.",
            Self::AccessDenied => "API access denied. Please check your OpenAI account status.",
            Self::Status(_) | Self::Http(_) => "Failed to generate feedback.",
        }
    }
}

/// System instruction for the evaluator model.
pub fn evaluator_prompt(job: &JobConfig) -> String {
    let title = if job.title.is_empty() {
        "Software Developer"
    } else {
        job.title.as_str()
    };
    let requirements = if job.description.is_empty() {
        "General software development role"
    } else {
        job.description.as_str()
    };

    EVALUATOR_PROMPT
        .replace("{title}", title)
        .replace("{requirements}", requirements)
}

/// User message carrying the conversation to analyze.
pub fn analysis_request(review: &ReviewTranscript) -> String {
    let conversation = review
        .lines
        .iter()
        .map(|line| format!("**{}:** {}", line.role, line.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Please analyze this interview conversation and provide feedback:\n\n{conversation}\n\nTotal conversation length: {} exchanges",
        review.count
    )
}

pub struct FeedbackRequester {
    config: FeedbackConfig,
    client: Client,
}

impl FeedbackRequester {
    pub fn new(config: FeedbackConfig) -> Result<Self, FeedbackError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Request feedback for `review`. Returns the model's text.
    pub async fn request(
        &self,
        api_key: Option<&str>,
        job: &JobConfig,
        review: &ReviewTranscript,
    ) -> Result<String, FeedbackError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(FeedbackError::MissingApiKey)?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": evaluator_prompt(job) },
                { "role": "user", "content": analysis_request(review) },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        debug!(
            "Requesting feedback from model '{}' for {} entries",
            self.config.model, review.count
        );

        let t_start = Instant::now();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| {
                if e.is_connect() {
                    warn!("Cannot connect to feedback endpoint at {}", self.config.endpoint);
                } else if e.is_timeout() {
                    warn!("Feedback request timed out");
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Feedback endpoint returned status {status}");
            return Err(FeedbackError::from_status(status));
        }

        let data: serde_json::Value = resp.json().await?;
        let latency_ms = t_start.elapsed().as_secs_f64() * 1000.0;

        let feedback = data["choices"][0]["message"]["content"]
            .as_str()
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_FEEDBACK)
            .to_string();

        info!("Feedback received: {} chars ({latency_ms:.0}ms)", feedback.len());
        Ok(feedback)
    }
}
