//! Interviewer assistant definition sent to the voice service on call start.

use serde_json::{json, Value};

use crate::config::{JobConfig, VoiceConfig};

const INTERVIEWER_PROMPT: &str = r#"You are a professional AI technical interviewer for {company}.

Position: {title}
Company: {company}
Requirements: {requirements}
Description: {description}

Run the interview as exactly 10 questions:
1. Open with: "Hello! I'm your AI interviewer for the {title} position at {company}. Let's begin with Question 1."
2. Announce every question by number ("Question 1:", "Question 2:", ...).
3. Ask one question at a time and wait for the full answer.
4. After each answer give 2-3 sentences of constructive feedback, then move to the next question.
5. Close with: "That completes all 10 questions. Thank you for participating in this technical interview!"

Mix technical fundamentals, problem-solving scenarios, best practices, system design and practical experience.
Keep a professional, encouraging tone and keep each spoken turn under 30 seconds.
Never ask more than 10 questions and never give scores or hiring recommendations.

Begin the interview now with your greeting and Question 1."#;

/// System prompt for the interviewer voice agent.
pub fn interviewer_prompt(job: &JobConfig) -> String {
    INTERVIEWER_PROMPT
        .replace("{title}", &job.title)
        .replace("{company}", &job.company)
        .replace("{requirements}", &job.requirements)
        .replace("{description}", &job.description)
}

/// Assistant payload: model, voice and transcriber blocks.
pub fn start_payload(voice: &VoiceConfig, job: &JobConfig) -> Value {
    json!({
        "model": {
            "provider": voice.model_provider,
            "model": voice.model,
            "messages": [
                { "role": "system", "content": interviewer_prompt(job) }
            ],
            "temperature": voice.temperature,
        },
        "voice": {
            "provider": voice.voice_provider,
            "voiceId": voice.voice_id,
        },
        "transcriber": {
            "provider": voice.transcriber_provider,
            "model": voice.transcriber_model,
            "language": voice.language,
        }
    })
}
