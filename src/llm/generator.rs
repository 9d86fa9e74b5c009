//! LLM-backed question generation.

use super::client::LlmClient;
use super::collaborator::QuestionGenerator;
use super::extractor::extract_json_object;
use super::prompts::{question_prompt, QUESTION_SYSTEM_PROMPT};
use crate::error::QuizError;
use crate::models::{GeneratedQuestion, QuestionKind};
use crate::profile::AggregateProfile;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Generates tailored questions at dynamic branch points.
pub struct LlmQuestionGenerator {
    client: Arc<LlmClient>,
}

impl LlmQuestionGenerator {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(
        &self,
        profile: &AggregateProfile,
        asked_ids: &HashSet<String>,
        remaining_topics: &[String],
    ) -> Result<Option<GeneratedQuestion>, QuizError> {
        let prompt = question_prompt(profile, asked_ids, remaining_topics);
        let reply = self
            .client
            .complete(QUESTION_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| QuizError::Generation(e.to_string()))?;

        debug!("Question reply: {} characters", reply.len());
        parse_question(&reply)
    }
}

/// Validate a generation reply. An empty reply or `null` means the model
/// had nothing to offer.
pub fn parse_question(reply: &str) -> Result<Option<GeneratedQuestion>, QuizError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    let raw = extract_json_object(trimmed)
        .ok_or_else(|| QuizError::MalformedQuestion("no JSON object in reply".to_string()))?;
    let json: Value =
        serde_json::from_str(raw).map_err(|e| QuizError::MalformedQuestion(e.to_string()))?;

    let question = json["question"]
        .as_str()
        .ok_or_else(|| QuizError::MalformedQuestion("missing question text".to_string()))?
        .trim()
        .to_string();

    let kind = match json["type"].as_str() {
        None => QuestionKind::Text,
        Some(s) => QuestionKind::parse(s)
            .ok_or_else(|| QuizError::MalformedQuestion(format!("unknown question type '{}'", s)))?,
    };

    let options = match &json["options"] {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    let generated = GeneratedQuestion {
        question,
        kind,
        options,
        purpose: json["purpose"].as_str().unwrap_or_default().to_string(),
    };
    generated.validate()?;

    Ok(Some(generated))
}
