//! LLM-backed insight extraction.

use super::client::LlmClient;
use super::collaborator::InsightExtractor;
use super::prompts::{analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::error::QuizError;
use crate::models::{Insight, ProgramFit, Sentiment};
use crate::profile::AggregateProfile;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Extracts insights by asking the LLM to analyse each answer.
pub struct LlmInsightExtractor {
    client: Arc<LlmClient>,
}

impl LlmInsightExtractor {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InsightExtractor for LlmInsightExtractor {
    async fn extract(
        &self,
        question_text: &str,
        response: &str,
        profile: &AggregateProfile,
    ) -> Result<Insight, QuizError> {
        let prompt = analysis_prompt(question_text, response, profile);
        let reply = self
            .client
            .complete(ANALYSIS_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| QuizError::Extraction(e.to_string()))?;

        debug!("Analysis reply: {} characters", reply.len());
        parse_insight(&reply)
    }
}

/// Locate the JSON object in a model reply, ignoring code fences and any
/// prose around it.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Validate an analysis reply into an [`Insight`].
pub fn parse_insight(reply: &str) -> Result<Insight, QuizError> {
    let raw = extract_json_object(reply)
        .ok_or_else(|| QuizError::MalformedInsight("no JSON object in reply".to_string()))?;
    let json: Value =
        serde_json::from_str(raw).map_err(|e| QuizError::MalformedInsight(e.to_string()))?;

    let sentiment = match &json["sentiment"] {
        Value::Null => Sentiment::Neutral,
        Value::String(s) => Sentiment::parse(s)
            .ok_or_else(|| QuizError::MalformedInsight(format!("unknown sentiment '{}'", s)))?,
        other => {
            return Err(QuizError::MalformedInsight(format!(
                "sentiment must be a string, got {}",
                other
            )))
        }
    };

    let motivations = if json.get("careerMotivations").is_some() {
        string_list(&json, "careerMotivations")?
    } else {
        string_list(&json, "motivations")?
    };

    let fit = &json["programFit"];
    let fit_score = match &fit["fitScore"] {
        Value::Null => ProgramFit::default().fit_score,
        value => value
            .as_f64()
            .filter(|score| (0.0..=100.0).contains(score))
            .map(|score| score.round() as u8)
            .ok_or_else(|| {
                QuizError::MalformedInsight(format!("fitScore must be 0-100, got {}", value))
            })?,
    };

    let suggested_probe = match &json["suggestedProbe"] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    Ok(Insight {
        sentiment,
        key_themes: string_list(&json, "keyThemes")?,
        motivations,
        concerns: string_list(&json, "concerns")?,
        program_fit: ProgramFit {
            recommended_programs: string_list(fit, "recommendedPrograms")?,
            fit_score,
        },
        follow_up_needed: json["followUpNeeded"].as_bool().unwrap_or(false),
        suggested_probe,
    })
}

/// A missing field is an empty list; anything other than an array of
/// strings is malformed.
fn string_list(json: &Value, field: &str) -> Result<Vec<String>, QuizError> {
    match &json[field] {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    QuizError::MalformedInsight(format!("{} must contain only strings", field))
                })
            })
            .collect(),
        _ => Err(QuizError::MalformedInsight(format!(
            "{} must be an array",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPLY: &str = r#"{
        "sentiment": "positive",
        "keyThemes": ["leadership", "growth"],
        "careerMotivations": ["promotion"],
        "concerns": ["time"],
        "programFit": {"recommendedPrograms": ["MBA"], "fitScore": 82},
        "followUpNeeded": true,
        "suggestedProbe": "What does leading a team mean to you?"
    }"#;

    #[test]
    fn test_parse_full_insight() {
        let insight = parse_insight(FULL_REPLY).unwrap();
        assert_eq!(insight.sentiment, Sentiment::Positive);
        assert_eq!(insight.key_themes, vec!["leadership", "growth"]);
        assert_eq!(insight.motivations, vec!["promotion"]);
        assert_eq!(insight.program_fit.recommended_programs, vec!["MBA"]);
        assert_eq!(insight.program_fit.fit_score, 82);
        assert_eq!(insight.probe(), Some("What does leading a team mean to you?"));
    }

    #[test]
    fn test_reply_wrapped_in_prose_and_fences() {
        let reply = format!("Here's my analysis:\n```json\n{}\n```\nHope that helps!", FULL_REPLY);
        let insight = parse_insight(&reply).unwrap();
        assert_eq!(insight.program_fit.fit_score, 82);
    }

    #[test]
    fn test_motivations_alias_and_defaults() {
        let insight = parse_insight(r#"{"sentiment": "neutral", "motivations": ["stability"]}"#).unwrap();
        assert_eq!(insight.motivations, vec!["stability"]);
        assert!(insight.key_themes.is_empty());
        assert_eq!(insight.program_fit.fit_score, 50);
        assert!(!insight.follow_up_needed);
    }

    #[test]
    fn test_rejects_invalid_payloads() {
        let cases = [
            "no json here",
            r#"{"sentiment": "ecstatic"}"#,
            r#"{"programFit": {"fitScore": 140}}"#,
            r#"{"programFit": {"fitScore": -3}}"#,
            r#"{"keyThemes": "leadership"}"#,
            r#"{"concerns": [1, 2]}"#,
            r#"{"sentiment": "positive", "#,
        ];
        for reply in cases {
            assert!(
                matches!(parse_insight(reply), Err(QuizError::MalformedInsight(_))),
                "accepted: {}",
                reply
            );
        }
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("x {\"a\": 1} y"), Some("{\"a\": 1}"));
        assert_eq!(extract_json_object("} {"), None);
        assert_eq!(extract_json_object("plain"), None);
    }
}
