//! LLM-backed career blueprint.

use super::client::LlmClient;
use super::collaborator::BlueprintWriter;
use super::extractor::extract_json_object;
use super::prompts::{blueprint_prompt, BLUEPRINT_SYSTEM_PROMPT};
use crate::error::QuizError;
use crate::models::{CareerBlueprint, Challenge, ProgramPlan, QuestionRecord, Trajectory};
use crate::profile::AggregateProfile;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Writes the closing blueprint from the aggregate profile and the answers.
pub struct LlmBlueprintWriter {
    client: Arc<LlmClient>,
}

impl LlmBlueprintWriter {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlueprintWriter for LlmBlueprintWriter {
    async fn write(
        &self,
        profile: &AggregateProfile,
        history: &[QuestionRecord],
    ) -> Result<CareerBlueprint, QuizError> {
        let prompt = blueprint_prompt(profile, history);
        let reply = self
            .client
            .complete(BLUEPRINT_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| QuizError::Blueprint(e.to_string()))?;

        debug!("Blueprint reply: {} characters", reply.len());
        parse_blueprint(&reply)
    }
}

/// Validate a blueprint reply. The introduction, the three horizons and the
/// primary program are required; every list may be missing.
pub fn parse_blueprint(reply: &str) -> Result<CareerBlueprint, QuizError> {
    let raw = extract_json_object(reply)
        .ok_or_else(|| QuizError::MalformedBlueprint("no JSON object in reply".to_string()))?;
    let json: Value =
        serde_json::from_str(raw).map_err(|e| QuizError::MalformedBlueprint(e.to_string()))?;

    let trajectory = &json["trajectory"];
    let programs = &json["programs"];

    let challenges = match &json["challenges"] {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                Ok(Challenge {
                    concern: required_text(item, "concern")?,
                    solution: required_text(item, "solution")?,
                })
            })
            .collect::<Result<_, QuizError>>()?,
        _ => {
            return Err(QuizError::MalformedBlueprint(
                "challenges must be an array".to_string(),
            ))
        }
    };

    Ok(CareerBlueprint {
        introduction: required_text(&json, "introduction")?,
        trajectory: Trajectory {
            year3: required_text(trajectory, "year3")?,
            year5: required_text(trajectory, "year5")?,
            year10: required_text(trajectory, "year10")?,
        },
        programs: ProgramPlan {
            primary: required_text(programs, "primary")?,
            rationale: programs["rationale"]
                .as_str()
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            alternatives: string_list(programs, "alternatives")?,
        },
        strengths: string_list(&json, "strengths")?,
        skills_to_develop: string_list(&json, "skillsToDevelop")?,
        challenges,
        next_steps: string_list(&json, "nextSteps")?,
    })
}

fn required_text(json: &Value, field: &str) -> Result<String, QuizError> {
    json[field]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| QuizError::MalformedBlueprint(format!("missing {}", field)))
}

fn string_list(json: &Value, field: &str) -> Result<Vec<String>, QuizError> {
    match &json[field] {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    QuizError::MalformedBlueprint(format!("{} must contain only strings", field))
                })
            })
            .collect(),
        _ => Err(QuizError::MalformedBlueprint(format!(
            "{} must be an array",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPLY: &str = r#"{
        "introduction": "You've built a strong base in operations.",
        "trajectory": {
            "year3": "Operations manager",
            "year5": "Director of operations",
            "year10": "Chief operating officer"
        },
        "programs": {
            "primary": "MBA",
            "rationale": "Builds on your management experience",
            "alternatives": ["MS in Management"]
        },
        "strengths": ["Team leadership"],
        "skillsToDevelop": ["Finance"],
        "challenges": [{"concern": "Time", "solution": "Part-time online classes"}],
        "nextSteps": ["Talk to an advisor"]
    }"#;

    #[test]
    fn test_parse_full_blueprint() {
        let blueprint = parse_blueprint(&format!("```json\n{}\n```", FULL_REPLY)).unwrap();
        assert_eq!(blueprint.trajectory.year10, "Chief operating officer");
        assert_eq!(blueprint.programs.primary, "MBA");
        assert_eq!(blueprint.programs.alternatives, vec!["MS in Management"]);
        assert_eq!(blueprint.skills_to_develop, vec!["Finance"]);
        assert_eq!(blueprint.challenges[0].solution, "Part-time online classes");
        assert_eq!(blueprint.next_steps, vec!["Talk to an advisor"]);
    }

    #[test]
    fn test_optional_sections_default_to_empty() {
        let reply = r#"{
            "introduction": "Hi",
            "trajectory": {"year3": "a", "year5": "b", "year10": "c"},
            "programs": {"primary": "MBA"}
        }"#;
        let blueprint = parse_blueprint(reply).unwrap();
        assert!(blueprint.programs.rationale.is_empty());
        assert!(blueprint.strengths.is_empty());
        assert!(blueprint.challenges.is_empty());
    }

    #[test]
    fn test_rejects_invalid_blueprints() {
        let cases = [
            "I can't help with that",
            r#"{"introduction": "Hi"}"#,
            r#"{"introduction": " ", "trajectory": {"year3": "a", "year5": "b", "year10": "c"}, "programs": {"primary": "MBA"}}"#,
            r#"{"introduction": "Hi", "trajectory": {"year3": "a", "year5": "b", "year10": "c"}, "programs": {"primary": "MBA"}, "nextSteps": "apply"}"#,
            r#"{"introduction": "Hi", "trajectory": {"year3": "a", "year5": "b", "year10": "c"}, "programs": {"primary": "MBA"}, "challenges": [{"concern": "Cost"}]}"#,
        ];
        for reply in cases {
            assert!(
                matches!(parse_blueprint(reply), Err(QuizError::MalformedBlueprint(_))),
                "accepted: {}",
                reply
            );
        }
    }
}
