//! Data models for the quiz engine.
//!
//! This module contains the core data structures shared by the profile
//! store, the trigger matcher, the router and the session aggregator.

use crate::error::QuizError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall tone of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Negative => write!(f, "Negative"),
        }
    }
}

impl Sentiment {
    /// Returns an emoji representation of the sentiment.
    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Positive => "🟢",
            Sentiment::Neutral => "🟡",
            Sentiment::Negative => "🔴",
        }
    }

    /// Parse the lowercase wire name used by the extractor.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// A raw answer: free text or one or more selected options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Text(String),
    Selections(Vec<String>),
}

impl Response {
    /// Flattened text form, selections joined with ", ".
    pub fn as_text(&self) -> String {
        match self {
            Response::Text(text) => text.clone(),
            Response::Selections(items) => items.join(", "),
        }
    }

    /// Exact, case-sensitive membership. A multi-selection answer is a
    /// member if any of its selections is.
    pub fn is_member_of(&self, set: &[String]) -> bool {
        match self {
            Response::Text(text) => set.iter().any(|s| s == text),
            Response::Selections(items) => items.iter().any(|item| set.contains(item)),
        }
    }

    /// Case-sensitive substring test.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Response::Text(text) => text.contains(needle),
            Response::Selections(items) => items.iter().any(|item| item.contains(needle)),
        }
    }

    /// Case-insensitive substring test.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.as_text().to_lowercase().contains(&needle)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Response::Text(text) => text.trim().is_empty(),
            Response::Selections(items) => items.is_empty(),
        }
    }
}

impl From<&str> for Response {
    fn from(s: &str) -> Self {
        Response::Text(s.to_string())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// Program recommendations attached to one insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramFit {
    pub recommended_programs: Vec<String>,
    /// 0-100.
    pub fit_score: u8,
}

impl Default for ProgramFit {
    fn default() -> Self {
        Self {
            recommended_programs: Vec::new(),
            fit_score: DEFAULT_FIT_SCORE,
        }
    }
}

/// Fit score used when nothing is known.
pub const DEFAULT_FIT_SCORE: u8 = 50;

/// Structured interpretation of one answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Insight {
    pub sentiment: Sentiment,
    pub key_themes: Vec<String>,
    pub motivations: Vec<String>,
    pub concerns: Vec<String>,
    pub program_fit: ProgramFit,
    pub follow_up_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_probe: Option<String>,
}

impl Insight {
    /// The neutral insight substituted whenever extraction fails.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// The probe text, if the extractor asked for a follow-up and gave one.
    pub fn probe(&self) -> Option<&str> {
        if !self.follow_up_needed {
            return None;
        }
        self.suggested_probe
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// One answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: String,
    pub response: Response,
    pub insight: Insight,
    pub timestamp: DateTime<Utc>,
}

/// Presentation type of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    #[default]
    Text,
    Scale,
    Checkbox,
}

impl QuestionKind {
    /// Parse the wire name (`multiple-choice|text|scale|checkbox`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "multiple-choice" | "choice" => Some(QuestionKind::MultipleChoice),
            "text" => Some(QuestionKind::Text),
            "scale" => Some(QuestionKind::Scale),
            "checkbox" => Some(QuestionKind::Checkbox),
            _ => None,
        }
    }

    /// Whether the question needs a list of options to be answerable.
    pub fn needs_options(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice | QuestionKind::Checkbox)
    }
}

/// A question produced on demand by the question generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub purpose: String,
}

impl GeneratedQuestion {
    /// Reject questions the caller could not present.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.question.trim().is_empty() {
            return Err(QuizError::MalformedQuestion("empty question text".to_string()));
        }
        if self.kind.needs_options() && self.options.iter().all(|o| o.trim().is_empty()) {
            return Err(QuizError::MalformedQuestion(format!(
                "{:?} question without options",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Where a presented question came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum QuestionOrigin {
    Scripted,
    /// A probe attributed to `parent`.
    FollowUp { parent: String },
    /// Generated on demand, optionally filling a tagged script slot.
    Dynamic { slot: Option<String> },
}

/// A question handed to the caller for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedQuestion {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub section: Option<String>,
    pub topic: Option<String>,
    #[serde(flatten)]
    pub origin: QuestionOrigin,
}

impl PresentedQuestion {
    /// The question a follow-up would be attributed to.
    pub fn origin_id(&self) -> &str {
        match &self.origin {
            QuestionOrigin::FollowUp { parent } => parent,
            _ => &self.id,
        }
    }

    pub fn is_follow_up(&self) -> bool {
        matches!(self.origin, QuestionOrigin::FollowUp { .. })
    }
}

/// A canned reaction surfaced by the trigger matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reaction {
    Message {
        rule: String,
        text: String,
    },
    Probe {
        rule: String,
        question: String,
        options: Vec<String>,
    },
}

impl Reaction {
    pub fn rule(&self) -> &str {
        match self {
            Reaction::Message { rule, .. } | Reaction::Probe { rule, .. } => rule,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reaction::Message { text, .. } => text,
            Reaction::Probe { question, .. } => question,
        }
    }

    pub fn is_probe(&self) -> bool {
        matches!(self, Reaction::Probe { .. })
    }
}

/// Router state after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextState {
    AwaitingAnswer,
    FollowUp,
    NextScheduled,
    Dynamic,
    Done,
}

impl fmt::Display for NextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextState::AwaitingAnswer => write!(f, "awaiting answer"),
            NextState::FollowUp => write!(f, "follow-up"),
            NextState::NextScheduled => write!(f, "next scheduled"),
            NextState::Dynamic => write!(f, "dynamic"),
            NextState::Done => write!(f, "done"),
        }
    }
}

/// Everything the caller needs after one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub reaction: Option<Reaction>,
    pub next_state: NextState,
    pub next_question: Option<PresentedQuestion>,
    pub encouragement: Option<String>,
    pub insight: Insight,
}

impl TurnResult {
    /// The reaction line to show before the next question. Probes are never
    /// shown as statements: they reach the user only as a follow-up question.
    pub fn remark(&self) -> Option<&str> {
        self.reaction
            .as_ref()
            .filter(|r| !r.is_probe())
            .map(Reaction::text)
    }
}

/// Career path at three horizons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trajectory {
    pub year3: String,
    pub year5: String,
    pub year10: String,
}

/// Recommended programs with the reasoning behind the first choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPlan {
    pub primary: String,
    pub rationale: String,
    pub alternatives: Vec<String>,
}

/// A concern raised during the quiz and how to address it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub concern: String,
    pub solution: String,
}

/// Personalised career plan written once the quiz is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerBlueprint {
    pub introduction: String,
    pub trajectory: Trajectory,
    pub programs: ProgramPlan,
    pub strengths: Vec<String>,
    pub skills_to_develop: Vec<String>,
    pub challenges: Vec<Challenge>,
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_insight() {
        let insight = Insight::neutral();
        assert_eq!(insight.sentiment, Sentiment::Neutral);
        assert!(insight.key_themes.is_empty());
        assert_eq!(insight.program_fit.fit_score, 50);
        assert!(!insight.follow_up_needed);
        assert!(insight.probe().is_none());
    }

    #[test]
    fn test_probe_requires_flag_and_text() {
        let mut insight = Insight {
            suggested_probe: Some("Why now?".to_string()),
            ..Insight::neutral()
        };
        assert_eq!(insight.probe(), None);

        insight.follow_up_needed = true;
        assert_eq!(insight.probe(), Some("Why now?"));

        insight.suggested_probe = Some("   ".to_string());
        assert_eq!(insight.probe(), None);
    }

    #[test]
    fn test_response_membership() {
        let set = vec!["Executive".to_string(), "Master's Degree".to_string()];
        assert!(Response::from("Executive").is_member_of(&set));
        assert!(!Response::from("executive").is_member_of(&set));
        assert!(Response::Selections(vec!["Other".into(), "Executive".into()]).is_member_of(&set));
    }

    #[test]
    fn test_response_substring() {
        let response = Response::from("I'm still exploring my Options");
        assert!(response.contains("exploring"));
        assert!(!response.contains("options"));
        assert!(response.contains_ignore_case("OPTIONS"));
    }

    #[test]
    fn test_response_deserializes_untagged() {
        let text: Response = serde_json::from_str(r#""Executive""#).unwrap();
        assert_eq!(text, Response::Text("Executive".into()));

        let picks: Response = serde_json::from_str(r#"["Nights", "Weekends"]"#).unwrap();
        assert_eq!(picks.as_text(), "Nights, Weekends");
    }

    #[test]
    fn test_question_kind_parse() {
        assert_eq!(QuestionKind::parse("multiple-choice"), Some(QuestionKind::MultipleChoice));
        assert_eq!(QuestionKind::parse("Checkbox"), Some(QuestionKind::Checkbox));
        assert_eq!(QuestionKind::parse("essay"), None);
        assert!(QuestionKind::Checkbox.needs_options());
        assert!(!QuestionKind::Scale.needs_options());
    }

    #[test]
    fn test_generated_question_validation() {
        let mut question = GeneratedQuestion {
            question: "Which industry excites you most?".into(),
            kind: QuestionKind::MultipleChoice,
            options: vec![],
            purpose: "industry fit".into(),
        };
        assert!(matches!(question.validate(), Err(QuizError::MalformedQuestion(_))));

        question.options = vec!["Healthcare".into(), "Technology".into()];
        assert!(question.validate().is_ok());

        question.question = "  ".into();
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_follow_up_origin() {
        let probe = PresentedQuestion {
            id: "q8_biggest_concern__follow_up".into(),
            text: "What would 'worth it' look like?".into(),
            kind: QuestionKind::Text,
            options: vec![],
            section: None,
            topic: None,
            origin: QuestionOrigin::FollowUp {
                parent: "q8_biggest_concern".into(),
            },
        };
        assert!(probe.is_follow_up());
        assert_eq!(probe.origin_id(), "q8_biggest_concern");
    }

    #[test]
    fn test_turn_remark_hides_probes() {
        let mut turn = TurnResult {
            reaction: Some(Reaction::Probe {
                rule: "financial_value_probe".into(),
                question: "What would 'worth it' look like?".into(),
                options: vec![],
            }),
            next_state: NextState::NextScheduled,
            next_question: None,
            encouragement: None,
            insight: Insight::neutral(),
        };
        assert!(turn.remark().is_none());

        turn.next_state = NextState::FollowUp;
        assert!(turn.remark().is_none());

        turn.reaction = Some(Reaction::Message {
            rule: "family_remark".into(),
            text: "Family support is crucial.".into(),
        });
        assert_eq!(turn.remark(), Some("Family support is crucial."));
    }
}
