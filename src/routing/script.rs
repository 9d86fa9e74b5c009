//! The fixed quiz script.
//!
//! A script is an ordered list of questions grouped into sections and
//! topics. Questions tagged `dynamic` are branch points where the router may
//! ask the question generator for a tailored question instead.

use crate::models::{PresentedQuestion, QuestionKind, QuestionOrigin};
use crate::triggers::ProfileKind;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Alternate wordings for particular kinds of respondent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experienced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struggling: Option<String>,
}

/// One question of the fixed script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedQuestion {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub section: String,
    pub topic: String,
    /// Branch point where a generated question may be asked instead.
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub variations: Variations,
}

impl ScriptedQuestion {
    /// The wording for a given kind of respondent.
    pub fn text_for(&self, kind: ProfileKind) -> &str {
        let variation = match kind {
            ProfileKind::Experienced => self.variations.experienced.as_deref(),
            ProfileKind::Struggling => self.variations.struggling.as_deref(),
            ProfileKind::Default => None,
        };
        variation.unwrap_or(&self.text)
    }

    pub fn present(&self, kind: ProfileKind) -> PresentedQuestion {
        PresentedQuestion {
            id: self.id.clone(),
            text: self.text_for(kind).to_string(),
            kind: self.kind,
            options: self.options.clone(),
            section: Some(self.section.clone()),
            topic: Some(self.topic.clone()),
            origin: QuestionOrigin::Scripted,
        }
    }
}

/// Ordered list of scripted questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScript {
    pub questions: Vec<ScriptedQuestion>,
}

impl Default for QuizScript {
    fn default() -> Self {
        Self::builtin()
    }
}

impl QuizScript {
    /// Build a script, rejecting empty scripts and duplicate ids.
    pub fn new(questions: Vec<ScriptedQuestion>) -> Result<Self> {
        let script = Self { questions };
        script.validate()?;
        Ok(script)
    }

    /// Load a script from a TOML file with `[[questions]]` entries.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read quiz script: {}", path.display()))?;

        let script: QuizScript = toml::from_str(&content)
            .with_context(|| format!("Failed to parse quiz script: {}", path.display()))?;

        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            bail!("Quiz script has no questions");
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                bail!("Duplicate question id in quiz script: {}", question.id);
            }
            if question.kind.needs_options() && question.options.is_empty() {
                bail!("Question {} needs options", question.id);
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ScriptedQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Distinct topics in script order.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = Vec::new();
        for question in &self.questions {
            if !topics.contains(&question.topic) {
                topics.push(question.topic.clone());
            }
        }
        topics
    }

    /// First question in script order whose id has not been asked.
    pub fn next_unasked<'a>(&'a self, asked: &HashSet<String>) -> Option<&'a ScriptedQuestion> {
        self.questions.iter().find(|q| !asked.contains(&q.id))
    }

    pub fn has_unasked_in_topic(&self, topic: &str, asked: &HashSet<String>) -> bool {
        self.questions
            .iter()
            .any(|q| q.topic == topic && !asked.contains(&q.id))
    }

    /// How many scripted questions have been asked.
    pub fn asked_count(&self, asked: &HashSet<String>) -> usize {
        self.questions.iter().filter(|q| asked.contains(&q.id)).count()
    }

    /// The built-in career assessment.
    pub fn builtin() -> Self {
        let q = |id: &str, section: &str, topic: &str, kind: QuestionKind, text: &str, options: &[&str]| {
            ScriptedQuestion {
                id: id.to_string(),
                text: text.to_string(),
                kind,
                options: options.iter().map(|s| s.to_string()).collect(),
                section: section.to_string(),
                topic: topic.to_string(),
                dynamic: false,
                variations: Variations::default(),
            }
        };
        use QuestionKind::{Checkbox, MultipleChoice, Text};

        let mut questions = vec![
            // Education
            q("q1_education", "education", "education", MultipleChoice,
                "🎓 What's your highest level of education so far?",
                &["High School Diploma/GED", "Some College", "Associate Degree", "Bachelor's Degree", "Master's Degree", "Doctoral Degree"]),
            q("q2_last_enrolled", "education", "education", MultipleChoice,
                "📅 When were you last enrolled in school?",
                &["Currently enrolled", "Within the last 5 years", "5-10 years ago", "More than 10 years ago"]),
            q("q4_study_format", "education", "education", MultipleChoice,
                "💻 How do you prefer to learn?",
                &["Fully online", "On campus", "A mix of both"]),
            q("q5_favorite_aspect", "education", "education", MultipleChoice,
                "✨ What did you enjoy most about learning in the past?",
                &["Hands-on projects", "Group discussions", "Independent research", "Lectures from experts"]),
            // Experience
            q("q6_current_role", "experience", "experience", MultipleChoice,
                "💼 Which best describes your current role?",
                &["Entry level", "Individual contributor", "Manager", "Executive", "Not currently working"]),
            q("q9_employment_status", "experience", "experience", MultipleChoice,
                "🕒 What's your current employment status?",
                &["Employed full-time", "Employed part-time", "Self-employed", "Between jobs"]),
            q("q10_industry", "experience", "experience", Text,
                "🏢 Tell me about the industry you work in and what you do day to day.",
                &[]),
            q("q11_years_experience", "experience", "experience", MultipleChoice,
                "📈 How many years of professional experience do you have?",
                &["Less than 5 years", "5-10 years", "10-15 years", "15-20 years", "More than 20 years"]),
            q("q7_career_change", "experience", "motivation", MultipleChoice,
                "🧭 Are you looking to move up or change direction?",
                &["Advance in my current field", "Want to change careers", "Start my own business", "I'm still exploring"]),
            // Vision
            q("q12_frustration", "vision", "motivation", Text,
                "😤 What frustrates you most about your current career path?",
                &[]),
            q("q14_dream_job", "vision", "goals", Text,
                "🌟 Describe your dream job five years from now.",
                &[]),
            q("q15_ideal_role", "vision", "goals", Text,
                "🎯 What kind of role do you see yourself in once you graduate?",
                &[]),
            q("q16_primary_goal", "vision", "goals", Text,
                "Let's talk goals! 🎯 What's your primary career goal for the next 3-5 years?",
                &[]),
            // Decision
            q("q8_biggest_concern", "decision", "concerns", MultipleChoice,
                "🤔 What's your biggest concern about going back to school?",
                &["Time management", "Financial investment and value", "Academic confidence after time away", "Balancing family commitments"]),
            q("q17_start_timeline", "decision", "logistics", MultipleChoice,
                "🚀 When would you like to start?",
                &["As soon as possible", "Within 3 months", "Within 6 months", "I'm unsure yet"]),
            q("q18_support", "decision", "logistics", Checkbox,
                "🤝 Who will support you along the way?",
                &["Family", "Employer", "Friends", "Online community"]),
        ];

        for question in &mut questions {
            match question.id.as_str() {
                "q10_industry" | "q14_dream_job" => question.dynamic = true,
                "q16_primary_goal" => {
                    question.variations = Variations {
                        experienced: Some("After all you've accomplished, what's the ONE thing that would make the next chapter truly fulfilling?".to_string()),
                        struggling: Some("If we could wave a magic wand and fix your biggest career challenge, what would change?".to_string()),
                    };
                }
                _ => {}
            }
        }

        Self { questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_script_is_valid() {
        let script = QuizScript::builtin();
        assert!(script.validate().is_ok());
        assert_eq!(script.len(), 16);
        assert_eq!(
            script.topics(),
            vec!["education", "experience", "motivation", "goals", "concerns", "logistics"]
        );
        assert!(script.get("q10_industry").unwrap().dynamic);
    }

    #[test]
    fn test_next_unasked_skips_asked_ids() {
        let script = QuizScript::builtin();
        let mut asked = HashSet::new();
        assert_eq!(script.next_unasked(&asked).unwrap().id, "q1_education");

        asked.insert("q1_education".to_string());
        asked.insert("q4_study_format".to_string());
        assert_eq!(script.next_unasked(&asked).unwrap().id, "q2_last_enrolled");
        assert_eq!(script.asked_count(&asked), 2);
    }

    #[test]
    fn test_topic_tracking() {
        let script = QuizScript::builtin();
        let mut asked = HashSet::new();
        assert!(script.has_unasked_in_topic("concerns", &asked));
        asked.insert("q8_biggest_concern".to_string());
        assert!(!script.has_unasked_in_topic("concerns", &asked));
    }

    #[test]
    fn test_variations() {
        let script = QuizScript::builtin();
        let goal = script.get("q16_primary_goal").unwrap();
        assert!(goal.text_for(ProfileKind::Default).starts_with("Let's talk goals"));
        assert!(goal.text_for(ProfileKind::Experienced).starts_with("After all"));
        assert!(goal.text_for(ProfileKind::Struggling).starts_with("If we could"));

        // Questions without variations always use their base text
        let edu = script.get("q1_education").unwrap();
        assert_eq!(edu.text_for(ProfileKind::Struggling), edu.text);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut questions = QuizScript::builtin().questions;
        questions.push(questions[0].clone());
        assert!(QuizScript::new(questions).is_err());
        assert!(QuizScript::new(vec![]).is_err());
    }

    #[test]
    fn test_load_script_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[questions]]
id = "q1"
text = "Highest degree?"
kind = "multiple-choice"
options = ["Bachelor's Degree", "Master's Degree"]
section = "education"
topic = "education"

[[questions]]
id = "q2"
text = "Role?"
section = "experience"
topic = "experience"
dynamic = true
"#
        )
        .unwrap();

        let script = QuizScript::load(file.path()).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.questions[1].kind, QuestionKind::Text);
        assert!(script.questions[1].dynamic);
    }

    #[test]
    fn test_choice_without_options_rejected() {
        let mut questions = QuizScript::builtin().questions;
        questions[0].options.clear();
        assert!(QuizScript::new(questions).is_err());
    }
}
