//! Prompt templates for the LLM collaborators.

use crate::models::QuestionRecord;
use crate::profile::AggregateProfile;
use std::collections::HashSet;

/// Advisor persona shared by every request.
pub const ADVISOR_PERSONA: &str = r#"You are a career advisor helping prospective adult students discover their career paths. You're warm, encouraging, and curious about each person's story.

Your personality:
- Conversational and friendly (use emojis appropriately)
- Encouraging but not pushy
- Interested in deeper motivations, not just facts
- Build confidence while addressing concerns"#;

/// System prompt for answer analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are an expert at analyzing career assessment responses. Reply with a single JSON object and nothing else.";

/// System prompt for question generation.
pub const QUESTION_SYSTEM_PROMPT: &str =
    "You are designing personalized career assessment questions. Reply with a single JSON object and nothing else.";

/// System prompt for the closing career blueprint.
pub const BLUEPRINT_SYSTEM_PROMPT: &str =
    "You are creating personalized career blueprints that inspire action and show clear paths to success. Reply with a single JSON object and nothing else.";

/// Build the analysis prompt for one answer.
pub fn analysis_prompt(question: &str, response: &str, profile: &AggregateProfile) -> String {
    let mut prompt = String::new();
    prompt.push_str(ADVISOR_PERSONA);
    prompt.push_str("\n\nAnalyze this career assessment response and extract key insights.\n\n");
    prompt.push_str(&format!("Question: \"{}\"\n", question));
    prompt.push_str(&format!("Response: \"{}\"\n", response));
    prompt.push_str(&format!("Context: {}\n\n", profile_json(profile)));
    prompt.push_str("Extract and return as JSON:\n");
    prompt.push_str(
        r#"{
    "sentiment": "positive|neutral|negative",
    "keyThemes": ["theme1", "theme2"],
    "careerMotivations": ["motivation1", "motivation2"],
    "concerns": ["concern1", "concern2"],
    "programFit": {
        "recommendedPrograms": ["program1", "program2"],
        "fitScore": 0
    },
    "followUpNeeded": false,
    "suggestedProbe": "Optional follow-up question if needed"
}"#,
    );
    prompt.push_str("\n\nfitScore is an integer from 0 to 100.");
    prompt
}

/// Build the next-question prompt.
pub fn question_prompt(
    profile: &AggregateProfile,
    asked_ids: &HashSet<String>,
    remaining_topics: &[String],
) -> String {
    let mut prompt = String::new();
    prompt.push_str(ADVISOR_PERSONA);
    prompt.push_str(
        "\n\nGenerate the next question for a career assessment based on what we know so far.\n\n",
    );
    prompt.push_str(&format!("User Profile:\n{}\n\n", profile_json(profile)));
    prompt.push_str(&format!("Questions Already Asked: {}\n", asked_ids.len()));
    prompt.push_str(&format!(
        "Topics Still to Cover: {}\n\n",
        remaining_topics.join(", ")
    ));
    prompt.push_str(
        "Generate a question that:\n\
         1. Feels natural in the conversation flow\n\
         2. Addresses gaps in our understanding\n\
         3. Is relevant to their stated goals\n\
         4. Helps determine program fit\n\n",
    );
    prompt.push_str("Return as JSON:\n");
    prompt.push_str(
        r#"{
    "question": "The question text with appropriate emoji",
    "type": "multiple-choice|text|scale|checkbox",
    "options": ["option1", "option2"],
    "purpose": "What insight this provides"
}"#,
    );
    prompt.push_str("\n\nOnly include options for multiple-choice and checkbox questions.");
    prompt
}

/// Build the blueprint prompt from the whole session.
pub fn blueprint_prompt(profile: &AggregateProfile, history: &[QuestionRecord]) -> String {
    let mut prompt = String::new();
    prompt.push_str(ADVISOR_PERSONA);
    prompt.push_str("\n\nCreate a personalized career blueprint for this prospective student.\n\n");
    prompt.push_str(&format!("User Profile:\n{}\n\n", profile_json(profile)));
    prompt.push_str("Quiz Responses:\n");
    for record in history {
        prompt.push_str(&format!("- {}: {}\n", record.question_id, record.response));
    }
    prompt.push_str(
        "\nThe blueprint should acknowledge their situation, map a 3, 5 and 10 year \
         trajectory, recommend a primary program with alternatives, list strengths \
         and skills to develop, answer each concern from the quiz, and end with \
         clear next steps.\n\n",
    );
    prompt.push_str("Return as JSON:\n");
    prompt.push_str(
        r#"{
    "introduction": "A short personal opening",
    "trajectory": {"year3": "...", "year5": "...", "year10": "..."},
    "programs": {"primary": "...", "rationale": "...", "alternatives": ["..."]},
    "strengths": ["..."],
    "skillsToDevelop": ["..."],
    "challenges": [{"concern": "...", "solution": "..."}],
    "nextSteps": ["..."]
}"#,
    );
    prompt
}

fn profile_json(profile: &AggregateProfile) -> String {
    serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Insight;

    #[test]
    fn test_analysis_prompt_includes_answer_and_context() {
        let mut profile = AggregateProfile::default();
        profile.extend(&Insight {
            key_themes: vec!["leadership".into()],
            ..Insight::neutral()
        });

        let prompt = analysis_prompt("Dream job?", "Running a clinic", &profile);
        assert!(prompt.contains("Question: \"Dream job?\""));
        assert!(prompt.contains("Response: \"Running a clinic\""));
        assert!(prompt.contains("leadership"));
        assert!(prompt.contains("careerMotivations"));
    }

    #[test]
    fn test_question_prompt_lists_topics() {
        let asked: HashSet<String> = ["q1".to_string(), "q2".to_string()].into_iter().collect();
        let prompt = question_prompt(
            &AggregateProfile::default(),
            &asked,
            &["goals".to_string(), "logistics".to_string()],
        );
        assert!(prompt.contains("Questions Already Asked: 2"));
        assert!(prompt.contains("Topics Still to Cover: goals, logistics"));
    }

    #[test]
    fn test_blueprint_prompt_lists_responses() {
        let history = vec![QuestionRecord {
            question_id: "q8_biggest_concern".into(),
            response: crate::models::Response::from("Time commitment"),
            insight: Insight::neutral(),
            timestamp: chrono::Utc::now(),
        }];
        let prompt = blueprint_prompt(&AggregateProfile::fold(&history), &history);
        assert!(prompt.contains("- q8_biggest_concern: Time commitment"));
        assert!(prompt.contains("skillsToDevelop"));
    }
}
