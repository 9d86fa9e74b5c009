//! Session report generation.
//!
//! This module builds a [`SessionReport`] from a finished (or abandoned)
//! session and renders it as Markdown or JSON.

use crate::models::{CareerBlueprint, Response, Sentiment};
use crate::profile::SentimentTally;
use crate::session::Session;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// How many entries each "top" table shows.
const TOP_N: usize = 5;

/// Report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub completed: bool,
    pub questions_answered: usize,
    /// Model name, or `None` when the quiz ran offline.
    pub model_used: Option<String>,
    pub api_calls: u32,
    pub duration_seconds: f64,
}

/// One answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub question: String,
    pub response: Response,
    pub sentiment: Sentiment,
    pub key_themes: Vec<String>,
}

/// An item with how often it came up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counted {
    pub name: String,
    pub count: usize,
}

/// Profile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub dominant_sentiment: Sentiment,
    pub sentiments: SentimentTally,
    pub top_themes: Vec<Counted>,
    pub top_motivations: Vec<Counted>,
    pub top_concerns: Vec<Counted>,
    pub recommended_programs: Vec<Counted>,
    pub average_fit_score: Option<f64>,
}

/// A reaction shown during the quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEntry {
    pub after_question: String,
    pub rule: String,
    pub text: String,
}

/// Complete session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub metadata: ReportMetadata,
    pub answers: Vec<AnswerEntry>,
    pub profile: ProfileSummary,
    pub reactions: Vec<ReactionEntry>,
    /// Present only when the quiz completed with a working LLM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<CareerBlueprint>,
}

fn counted(items: Vec<(String, usize)>) -> Vec<Counted> {
    items
        .into_iter()
        .map(|(name, count)| Counted { name, count })
        .collect()
}

impl SessionReport {
    /// Build a report from the session as it stands.
    pub fn from_session(session: &Session, model_used: Option<String>) -> Self {
        let completed_at = Utc::now();
        let aggregate = session.aggregate();

        let answers = session
            .history()
            .iter()
            .map(|record| AnswerEntry {
                question_id: record.question_id.clone(),
                question: session
                    .presented(&record.question_id)
                    .map(|q| q.text.clone())
                    .unwrap_or_else(|| record.question_id.clone()),
                response: record.response.clone(),
                sentiment: record.insight.sentiment,
                key_themes: record.insight.key_themes.clone(),
            })
            .collect();

        let profile = ProfileSummary {
            dominant_sentiment: aggregate.sentiments.dominant(),
            sentiments: aggregate.sentiments,
            top_themes: counted(aggregate.top_themes(TOP_N)),
            top_motivations: counted(aggregate.top_motivations(TOP_N)),
            top_concerns: counted(aggregate.top_concerns(TOP_N)),
            recommended_programs: counted(aggregate.ranked_programs()),
            average_fit_score: aggregate.average_fit_score(),
        };

        let reactions = session
            .reactions()
            .iter()
            .map(|surfaced| ReactionEntry {
                after_question: surfaced.after_question.clone(),
                rule: surfaced.reaction.rule().to_string(),
                text: surfaced.reaction.text().to_string(),
            })
            .collect();

        let duration = completed_at - session.started_at();

        Self {
            metadata: ReportMetadata {
                session_id: session.id().to_string(),
                started_at: session.started_at(),
                completed_at,
                completed: session.is_done(),
                questions_answered: session.history().len(),
                model_used,
                api_calls: session.api_calls(),
                duration_seconds: duration.num_milliseconds() as f64 / 1000.0,
            },
            answers,
            profile,
            reactions,
            blueprint: session.blueprint().cloned(),
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SessionReport) -> String {
    let mut output = String::new();

    output.push_str("# Career Quiz Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_profile_section(&report.profile));
    if let Some(ref blueprint) = report.blueprint {
        output.push_str(&generate_blueprint_section(blueprint));
    }
    output.push_str(&generate_answers_section(&report.answers));
    output.push_str(&generate_reactions_section(&report.reactions));
    output.push_str("---\n\n*Report generated by career-quiz*\n");

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Session:** `{}`\n", metadata.session_id));
    section.push_str(&format!(
        "- **Date:** {}\n",
        metadata.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Status:** {}\n",
        if metadata.completed {
            "Completed"
        } else {
            "Incomplete"
        }
    ));
    section.push_str(&format!(
        "- **Questions Answered:** {}\n",
        metadata.questions_answered
    ));
    match metadata.model_used {
        Some(ref model) => {
            section.push_str(&format!("- **Model Used:** `{}`\n", model));
            section.push_str(&format!("- **API Calls:** {}\n", metadata.api_calls));
        }
        None => section.push_str("- **Mode:** Static quiz (LLM features off)\n"),
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn counted_table(section: &mut String, title: &str, column: &str, items: &[Counted]) {
    if items.is_empty() {
        return;
    }

    section.push_str(&format!("### {}\n\n", title));
    section.push_str(&format!("| {} | Mentions |\n", column));
    section.push_str("|:---|:---:|\n");
    for item in items {
        section.push_str(&format!("| {} | {} |\n", item.name, item.count));
    }
    section.push('\n');
}

/// Generate the profile section.
fn generate_profile_section(profile: &ProfileSummary) -> String {
    let mut section = String::new();

    section.push_str("## Profile\n\n");
    section.push_str(&format!(
        "| {} Positive | {} Neutral | {} Negative | **Overall** |\n",
        Sentiment::Positive.emoji(),
        Sentiment::Neutral.emoji(),
        Sentiment::Negative.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        profile.sentiments.positive,
        profile.sentiments.neutral,
        profile.sentiments.negative,
        profile.dominant_sentiment
    ));

    counted_table(&mut section, "Key Themes", "Theme", &profile.top_themes);
    counted_table(
        &mut section,
        "Career Motivations",
        "Motivation",
        &profile.top_motivations,
    );
    counted_table(&mut section, "Concerns", "Concern", &profile.top_concerns);
    counted_table(
        &mut section,
        "Recommended Programs",
        "Program",
        &profile.recommended_programs,
    );

    if let Some(score) = profile.average_fit_score {
        section.push_str(&format!("**Average Program Fit:** {:.0}/100\n\n", score));
    }

    section
}

fn bullet_list(section: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    section.push_str(&format!("### {}\n\n", title));
    for item in items {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');
}

/// Generate the career blueprint section.
fn generate_blueprint_section(blueprint: &CareerBlueprint) -> String {
    let mut section = String::new();

    section.push_str("## Your Career Blueprint\n\n");
    section.push_str(&format!("{}\n\n", blueprint.introduction));

    section.push_str("### Trajectory\n\n");
    section.push_str("| Horizon | Where you could be |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| 3 years | {} |\n", blueprint.trajectory.year3));
    section.push_str(&format!("| 5 years | {} |\n", blueprint.trajectory.year5));
    section.push_str(&format!("| 10 years | {} |\n\n", blueprint.trajectory.year10));

    section.push_str("### Recommended Program\n\n");
    section.push_str(&format!("**{}**", blueprint.programs.primary));
    if !blueprint.programs.rationale.is_empty() {
        section.push_str(&format!(": {}", blueprint.programs.rationale));
    }
    section.push_str("\n\n");
    if !blueprint.programs.alternatives.is_empty() {
        section.push_str(&format!(
            "*Also worth a look: {}*\n\n",
            blueprint.programs.alternatives.join(", ")
        ));
    }

    bullet_list(&mut section, "Strengths", &blueprint.strengths);
    bullet_list(&mut section, "Skills to Develop", &blueprint.skills_to_develop);

    if !blueprint.challenges.is_empty() {
        section.push_str("### Overcoming Your Challenges\n\n");
        for challenge in &blueprint.challenges {
            section.push_str(&format!("- **{}:** {}\n", challenge.concern, challenge.solution));
        }
        section.push('\n');
    }

    bullet_list(&mut section, "Next Steps", &blueprint.next_steps);

    section
}

/// Generate the answers section.
fn generate_answers_section(answers: &[AnswerEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Answers\n\n");

    if answers.is_empty() {
        section.push_str("No questions were answered.\n\n");
        return section;
    }

    for (i, answer) in answers.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}**\n   {} {}\n",
            i + 1,
            answer.question,
            answer.sentiment.emoji(),
            answer.response
        ));
        if !answer.key_themes.is_empty() {
            section.push_str(&format!("   *Themes: {}*\n", answer.key_themes.join(", ")));
        }
    }
    section.push('\n');

    section
}

/// Generate the reactions section.
fn generate_reactions_section(reactions: &[ReactionEntry]) -> String {
    if reactions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Conversation Highlights\n\n");
    for reaction in reactions {
        section.push_str(&format!(
            "> {} *(after `{}`)*\n\n",
            reaction.text, reaction.after_question
        ));
    }

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    Ok(())
}
