//! Terminal front end: presenting questions and collecting answers.
//!
//! Answers come either from stdin or from a replay file. Numbers select
//! options; checkbox questions accept several numbers separated by commas.

use crate::models::{PresentedQuestion, QuestionKind, Response};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Words that end an interactive quiz early.
const QUIT_WORDS: &[&str] = &["quit", "exit", ":q"];

/// One entry of an answers file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReplayAnswer {
    /// Answer a specific question.
    Keyed {
        question_id: String,
        response: Response,
    },
    /// Answer whatever question is current.
    Plain(Response),
}

/// Where answers come from.
pub enum AnswerSource {
    Interactive(Lines<BufReader<Stdin>>),
    Replay(VecDeque<ReplayAnswer>),
}

impl AnswerSource {
    pub fn interactive() -> Self {
        AnswerSource::Interactive(BufReader::new(tokio::io::stdin()).lines())
    }

    /// Load a JSON array of answers.
    pub fn replay(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read answers file: {}", path.display()))?;
        let answers: Vec<ReplayAnswer> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse answers file: {}", path.display()))?;
        Ok(AnswerSource::Replay(answers.into()))
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, AnswerSource::Interactive(_))
    }

    /// The next `(question_id, response)` pair, or `None` when the user quit
    /// or the replay ran out.
    pub async fn next_answer(
        &mut self,
        question: &PresentedQuestion,
    ) -> Result<Option<(String, Response)>> {
        match self {
            AnswerSource::Replay(answers) => Ok(answers.pop_front().map(|answer| match answer {
                ReplayAnswer::Keyed {
                    question_id,
                    response,
                } => (question_id, response),
                ReplayAnswer::Plain(response) => (question.id.clone(), response),
            })),
            AnswerSource::Interactive(lines) => loop {
                print_prompt();
                let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
                    return Ok(None);
                };
                let input = line.trim();
                if QUIT_WORDS.contains(&input.to_lowercase().as_str()) {
                    return Ok(None);
                }
                match parse_input(input, question) {
                    Some(response) => return Ok(Some((question.id.clone(), response))),
                    None => println!("   Please enter an answer (or 'quit' to stop)."),
                }
            },
        }
    }
}

fn print_prompt() {
    use std::io::Write;
    print!("> ");
    // A failed flush only delays the prompt
    let _ = std::io::stdout().flush();
}

/// Turn typed input into a response. Returns `None` for empty input.
pub fn parse_input(input: &str, question: &PresentedQuestion) -> Option<Response> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if question.options.is_empty() {
        return Some(Response::Text(input.to_string()));
    }

    let option_at = |token: &str| -> Option<String> {
        let index: usize = token.trim().parse().ok()?;
        question.options.get(index.checked_sub(1)?).cloned()
    };

    if question.kind == QuestionKind::Checkbox {
        let picks: Option<Vec<String>> = input.split(',').map(option_at).collect();
        if let Some(picks) = picks.filter(|p| !p.is_empty()) {
            return Some(Response::Selections(picks));
        }
    } else if let Some(pick) = option_at(input) {
        return Some(Response::Text(pick));
    }

    // Typed text is taken as-is; an exact option name still matches rules
    Some(Response::Text(input.to_string()))
}

/// Render a question for the terminal.
pub fn render_question(question: &PresentedQuestion, number: usize) -> String {
    let mut out = String::new();

    let marker = if question.is_follow_up() { "↳" } else { "" };
    out.push_str(&format!("\n{}{}. {}\n", marker, number, question.text));

    for (i, option) in question.options.iter().enumerate() {
        out.push_str(&format!("   {}) {}\n", i + 1, option));
    }

    match question.kind {
        QuestionKind::Checkbox => out.push_str("   (pick one or more, e.g. 1,3)\n"),
        QuestionKind::Scale if question.options.is_empty() => {
            out.push_str("   (answer on a scale of 1-10)\n")
        }
        _ => {}
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionOrigin;
    use std::io::Write;

    fn question(kind: QuestionKind, options: &[&str]) -> PresentedQuestion {
        PresentedQuestion {
            id: "q".to_string(),
            text: "Pick".to_string(),
            kind,
            options: options.iter().map(|s| s.to_string()).collect(),
            section: None,
            topic: None,
            origin: QuestionOrigin::Scripted,
        }
    }

    #[test]
    fn test_number_selects_option() {
        let q = question(QuestionKind::MultipleChoice, &["Manager", "Executive"]);
        assert_eq!(parse_input("2", &q), Some(Response::from("Executive")));
        assert_eq!(parse_input(" Executive ", &q), Some(Response::from("Executive")));
        // Out of range numbers are kept as text
        assert_eq!(parse_input("7", &q), Some(Response::from("7")));
        assert_eq!(parse_input("   ", &q), None);
    }

    #[test]
    fn test_checkbox_selections() {
        let q = question(QuestionKind::Checkbox, &["Family", "Employer", "Friends"]);
        assert_eq!(
            parse_input("1, 3", &q),
            Some(Response::Selections(vec!["Family".into(), "Friends".into()]))
        );
        assert_eq!(parse_input("1,9", &q), Some(Response::from("1,9")));
    }

    #[test]
    fn test_free_text() {
        let q = question(QuestionKind::Text, &[]);
        assert_eq!(parse_input("2", &q), Some(Response::from("2")));
    }

    #[test]
    fn test_render_question() {
        let q = question(QuestionKind::Checkbox, &["Family", "Employer"]);
        let rendered = render_question(&q, 3);
        assert!(rendered.contains("3. Pick"));
        assert!(rendered.contains("   2) Employer"));
        assert!(rendered.contains("pick one or more"));
    }

    #[tokio::test]
    async fn test_replay_answers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"["Master's Degree", ["Family", "Friends"], {{"question_id": "q9", "response": "Executive"}}]"#
        )
        .unwrap();

        let mut source = AnswerSource::replay(file.path()).unwrap();
        assert!(!source.is_interactive());
        let q = question(QuestionKind::Text, &[]);

        let first = source.next_answer(&q).await.unwrap().unwrap();
        assert_eq!(first, ("q".to_string(), Response::from("Master's Degree")));

        let second = source.next_answer(&q).await.unwrap().unwrap();
        assert_eq!(second.1, Response::Selections(vec!["Family".into(), "Friends".into()]));

        let third = source.next_answer(&q).await.unwrap().unwrap();
        assert_eq!(third.0, "q9");

        assert!(source.next_answer(&q).await.unwrap().is_none());
    }
}
