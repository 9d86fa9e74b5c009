//! Trigger rule evaluation.
//!
//! Rules are evaluated in category order (insight pattern, keyword probe,
//! contextual response, section bridge). The first rule that fires wins;
//! lower-priority reactions for the same turn are dropped.

use super::rules::{default_rules, KeywordReaction, ResponseTest, TriggerRule, FINISH_SECTION};
use crate::models::{QuestionRecord, Reaction};
use tracing::debug;

/// Everything a rule may look at for the current turn.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub history: &'a [QuestionRecord],
    /// Id of the question answered this turn.
    pub answered_question: &'a str,
    pub answered_section: Option<&'a str>,
    /// Section of the next scheduled question, `None` once the script is exhausted.
    pub upcoming_section: Option<&'a str>,
}

/// Evaluates a fixed rule table against a session.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    rules: Vec<TriggerRule>,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl PatternMatcher {
    /// Build a matcher. Rules are stably sorted by category so table order
    /// only breaks ties within a category.
    pub fn new(mut rules: Vec<TriggerRule>) -> Self {
        rules.sort_by_key(|r| (r.category(), untied_rank(r)));
        Self { rules }
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    /// The highest-priority reaction for this turn, if any rule fires.
    pub fn evaluate(&self, ctx: &MatchContext<'_>) -> Option<Reaction> {
        let reaction = self.rules.iter().find_map(|rule| fire(rule, ctx));

        if let Some(ref r) = reaction {
            debug!("Rule {} fired after {}", r.rule(), ctx.answered_question);
        }

        reaction
    }

    /// Every rule that would fire, in priority order.
    pub fn firing_rules<'r>(&'r self, ctx: &MatchContext<'_>) -> Vec<&'r TriggerRule> {
        self.rules
            .iter()
            .filter(|rule| fire(rule, ctx).is_some())
            .collect()
    }
}

/// Tied keyword probes outrank untied ones.
fn untied_rank(rule: &TriggerRule) -> u8 {
    match rule {
        TriggerRule::KeywordProbe {
            question_id: None, ..
        } => 1,
        _ => 0,
    }
}

fn fire(rule: &TriggerRule, ctx: &MatchContext<'_>) -> Option<Reaction> {
    match rule {
        TriggerRule::InsightPattern {
            name,
            test,
            threshold,
            message,
        } => {
            let qualifying = ctx
                .history
                .iter()
                .filter(|record| passes(test, record))
                .count();

            (qualifying >= *threshold).then(|| Reaction::Message {
                rule: name.clone(),
                text: message.clone(),
            })
        }

        TriggerRule::KeywordProbe {
            name,
            question_id,
            keywords,
            reaction,
        } => {
            let last = ctx.history.last()?;
            if last.question_id != ctx.answered_question {
                return None;
            }
            if let Some(qid) = question_id {
                if qid != ctx.answered_question {
                    return None;
                }
            }
            if !keywords.iter().any(|k| last.response.contains_ignore_case(k)) {
                return None;
            }

            Some(match reaction {
                KeywordReaction::Message(text) => Reaction::Message {
                    rule: name.clone(),
                    text: text.clone(),
                },
                KeywordReaction::Probe { question, options } => Reaction::Probe {
                    rule: name.clone(),
                    question: question.clone(),
                    options: options.clone(),
                },
            })
        }

        TriggerRule::ContextualResponse {
            name,
            triggers,
            min_match_count,
            responses,
        } => {
            let matches = ctx
                .history
                .iter()
                .filter(|record| record.response.is_member_of(triggers))
                .count();

            if matches < *min_match_count || responses.is_empty() {
                return None;
            }

            // Rotate through the canned lines as more matches accumulate
            let pick = (matches - min_match_count) % responses.len();
            Some(Reaction::Message {
                rule: name.clone(),
                text: responses[pick].clone(),
            })
        }

        TriggerRule::SectionBridge {
            name,
            from,
            to,
            message,
        } => {
            let answered = ctx.answered_section?;
            let upcoming = ctx.upcoming_section.unwrap_or(FINISH_SECTION);

            (answered == from && upcoming == to && answered != upcoming).then(|| {
                Reaction::Message {
                    rule: name.clone(),
                    text: message.clone(),
                }
            })
        }
    }
}

fn passes(test: &ResponseTest, record: &QuestionRecord) -> bool {
    match test {
        ResponseTest::AnyOf(set) => record.response.is_member_of(set),
        ResponseTest::ContainsAny(needles) => {
            needles.iter().any(|needle| record.response.contains(needle))
        }
    }
}
