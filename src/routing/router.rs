//! Next-question routing.
//!
//! Routing happens in two steps. [`QuestionRouter::plan`] is a pure decision
//! over the session, the insight just produced and the surfaced reaction.
//! [`QuestionRouter::resolve`] then performs the one optional side effect,
//! asking the generator for a dynamic question, and falls back to the
//! script when that fails.

use super::script::{QuizScript, ScriptedQuestion};
use crate::config::FeatureFlags;
use crate::error::QuizError;
use crate::llm::QuestionGenerator;
use crate::models::{Insight, NextState, PresentedQuestion, QuestionKind, QuestionOrigin, Reaction};
use crate::session::Session;
use crate::triggers::ProfileKind;
use std::time::Duration;
use tracing::{debug, warn};

/// Suffix of follow-up question ids.
const FOLLOW_UP_SUFFIX: &str = "__follow_up";
/// Suffix of generated questions that fill a script slot.
const DYNAMIC_SUFFIX: &str = "__dynamic";

/// The router's decision before any generator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePlan {
    FollowUp(PresentedQuestion),
    NextScheduled(PresentedQuestion),
    /// Ask the generator; present `fallback` (or finish) if it fails.
    Dynamic {
        slot: Option<String>,
        topic: Option<String>,
        section: Option<String>,
        fallback: Option<PresentedQuestion>,
    },
    Done,
}

/// Final routing outcome for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub state: NextState,
    pub question: Option<PresentedQuestion>,
    /// Whether the generator was called (for API budgeting).
    pub generator_called: bool,
}

/// Picks the next question from the script, follow-ups and the generator.
#[derive(Debug, Clone)]
pub struct QuestionRouter {
    script: QuizScript,
    flags: FeatureFlags,
}

impl QuestionRouter {
    pub fn new(script: QuizScript, flags: FeatureFlags) -> Self {
        Self { script, flags }
    }

    pub fn script(&self) -> &QuizScript {
        &self.script
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    /// Next scripted question not yet asked.
    pub fn next_scheduled<'a>(&'a self, session: &Session) -> Option<&'a ScriptedQuestion> {
        self.script.next_unasked(session.asked())
    }

    /// Section of the next scripted question.
    pub fn upcoming_section<'a>(&'a self, session: &Session) -> Option<&'a str> {
        self.next_scheduled(session).map(|q| q.section.as_str())
    }

    /// Look up how an answered id should be treated: the pending question
    /// when it matches, otherwise the script entry, otherwise an ad hoc
    /// question with no topic.
    pub fn resolve_answered(&self, session: &Session, question_id: &str) -> PresentedQuestion {
        if let Some(pending) = session.pending().filter(|p| p.id == question_id) {
            return pending.clone();
        }

        match self.script.get(question_id) {
            Some(scripted) => scripted.present(ProfileKind::classify(session.history())),
            None => PresentedQuestion {
                id: question_id.to_string(),
                text: question_id.to_string(),
                kind: QuestionKind::Text,
                options: Vec::new(),
                section: None,
                topic: None,
                origin: QuestionOrigin::Scripted,
            },
        }
    }

    /// Plan the first question of a session.
    pub fn plan_start(&self, session: &Session) -> RoutePlan {
        self.plan_scheduled(session)
    }

    /// Plan the next step after `answered` produced `insight`.
    pub fn plan(
        &self,
        session: &Session,
        answered: &PresentedQuestion,
        insight: &Insight,
        reaction: Option<&Reaction>,
    ) -> RoutePlan {
        if let Some(follow_up) = self.follow_up_for(session, answered, insight, reaction) {
            return RoutePlan::FollowUp(follow_up);
        }
        self.plan_scheduled(session)
    }

    /// A follow-up is asked at most once per original question, and never
    /// in response to a follow-up.
    fn follow_up_for(
        &self,
        session: &Session,
        answered: &PresentedQuestion,
        insight: &Insight,
        reaction: Option<&Reaction>,
    ) -> Option<PresentedQuestion> {
        if answered.is_follow_up() {
            return None;
        }
        let parent = answered.origin_id();
        if session.was_probed(parent) {
            return None;
        }

        let (text, kind, options) = if let Some(probe) =
            insight.probe().filter(|_| self.flags.intelligent_followups)
        {
            (probe.to_string(), QuestionKind::Text, Vec::new())
        } else if let Some(Reaction::Probe {
            question, options, ..
        }) = reaction.filter(|_| self.flags.smart_routing)
        {
            let kind = if options.is_empty() {
                QuestionKind::Text
            } else {
                QuestionKind::MultipleChoice
            };
            (question.clone(), kind, options.clone())
        } else {
            return None;
        };

        debug!("Planning follow-up for {}", parent);
        Some(PresentedQuestion {
            id: format!("{}{}", parent, FOLLOW_UP_SUFFIX),
            text,
            kind,
            options,
            section: answered.section.clone(),
            topic: answered.topic.clone(),
            origin: QuestionOrigin::FollowUp {
                parent: parent.to_string(),
            },
        })
    }

    fn plan_scheduled(&self, session: &Session) -> RoutePlan {
        let profile_kind = ProfileKind::classify(session.history());

        match self.next_scheduled(session) {
            Some(next) if next.dynamic && self.flags.dynamic_questions => RoutePlan::Dynamic {
                slot: Some(next.id.clone()),
                topic: Some(next.topic.clone()),
                section: Some(next.section.clone()),
                fallback: Some(next.present(profile_kind)),
            },
            Some(next) => RoutePlan::NextScheduled(next.present(profile_kind)),
            None => match session.remaining_topics().first() {
                Some(topic) if self.flags.dynamic_questions => RoutePlan::Dynamic {
                    slot: None,
                    topic: Some(topic.clone()),
                    section: None,
                    fallback: None,
                },
                _ => RoutePlan::Done,
            },
        }
    }

    /// Carry out a plan. `generator` is `None` when the call budget is spent,
    /// which is handled like a failed generation.
    pub async fn resolve(
        &self,
        plan: RoutePlan,
        session: &Session,
        generator: Option<&dyn QuestionGenerator>,
        timeout: Duration,
    ) -> RouteOutcome {
        match plan {
            RoutePlan::FollowUp(question) => RouteOutcome {
                state: NextState::FollowUp,
                question: Some(question),
                generator_called: false,
            },
            RoutePlan::NextScheduled(question) => RouteOutcome {
                state: NextState::NextScheduled,
                question: Some(question),
                generator_called: false,
            },
            RoutePlan::Done => RouteOutcome {
                state: NextState::Done,
                question: None,
                generator_called: false,
            },
            RoutePlan::Dynamic {
                slot,
                topic,
                section,
                fallback,
            } => {
                let Some(generator) = generator else {
                    debug!("API budget spent, skipping dynamic question");
                    return Self::fallback(fallback, false);
                };

                match self.generate(generator, session, timeout).await {
                    Ok(generated) => {
                        let id = match slot {
                            Some(ref slot) => format!("{}{}", slot, DYNAMIC_SUFFIX),
                            None => format!("dynamic_{}", session.history().len() + 1),
                        };
                        RouteOutcome {
                            state: NextState::Dynamic,
                            question: Some(PresentedQuestion {
                                id,
                                text: generated.question,
                                kind: generated.kind,
                                options: generated.options,
                                section,
                                topic,
                                origin: QuestionOrigin::Dynamic { slot },
                            }),
                            generator_called: true,
                        }
                    }
                    Err(e) => {
                        warn!("Dynamic question unavailable, using script: {}", e);
                        Self::fallback(fallback, true)
                    }
                }
            }
        }
    }

    async fn generate(
        &self,
        generator: &dyn QuestionGenerator,
        session: &Session,
        timeout: Duration,
    ) -> Result<crate::models::GeneratedQuestion, QuizError> {
        let call = generator.generate(
            session.aggregate(),
            session.asked(),
            session.remaining_topics(),
        );

        let generated = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| {
                QuizError::Generation(format!("timed out after {}ms", timeout.as_millis()))
            })??
            .ok_or_else(|| QuizError::Generation("generator returned no question".to_string()))?;

        generated.validate()?;
        Ok(generated)
    }

    fn fallback(fallback: Option<PresentedQuestion>, generator_called: bool) -> RouteOutcome {
        match fallback {
            Some(question) => RouteOutcome {
                state: NextState::NextScheduled,
                question: Some(question),
                generator_called,
            },
            None => RouteOutcome {
                state: NextState::Done,
                question: None,
                generator_called,
            },
        }
    }
}
