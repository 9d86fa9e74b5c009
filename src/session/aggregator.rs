//! One quiz turn, end to end.
//!
//! The aggregator is immutable and shared; all per-user state lives in the
//! [`Session`] passed to each call.

use super::state::Session;
use crate::error::QuizError;
use crate::llm::{BlueprintWriter, InsightExtractor, OfflineCollaborator, QuestionGenerator};
use crate::models::{
    Insight, NextState, PresentedQuestion, QuestionOrigin, Reaction, Response, TurnResult,
};
use crate::profile::AggregateProfile;
use crate::routing::{QuestionRouter, RouteOutcome, RoutePlan};
use crate::triggers::{encouragement, MatchContext, PatternMatcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Limits applied to collaborator calls.
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    /// Deadline for one extractor or generator call.
    pub timeout: Duration,
    /// Extractor and generator calls allowed per session.
    pub max_api_calls: u32,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            max_api_calls: 15,
        }
    }
}

/// Orchestrates record, extract, match and route for every turn.
pub struct SessionAggregator {
    router: QuestionRouter,
    matcher: PatternMatcher,
    extractor: Arc<dyn InsightExtractor>,
    generator: Arc<dyn QuestionGenerator>,
    blueprint_writer: Arc<dyn BlueprintWriter>,
    policy: CallPolicy,
}

impl SessionAggregator {
    pub fn new(
        router: QuestionRouter,
        matcher: PatternMatcher,
        extractor: Arc<dyn InsightExtractor>,
        generator: Arc<dyn QuestionGenerator>,
        policy: CallPolicy,
    ) -> Self {
        Self {
            router,
            matcher,
            extractor,
            generator,
            blueprint_writer: Arc::new(OfflineCollaborator),
            policy,
        }
    }

    /// Use `writer` for the closing blueprint. Without one no blueprint is
    /// ever written.
    pub fn with_blueprint_writer(mut self, writer: Arc<dyn BlueprintWriter>) -> Self {
        self.blueprint_writer = writer;
        self
    }

    pub fn router(&self) -> &QuestionRouter {
        &self.router
    }

    /// A fresh session covering every topic of the script.
    pub fn new_session(&self, id: impl Into<String>) -> Session {
        let session = Session::new(id, self.router.script().topics());
        info!(
            "Started session {} with {} topics",
            session.id(),
            session.remaining_topics().len()
        );
        session
    }

    /// Present the first question.
    pub async fn begin(&self, session: &mut Session) -> Option<PresentedQuestion> {
        let plan = self.router.plan_start(session);
        let outcome = self.route(plan, session).await;
        session.present(outcome.state, outcome.question.clone());
        outcome.question
    }

    /// Process one answer.
    ///
    /// Fails only with [`QuizError::DuplicateQuestion`], in which case the
    /// session is left untouched. Collaborator failures are recovered here.
    pub async fn process_answer(
        &self,
        session: &mut Session,
        question_id: &str,
        response: Response,
    ) -> Result<TurnResult, QuizError> {
        if session.store().contains(question_id) {
            return Err(QuizError::DuplicateQuestion(question_id.to_string()));
        }

        let answered = self.router.resolve_answered(session, question_id);
        debug!("Processing answer to {} ({:?})", answered.id, answered.origin);

        let insight = self.extract(session, &answered, &response).await;

        session
            .store_mut()
            .record_answer(question_id, response, insight.clone())?;
        session.mark_asked(&answered);
        self.retire_topic(session, &answered);

        let mut reaction = self.react(session, &answered, false);
        let plan = self
            .router
            .plan(session, &answered, &insight, reaction.as_ref());
        if matches!(plan, RoutePlan::FollowUp(_)) {
            // The follow-up keeps the quiz in this section, so no bridge yet
            reaction = self.react(session, &answered, true);
        }
        if let Some(ref r) = reaction {
            session.push_reaction(question_id, r.clone());
        }

        let outcome = self.route(plan, session).await;
        session.present(outcome.state, outcome.question.clone());

        let encouragement = self.encouragement_for(session, &answered);
        debug!("Turn for {} -> {}", question_id, outcome.state);
        if outcome.state == NextState::Done {
            info!(
                "Session {} complete after {} answers",
                session.id(),
                session.history().len()
            );
        }

        Ok(TurnResult {
            reaction,
            next_state: outcome.state,
            next_question: outcome.question,
            encouragement,
            insight,
        })
    }

    /// Write the career blueprint for a completed session. Any failure leaves
    /// the session without one.
    pub async fn finish(&self, session: &mut Session) {
        if !session.is_done() || !self.router.flags().ai_blueprints {
            return;
        }
        if !self.budget_left(session) {
            debug!("API budget spent, skipping blueprint");
            return;
        }

        let call = self
            .blueprint_writer
            .write(session.aggregate(), session.history());
        let result = tokio::time::timeout(self.policy.timeout, call).await;
        session.count_api_call();

        match result {
            Ok(Ok(blueprint)) => {
                info!("Blueprint written for session {}", session.id());
                session.set_blueprint(blueprint);
            }
            Ok(Err(e)) => warn!("No blueprint for session {}: {}", session.id(), e),
            Err(_) => warn!(
                "Blueprint for session {} timed out after {}ms",
                session.id(),
                self.policy.timeout.as_millis()
            ),
        }
    }

    /// Evaluate the trigger rules for the answer just recorded. With
    /// `staying` set the next question is treated as part of the same section.
    fn react(
        &self,
        session: &Session,
        answered: &PresentedQuestion,
        staying: bool,
    ) -> Option<Reaction> {
        let answered_section = self.answered_section(answered);
        let upcoming_section = if staying {
            answered_section.as_deref()
        } else {
            self.router.upcoming_section(session)
        };
        let ctx = MatchContext {
            history: session.history(),
            answered_question: &answered.id,
            answered_section: answered_section.as_deref(),
            upcoming_section,
        };
        self.matcher.evaluate(&ctx)
    }

    fn budget_left(&self, session: &Session) -> bool {
        session.api_calls() < self.policy.max_api_calls
    }

    async fn extract(
        &self,
        session: &mut Session,
        answered: &PresentedQuestion,
        response: &Response,
    ) -> Insight {
        let flags = self.router.flags();
        if !flags.nlp_analysis {
            return Insight::neutral();
        }
        if !self.budget_left(session) {
            debug!("API budget spent, using neutral insight for {}", answered.id);
            return Insight::neutral();
        }

        let empty = AggregateProfile::default();
        let profile = if flags.conversation_memory {
            session.aggregate()
        } else {
            &empty
        };
        let text = response.as_text();
        let call = self.extractor.extract(&answered.text, &text, profile);
        let result = tokio::time::timeout(self.policy.timeout, call).await;
        session.count_api_call();

        match result {
            Ok(Ok(insight)) => insight,
            Ok(Err(e)) => {
                warn!("Insight extraction failed for {}: {}", answered.id, e);
                Insight::neutral()
            }
            Err(_) => {
                warn!(
                    "Insight extraction for {} timed out after {}ms",
                    answered.id,
                    self.policy.timeout.as_millis()
                );
                Insight::neutral()
            }
        }
    }

    async fn route(&self, plan: RoutePlan, session: &mut Session) -> RouteOutcome {
        let generator = self
            .budget_left(session)
            .then(|| self.generator.as_ref());
        let outcome = self
            .router
            .resolve(plan, session, generator, self.policy.timeout)
            .await;
        if outcome.generator_called {
            session.count_api_call();
        }
        outcome
    }

    /// Drop a topic once it has nothing left to ask.
    fn retire_topic(&self, session: &mut Session, answered: &PresentedQuestion) {
        let Some(topic) = answered.topic.as_deref() else {
            return;
        };
        match answered.origin {
            QuestionOrigin::Dynamic { .. } => session.remove_topic(topic),
            QuestionOrigin::Scripted => {
                if !self
                    .router
                    .script()
                    .has_unasked_in_topic(topic, session.asked())
                {
                    session.remove_topic(topic);
                }
            }
            QuestionOrigin::FollowUp { .. } => {}
        }
    }

    /// A follow-up belongs to its parent's section.
    fn answered_section(&self, answered: &PresentedQuestion) -> Option<String> {
        match answered.origin {
            QuestionOrigin::FollowUp { ref parent } => self
                .router
                .script()
                .get(parent)
                .map(|q| q.section.clone())
                .or_else(|| answered.section.clone()),
            _ => answered.section.clone(),
        }
    }

    fn encouragement_for(&self, session: &Session, answered: &PresentedQuestion) -> Option<String> {
        let counts = match answered.origin {
            QuestionOrigin::Scripted => self.router.script().get(&answered.id).is_some(),
            QuestionOrigin::Dynamic { ref slot } => slot.is_some(),
            QuestionOrigin::FollowUp { .. } => false,
        };
        if !counts {
            return None;
        }

        let script = self.router.script();
        encouragement(script.asked_count(session.asked()), script.len()).map(str::to_string)
    }
}
