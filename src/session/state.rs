//! Per-user quiz session state.

use crate::models::{
    CareerBlueprint, NextState, PresentedQuestion, QuestionOrigin, QuestionRecord, Reaction,
};
use crate::profile::{AggregateProfile, ProfileStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A reaction together with the answer that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfacedReaction {
    pub after_question: String,
    pub reaction: Reaction,
}

/// One user's quiz attempt.
///
/// Sessions share nothing; every call that reads or changes quiz state takes
/// the session explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    store: ProfileStore,
    asked: HashSet<String>,
    remaining_topics: Vec<String>,
    pending: Option<PresentedQuestion>,
    /// Questions that already received their follow-up.
    probed: HashSet<String>,
    state: NextState,
    api_calls: u32,
    reactions: Vec<SurfacedReaction>,
    /// Every question presented, in order.
    transcript: Vec<PresentedQuestion>,
    blueprint: Option<CareerBlueprint>,
}

impl Session {
    /// Start a session with the full topic list.
    pub fn new(id: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            id: id.into(),
            started_at: Utc::now(),
            store: ProfileStore::new(),
            asked: HashSet::new(),
            remaining_topics: topics,
            pending: None,
            probed: HashSet::new(),
            state: NextState::AwaitingAnswer,
            api_calls: 0,
            reactions: Vec::new(),
            transcript: Vec::new(),
            blueprint: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn history(&self) -> &[QuestionRecord] {
        self.store.history()
    }

    pub fn aggregate(&self) -> &AggregateProfile {
        self.store.current_aggregate()
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn asked(&self) -> &HashSet<String> {
        &self.asked
    }

    pub fn remaining_topics(&self) -> &[String] {
        &self.remaining_topics
    }

    pub fn pending(&self) -> Option<&PresentedQuestion> {
        self.pending.as_ref()
    }

    pub fn was_probed(&self, question_id: &str) -> bool {
        self.probed.contains(question_id)
    }

    pub fn state(&self) -> NextState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == NextState::Done
    }

    pub fn api_calls(&self) -> u32 {
        self.api_calls
    }

    pub fn reactions(&self) -> &[SurfacedReaction] {
        &self.reactions
    }

    pub fn transcript(&self) -> &[PresentedQuestion] {
        &self.transcript
    }

    pub fn blueprint(&self) -> Option<&CareerBlueprint> {
        self.blueprint.as_ref()
    }

    /// The presented question with this id, if it was ever shown.
    pub fn presented(&self, question_id: &str) -> Option<&PresentedQuestion> {
        self.transcript.iter().find(|q| q.id == question_id)
    }

    pub(crate) fn store_mut(&mut self) -> &mut ProfileStore {
        &mut self.store
    }

    /// Mark a question as asked. Answering a generated question also consumes
    /// the script slot it stood in for.
    pub(crate) fn mark_asked(&mut self, question: &PresentedQuestion) {
        self.asked.insert(question.id.clone());
        if let QuestionOrigin::Dynamic {
            slot: Some(ref slot),
            ..
        } = question.origin
        {
            self.asked.insert(slot.clone());
        }
    }

    pub(crate) fn remove_topic(&mut self, topic: &str) {
        self.remaining_topics.retain(|t| t != topic);
    }

    pub(crate) fn present(&mut self, state: NextState, question: Option<PresentedQuestion>) {
        if let Some(QuestionOrigin::FollowUp { parent }) = question.as_ref().map(|q| &q.origin) {
            self.probed.insert(parent.clone());
        }
        if let Some(ref q) = question {
            self.transcript.push(q.clone());
        }
        self.state = state;
        self.pending = question;
    }

    pub(crate) fn count_api_call(&mut self) {
        self.api_calls += 1;
    }

    pub(crate) fn set_blueprint(&mut self, blueprint: CareerBlueprint) {
        self.blueprint = Some(blueprint);
    }

    pub(crate) fn push_reaction(&mut self, after_question: &str, reaction: Reaction) {
        self.reactions.push(SurfacedReaction {
            after_question: after_question.to_string(),
            reaction,
        });
    }
}
