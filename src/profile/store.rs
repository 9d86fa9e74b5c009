//! Per-session store of answered questions.

use super::aggregate::AggregateProfile;
use crate::error::QuizError;
use crate::models::{Insight, QuestionRecord, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Answer records plus the aggregate derived from them.
///
/// The aggregate is extended as records arrive and always equals
/// `AggregateProfile::fold(self.history())`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    records: Vec<QuestionRecord>,
    #[serde(skip)]
    ids: HashSet<String>,
    aggregate: AggregateProfile,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer. A question may be answered at most once per session.
    pub fn record_answer(
        &mut self,
        question_id: &str,
        response: Response,
        insight: Insight,
    ) -> Result<&QuestionRecord, QuizError> {
        if self.contains(question_id) {
            return Err(QuizError::DuplicateQuestion(question_id.to_string()));
        }

        self.aggregate.extend(&insight);
        self.ids.insert(question_id.to_string());
        self.records.push(QuestionRecord {
            question_id: question_id.to_string(),
            response,
            insight,
            timestamp: Utc::now(),
        });

        debug!(
            "Recorded answer for {} ({} total)",
            question_id,
            self.records.len()
        );

        Ok(&self.records[self.records.len() - 1])
    }

    pub fn contains(&self, question_id: &str) -> bool {
        // `ids` is not serialized, so fall back to a scan after a reload
        self.ids.contains(question_id) || self.records.iter().any(|r| r.question_id == question_id)
    }

    pub fn current_aggregate(&self) -> &AggregateProfile {
        &self.aggregate
    }

    /// Answered questions in arrival order.
    pub fn history(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&QuestionRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgramFit;

    fn insight_with_theme(theme: &str) -> Insight {
        Insight {
            key_themes: vec![theme.to_string()],
            program_fit: ProgramFit {
                recommended_programs: vec!["Business Administration".to_string()],
                fit_score: 72,
            },
            ..Insight::neutral()
        }
    }

    #[test]
    fn test_record_answer() {
        let mut store = ProfileStore::new();
        let record = store
            .record_answer("q1", Response::from("Master's Degree"), insight_with_theme("ambition"))
            .unwrap();

        assert_eq!(record.question_id, "q1");
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_aggregate().themes, vec!["ambition"]);
    }

    #[test]
    fn test_duplicate_is_rejected_and_history_unchanged() {
        let mut store = ProfileStore::new();
        store
            .record_answer("q1", Response::from("Executive"), insight_with_theme("ambition"))
            .unwrap();
        let before = store.current_aggregate().clone();

        let err = store
            .record_answer("q1", Response::from("Entry level"), insight_with_theme("caution"))
            .unwrap_err();

        assert!(matches!(err, QuizError::DuplicateQuestion(id) if id == "q1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.history()[0].response, Response::from("Executive"));
        assert_eq!(store.current_aggregate(), &before);
    }

    #[test]
    fn test_aggregate_equals_fold_of_history() {
        let mut store = ProfileStore::new();
        for (i, theme) in ["ambition", "family", "ambition", "stability"].iter().enumerate() {
            store
                .record_answer(&format!("q{}", i), Response::from("x"), insight_with_theme(theme))
                .unwrap();

            assert_eq!(
                store.current_aggregate(),
                &AggregateProfile::fold(store.history())
            );
        }

        assert_eq!(store.current_aggregate().theme_count("ambition"), 2);
        assert_eq!(
            store.current_aggregate().program_count("Business Administration"),
            4
        );
    }

    #[test]
    fn test_history_preserves_order() {
        let mut store = ProfileStore::new();
        for id in ["q3", "q1", "q2"] {
            store
                .record_answer(id, Response::from("x"), Insight::neutral())
                .unwrap();
        }
        let ids: Vec<_> = store.history().iter().map(|r| r.question_id.as_str()).collect();
        assert_eq!(ids, vec!["q3", "q1", "q2"]);
        assert_eq!(store.last().map(|r| r.question_id.as_str()), Some("q2"));
    }

    #[test]
    fn test_contains_after_serde_round_trip() {
        let mut store = ProfileStore::new();
        store
            .record_answer("q1", Response::from("x"), Insight::neutral())
            .unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let mut restored: ProfileStore = serde_json::from_str(&json).unwrap();

        assert!(restored.contains("q1"));
        assert!(restored
            .record_answer("q1", Response::from("y"), Insight::neutral())
            .is_err());
    }
}
