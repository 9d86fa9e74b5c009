//! Collaborator interfaces used by the session aggregator.
//!
//! The aggregator depends on these contracts only. Failures are always
//! recovered by the caller: a neutral insight for extraction, the fixed
//! script for generation, no blueprint in the report.

use crate::error::QuizError;
use crate::models::{CareerBlueprint, GeneratedQuestion, Insight, QuestionRecord};
use crate::profile::AggregateProfile;
use async_trait::async_trait;
use std::collections::HashSet;

/// Turns one raw answer into a structured insight.
#[async_trait]
pub trait InsightExtractor: Send + Sync {
    async fn extract(
        &self,
        question_text: &str,
        response: &str,
        profile: &AggregateProfile,
    ) -> Result<Insight, QuizError>;
}

/// Produces a tailored next question on demand.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// `Ok(None)` means the generator had nothing to offer.
    async fn generate(
        &self,
        profile: &AggregateProfile,
        asked_ids: &HashSet<String>,
        remaining_topics: &[String],
    ) -> Result<Option<GeneratedQuestion>, QuizError>;
}

/// Writes the closing career plan from a finished session.
#[async_trait]
pub trait BlueprintWriter: Send + Sync {
    async fn write(
        &self,
        profile: &AggregateProfile,
        history: &[QuestionRecord],
    ) -> Result<CareerBlueprint, QuizError>;
}

/// Collaborator used when LLM features are off. Every call fails, so the
/// quiz runs on neutral insights and the fixed script.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCollaborator;

#[async_trait]
impl InsightExtractor for OfflineCollaborator {
    async fn extract(
        &self,
        _question_text: &str,
        _response: &str,
        _profile: &AggregateProfile,
    ) -> Result<Insight, QuizError> {
        Err(QuizError::Extraction("LLM features are disabled".to_string()))
    }
}

#[async_trait]
impl QuestionGenerator for OfflineCollaborator {
    async fn generate(
        &self,
        _profile: &AggregateProfile,
        _asked_ids: &HashSet<String>,
        _remaining_topics: &[String],
    ) -> Result<Option<GeneratedQuestion>, QuizError> {
        Err(QuizError::Generation("LLM features are disabled".to_string()))
    }
}

#[async_trait]
impl BlueprintWriter for OfflineCollaborator {
    async fn write(
        &self,
        _profile: &AggregateProfile,
        _history: &[QuestionRecord],
    ) -> Result<CareerBlueprint, QuizError> {
        Err(QuizError::Blueprint("LLM features are disabled".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_collaborator_always_fails() {
        let offline = OfflineCollaborator;
        let profile = AggregateProfile::default();

        let insight = tokio_test::block_on(offline.extract("q", "a", &profile));
        assert!(matches!(insight, Err(QuizError::Extraction(_))));

        let question = tokio_test::block_on(offline.generate(&profile, &HashSet::new(), &[]));
        assert!(matches!(question, Err(QuizError::Generation(_))));

        let blueprint = tokio_test::block_on(offline.write(&profile, &[]));
        assert!(matches!(blueprint, Err(QuizError::Blueprint(_))));
    }
}
