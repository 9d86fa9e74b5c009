//! Error taxonomy for the quiz engine.
//!
//! Only [`QuizError::DuplicateQuestion`] ever reaches the caller of a turn.
//! Every other variant comes from an external collaborator and is recovered
//! locally, usually by substituting a default or falling back to the script.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    /// The question was already answered in this session.
    #[error("question '{0}' has already been answered in this session")]
    DuplicateQuestion(String),

    /// The insight extractor failed (transport, timeout, budget, ...).
    #[error("insight extraction failed: {0}")]
    Extraction(String),

    /// The extractor replied, but the payload failed validation.
    #[error("malformed insight: {0}")]
    MalformedInsight(String),

    /// The question generator failed.
    #[error("question generation failed: {0}")]
    Generation(String),

    /// The generator replied, but the question failed validation.
    #[error("malformed generated question: {0}")]
    MalformedQuestion(String),

    /// The blueprint writer failed.
    #[error("blueprint generation failed: {0}")]
    Blueprint(String),

    /// The blueprint writer replied, but the plan failed validation.
    #[error("malformed blueprint: {0}")]
    MalformedBlueprint(String),
}
