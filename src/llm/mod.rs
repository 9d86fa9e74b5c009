//! LLM collaborators: the traits the session depends on, the HTTP client
//! and the prompt-driven implementations.

pub mod blueprint;
pub mod client;
pub mod collaborator;
pub mod extractor;
pub mod generator;
pub mod prompts;

pub use blueprint::LlmBlueprintWriter;
pub use client::LlmClient;
pub use collaborator::{
    BlueprintWriter, InsightExtractor, OfflineCollaborator, QuestionGenerator,
};
pub use extractor::LlmInsightExtractor;
pub use generator::LlmQuestionGenerator;
