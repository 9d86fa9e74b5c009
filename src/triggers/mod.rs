//! Conversational trigger rules and the pattern matcher.

pub mod extras;
pub mod matcher;
pub mod rules;

pub use extras::{encouragement, ProfileKind};
pub use matcher::{MatchContext, PatternMatcher};
pub use rules::{default_rules, TriggerRule};
