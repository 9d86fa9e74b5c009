//! Question routing: the fixed script and the router that walks it.

pub mod router;
pub mod script;

pub use router::{QuestionRouter, RouteOutcome, RoutePlan};
pub use script::{QuizScript, ScriptedQuestion};
