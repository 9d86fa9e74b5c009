//! Profile store and aggregate statistics for one quiz session.

pub mod aggregate;
pub mod store;

pub use aggregate::{AggregateProfile, SentimentTally};
pub use store::ProfileStore;
