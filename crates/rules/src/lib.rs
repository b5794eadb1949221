//! Rule evaluation for the alert routing pipeline.
//!
//! Translates typed conditions plus an alert into match results, applies
//! optional time windows, and walks rules in `(priority ASC, created_at
//! ASC)` order collecting actions until a terminal rule matches.

pub mod condition;
pub mod engine;
pub mod time_window;
pub mod validate;

pub use condition::{ConditionEvaluator, ConditionResult};
pub use engine::{EvaluationOutcome, RuleEngine, RuleEvaluation};
pub use time_window::time_condition_matches;
pub use validate::{ValidationError, validate_rule};
