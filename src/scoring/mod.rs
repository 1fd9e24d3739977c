pub mod config;
pub mod factors;
pub mod engine;
pub mod validation;

pub use config::*;
pub use factors::Membership;
pub use engine::{calculate_score, FactorContribution, ScoreBreakdown, ScoreResult};
pub use validation::{default_weight_map, validate_scoring};
