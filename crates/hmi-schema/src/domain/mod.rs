//! Domain Layer
//!
//! Pure schema logic: parsing, the immutable alias table and resolution.
//! Nothing here locks or logs.

pub mod defaults;
pub mod generation;
pub mod rules;

pub use defaults::DEFAULT_RULES;
pub use generation::{Category, Generation, Resolution};
pub use rules::{parse_rules, CategoryRule, RuleSet};
