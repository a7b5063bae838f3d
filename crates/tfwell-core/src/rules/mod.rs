pub mod catalog;
pub mod classify;
pub mod eval;
pub mod registry;

pub use catalog::{Pillar, RuleMetadata, Severity};
pub use eval::{CrossResourceRule, Finding, Rule};
pub use registry::Registry;
