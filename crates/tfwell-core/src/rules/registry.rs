//! Catalogue of available rules.
//!
//! There is no global registry. Each check package exposes pure
//! `rules()` / `cross_rules()` functions and the top-level assembly feeds them
//! into a [`Registry`], which is then handed to the engine.

use std::sync::Arc;

use crate::rules::eval::{CrossResourceRule, Rule};

/// Append-only collection of single-resource and cross-resource rules.
#[derive(Default, Clone)]
pub struct Registry {
    rules: Vec<Arc<dyn Rule>>,
    cross_rules: Vec<Arc<dyn CrossResourceRule>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn register_cross(&mut self, rule: Arc<dyn CrossResourceRule>) -> &mut Self {
        self.cross_rules.push(rule);
        self
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    pub fn extend_cross(
        &mut self,
        rules: impl IntoIterator<Item = Arc<dyn CrossResourceRule>>,
    ) -> &mut Self {
        self.cross_rules.extend(rules);
        self
    }

    /// Single-resource rules in registration order.
    pub fn all_rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    /// Cross-resource rules in registration order.
    pub fn all_cross_rules(&self) -> &[Arc<dyn CrossResourceRule>] {
        &self.cross_rules
    }

    pub fn len(&self) -> usize {
        self.rules.len() + self.cross_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "rules",
                &self.rules.iter().map(|r| &r.metadata().id).collect::<Vec<_>>(),
            )
            .field(
                "cross_rules",
                &self
                    .cross_rules
                    .iter()
                    .map(|r| &r.metadata().id)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
