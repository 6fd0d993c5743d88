//! Live schema generation pointer.
//!
//! The write lock is held only for the pointer swap. Readers clone the
//! `Arc<Generation>` and resolve against that snapshot without any lock, so
//! they always see one complete generation.

use std::collections::BTreeMap;
use std::sync::Arc;

use hmi_telemetry::metrics::SCHEMA_RELOADS;
use hmi_types::TypeId;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::{parse_rules, Generation, Resolution, RuleSet, DEFAULT_RULES};
use crate::error::ReloadError;

/// Owner of the current generation. `reload` is its only mutation.
#[derive(Debug)]
pub struct SchemaRegistry {
    current: RwLock<Arc<Generation>>,
}

impl SchemaRegistry {
    /// Registry serving `rules` as generation 1.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::new(1, rules))),
        }
    }

    pub fn from_rules(source: &str) -> Result<Self, ReloadError> {
        parse_rules(source).map(Self::new)
    }

    /// Registry serving the built-in rule set.
    pub fn with_default_rules() -> Result<Self, ReloadError> {
        Self::from_rules(DEFAULT_RULES)
    }

    /// Snapshot of the generation active right now.
    #[must_use]
    pub fn current(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    #[must_use]
    pub fn generation_number(&self) -> u64 {
        self.current.read().number()
    }

    #[must_use]
    pub fn resolve(
        &self,
        type_id: TypeId,
        fields: &BTreeMap<String, String>,
        canonical: &str,
    ) -> Resolution {
        self.current().resolve(type_id, fields, canonical)
    }

    #[must_use]
    pub fn resolve_all(
        &self,
        type_id: TypeId,
        fields: &BTreeMap<String, String>,
    ) -> BTreeMap<String, Resolution> {
        self.current().resolve_all(type_id, fields)
    }

    /// Replace the alias tables with the ones parsed from `source`.
    ///
    /// Returns the new generation number. On error the previous generation
    /// keeps serving.
    pub fn reload(&self, source: &str) -> Result<u64, ReloadError> {
        let rules = match parse_rules(source) {
            Ok(rules) => rules,
            Err(e) => {
                SCHEMA_RELOADS.with_label_values(&["rejected"]).inc();
                warn!(
                    error = %e,
                    generation = self.generation_number(),
                    "Schema reload rejected, previous generation still active"
                );
                return Err(e);
            }
        };

        let number = {
            let mut current = self.current.write();
            let number = current.number() + 1;
            *current = Arc::new(Generation::new(number, rules));
            number
        };

        SCHEMA_RELOADS.with_label_values(&["applied"]).inc();
        info!(generation = number, "Schema generation swapped");
        Ok(number)
    }
}

/// Read-only handle to a registry, handed to client sessions.
#[derive(Debug, Clone)]
pub struct SchemaView {
    registry: Arc<SchemaRegistry>,
}

impl SchemaView {
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn current(&self) -> Arc<Generation> {
        self.registry.current()
    }

    #[must_use]
    pub fn generation_number(&self) -> u64 {
        self.registry.generation_number()
    }

    #[must_use]
    pub fn resolve(
        &self,
        type_id: TypeId,
        fields: &BTreeMap<String, String>,
        canonical: &str,
    ) -> Resolution {
        self.registry.resolve(type_id, fields, canonical)
    }

    #[must_use]
    pub fn resolve_all(
        &self,
        type_id: TypeId,
        fields: &BTreeMap<String, String>,
    ) -> BTreeMap<String, Resolution> {
        self.registry.resolve_all(type_id, fields)
    }
}
