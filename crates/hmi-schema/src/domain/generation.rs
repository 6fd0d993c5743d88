//! Immutable alias tables
//!
//! A `Generation` is built once from a `RuleSet` and never edited; the
//! registry replaces it wholesale.

use std::collections::{BTreeMap, HashMap};

use hmi_types::{TypeId, UNRESOLVED_DISPLAY};
use serde::{Deserialize, Serialize};

use super::rules::RuleSet;

/// Outcome of resolving one canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Value(String),
    Unresolved,
}

impl Resolution {
    /// The value, or `"N/A"` when unresolved.
    #[must_use]
    pub fn display(&self) -> &str {
        match self {
            Self::Value(value) => value,
            Self::Unresolved => UNRESOLVED_DISPLAY,
        }
    }

    #[must_use]
    pub fn as_option(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unresolved => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// A canonical message category reachable through one or more type ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    type_ids: Vec<TypeId>,
    aliases: BTreeMap<String, Vec<String>>,
}

impl Category {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_ids(&self) -> &[TypeId] {
        &self.type_ids
    }

    /// Concrete keys for `canonical`, newest first.
    #[must_use]
    pub fn aliases(&self, canonical: &str) -> Option<&[String]> {
        self.aliases.get(canonical).map(Vec::as_slice)
    }

    /// Canonical names in sorted order.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    fn resolve(&self, fields: &BTreeMap<String, String>, canonical: &str) -> Option<Resolution> {
        let keys = self.aliases.get(canonical)?;
        let value = keys.iter().find_map(|key| fields.get(key));
        Some(value.map_or(Resolution::Unresolved, |v| Resolution::Value(v.clone())))
    }
}

/// One complete, immutable snapshot of the alias tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    number: u64,
    categories: BTreeMap<String, Category>,
    by_type_id: HashMap<TypeId, String>,
}

impl Generation {
    /// Freeze a validated rule set under `number`.
    #[must_use]
    pub fn new(number: u64, rules: RuleSet) -> Self {
        let mut categories = BTreeMap::new();
        let mut by_type_id = HashMap::new();

        for rule in rules.categories {
            for type_id in &rule.type_ids {
                by_type_id.insert(*type_id, rule.name.clone());
            }
            categories.insert(
                rule.name.clone(),
                Category {
                    name: rule.name,
                    type_ids: rule.type_ids,
                    aliases: rule.aliases,
                },
            );
        }

        Self {
            number,
            categories,
            by_type_id,
        }
    }

    /// Monotonic generation number within one registry.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    #[must_use]
    pub fn category_for(&self, type_id: TypeId) -> Option<&Category> {
        self.by_type_id
            .get(&type_id)
            .and_then(|name| self.categories.get(name))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Resolve `canonical` for a message of `type_id`.
    ///
    /// When the type id is unmapped, or its category does not define
    /// `canonical`, the canonical name itself is looked up as a key.
    #[must_use]
    pub fn resolve(
        &self,
        type_id: TypeId,
        fields: &BTreeMap<String, String>,
        canonical: &str,
    ) -> Resolution {
        self.category_for(type_id)
            .and_then(|category| category.resolve(fields, canonical))
            .unwrap_or_else(|| {
                fields
                    .get(canonical)
                    .map_or(Resolution::Unresolved, |v| Resolution::Value(v.clone()))
            })
    }

    /// Every canonical field of the message's category, resolved.
    ///
    /// Empty for type ids no category claims.
    #[must_use]
    pub fn resolve_all(
        &self,
        type_id: TypeId,
        fields: &BTreeMap<String, String>,
    ) -> BTreeMap<String, Resolution> {
        let Some(category) = self.category_for(type_id) else {
            return BTreeMap::new();
        };
        category
            .aliases
            .keys()
            .map(|canonical| {
                let resolution = category
                    .resolve(fields, canonical)
                    .unwrap_or(Resolution::Unresolved);
                (canonical.clone(), resolution)
            })
            .collect()
    }
}
