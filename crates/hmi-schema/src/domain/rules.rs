//! Rule document parser
//!
//! # Grammar
//!
//! ```text
//! # comment until end of line
//! category <name> <type_id> [<type_id> ...]
//! alias <category> <CANONICAL> <newest_key> [<older_key> ...]
//! ```
//!
//! An `alias` line may come before the `category` it names; references are
//! checked once every line has been read. The first problem found aborts the
//! whole document.

use std::collections::{BTreeMap, HashMap, HashSet};

use hmi_types::TypeId;

use crate::error::ReloadError;

/// A parsed category before it is frozen into a `Generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    pub type_ids: Vec<TypeId>,
    /// canonical name → concrete keys, newest first
    pub aliases: BTreeMap<String, Vec<String>>,
}

/// A complete, validated rule document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    pub categories: Vec<CategoryRule>,
}

struct AliasLine<'a> {
    line: usize,
    category: &'a str,
    canonical: &'a str,
    keys: Vec<&'a str>,
}

/// Parse and validate a rule document.
pub fn parse_rules(source: &str) -> Result<RuleSet, ReloadError> {
    let mut categories: Vec<CategoryRule> = Vec::new();
    let mut category_index: HashMap<&str, usize> = HashMap::new();
    let mut claimed: HashMap<TypeId, &str> = HashMap::new();
    let mut alias_lines = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.split('#').next().unwrap_or_default();
        let mut tokens = content.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };

        match directive {
            "category" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| ReloadError::at(line, "category without a name"))?;
                if category_index.contains_key(name) {
                    return Err(ReloadError::at(line, format!("duplicate category '{name}'")));
                }

                let mut type_ids = Vec::new();
                for token in tokens {
                    let type_id: TypeId = token.parse().map_err(|_| {
                        ReloadError::at(line, format!("invalid type id '{token}'"))
                    })?;
                    if let Some(owner) = claimed.insert(type_id, name) {
                        return Err(ReloadError::at(
                            line,
                            format!("type id {type_id} already mapped to category '{owner}'"),
                        ));
                    }
                    type_ids.push(type_id);
                }
                if type_ids.is_empty() {
                    return Err(ReloadError::at(
                        line,
                        format!("category '{name}' has no type ids"),
                    ));
                }

                category_index.insert(name, categories.len());
                categories.push(CategoryRule {
                    name: name.to_string(),
                    type_ids,
                    aliases: BTreeMap::new(),
                });
            }
            "alias" => {
                let (Some(category), Some(canonical)) = (tokens.next(), tokens.next()) else {
                    return Err(ReloadError::at(
                        line,
                        "alias needs a category and a canonical name",
                    ));
                };
                let keys: Vec<&str> = tokens.collect();
                if keys.is_empty() {
                    return Err(ReloadError::at(
                        line,
                        format!("alias '{canonical}' lists no keys"),
                    ));
                }
                alias_lines.push(AliasLine {
                    line,
                    category,
                    canonical,
                    keys,
                });
            }
            other => {
                return Err(ReloadError::at(line, format!("unknown directive '{other}'")));
            }
        }
    }

    for alias in alias_lines {
        let Some(&index) = category_index.get(alias.category) else {
            return Err(ReloadError::at(
                alias.line,
                format!("alias refers to undeclared category '{}'", alias.category),
            ));
        };

        let mut seen = HashSet::new();
        if let Some(dup) = alias.keys.iter().find(|key| !seen.insert(**key)) {
            return Err(ReloadError::at(
                alias.line,
                format!("key '{dup}' listed twice for '{}'", alias.canonical),
            ));
        }

        let category = &mut categories[index];
        if category.aliases.contains_key(alias.canonical) {
            return Err(ReloadError::at(
                alias.line,
                format!(
                    "canonical '{}' already defined in category '{}'",
                    alias.canonical, alias.category
                ),
            ));
        }
        category.aliases.insert(
            alias.canonical.to_string(),
            alias.keys.into_iter().map(str::to_string).collect(),
        );
    }

    if categories.is_empty() {
        return Err(ReloadError::at(0, "document defines no categories"));
    }

    Ok(RuleSet { categories })
}
