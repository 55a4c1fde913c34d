//! # Schema Serializer
//!
//! Renders an introspected `SchemaSnapshot` as text for a model prompt.
//!
//! ## Pipeline
//!
//! ```text
//! SchemaSnapshot ──prune(prefix)──▶ PrunedSchema ──canonical()──▶ define text
//!                                               └──compact()────▶ compact text
//! ```
//!
//! Rendering is only available on `PrunedSchema`, so no reserved label can
//! reach either form. Every category is held in a `BTreeSet`, so output is
//! byte-identical for the same tuples regardless of input order or repeats.

use crate::primitives::RESERVED_PREFIX;
use crate::types::{OwnsEdge, PlaysEdge, RelatesEdge, SchemaSnapshot, TypeLabel, TypelineError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which rendering of a schema to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaForm {
    /// Executable `define` query, one statement per line.
    #[default]
    Canonical,
    /// Grouped, token-minimized projection.
    Compact,
}

impl SchemaSnapshot {
    /// Check that no type label is declared twice.
    ///
    /// Entity, attribute and relation labels share one namespace.
    pub fn validate(&self) -> Result<(), TypelineError> {
        let mut seen = BTreeSet::new();
        let categories = [
            ("entity", &self.entities),
            ("attribute", &self.attributes),
            ("relation", &self.relations),
        ];
        for (category, labels) in categories {
            for label in labels {
                if !seen.insert(label.as_str()) {
                    return Err(TypelineError::DuplicateLabel {
                        category,
                        label: label.0.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop every label starting with `prefix`, and every edge touching one.
    #[must_use]
    pub fn prune(self, prefix: &str) -> PrunedSchema {
        let keep = |label: &TypeLabel| !label.is_reserved(prefix);
        PrunedSchema {
            entities: self.entities.into_iter().filter(keep).collect(),
            attributes: self.attributes.into_iter().filter(keep).collect(),
            relations: self.relations.into_iter().filter(keep).collect(),
            owns: self
                .owns
                .into_iter()
                .filter(|e| keep(&e.owner) && keep(&e.attribute))
                .collect(),
            relates: self
                .relates
                .into_iter()
                .filter(|e| keep(&e.relation) && keep(&e.role))
                .collect(),
            plays: self
                .plays
                .into_iter()
                .filter(|e| keep(&e.player) && keep(&e.role))
                .collect(),
        }
    }

    /// `prune` with the built-in reserved prefix.
    #[must_use]
    pub fn prune_reserved(self) -> PrunedSchema {
        self.prune(RESERVED_PREFIX)
    }
}

/// A schema with the reserved namespace removed. The only renderable form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunedSchema {
    entities: BTreeSet<TypeLabel>,
    attributes: BTreeSet<TypeLabel>,
    relations: BTreeSet<TypeLabel>,
    owns: BTreeSet<OwnsEdge>,
    relates: BTreeSet<RelatesEdge>,
    plays: BTreeSet<PlaysEdge>,
}

impl PrunedSchema {
    /// Render in the requested form.
    #[must_use]
    pub fn render(&self, form: SchemaForm) -> String {
        match form {
            SchemaForm::Canonical => self.canonical(),
            SchemaForm::Compact => self.compact(),
        }
    }

    /// Number of type labels that survived pruning.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.entities.len() + self.attributes.len() + self.relations.len()
    }

    /// `define` followed by one statement per element.
    ///
    /// Category order: entities, attributes, relations, owns, relates, plays.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut lines = vec!["define".to_string()];
        lines.extend(self.entities.iter().map(|l| format!("entity {l};")));
        lines.extend(self.attributes.iter().map(|l| format!("attribute {l};")));
        lines.extend(self.relations.iter().map(|l| format!("relation {l};")));
        lines.extend(
            self.owns
                .iter()
                .map(|e| format!("{} owns {};", e.owner, e.attribute)),
        );
        lines.extend(
            self.relates
                .iter()
                .map(|e| format!("{} relates {};", e.relation, e.role)),
        );
        lines.extend(
            self.plays
                .iter()
                .map(|e| format!("{} plays {};", e.player, e.role)),
        );
        lines.join("\n")
    }

    /// Grouped projection:
    ///
    /// ```text
    /// $var isa city | parentage | person;
    /// # Has
    /// person has age | name;
    ///
    /// # Links
    /// parentage links (child: person, parent: person);
    /// ```
    #[must_use]
    pub fn compact(&self) -> String {
        let mut owns_by_owner: BTreeMap<&TypeLabel, BTreeSet<&TypeLabel>> = BTreeMap::new();
        for e in &self.owns {
            owns_by_owner.entry(&e.owner).or_default().insert(&e.attribute);
        }
        let mut roles_by_relation: BTreeMap<&TypeLabel, BTreeSet<&TypeLabel>> = BTreeMap::new();
        for e in &self.relates {
            roles_by_relation.entry(&e.relation).or_default().insert(&e.role);
        }
        // Roles are unscoped, so players are pooled per role name.
        let mut players_by_role: BTreeMap<&TypeLabel, BTreeSet<&TypeLabel>> = BTreeMap::new();
        for e in &self.plays {
            players_by_role.entry(&e.role).or_default().insert(&e.player);
        }

        let things: BTreeSet<&TypeLabel> = self.entities.iter().chain(&self.relations).collect();

        let has: Vec<String> = things
            .iter()
            .filter_map(|owner| {
                owns_by_owner
                    .get(owner)
                    .map(|attrs| format!("{owner} has {};", join(attrs)))
            })
            .collect();

        let links: Vec<String> = self
            .relations
            .iter()
            .filter_map(|relation| {
                let roles = roles_by_relation.get(relation)?;
                let clauses: Vec<String> = roles
                    .iter()
                    .map(|role| match players_by_role.get(role) {
                        Some(players) => format!("{role}: {}", join(players)),
                        None => role.to_string(),
                    })
                    .collect();
                Some(format!("{relation} links ({});", clauses.join(", ")))
            })
            .collect();

        let mut sections = Vec::new();
        if !things.is_empty() {
            sections.push(format!("$var isa {};", join(&things)));
        }
        if !has.is_empty() {
            sections.push(format!("# Has\n{}\n", has.join("\n")));
        }
        if !links.is_empty() {
            sections.push(format!("# Links\n{}", links.join("\n")));
        }
        sections.join("\n").trim_end().to_string()
    }
}

fn join(labels: &BTreeSet<&TypeLabel>) -> String {
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(" | ")
}

// =============================================================================
// TESTS
// =============================================================================
