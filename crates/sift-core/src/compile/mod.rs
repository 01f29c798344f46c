//! Compilation of criteria into a single reusable query fragment.
//!
//! A [`FilterDialect`] knows how to render each concrete criterion variant in
//! one backend's query language. [`FilterDialect::compile`] assembles the
//! fragments in a fixed order:
//!
//! ```text
//!  " WHERE " project state identifier responsible type node text
//! ```
//!
//! The project fragment is never empty. Every later fragment is either empty
//! (unconstrained axis) or a self-delimiting `" AND (...)"` continuation, so
//! the concatenation is always well formed.

pub mod sqlite;

pub use sqlite::SqliteDialect;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::criteria::Criteria;
use crate::model::ItemState;

/// Literal prefix of every compiled query.
pub const WHERE_PREFIX: &str = " WHERE ";

/// Deferred parameter standing for the requester's accessible projects.
///
/// Present in a compiled query exactly when the project scope is
/// [`crate::criteria::ProjectCriterion::RegisteredUser`]. The execution layer
/// binds it; it is never substituted as text.
pub const PROJECTS_PLACEHOLDER: &str = "$projects";

/// Renders criteria in one backend's query language.
pub trait FilterDialect {
    /// Explicitly selected project ids, optionally negated.
    fn project_for_selected(&self, project_ids: &[String], negate: bool) -> String;

    /// Public projects plus the requester's projects, via [`PROJECTS_PLACEHOLDER`].
    fn project_for_registered_user(&self) -> String;

    /// Public projects only.
    fn project_for_unregistered_user(&self) -> String;

    fn state_in(&self, states: &[ItemState], negate: bool) -> String;

    fn identifier_equals(&self, item_id: &str) -> String;

    fn responsible_in(&self, responsible_ids: &[String], negate: bool) -> String;

    fn type_in(&self, titles: &[String], negate: bool) -> String;

    fn node_in(&self, titles: &[String], negate: bool) -> String;

    fn text_contains(&self, text: &str) -> String;

    /// Assemble all seven fragments into one compiled query.
    fn compile(&self, criteria: &Criteria) -> CompiledQuery {
        let mut query = String::from(WHERE_PREFIX);
        query.push_str(&criteria.project.fragment(self));
        query.push_str(&criteria.state.fragment(self));
        query.push_str(&criteria.identifier.fragment(self));
        query.push_str(&criteria.responsible.fragment(self));
        query.push_str(&criteria.item_type.fragment(self));
        query.push_str(&criteria.node.fragment(self));
        query.push_str(&criteria.text.fragment(self));

        tracing::debug!(len = query.len(), "compiled filter query");
        CompiledQuery(query)
    }
}

/// A compiled filter predicate, ready to append to the base item query.
///
/// Opaque to callers; produced once when a filter is created or edited and
/// reused verbatim on every execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompiledQuery(String);

impl CompiledQuery {
    /// Wrap text previously produced by a dialect (e.g. loaded from storage).
    #[must_use]
    pub const fn from_stored(text: String) -> Self {
        Self(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether execution must bind the requester's projects.
    ///
    /// Only a parameter counts: `$projects` typed into a quoted literal (for
    /// example free text) does not.
    #[must_use]
    pub fn defers_projects(&self) -> bool {
        self.parameter_occurrences(PROJECTS_PLACEHOLDER) > 0
    }

    /// Occurrences of `name` outside single-quoted literals.
    #[must_use]
    pub fn parameter_occurrences(&self, name: &str) -> usize {
        let mut count = 0;
        let mut in_literal = false;
        let mut rest = self.0.as_str();
        while let Some(ch) = rest.chars().next() {
            if ch == '\'' {
                // A doubled quote inside a literal toggles twice.
                in_literal = !in_literal;
            } else if !in_literal && rest.starts_with(name) {
                count += 1;
                rest = &rest[name.len()..];
                continue;
            }
            rest = &rest[ch.len_utf8()..];
        }
        count
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
