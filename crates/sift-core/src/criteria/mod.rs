//! Per-axis filter criteria.
//!
//! A filter constrains items along seven independent axes. Each axis is a sum
//! type with one variant per predicate shape, including an explicit
//! unconstrained variant (`Any`) for every axis except project scope, which
//! always contributes a fragment.
//!
//! Criteria are transient: they are built from a [`FilterSelection`], fed once
//! through [`crate::compile::FilterDialect::compile`], and dropped. Only the compiled query
//! and the raw selection survive on the [`crate::filter::Filter`].

pub mod identifier;
pub mod item_type;
pub mod node;
pub mod project;
pub mod responsible;
pub mod state;
pub mod text;

pub use identifier::IdentifierCriterion;
pub use item_type::TypeCriterion;
pub use node::NodeCriterion;
pub use project::ProjectCriterion;
pub use responsible::ResponsibleCriterion;
pub use state::StateCriterion;
pub use text::TextCriterion;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FilterError;
use crate::model::ItemState;

/// The seven filterable axes, in compilation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Project,
    State,
    Identifier,
    Responsible,
    ItemType,
    Node,
    Text,
}

impl Axis {
    pub const ALL: [Self; 7] = [
        Self::Project,
        Self::State,
        Self::Identifier,
        Self::Responsible,
        Self::ItemType,
        Self::Node,
        Self::Text,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::State => "state",
            Self::Identifier => "identifier",
            Self::Responsible => "responsible",
            Self::ItemType => "type",
            Self::Node => "node",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a user picked on each axis, before validation.
///
/// Empty lists and absent strings mean "unconstrained".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub projects: Vec<String>,
    pub negate_projects: bool,
    pub states: Vec<ItemState>,
    pub negate_states: bool,
    pub item_id: Option<String>,
    pub responsibles: Vec<String>,
    pub negate_responsibles: bool,
    pub item_types: Vec<String>,
    pub negate_item_types: bool,
    pub nodes: Vec<String>,
    pub negate_nodes: bool,
    pub text: Option<String>,
}

/// One resolved criterion per axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub project: ProjectCriterion,
    pub state: StateCriterion,
    pub identifier: IdentifierCriterion,
    pub responsible: ResponsibleCriterion,
    pub item_type: TypeCriterion,
    pub node: NodeCriterion,
    pub text: TextCriterion,
}

impl Criteria {
    /// Criteria that constrain nothing beyond project visibility.
    #[must_use]
    pub const fn unconstrained(project: ProjectCriterion) -> Self {
        Self {
            project,
            state: StateCriterion::Any,
            identifier: IdentifierCriterion::Any,
            responsible: ResponsibleCriterion::Any,
            item_type: TypeCriterion::Any,
            node: NodeCriterion::Any,
            text: TextCriterion::Any,
        }
    }

    /// Resolve every axis of `selection` to exactly one criterion.
    ///
    /// `registered` picks the project scope used when no project was
    /// selected: registered viewers also see their own private projects.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] on the first malformed axis.
    pub fn from_selection(selection: &FilterSelection, registered: bool) -> Result<Self, FilterError> {
        let project = if selection.projects.is_empty() {
            ProjectCriterion::any_for(registered)
        } else {
            ProjectCriterion::selected(&selection.projects, selection.negate_projects)?
        };

        Ok(Self {
            project,
            state: StateCriterion::from_selection(&selection.states, selection.negate_states)?,
            identifier: IdentifierCriterion::from_selection(selection.item_id.as_deref()),
            responsible: ResponsibleCriterion::from_selection(
                &selection.responsibles,
                selection.negate_responsibles,
            )?,
            item_type: TypeCriterion::from_selection(
                &selection.item_types,
                selection.negate_item_types,
            )?,
            node: NodeCriterion::from_selection(&selection.nodes, selection.negate_nodes)?,
            text: TextCriterion::from_selection(selection.text.as_deref()),
        })
    }

    /// The normalized selection these criteria were built from.
    ///
    /// Feeding the result back through [`Criteria::from_selection`] with the
    /// same registration yields criteria equal to `self`.
    #[must_use]
    pub fn selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::default();

        if let ProjectCriterion::Selected {
            project_ids,
            negate,
        } = &self.project
        {
            selection.projects.clone_from(project_ids);
            selection.negate_projects = *negate;
        }
        if let StateCriterion::OneOf { states, negate } = &self.state {
            selection.states.clone_from(states);
            selection.negate_states = *negate;
        }
        if let IdentifierCriterion::Equals(item_id) = &self.identifier {
            selection.item_id = Some(item_id.clone());
        }
        if let ResponsibleCriterion::OneOf {
            responsible_ids,
            negate,
        } = &self.responsible
        {
            selection.responsibles.clone_from(responsible_ids);
            selection.negate_responsibles = *negate;
        }
        if let TypeCriterion::OneOf { titles, negate } = &self.item_type {
            selection.item_types.clone_from(titles);
            selection.negate_item_types = *negate;
        }
        if let NodeCriterion::OneOf { titles, negate } = &self.node {
            selection.nodes.clone_from(titles);
            selection.negate_nodes = *negate;
        }
        if let TextCriterion::Contains(text) = &self.text {
            selection.text = Some(text.clone());
        }

        selection
    }
}

/// Trim every value, reject blanks, and drop duplicates (first one wins).
pub(crate) fn normalize_values<I, S>(axis: Axis, values: I) -> Result<Vec<String>, FilterError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(FilterError::invalid(axis, "blank value in selection"));
        }
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    Ok(out)
}
