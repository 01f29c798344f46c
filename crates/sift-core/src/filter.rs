//! The persisted filter aggregate.
//!
//! A [`Filter`] keeps two independent views of the user's criteria:
//!
//! - `compiled_query`: the assembled fragment, computed once when the filter is
//!   created or edited and reused verbatim on every execution;
//! - the raw selections and negation flags, so the criteria can be redisplayed
//!   or rebuilt for editing without keeping criterion objects around.
//!
//! Both are written together by [`Filter::apply`], and only after every axis
//! has been validated and compiled.

use serde::{Deserialize, Serialize};

use crate::compile::{CompiledQuery, FilterDialect};
use crate::criteria::{Axis, Criteria, FilterSelection};
use crate::error::FilterError;
use crate::model::ItemState;

/// Prefix of every generated filter id.
pub const FILTER_ID_PREFIX: &str = "flt-";

/// Per-axis textual encoding of what the user picked.
///
/// List axes hold a JSON array of strings (`[]` when unconstrained); identifier
/// and text hold the literal value (empty when unconstrained).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSelections {
    pub project: String,
    pub state: String,
    pub identifier: String,
    pub responsible: String,
    pub item_type: String,
    pub node: String,
    pub text: String,
}

impl Default for RawSelections {
    fn default() -> Self {
        Self {
            project: "[]".to_string(),
            state: "[]".to_string(),
            identifier: String::new(),
            responsible: "[]".to_string(),
            item_type: "[]".to_string(),
            node: "[]".to_string(),
            text: String::new(),
        }
    }
}

impl RawSelections {
    fn encode(selection: &FilterSelection) -> Self {
        let states: Vec<&str> = selection.states.iter().map(|s| s.as_str()).collect();
        Self {
            project: encode_list(&selection.projects),
            state: encode_list(&states),
            identifier: selection.item_id.clone().unwrap_or_default(),
            responsible: encode_list(&selection.responsibles),
            item_type: encode_list(&selection.item_types),
            node: encode_list(&selection.nodes),
            text: selection.text.clone().unwrap_or_default(),
        }
    }

    fn decode(&self, negate: Negations) -> Result<FilterSelection, FilterError> {
        let states = decode_list(Axis::State, &self.state)?
            .iter()
            .map(|name| {
                name.parse::<ItemState>().map_err(|err| FilterError::CorruptSelection {
                    axis: Axis::State,
                    source: serde::de::Error::custom(err),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FilterSelection {
            projects: decode_list(Axis::Project, &self.project)?,
            negate_projects: negate.project,
            states,
            negate_states: negate.state,
            item_id: non_empty(&self.identifier),
            responsibles: decode_list(Axis::Responsible, &self.responsible)?,
            negate_responsibles: negate.responsible,
            item_types: decode_list(Axis::ItemType, &self.item_type)?,
            negate_item_types: negate.item_type,
            nodes: decode_list(Axis::Node, &self.node)?,
            negate_nodes: negate.node,
            text: non_empty(&self.text),
        })
    }
}

/// Negation flags for the axes that support negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Negations {
    pub project: bool,
    pub state: bool,
    pub responsible: bool,
    pub item_type: bool,
    pub node: bool,
}

impl Negations {
    const fn of(selection: &FilterSelection) -> Self {
        Self {
            project: selection.negate_projects,
            state: selection.negate_states,
            responsible: selection.negate_responsibles,
            item_type: selection.negate_item_types,
            node: selection.negate_nodes,
        }
    }
}

/// A saved (or ad-hoc) item filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    /// Owning user; `None` for an ad-hoc filter built by an anonymous viewer.
    pub owner: Option<String>,
    pub name: String,
    pub favorite: bool,
    pub compiled_query: CompiledQuery,
    pub raw: RawSelections,
    pub negate: Negations,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl Filter {
    /// Create and compile a new filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::BlankName`] for a blank name and
    /// [`FilterError::InvalidSelection`] if any axis is malformed.
    pub fn create<D: FilterDialect + ?Sized>(
        owner: Option<&str>,
        name: &str,
        selection: &FilterSelection,
        dialect: &D,
    ) -> Result<Self, FilterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FilterError::BlankName);
        }
        let criteria = Criteria::from_selection(selection, owner.is_some())?;
        let now_us = chrono::Utc::now().timestamp_micros();

        let mut filter = Self {
            id: generate_filter_id(owner, name, now_us),
            owner: owner.map(ToString::to_string),
            name: name.to_string(),
            favorite: false,
            compiled_query: CompiledQuery::default(),
            raw: RawSelections::default(),
            negate: Negations::default(),
            created_at_us: now_us,
            updated_at_us: now_us,
        };
        filter.store_compiled(&criteria, dialect);

        tracing::debug!(filter_id = %filter.id, name = %filter.name, "created filter");
        Ok(filter)
    }

    /// Recompile this filter from a re-submitted selection.
    ///
    /// The submission is authoritative; the stored raw selections are not
    /// consulted. On error the filter is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] if any axis is malformed.
    pub fn apply<D: FilterDialect + ?Sized>(
        &mut self,
        selection: &FilterSelection,
        dialect: &D,
    ) -> Result<(), FilterError> {
        let criteria = Criteria::from_selection(selection, self.is_owned())?;
        self.store_compiled(&criteria, dialect);
        self.updated_at_us = chrono::Utc::now().timestamp_micros();

        tracing::debug!(filter_id = %self.id, "recompiled filter");
        Ok(())
    }

    /// Decode the raw selections back into what the user picked.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::CorruptSelection`] if a stored field is not a
    /// valid encoding.
    pub fn selection(&self) -> Result<FilterSelection, FilterError> {
        self.raw.decode(self.negate)
    }

    /// Rebuild the criteria this filter was compiled from.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::CorruptSelection`] or
    /// [`FilterError::InvalidSelection`] if the stored fields were tampered with.
    pub fn criteria(&self) -> Result<Criteria, FilterError> {
        Criteria::from_selection(&self.selection()?, self.is_owned())
    }

    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    fn store_compiled<D: FilterDialect + ?Sized>(&mut self, criteria: &Criteria, dialect: &D) {
        let compiled_query = dialect.compile(criteria);
        let normalized = criteria.selection();

        self.compiled_query = compiled_query;
        self.raw = RawSelections::encode(&normalized);
        self.negate = Negations::of(&normalized);
    }
}

/// Derive a fresh, hard-to-collide filter id: `flt-` + 12 hex chars of a
/// BLAKE3 digest over owner, name, timestamp and a random nonce.
#[must_use]
pub fn generate_filter_id(owner: Option<&str>, name: &str, now_us: i64) -> String {
    let nonce: u64 = rand::random();

    let mut hasher = blake3::Hasher::new();
    hasher.update(owner.unwrap_or_default().as_bytes());
    hasher.update(&[0]);
    hasher.update(name.as_bytes());
    hasher.update(&[0]);
    hasher.update(&now_us.to_le_bytes());
    hasher.update(&nonce.to_le_bytes());
    let digest = hasher.finalize();

    let hex = digest.to_hex();
    format!("{FILTER_ID_PREFIX}{}", &hex[..12])
}

fn encode_list<S: Serialize>(values: &[S]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn decode_list(axis: Axis, raw: &str) -> Result<Vec<String>, FilterError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|source| FilterError::CorruptSelection { axis, source })
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
