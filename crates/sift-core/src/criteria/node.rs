//! Workflow position: the title of the node an item currently sits on.

use super::{Axis, normalize_values};
use crate::compile::FilterDialect;
use crate::error::FilterError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeCriterion {
    /// No constraint on workflow position.
    #[default]
    Any,
    OneOf { titles: Vec<String>, negate: bool },
}

impl NodeCriterion {
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] if `titles` is empty or has a
    /// blank title.
    pub fn one_of<I, S>(titles: I, negate: bool) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let titles = normalize_values(Axis::Node, titles)?;
        if titles.is_empty() {
            return Err(FilterError::invalid(
                Axis::Node,
                "a concrete node criterion needs at least one node title",
            ));
        }
        Ok(Self::OneOf { titles, negate })
    }

    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] for blank titles.
    pub fn from_selection(titles: &[String], negate: bool) -> Result<Self, FilterError> {
        if titles.is_empty() {
            Ok(Self::Any)
        } else {
            Self::one_of(titles, negate)
        }
    }

    pub fn fragment<D: FilterDialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Self::Any => String::new(),
            Self::OneOf { titles, negate } => dialect.node_in(titles, *negate),
        }
    }
}
