//! Lifecycle state criterion.

use super::Axis;
use crate::compile::FilterDialect;
use crate::error::FilterError;
use crate::model::ItemState;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StateCriterion {
    /// No constraint on state.
    #[default]
    Any,
    /// Item state must (or, negated, must not) be one of `states`.
    OneOf {
        states: Vec<ItemState>,
        negate: bool,
    },
}

impl StateCriterion {
    /// Build a concrete state criterion.
    ///
    /// Duplicate states are dropped, keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] if `states` is empty; use
    /// [`StateCriterion::Any`] for an unconstrained axis.
    pub fn one_of<I>(states: I, negate: bool) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = ItemState>,
    {
        let mut unique: Vec<ItemState> = Vec::new();
        for state in states {
            if !unique.contains(&state) {
                unique.push(state);
            }
        }
        if unique.is_empty() {
            return Err(FilterError::invalid(
                Axis::State,
                "a concrete state criterion needs at least one state",
            ));
        }
        Ok(Self::OneOf {
            states: unique,
            negate,
        })
    }

    /// Empty selection means "any state".
    ///
    /// # Errors
    ///
    /// Never fails for an empty selection; propagates [`Self::one_of`]
    /// errors otherwise.
    pub fn from_selection(states: &[ItemState], negate: bool) -> Result<Self, FilterError> {
        if states.is_empty() {
            Ok(Self::Any)
        } else {
            Self::one_of(states.iter().copied(), negate)
        }
    }

    pub fn fragment<D: FilterDialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Self::Any => String::new(),
            Self::OneOf { states, negate } => dialect.state_in(states, *negate),
        }
    }
}
