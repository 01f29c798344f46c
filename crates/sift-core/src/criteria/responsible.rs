//! Responsible-party criterion.
//!
//! Unlike the other set axes, an item may have no responsible party at all.
//! Negation therefore keeps unassigned items: "not assigned to alice"
//! includes items assigned to nobody.

use super::{Axis, normalize_values};
use crate::compile::FilterDialect;
use crate::error::FilterError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponsibleCriterion {
    #[default]
    Any,
    OneOf {
        responsible_ids: Vec<String>,
        negate: bool,
    },
}

impl ResponsibleCriterion {
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] if the set is empty or has a
    /// blank id.
    pub fn one_of<I, S>(responsible_ids: I, negate: bool) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let responsible_ids = normalize_values(Axis::Responsible, responsible_ids)?;
        if responsible_ids.is_empty() {
            return Err(FilterError::invalid(
                Axis::Responsible,
                "a concrete responsible criterion needs at least one user id",
            ));
        }
        Ok(Self::OneOf {
            responsible_ids,
            negate,
        })
    }

    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] for blank ids.
    pub fn from_selection(responsible_ids: &[String], negate: bool) -> Result<Self, FilterError> {
        if responsible_ids.is_empty() {
            Ok(Self::Any)
        } else {
            Self::one_of(responsible_ids, negate)
        }
    }

    pub fn fragment<D: FilterDialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Self::Any => String::new(),
            Self::OneOf {
                responsible_ids,
                negate,
            } => dialect.responsible_in(responsible_ids, *negate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_is_any() {
        assert_eq!(
            ResponsibleCriterion::from_selection(&[], true).unwrap(),
            ResponsibleCriterion::Any
        );
    }

    #[test]
    fn blank_id_fails_fast() {
        let err = ResponsibleCriterion::from_selection(&["u1".into(), String::new()], false)
            .unwrap_err();
        assert!(err.to_string().contains("responsible"));
    }
}
