use super::{Axis, normalize_values};
use crate::compile::FilterDialect;
use crate::error::FilterError;

/// Item type, matched by type title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeCriterion {
    #[default]
    Any,
    OneOf { titles: Vec<String>, negate: bool },
}

impl TypeCriterion {
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] if `titles` is empty or has a
    /// blank title.
    pub fn one_of<I, S>(titles: I, negate: bool) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let titles = normalize_values(Axis::ItemType, titles)?;
        if titles.is_empty() {
            return Err(FilterError::invalid(
                Axis::ItemType,
                "a concrete type criterion needs at least one type title",
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
            Self::OneOf { titles, negate } => dialect.type_in(titles, *negate),
        }
    }
}
