use super::Axis;
use crate::compile::FilterDialect;
use crate::error::FilterError;

/// Exact item identifier. Equality only; this axis cannot be negated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentifierCriterion {
    #[default]
    Any,
    Equals(String),
}

impl IdentifierCriterion {
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] for a blank identifier.
    pub fn equals(item_id: impl AsRef<str>) -> Result<Self, FilterError> {
        let item_id = item_id.as_ref().trim();
        if item_id.is_empty() {
            return Err(FilterError::invalid(
                Axis::Identifier,
                "item identifier must not be blank",
            ));
        }
        Ok(Self::Equals(item_id.to_string()))
    }

    /// `None` or a blank string means "any item".
    #[must_use]
    pub fn from_selection(item_id: Option<&str>) -> Self {
        match item_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::Equals(id.to_string()),
            _ => Self::Any,
        }
    }

    pub fn fragment<D: FilterDialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Self::Any => String::new(),
            Self::Equals(item_id) => dialect.identifier_equals(item_id),
        }
    }
}
