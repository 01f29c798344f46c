use super::Axis;
use crate::compile::FilterDialect;
use crate::error::FilterError;

/// Free-text match against item title and description. Not negatable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextCriterion {
    #[default]
    Any,
    Contains(String),
}

impl TextCriterion {
    /// The fragment is kept verbatim (inner whitespace included); only
    /// surrounding whitespace is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] for blank text.
    pub fn contains(text: impl AsRef<str>) -> Result<Self, FilterError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(FilterError::invalid(Axis::Text, "search text must not be blank"));
        }
        Ok(Self::Contains(text.to_string()))
    }

    #[must_use]
    pub fn from_selection(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(text) if !text.is_empty() => Self::Contains(text.to_string()),
            _ => Self::Any,
        }
    }

    pub fn fragment<D: FilterDialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Self::Any => String::new(),
            Self::Contains(text) => dialect.text_contains(text),
        }
    }
}
