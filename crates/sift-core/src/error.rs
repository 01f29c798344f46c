use std::fmt;

use crate::criteria::Axis;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    MissingRequester,
    FilterNotFound,
    FilterNameNotUnique,
    FilterUnowned,
    InvalidSelection,
    CorruptSelection,
    InvalidOrdering,
    BlankFilterName,
    UnresolvedPlaceholder,
    StorageFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::MissingRequester => "E1003",
            Self::FilterNotFound => "E2001",
            Self::FilterNameNotUnique => "E2002",
            Self::FilterUnowned => "E2003",
            Self::InvalidSelection => "E2004",
            Self::CorruptSelection => "E2005",
            Self::InvalidOrdering => "E2006",
            Self::BlankFilterName => "E2007",
            Self::UnresolvedPlaceholder => "E9001",
            Self::StorageFailure => "E9002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::MissingRequester => "No requesting user",
            Self::FilterNotFound => "Filter not found",
            Self::FilterNameNotUnique => "Filter name already in use",
            Self::FilterUnowned => "Filter has no owner",
            Self::InvalidSelection => "Invalid filter selection",
            Self::CorruptSelection => "Stored filter selection is unreadable",
            Self::InvalidOrdering => "Invalid ordering",
            Self::BlankFilterName => "Blank filter name",
            Self::UnresolvedPlaceholder => "Unresolved query placeholder",
            Self::StorageFailure => "Storage failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `sift init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .sift/config.toml and retry."),
            Self::MissingRequester => {
                Some("Pass --user, set SIFT_USER, or add `user = \"...\"` to the user config.")
            }
            Self::FilterNotFound => Some("Run `sift filter list` to see your saved filters."),
            Self::FilterNameNotUnique => Some("Pick another name or edit the existing filter."),
            Self::FilterUnowned => Some("Pass --user (or set SIFT_USER) to save filters."),
            Self::InvalidSelection => {
                Some("Remove blank values and select only projects you can see.")
            }
            Self::CorruptSelection => Some("Recreate the filter with `sift filter edit`."),
            Self::InvalidOrdering => {
                Some("Order by one of: id, title, state, type, node, created, updated.")
            }
            Self::BlankFilterName => Some("Give the filter a non-blank name."),
            Self::UnresolvedPlaceholder | Self::StorageFailure => {
                Some("Retry once. If persistent, report a bug with logs.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while building, persisting, or executing filters.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// No filter with the given id exists.
    #[error("filter '{filter_id}' not found")]
    NotFound { filter_id: String },

    /// The owner has no filter with the given name.
    #[error("filter '{name}' not found for user '{owner}'")]
    NotFoundByName { owner: String, name: String },

    /// The owner already has a filter with this name.
    #[error("user '{owner}' already has a filter named '{name}'")]
    NameNotUnique { owner: String, name: String },

    /// Only owned filters can be persisted.
    #[error("filter '{filter_id}' has no owner and cannot be saved")]
    Unowned { filter_id: String },

    /// A criterion was constructed from malformed input.
    #[error("invalid {axis} selection: {reason}")]
    InvalidSelection { axis: Axis, reason: String },

    /// A persisted raw selection field could not be decoded.
    #[error("stored {axis} selection is corrupt: {source}")]
    CorruptSelection {
        axis: Axis,
        #[source]
        source: serde_json::Error,
    },

    /// Filters need a name with at least one non-whitespace character.
    #[error("filter name must not be blank")]
    BlankName,

    /// Unknown ordering property or direction.
    #[error("invalid ordering '{value}'")]
    InvalidOrdering { value: String },

    /// The compiled query still carries a parameter nobody bound.
    #[error("compiled query has unresolved placeholder '{placeholder}'")]
    UnresolvedPlaceholder { placeholder: String },

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl FilterError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } | Self::NotFoundByName { .. } => ErrorCode::FilterNotFound,
            Self::NameNotUnique { .. } => ErrorCode::FilterNameNotUnique,
            Self::Unowned { .. } => ErrorCode::FilterUnowned,
            Self::InvalidSelection { .. } => ErrorCode::InvalidSelection,
            Self::CorruptSelection { .. } => ErrorCode::CorruptSelection,
            Self::InvalidOrdering { .. } => ErrorCode::InvalidOrdering,
            Self::BlankName => ErrorCode::BlankFilterName,
            Self::UnresolvedPlaceholder { .. } => ErrorCode::UnresolvedPlaceholder,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    pub(crate) fn invalid(axis: Axis, reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            axis,
            reason: reason.into(),
        }
    }
}
