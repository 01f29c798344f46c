use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The four lifecycle states a work item can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Created,
    Open,
    Closed,
    Blocked,
}

impl ItemState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Created, Self::Open, Self::Closed, Self::Blocked];

    /// Canonical lowercase name, as stored in `items.state`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item state '{0}': expected one of created, open, closed, blocked")]
pub struct UnknownState(pub String);

impl FromStr for ItemState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "new" => Ok(Self::Created),
            "open" => Ok(Self::Open),
            "closed" | "done" => Ok(Self::Closed),
            "blocked" => Ok(Self::Blocked),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// Item property a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Id,
    Title,
    State,
    Type,
    Node,
    Created,
    #[default]
    Updated,
}

impl OrderBy {
    pub(crate) const fn column(self) -> &'static str {
        match self {
            Self::Id => "i.item_id",
            Self::Title => "i.title",
            Self::State => "i.state",
            Self::Type => "i.item_type",
            Self::Node => "i.workflow_node",
            Self::Created => "i.created_at_us",
            Self::Updated => "i.updated_at_us",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::State => "state",
            Self::Type => "type",
            Self::Node => "node",
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = crate::error::FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "item_id" | "itemid" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "state" => Ok(Self::State),
            "type" | "item_type" | "itemtype" => Ok(Self::Type),
            "node" | "workflow_node" => Ok(Self::Node),
            "created" | "created_at" => Ok(Self::Created),
            "updated" | "updated_at" => Ok(Self::Updated),
            other => Err(crate::error::FilterError::InvalidOrdering {
                value: other.to_string(),
            }),
        }
    }
}

/// Sort direction applied to an [`OrderBy`] property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

impl Direction {
    pub(crate) const fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("ascending"),
            Self::Descending => f.write_str("descending"),
        }
    }
}

impl FromStr for Direction {
    type Err = crate::error::FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(crate::error::FilterError::InvalidOrdering {
                value: other.to_string(),
            }),
        }
    }
}
