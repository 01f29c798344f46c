//! Project scope: which projects' items a filter can see at all.

use super::{Axis, normalize_values};
use crate::compile::FilterDialect;
use crate::error::FilterError;

/// Project-scope criterion.
///
/// There is no null variant: every compiled filter starts with a project
/// fragment, so later fragments can always be appended as `AND` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectCriterion {
    /// Anonymous viewer: public projects only.
    UnregisteredUser,
    /// Signed-in viewer: public projects plus the requester's own projects,
    /// resolved at execution time.
    RegisteredUser,
    /// Explicit project ids picked by the user.
    Selected {
        project_ids: Vec<String>,
        negate: bool,
    },
}

impl ProjectCriterion {
    /// Build a selected-projects criterion.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] if `project_ids` is empty or
    /// contains blank ids.
    pub fn selected<I, S>(project_ids: I, negate: bool) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let project_ids = normalize_values(Axis::Project, project_ids)?;
        if project_ids.is_empty() {
            return Err(FilterError::invalid(
                Axis::Project,
                "a selected-project scope needs at least one project id",
            ));
        }
        Ok(Self::Selected {
            project_ids,
            negate,
        })
    }

    /// The "any project" scope for a viewer, which depends only on whether
    /// someone is signed in.
    #[must_use]
    pub const fn any_for(registered: bool) -> Self {
        if registered {
            Self::RegisteredUser
        } else {
            Self::UnregisteredUser
        }
    }

    pub fn fragment<D: FilterDialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Self::UnregisteredUser => dialect.project_for_unregistered_user(),
            Self::RegisteredUser => dialect.project_for_registered_user(),
            Self::Selected {
                project_ids,
                negate,
            } => dialect.project_for_selected(project_ids, *negate),
        }
    }
}
