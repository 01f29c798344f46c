//! Execution of compiled filters against the item store.
//!
//! The compiled query is appended verbatim to a base `SELECT` over
//! `items i JOIN projects p`. Ordering and pagination are applied here and are
//! never part of the filter.
//!
//! The only parameters a statement may carry are:
//!
//! - `$projects`: a JSON array of the requester's accessible project ids
//!   (`[]` for anonymous requesters or users without projects, which leaves
//!   only public projects visible);
//! - `:current_project`: the project the requester is currently browsing, if
//!   any;
//! - `:visible_projects`: the same JSON array as `$projects`, bound into the
//!   visibility clause every execution appends. A filter scoped to selected
//!   (or negated) projects therefore never reaches a private project the
//!   requester is not a member of.
//!
//! Anything else is a corrupt compiled query and aborts execution with
//! [`FilterError::UnresolvedPlaceholder`]. Executing with a parameter left
//! unbound would silently compare against `NULL` and return nothing.

use anyhow::{Context, Result};
use rusqlite::{Connection, Statement, params};
use std::collections::HashSet;

use crate::compile::{CompiledQuery, PROJECTS_PLACEHOLDER};
use crate::criteria::Axis;
use crate::error::FilterError;
use crate::model::{Direction, ItemState, OrderBy};

const CURRENT_PROJECT_PARAM: &str = ":current_project";
const VISIBLE_PROJECTS_PARAM: &str = ":visible_projects";

const VISIBILITY_CLAUSE: &str = " AND (p.is_public = 1 OR i.project_id IN \
     (SELECT value FROM json_each(:visible_projects)))";

const ITEM_COLUMNS: &str = "i.item_id, i.project_id, i.title, i.description, i.state, \
     i.responsible_id, i.item_type, i.workflow_node, i.created_at_us, i.updated_at_us";

const BASE_FROM: &str = " FROM items i INNER JOIN projects p ON p.project_id = i.project_id";

/// A work item row returned by filter execution.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueryItem {
    pub item_id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub state: ItemState,
    pub responsible_id: Option<String>,
    pub item_type: String,
    pub workflow_node: String,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// The user a query runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requester {
    /// `None` for an anonymous viewer.
    pub user_id: Option<String>,
    /// Projects the user is a member of.
    pub project_ids: Vec<String>,
}

impl Requester {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve `user_id`'s accessible projects from `project_members`.
    ///
    /// Unknown users resolve to a requester with no projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the membership query fails.
    pub fn load(conn: &Connection, user_id: &str) -> Result<Self> {
        let mut stmt = conn
            .prepare(
                "SELECT project_id FROM project_members WHERE user_id = ?1 ORDER BY project_id",
            )
            .context("prepare requester membership query")?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .context("execute requester membership query")?;

        let mut project_ids = Vec::new();
        for row in rows {
            project_ids.push(row.context("read membership row")?);
        }

        tracing::debug!(user_id, projects = project_ids.len(), "resolved requester");
        Ok(Self {
            user_id: Some(user_id.to_string()),
            project_ids,
        })
    }

    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.user_id.is_some()
    }

    /// Ensure every selected project id is one this requester can see: a
    /// public project or one they are a member of.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSelection`] on the project axis for the
    /// first id that is unknown or private to someone else, or
    /// [`FilterError::Storage`] if the lookup fails.
    pub fn check_selected_projects(
        &self,
        conn: &Connection,
        project_ids: &[String],
    ) -> Result<(), FilterError> {
        if project_ids.is_empty() {
            return Ok(());
        }

        let mut stmt = conn.prepare(
            "SELECT project_id FROM projects
             WHERE is_public = 1 OR project_id IN (SELECT value FROM json_each(?1))",
        )?;
        let visible = stmt
            .query_map(params![self.projects_param()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;

        match project_ids
            .iter()
            .map(|id| id.trim())
            .find(|id| !visible.contains(*id))
        {
            Some(hidden) => {
                tracing::warn!(project_id = hidden, user_id = ?self.user_id, "rejected project selection");
                Err(FilterError::invalid(
                    Axis::Project,
                    format!("project '{hidden}' is not visible to this user"),
                ))
            }
            None => Ok(()),
        }
    }

    /// Value bound to `$projects`.
    fn projects_param(&self) -> String {
        serde_json::to_string(&self.project_ids).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Ordering and pagination for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub offset: u32,
    /// `None` returns every row from `offset` on.
    pub limit: Option<u32>,
    pub order_by: OrderBy,
    pub direction: Direction,
}

impl Page {
    fn sql_clause(&self) -> String {
        let limit = self
            .limit
            .map_or_else(|| "-1".to_string(), |limit| limit.to_string());
        format!(
            " ORDER BY {} {}, i.item_id ASC LIMIT {limit} OFFSET {}",
            self.order_by.column(),
            self.direction.keyword(),
            self.offset
        )
    }
}

/// Run a compiled filter and return one page of matching items.
///
/// # Errors
///
/// - [`FilterError::UnresolvedPlaceholder`] if the compiled query carries a
///   parameter this adapter does not know how to bind.
/// - [`FilterError::Storage`] if SQLite rejects the statement.
pub fn find_items(
    conn: &Connection,
    requester: &Requester,
    current_project: Option<&str>,
    compiled: &CompiledQuery,
    page: &Page,
) -> Result<Vec<QueryItem>, FilterError> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS}{BASE_FROM}{compiled}{VISIBILITY_CLAUSE}{}{}",
        current_project_clause(current_project),
        page.sql_clause()
    );

    let mut stmt = conn.prepare(&sql)?;
    bind_parameters(&mut stmt, requester, current_project)?;

    let mut rows = stmt.raw_query();
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(row_to_query_item(row)?);
    }

    tracing::debug!(
        rows = items.len(),
        offset = page.offset,
        limit = ?page.limit,
        "executed filter"
    );
    Ok(items)
}

/// Count all items a compiled filter matches, ignoring pagination.
///
/// # Errors
///
/// Same as [`find_items`].
pub fn count_items(
    conn: &Connection,
    requester: &Requester,
    current_project: Option<&str>,
    compiled: &CompiledQuery,
) -> Result<u64, FilterError> {
    let sql = format!(
        "SELECT COUNT(*){BASE_FROM}{compiled}{VISIBILITY_CLAUSE}{}",
        current_project_clause(current_project)
    );

    let mut stmt = conn.prepare(&sql)?;
    bind_parameters(&mut stmt, requester, current_project)?;

    let mut rows = stmt.raw_query();
    let count: i64 = match rows.next()? {
        Some(row) => row.get(0)?,
        None => 0,
    };

    Ok(u64::try_from(count).unwrap_or(0))
}

fn current_project_clause(current_project: Option<&str>) -> String {
    if current_project.is_some() {
        format!(" AND (i.project_id = {CURRENT_PROJECT_PARAM})")
    } else {
        String::new()
    }
}

/// Bind every parameter of `stmt`, or fail if one is unknown.
fn bind_parameters(
    stmt: &mut Statement<'_>,
    requester: &Requester,
    current_project: Option<&str>,
) -> Result<(), FilterError> {
    for index in 1..=stmt.parameter_count() {
        let name = stmt.parameter_name(index).map(ToString::to_string);
        match name.as_deref() {
            Some(PROJECTS_PLACEHOLDER) => {
                if !requester.is_registered() {
                    tracing::warn!("registered-user filter run anonymously; showing public projects only");
                }
                stmt.raw_bind_parameter(index, requester.projects_param())?;
            }
            Some(VISIBLE_PROJECTS_PARAM) => {
                stmt.raw_bind_parameter(index, requester.projects_param())?;
            }
            Some(CURRENT_PROJECT_PARAM) => {
                stmt.raw_bind_parameter(index, current_project)?;
            }
            other => {
                return Err(FilterError::UnresolvedPlaceholder {
                    placeholder: other.map_or_else(|| format!("?{index}"), ToString::to_string),
                });
            }
        }
    }
    Ok(())
}

fn row_to_query_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueryItem> {
    let state: String = row.get(4)?;
    let state = state.parse::<ItemState>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(QueryItem {
        item_id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        state,
        responsible_id: row.get(5)?,
        item_type: row.get(6)?,
        workflow_node: row.get(7)?,
        created_at_us: row.get(8)?,
        updated_at_us: row.get(9)?,
    })
}
