//! Persistence for saved filters.
//!
//! Every write stores the compiled query, the raw selections and the negation
//! flags of a [`Filter`] in a single statement, so a row never mixes the
//! compiled text of one edit with the raw fields of another.
//!
//! Names are unique per owner. The store checks before writing and the
//! `UNIQUE (owner_id, name)` constraint backs the check up.

use rusqlite::{Connection, OptionalExtension, params};

use crate::compile::CompiledQuery;
use crate::error::FilterError;
use crate::filter::{Filter, Negations, RawSelections};

const FILTER_COLUMNS: &str = "filter_id, owner_id, name, favorite, compiled_query, \
     project_selection, state_selection, identifier_selection, responsible_selection, \
     type_selection, node_selection, text_selection, \
     negate_project, negate_state, negate_responsible, negate_type, negate_node, \
     created_at_us, updated_at_us";

/// Save a new filter for its owner.
///
/// # Errors
///
/// - [`FilterError::Unowned`] if the filter has no owner.
/// - [`FilterError::NameNotUnique`] if the owner already has a filter with
///   this name.
/// - [`FilterError::Storage`] on any other SQLite failure.
pub fn insert_filter(conn: &Connection, filter: &Filter) -> Result<(), FilterError> {
    let owner = filter.owner.as_deref().ok_or_else(|| FilterError::Unowned {
        filter_id: filter.id.clone(),
    })?;

    if contains_filter_named(conn, owner, &filter.name)? {
        return Err(name_not_unique(owner, &filter.name));
    }

    conn.execute(
        &format!(
            "INSERT INTO filters ({FILTER_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            filter.id,
            owner,
            filter.name,
            filter.favorite,
            filter.compiled_query.as_str(),
            filter.raw.project,
            filter.raw.state,
            filter.raw.identifier,
            filter.raw.responsible,
            filter.raw.item_type,
            filter.raw.node,
            filter.raw.text,
            filter.negate.project,
            filter.negate.state,
            filter.negate.responsible,
            filter.negate.item_type,
            filter.negate.node,
            filter.created_at_us,
            filter.updated_at_us,
        ],
    )
    .map_err(|err| map_unique_violation(err, owner, &filter.name))?;

    tracing::info!(filter_id = %filter.id, owner, name = %filter.name, "saved filter");
    Ok(())
}

/// Overwrite a stored filter with the in-memory version.
///
/// The id, owner and creation time are never changed.
///
/// # Errors
///
/// - [`FilterError::NotFound`] if no row has this id.
/// - [`FilterError::NameNotUnique`] if a rename collides with another of the
///   owner's filters.
/// - [`FilterError::Storage`] on any other SQLite failure.
pub fn update_filter(conn: &Connection, filter: &Filter) -> Result<(), FilterError> {
    let owner = filter.owner.as_deref().unwrap_or_default();

    let changed = conn
        .execute(
            "UPDATE filters SET
                name = ?2,
                favorite = ?3,
                compiled_query = ?4,
                project_selection = ?5,
                state_selection = ?6,
                identifier_selection = ?7,
                responsible_selection = ?8,
                type_selection = ?9,
                node_selection = ?10,
                text_selection = ?11,
                negate_project = ?12,
                negate_state = ?13,
                negate_responsible = ?14,
                negate_type = ?15,
                negate_node = ?16,
                updated_at_us = ?17
             WHERE filter_id = ?1",
            params![
                filter.id,
                filter.name,
                filter.favorite,
                filter.compiled_query.as_str(),
                filter.raw.project,
                filter.raw.state,
                filter.raw.identifier,
                filter.raw.responsible,
                filter.raw.item_type,
                filter.raw.node,
                filter.raw.text,
                filter.negate.project,
                filter.negate.state,
                filter.negate.responsible,
                filter.negate.item_type,
                filter.negate.node,
                filter.updated_at_us,
            ],
        )
        .map_err(|err| map_unique_violation(err, owner, &filter.name))?;

    if changed == 0 {
        return Err(not_found(&filter.id));
    }

    tracing::info!(filter_id = %filter.id, "updated filter");
    Ok(())
}

/// Fetch a filter by id.
///
/// # Errors
///
/// Returns [`FilterError::NotFound`] if no filter has this id.
pub fn get_filter(conn: &Connection, filter_id: &str) -> Result<Filter, FilterError> {
    conn.query_row(
        &format!("SELECT {FILTER_COLUMNS} FROM filters WHERE filter_id = ?1"),
        params![filter_id],
        row_to_filter,
    )
    .optional()?
    .ok_or_else(|| not_found(filter_id))
}

/// Fetch one of `owner`'s filters by name.
///
/// # Errors
///
/// Returns [`FilterError::NotFoundByName`] if the owner has no such filter.
pub fn find_filter_by_name(
    conn: &Connection,
    owner: &str,
    name: &str,
) -> Result<Filter, FilterError> {
    conn.query_row(
        &format!("SELECT {FILTER_COLUMNS} FROM filters WHERE owner_id = ?1 AND name = ?2"),
        params![owner, name.trim()],
        row_to_filter,
    )
    .optional()?
    .ok_or_else(|| FilterError::NotFoundByName {
        owner: owner.to_string(),
        name: name.trim().to_string(),
    })
}

/// All of `owner`'s filters, ordered by name.
///
/// # Errors
///
/// Returns [`FilterError::Storage`] if the query fails.
pub fn list_filters(conn: &Connection, owner: &str) -> Result<Vec<Filter>, FilterError> {
    query_filters(
        conn,
        &format!("SELECT {FILTER_COLUMNS} FROM filters WHERE owner_id = ?1 ORDER BY name ASC"),
        owner,
    )
}

/// `owner`'s filters flagged as favorite, ordered by name.
///
/// # Errors
///
/// Returns [`FilterError::Storage`] if the query fails.
pub fn list_favorite_filters(conn: &Connection, owner: &str) -> Result<Vec<Filter>, FilterError> {
    query_filters(
        conn,
        &format!(
            "SELECT {FILTER_COLUMNS} FROM filters \
             WHERE owner_id = ?1 AND favorite = 1 ORDER BY name ASC"
        ),
        owner,
    )
}

/// Whether `owner` already has a filter called `name`.
///
/// # Errors
///
/// Returns [`FilterError::Storage`] if the query fails.
pub fn contains_filter_named(conn: &Connection, owner: &str, name: &str) -> Result<bool, FilterError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM filters WHERE owner_id = ?1 AND name = ?2)",
        params![owner, name.trim()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Flag or unflag a filter as favorite. Compilation is unaffected.
///
/// # Errors
///
/// Returns [`FilterError::NotFound`] if no filter has this id.
pub fn set_favorite(conn: &Connection, filter_id: &str, favorite: bool) -> Result<(), FilterError> {
    let changed = conn.execute(
        "UPDATE filters SET favorite = ?2 WHERE filter_id = ?1",
        params![filter_id, favorite],
    )?;
    if changed == 0 {
        return Err(not_found(filter_id));
    }
    tracing::info!(filter_id, favorite, "set filter favorite");
    Ok(())
}

/// Delete a filter by id.
///
/// # Errors
///
/// Returns [`FilterError::NotFound`] if no filter has this id.
pub fn delete_filter(conn: &Connection, filter_id: &str) -> Result<(), FilterError> {
    let changed = conn.execute("DELETE FROM filters WHERE filter_id = ?1", params![filter_id])?;
    if changed == 0 {
        return Err(not_found(filter_id));
    }
    tracing::info!(filter_id, "deleted filter");
    Ok(())
}

fn query_filters(conn: &Connection, sql: &str, owner: &str) -> Result<Vec<Filter>, FilterError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![owner], row_to_filter)?;

    let mut filters = Vec::new();
    for row in rows {
        filters.push(row?);
    }
    Ok(filters)
}

fn row_to_filter(row: &rusqlite::Row<'_>) -> rusqlite::Result<Filter> {
    Ok(Filter {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        favorite: row.get(3)?,
        compiled_query: CompiledQuery::from_stored(row.get(4)?),
        raw: RawSelections {
            project: row.get(5)?,
            state: row.get(6)?,
            identifier: row.get(7)?,
            responsible: row.get(8)?,
            item_type: row.get(9)?,
            node: row.get(10)?,
            text: row.get(11)?,
        },
        negate: Negations {
            project: row.get(12)?,
            state: row.get(13)?,
            responsible: row.get(14)?,
            item_type: row.get(15)?,
            node: row.get(16)?,
        },
        created_at_us: row.get(17)?,
        updated_at_us: row.get(18)?,
    })
}

fn not_found(filter_id: &str) -> FilterError {
    FilterError::NotFound {
        filter_id: filter_id.to_string(),
    }
}

fn name_not_unique(owner: &str, name: &str) -> FilterError {
    FilterError::NameNotUnique {
        owner: owner.to_string(),
        name: name.to_string(),
    }
}

fn map_unique_violation(err: rusqlite::Error, owner: &str, name: &str) -> FilterError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            name_not_unique(owner, name)
        }
        other => FilterError::Storage(other),
    }
}
