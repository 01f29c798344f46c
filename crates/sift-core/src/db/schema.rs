//! Canonical SQLite schema for the sift store.
//!
//! - `projects`, `users` and `project_members` define who can see what
//! - `items` is the read model filters are executed against
//! - `filters` holds each saved filter's compiled query next to the raw
//!   selections it was compiled from
//! - `store_meta` records the schema version for diagnostics

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    project_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    is_public INTEGER NOT NULL DEFAULT 0 CHECK (is_public IN (0, 1))
);

CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    display_name TEXT
);

CREATE TABLE IF NOT EXISTS project_members (
    project_id TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, user_id)
);

CREATE TABLE IF NOT EXISTS items (
    item_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    state TEXT NOT NULL CHECK (state IN ('created', 'open', 'closed', 'blocked')),
    responsible_id TEXT,
    item_type TEXT NOT NULL,
    workflow_node TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS filters (
    filter_id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL CHECK (length(trim(owner_id)) > 0),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    favorite INTEGER NOT NULL DEFAULT 0 CHECK (favorite IN (0, 1)),
    compiled_query TEXT NOT NULL,
    project_selection TEXT NOT NULL DEFAULT '[]',
    state_selection TEXT NOT NULL DEFAULT '[]',
    identifier_selection TEXT NOT NULL DEFAULT '',
    responsible_selection TEXT NOT NULL DEFAULT '[]',
    type_selection TEXT NOT NULL DEFAULT '[]',
    node_selection TEXT NOT NULL DEFAULT '[]',
    text_selection TEXT NOT NULL DEFAULT '',
    negate_project INTEGER NOT NULL DEFAULT 0 CHECK (negate_project IN (0, 1)),
    negate_state INTEGER NOT NULL DEFAULT 0 CHECK (negate_state IN (0, 1)),
    negate_responsible INTEGER NOT NULL DEFAULT 0 CHECK (negate_responsible IN (0, 1)),
    negate_type INTEGER NOT NULL DEFAULT 0 CHECK (negate_type IN (0, 1)),
    negate_node INTEGER NOT NULL DEFAULT 0 CHECK (negate_node IN (0, 1)),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    UNIQUE (owner_id, name),
    CHECK (filter_id LIKE 'flt-%')
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_items_project_state_updated
    ON items(project_id, state, updated_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_items_responsible
    ON items(responsible_id);

CREATE INDEX IF NOT EXISTS idx_items_type_node
    ON items(item_type, workflow_node);

CREATE INDEX IF NOT EXISTS idx_project_members_user
    ON project_members(user_id, project_id);

CREATE INDEX IF NOT EXISTS idx_filters_owner_favorite
    ON filters(owner_id, favorite, name);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by the item and filter query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_items_project_state_updated",
    "idx_items_responsible",
    "idx_items_type_node",
    "idx_project_members_user",
    "idx_filters_owner_favorite",
];

#[cfg(test)]
mod tests {
    use crate::db::migrations;
    use rusqlite::Connection;

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    #[test]
    fn query_plan_uses_membership_index() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;

        let details = query_plan_details(
            &conn,
            "SELECT project_id FROM project_members WHERE user_id = 'alice'",
        )?;
        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_project_members_user")),
            "expected membership index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn query_plan_uses_favorite_index() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;

        let details = query_plan_details(
            &conn,
            "SELECT filter_id FROM filters WHERE owner_id = 'alice' AND favorite = 1 ORDER BY name",
        )?;
        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_filters_owner_favorite")),
            "expected favorite index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn item_state_is_checked() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;
        conn.execute(
            "INSERT INTO projects (project_id, title, is_public) VALUES ('p1', 'P1', 1)",
            [],
        )?;

        let result = conn.execute(
            "INSERT INTO items (item_id, project_id, title, state, item_type, workflow_node,
                                created_at_us, updated_at_us)
             VALUES ('i1', 'p1', 'x', 'doing', 'Bug', 'Todo', 0, 0)",
            [],
        );
        assert!(result.is_err());
        Ok(())
    }
}
