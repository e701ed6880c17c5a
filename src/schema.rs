use rusqlite::Connection;

use crate::errors::CodeDepsError;

/// Creates the three analyzer-owned tables when they do not exist yet.
/// Production databases already carry them; embedded consumers and the test
/// suite go through here.
pub fn ensure_schema(conn: &Connection) -> Result<(), CodeDepsError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Node (
            id           TEXT PRIMARY KEY,
            type         TEXT NOT NULL,
            name         TEXT NOT NULL,
            projectName  TEXT NOT NULL DEFAULT '',
            projectId    TEXT NOT NULL DEFAULT '',
            branch       TEXT NOT NULL DEFAULT '',
            relativePath TEXT,
            startLine    INTEGER,
            startColumn  INTEGER,
            meta         TEXT
        );
        CREATE TABLE IF NOT EXISTS Project (
            id   TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            addr TEXT,
            type TEXT
        );
        CREATE TABLE IF NOT EXISTS Connection (
            fromId TEXT NOT NULL,
            toId   TEXT NOT NULL,
            PRIMARY KEY (fromId, toId)
        );
        CREATE INDEX IF NOT EXISTS idx_connection_to ON Connection(toId);
        CREATE INDEX IF NOT EXISTS idx_node_project_branch ON Node(projectId, branch);
        "#,
    )
    .map_err(|e| CodeDepsError::schema(e.to_string()))?;
    Ok(())
}
