use rusqlite::{params, params_from_iter, Connection};

use crate::errors::CodeDepsError;
use crate::model::{NodeRecord, ProjectRecord};

/// Upper bound on placeholders per `IN (…)` group; frontiers larger than
/// this are queried in chunks to stay clear of SQLite's parameter limit.
const SQL_IN_CHUNK: usize = 500;

const NODE_COLUMNS: &str =
    "id, type, name, projectName, projectId, branch, relativePath, startLine, startColumn, meta";

/// Outcome of a batched `Connection` insert. Per-row failures land in
/// `errors`; the batch keeps going.
#[derive(Debug, Default)]
pub struct InsertOutcome {
    pub created: usize,
    pub errors: Vec<String>,
}

/// Prepared, parameter-bound access to the `Node`, `Project` and
/// `Connection` tables on the invocation's own database handle. Statements
/// are finalized on every exit path by RAII.
pub struct DepStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> DepStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        DepStore { conn }
    }

    pub fn node_count(&self) -> Result<usize, CodeDepsError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM Node", [], |row| row.get::<_, i64>(0))
            .map(|count| count.max(0) as usize)
            .map_err(|e| CodeDepsError::query(e.to_string()))
    }

    /// Full node sweep for synthesis. A failure here aborts the invocation
    /// with a prefixed host message.
    pub fn all_nodes(&self) -> Result<Vec<NodeRecord>, CodeDepsError> {
        let capacity = self.node_count().unwrap_or(0);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {NODE_COLUMNS} FROM Node"))
            .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?;
        let rows = stmt
            .query_map([], row_to_node)
            .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?;
        let mut nodes = Vec::with_capacity(capacity);
        for row in rows {
            nodes.push(row.map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?);
        }
        Ok(nodes)
    }

    /// Best-effort read of every `(fromId, toId)` pair. A host error is
    /// reported back for the envelope instead of aborting; the caller
    /// proceeds with an empty set.
    pub fn connection_pairs(&self) -> (Vec<(String, String)>, Option<String>) {
        match self.try_connection_pairs() {
            Ok(pairs) => (pairs, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        }
    }

    fn try_connection_pairs(&self) -> Result<Vec<(String, String)>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT fromId, toId FROM Connection")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    pub fn node_by_id(&self, id: &str) -> Result<Option<NodeRecord>, CodeDepsError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {NODE_COLUMNS} FROM Node WHERE id = ?1"))
            .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?;
        let mut rows = stmt
            .query_map(params![id], row_to_node)
            .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?;
        match rows.next() {
            Some(row) => row
                .map(Some)
                .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}"))),
            None => Ok(None),
        }
    }

    /// Attribute fetch for a freshly discovered frontier, one `IN (…)` batch
    /// per chunk. Ids with no backing row are simply absent from the result.
    pub fn nodes_by_ids(&self, ids: &[String]) -> Result<Vec<NodeRecord>, CodeDepsError> {
        let mut nodes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(SQL_IN_CHUNK) {
            let sql = format!(
                "SELECT {NODE_COLUMNS} FROM Node WHERE id IN ({})",
                repeat_vars(chunk.len())
            );
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), row_to_node)
                .map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?;
            for row in rows {
                nodes.push(
                    row.map_err(|e| CodeDepsError::query(format!("Failed to select nodes: {e}")))?,
                );
            }
        }
        Ok(nodes)
    }

    /// Every connection touching the frontier on either endpoint. Chunked
    /// queries may hand back the same pair twice; callers dedup by pair.
    pub fn connections_touching(
        &self,
        ids: &[String],
    ) -> Result<Vec<(String, String)>, CodeDepsError> {
        let mut pairs = Vec::new();
        for chunk in ids.chunks(SQL_IN_CHUNK) {
            let vars = repeat_vars(chunk.len());
            let sql = format!(
                "SELECT fromId, toId FROM Connection WHERE fromId IN ({vars}) OR toId IN ({vars})"
            );
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| CodeDepsError::query(e.to_string()))?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter().chain(chunk.iter())), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .map_err(|e| CodeDepsError::query(e.to_string()))?;
            for row in rows {
                pairs.push(row.map_err(|e| CodeDepsError::query(e.to_string()))?);
            }
        }
        Ok(pairs)
    }

    pub fn project_by_id(&self, id: &str) -> Result<Option<ProjectRecord>, CodeDepsError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, addr, type FROM Project WHERE id = ?1")
            .map_err(|e| CodeDepsError::query(e.to_string()))?;
        let mut rows = stmt
            .query_map(params![id], row_to_project)
            .map_err(|e| CodeDepsError::query(e.to_string()))?;
        match rows.next() {
            Some(row) => row
                .map(Some)
                .map_err(|e| CodeDepsError::query(e.to_string())),
            None => Ok(None),
        }
    }

    /// Seed order for the wildcard sweep: table order, which follows
    /// analyzer insertion.
    pub fn all_project_ids(&self) -> Result<Vec<String>, CodeDepsError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM Project ORDER BY rowid")
            .map_err(|e| CodeDepsError::query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| CodeDepsError::query(e.to_string()))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| CodeDepsError::query(e.to_string()))?);
        }
        Ok(ids)
    }

    /// Distinct project-level edges touching any project in `ids`: a pair
    /// `(P, Q)` exists when some connection joins a node of `P` to a node of
    /// `Q` on `branch`, `P ≠ Q`, and either side is in the frontier.
    pub fn project_edges_touching(
        &self,
        ids: &[String],
        branch: &str,
    ) -> Result<Vec<(String, String)>, CodeDepsError> {
        let mut pairs = Vec::new();
        for chunk in ids.chunks(SQL_IN_CHUNK) {
            let vars = repeat_vars(chunk.len());
            let sql = format!(
                "SELECT DISTINCT f.projectId, t.projectId \
                 FROM Connection c \
                 JOIN Node f ON f.id = c.fromId \
                 JOIN Node t ON t.id = c.toId \
                 WHERE f.branch = ? AND t.branch = ? \
                   AND f.projectId <> t.projectId \
                   AND (f.projectId IN ({vars}) OR t.projectId IN ({vars}))"
            );
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| CodeDepsError::query(e.to_string()))?;
            let bindings = std::iter::once(branch)
                .chain(std::iter::once(branch))
                .chain(chunk.iter().map(String::as_str))
                .chain(chunk.iter().map(String::as_str));
            let rows = stmt
                .query_map(params_from_iter(bindings), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .map_err(|e| CodeDepsError::query(e.to_string()))?;
            for row in rows {
                pairs.push(row.map_err(|e| CodeDepsError::query(e.to_string()))?);
            }
        }
        Ok(pairs)
    }

    /// Batched insert of synthesized edges. The transaction opens right
    /// before the first row and commits after the last; a row that the host
    /// rejects is recorded and the loop continues. If even `BEGIN` fails the
    /// rows still go through in autocommit, with the failure reported.
    pub fn insert_connections(&self, rows: &[(String, String)]) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();
        if rows.is_empty() {
            return outcome;
        }
        let txn_open = match self.conn.execute("BEGIN IMMEDIATE", []) {
            Ok(_) => true,
            Err(e) => {
                outcome.errors.push(e.to_string());
                false
            }
        };
        match self
            .conn
            .prepare_cached("INSERT INTO Connection(fromId, toId) VALUES(?1, ?2)")
        {
            Ok(mut stmt) => {
                for (from, to) in rows {
                    match stmt.execute(params![from, to]) {
                        Ok(_) => outcome.created += 1,
                        Err(e) => outcome.errors.push(e.to_string()),
                    }
                }
            }
            Err(e) => outcome.errors.push(e.to_string()),
        }
        if txn_open {
            if let Err(e) = self.conn.execute("COMMIT", []) {
                outcome.errors.push(e.to_string());
            }
        }
        outcome
    }
}

fn repeat_vars(count: usize) -> String {
    let mut vars = "?,".repeat(count);
    vars.pop();
    vars
}

fn row_to_node(row: &rusqlite::Row<'_>) -> Result<NodeRecord, rusqlite::Error> {
    Ok(NodeRecord {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        project_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        project_id: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        branch: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        relative_path: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        start_line: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
        start_column: row.get::<_, Option<i64>>(8)?.unwrap_or(0),
        meta: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
    })
}

fn row_to_project(row: &rusqlite::Row<'_>) -> Result<ProjectRecord, rusqlite::Error> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        addr: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        kind: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}
