use rusqlite::{params, Connection};

use codedeps::ensure_schema;
use codedeps::synthesis::auto_create_connections;

fn test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("db");
    ensure_schema(&conn).expect("schema");
    conn
}

fn insert_node(conn: &Connection, id: &str, kind: &str, name: &str, project: &str, meta: &str) {
    insert_node_on_branch(conn, id, kind, name, project, "main", meta);
}

fn insert_node_on_branch(
    conn: &Connection,
    id: &str,
    kind: &str,
    name: &str,
    project: &str,
    branch: &str,
    meta: &str,
) {
    conn.execute(
        "INSERT INTO Node(id, type, name, projectName, projectId, branch, relativePath, startLine, startColumn, meta) \
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, 'src/index.ts', 1, 1, ?7)",
        params![id, kind, name, project, format!("{project}-id"), branch, meta],
    )
    .expect("node");
}

fn insert_connection(conn: &Connection, from: &str, to: &str) {
    conn.execute(
        "INSERT INTO Connection(fromId, toId) VALUES(?1, ?2)",
        params![from, to],
    )
    .expect("connection");
}

fn run(conn: &Connection) -> serde_json::Value {
    let envelope = auto_create_connections(conn).expect("synthesis");
    serde_json::from_str(&envelope).expect("envelope json")
}

fn connection_rows(conn: &Connection) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare("SELECT fromId, toId FROM Connection ORDER BY fromId, toId")
        .expect("stmt");
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("rows");
    rows.map(|r| r.expect("row")).collect()
}

#[test]
fn test_named_import_matches_index_export() {
    let conn = test_db();
    insert_node(&conn, "r", "NamedImport", "pkgA.foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 1);
    assert_eq!(result["skippedConnections"], 0);
    assert_eq!(result["errors"].as_array().expect("errors").len(), 0);
    assert_eq!(connection_rows(&conn), vec![("r".to_string(), "p".to_string())]);
}

#[test]
fn test_named_import_rejects_non_entry_exports() {
    let conn = test_db();
    insert_node(&conn, "r", "NamedImport", "pkgA.foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"other"}"#,
    );
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 0);
    assert!(connection_rows(&conn).is_empty());
}

#[test]
fn test_synthesis_is_idempotent() {
    let conn = test_db();
    insert_node(&conn, "r", "NamedImport", "pkgA.foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"seeyon_ui_index"}"#,
    );
    let first = run(&conn);
    assert_eq!(first["createdConnections"], 1);
    let second = run(&conn);
    assert_eq!(second["createdConnections"], 0);
    assert_eq!(second["skippedConnections"], 1);
    assert_eq!(connection_rows(&conn).len(), 1);
}

#[test]
fn test_same_project_never_connects() {
    let conn = test_db();
    insert_node(&conn, "r", "NamedImport", "pkgA.foo", "pkgA", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 0);
    // Filtered candidates are not "skipped"; they were never considered.
    assert_eq!(result["skippedConnections"], 0);
}

#[test]
fn test_import_name_without_dot_is_ignored() {
    let conn = test_db();
    insert_node(&conn, "r", "NamedImport", "foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    assert_eq!(run(&conn)["createdConnections"], 0);
}

#[test]
fn test_import_key_uses_second_dot_token() {
    let conn = test_db();
    // Only the `foo` segment participates; the trailing `.bar` is ignored.
    insert_node(&conn, "r", "NamedImport", "pkgA.foo.bar", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    assert_eq!(run(&conn)["createdConnections"], 1);
}

#[test]
fn test_branches_partition_the_graph() {
    let conn = test_db();
    insert_node_on_branch(&conn, "r", "NamedImport", "pkgA.foo", "Bsvc", "dev", "");
    insert_node_on_branch(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        "main",
        r#"{"entryName":"index"}"#,
    );
    assert_eq!(run(&conn)["createdConnections"], 0);
}

#[test]
fn test_runtime_import_uses_third_token() {
    let conn = test_db();
    insert_node(&conn, "r", "RuntimeDynamicImport", "pkgA.obj.foo", "Bsvc", "");
    insert_node(&conn, "p", "NamedExport", "foo", "pkgA", "");
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 1);
    assert_eq!(connection_rows(&conn), vec![("r".to_string(), "p".to_string())]);
}

#[test]
fn test_runtime_import_requires_two_dots() {
    let conn = test_db();
    insert_node(&conn, "r", "RuntimeDynamicImport", "pkgA.foo", "Bsvc", "");
    insert_node(&conn, "p", "NamedExport", "foo", "pkgA", "");
    assert_eq!(run(&conn)["createdConnections"], 0);
}

#[test]
fn test_runtime_import_ignores_segments_past_the_third() {
    let conn = test_db();
    insert_node(
        &conn,
        "r",
        "RuntimeDynamicImport",
        "pkgA.obj.foo.extra",
        "Bsvc",
        "",
    );
    insert_node(&conn, "p", "NamedExport", "foo", "pkgA", "");
    assert_eq!(run(&conn)["createdConnections"], 1);
}

#[test]
fn test_runtime_import_skips_entry_name_filter() {
    let conn = test_db();
    // Rule 1's entry gate applies to NamedImport readers only.
    insert_node(&conn, "r", "RuntimeDynamicImport", "pkgA.obj.foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"not_an_entry"}"#,
    );
    assert_eq!(run(&conn)["createdConnections"], 1);
}

#[test]
fn test_generic_read_write_rules_connect_by_name() {
    let pairs = [
        ("GlobalVarRead", "GlobalVarWrite"),
        ("WebStorageRead", "WebStorageWrite"),
        ("EventOn", "EventEmit"),
        ("UrlParamRead", "UrlParamWrite"),
    ];
    for (reader_kind, writer_kind) in pairs {
        let conn = test_db();
        insert_node(&conn, "r", reader_kind, "shared_key", "AppA", "");
        insert_node(&conn, "w", writer_kind, "shared_key", "AppB", "");
        insert_node(&conn, "other", writer_kind, "different_key", "AppB", "");
        let result = run(&conn);
        assert_eq!(result["createdConnections"], 1, "{reader_kind}->{writer_kind}");
        assert_eq!(
            connection_rows(&conn),
            vec![("r".to_string(), "w".to_string())],
            "{reader_kind}->{writer_kind}"
        );
    }
}

#[test]
fn test_writers_do_not_cross_kinds() {
    let conn = test_db();
    insert_node(&conn, "r", "GlobalVarRead", "shared_key", "AppA", "");
    insert_node(&conn, "w", "WebStorageWrite", "shared_key", "AppB", "");
    assert_eq!(run(&conn)["createdConnections"], 0);
}

#[test]
fn test_federation_reference_matches_entry_surface() {
    let conn = test_db();
    insert_node(
        &conn,
        "r",
        "DynamicModuleFederationReference",
        "pkgA.remoteEntry",
        "Bsvc",
        "",
    );
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "whatever",
        "pkgA",
        r#"{"entryName":"remoteEntry"}"#,
    );
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 1);
    assert_eq!(connection_rows(&conn), vec![("r".to_string(), "p".to_string())]);
}

#[test]
fn test_federation_reference_requires_dot() {
    let conn = test_db();
    insert_node(
        &conn,
        "r",
        "DynamicModuleFederationReference",
        "remoteEntry",
        "Bsvc",
        "",
    );
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "whatever",
        "pkgA",
        r#"{"entryName":"remoteEntry"}"#,
    );
    assert_eq!(run(&conn)["createdConnections"], 0);
}

#[test]
fn test_unknown_node_types_are_inert() {
    let conn = test_db();
    insert_node(&conn, "r", "Externals", "pkgA.foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    assert_eq!(run(&conn)["createdConnections"], 0);
}

#[test]
fn test_multiple_readers_share_one_producer() {
    let conn = test_db();
    insert_node(&conn, "r1", "NamedImport", "pkgA.foo", "Bsvc", "");
    insert_node(&conn, "r2", "NamedImport", "pkgA.foo", "Csvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 2);
    assert_eq!(connection_rows(&conn).len(), 2);
}

#[test]
fn test_envelope_reports_cycles_over_the_whole_graph() {
    let conn = test_db();
    insert_node(&conn, "a", "NamedExport", "a", "P1", "");
    insert_node(&conn, "b", "NamedExport", "b", "P2", "");
    insert_connection(&conn, "a", "b");
    insert_connection(&conn, "b", "a");
    let result = run(&conn);
    let cycles = result["cycles"].as_array().expect("cycles");
    assert_eq!(cycles.len(), 1);
    let cycle = cycles[0].as_array().expect("cycle");
    assert_eq!(cycle.len(), 3);
    assert_eq!(cycle.first().unwrap()["id"], cycle.last().unwrap()["id"]);
    assert!(cycle[0].get("name").is_some());
    assert!(cycle[0].get("type").is_some());
}

#[test]
fn test_envelope_key_order_is_stable() {
    let conn = test_db();
    let envelope = auto_create_connections(&conn).expect("synthesis");
    assert!(envelope.starts_with("{\"createdConnections\":"));
    let created = envelope.find("createdConnections").unwrap();
    let skipped = envelope.find("skippedConnections").unwrap();
    let errors = envelope.find("\"errors\"").unwrap();
    let cycles = envelope.find("\"cycles\"").unwrap();
    assert!(created < skipped && skipped < errors && errors < cycles);
}

#[test]
fn test_new_edges_join_preexisting_ones_in_the_cycle_report() {
    let conn = test_db();
    // An existing p->r edge turns the synthesized r->p edge into a cycle.
    insert_node(&conn, "r", "NamedImport", "pkgA.foo", "Bsvc", "");
    insert_node(
        &conn,
        "p",
        "NamedExport",
        "foo",
        "pkgA",
        r#"{"entryName":"index"}"#,
    );
    insert_connection(&conn, "p", "r");
    let result = run(&conn);
    assert_eq!(result["createdConnections"], 1);
    let cycles = result["cycles"].as_array().expect("cycles");
    assert_eq!(cycles.len(), 1);
}
