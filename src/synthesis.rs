use ahash::{AHashMap, AHashSet};
use rusqlite::Connection;

use crate::cycles::find_cycles;
use crate::errors::CodeDepsError;
use crate::json::render_synthesis_envelope;
use crate::model::{entry_name, NodeRecord, NodeType, VertexData};
use crate::ortho::OrthogonalGraph;
use crate::store::DepStore;

/// ES6 imports only bind to a package's published entry surface; exports
/// reached through sub-file entries never satisfy Rule 1.
const ENTRY_POINTS: [&str; 3] = ["index", "seeyon_ui_index", "seeyon_mui_index"];

/// Composite lookup key shared by the export and writer indexes:
/// `(owner, name, branch)` where `owner` is a project name for exports and a
/// writer type for the generic read/write rules.
type RuleKey = (String, String, String);

struct NodeIndexes {
    by_type: AHashMap<NodeType, Vec<usize>>,
    named_exports: AHashMap<RuleKey, Vec<usize>>,
    named_exports_by_entry: AHashMap<RuleKey, Vec<usize>>,
    generic_writes: AHashMap<RuleKey, Vec<usize>>,
}

impl NodeIndexes {
    fn build(nodes: &[NodeRecord]) -> Self {
        let mut indexes = NodeIndexes {
            by_type: AHashMap::new(),
            named_exports: AHashMap::new(),
            named_exports_by_entry: AHashMap::new(),
            generic_writes: AHashMap::new(),
        };
        for (slot, node) in nodes.iter().enumerate() {
            let Some(kind) = NodeType::parse(&node.kind) else {
                continue;
            };
            indexes.by_type.entry(kind).or_default().push(slot);
            match kind {
                NodeType::NamedExport => {
                    indexes
                        .named_exports
                        .entry((
                            node.project_name.clone(),
                            node.name.clone(),
                            node.branch.clone(),
                        ))
                        .or_default()
                        .push(slot);
                    let entry = entry_name(&node.meta);
                    if !entry.is_empty() {
                        indexes
                            .named_exports_by_entry
                            .entry((
                                node.project_name.clone(),
                                entry.to_string(),
                                node.branch.clone(),
                            ))
                            .or_default()
                            .push(slot);
                    }
                }
                NodeType::GlobalVarWrite
                | NodeType::WebStorageWrite
                | NodeType::UrlParamWrite
                | NodeType::EventEmit => {
                    indexes
                        .generic_writes
                        .entry((
                            kind.as_str().to_string(),
                            node.name.clone(),
                            node.branch.clone(),
                        ))
                        .or_default()
                        .push(slot);
                }
                _ => {}
            }
        }
        indexes
    }

    fn readers(&self, kind: NodeType) -> &[usize] {
        self.by_type.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

struct MatchState {
    existing: AHashSet<(String, String)>,
    to_create: Vec<(String, String)>,
    skipped: usize,
}

impl MatchState {
    /// Shared tail of every rule: candidates must cross a project boundary,
    /// Rule-1 candidates must sit on a published entry surface, and a pair
    /// already present (persisted or queued this batch) counts as skipped.
    fn process_match(&mut self, reader: &NodeRecord, candidates: &[usize], nodes: &[NodeRecord]) {
        for &slot in candidates {
            let candidate = &nodes[slot];
            if reader.project_name == candidate.project_name {
                continue;
            }
            if reader.kind == NodeType::NamedImport.as_str()
                && candidate.kind == NodeType::NamedExport.as_str()
                && !ENTRY_POINTS.contains(&entry_name(&candidate.meta))
            {
                continue;
            }
            let pair = (reader.id.clone(), candidate.id.clone());
            if self.existing.contains(&pair) {
                self.skipped += 1;
                continue;
            }
            self.to_create.push(pair.clone());
            self.existing.insert(pair);
        }
    }
}

/// Single-shot batch synthesis backing the `auto_create_connections` UDF:
/// read every node, index it seven ways, emit new cross-project edges under
/// the seven matching rules, insert them in one transaction, then report the
/// cycle structure of the resulting graph.
pub fn auto_create_connections(conn: &Connection) -> Result<String, CodeDepsError> {
    let store = DepStore::new(conn);
    let nodes = store.all_nodes()?;
    let indexes = NodeIndexes::build(&nodes);

    let (pairs, read_error) = store.connection_pairs();
    let mut errors: Vec<String> = read_error.into_iter().collect();
    let mut state = MatchState {
        existing: pairs.into_iter().collect(),
        to_create: Vec::new(),
        skipped: 0,
    };

    // Rule 1: NamedImport -> NamedExport, key (package, import, branch).
    for &slot in indexes.readers(NodeType::NamedImport) {
        let reader = &nodes[slot];
        let tokens: Vec<&str> = reader.name.split('.').collect();
        if tokens.len() < 2 {
            continue;
        }
        let key = (
            tokens[0].to_string(),
            tokens[1].to_string(),
            reader.branch.clone(),
        );
        if let Some(candidates) = indexes.named_exports.get(&key) {
            state.process_match(reader, candidates, &nodes);
        }
    }

    // Rule 2: RuntimeDynamicImport -> NamedExport. The runtime name carries
    // an extra segment: `package.<container>.import`, so the key takes
    // tokens 0 and 2.
    for &slot in indexes.readers(NodeType::RuntimeDynamicImport) {
        let reader = &nodes[slot];
        let tokens: Vec<&str> = reader.name.split('.').collect();
        if tokens.len() < 3 {
            continue;
        }
        let key = (
            tokens[0].to_string(),
            tokens[2].to_string(),
            reader.branch.clone(),
        );
        if let Some(candidates) = indexes.named_exports.get(&key) {
            state.process_match(reader, candidates, &nodes);
        }
    }

    // Rules 3, 4, 5, 7: generic read -> write pairs keyed by name.
    let generic_rules = [
        (NodeType::GlobalVarRead, NodeType::GlobalVarWrite),
        (NodeType::WebStorageRead, NodeType::WebStorageWrite),
        (NodeType::EventOn, NodeType::EventEmit),
        (NodeType::UrlParamRead, NodeType::UrlParamWrite),
    ];
    for (reader_kind, writer_kind) in generic_rules {
        for &slot in indexes.readers(reader_kind) {
            let reader = &nodes[slot];
            let key = (
                writer_kind.as_str().to_string(),
                reader.name.clone(),
                reader.branch.clone(),
            );
            if let Some(candidates) = indexes.generic_writes.get(&key) {
                state.process_match(reader, candidates, &nodes);
            }
        }
    }

    // Rule 6: DynamicModuleFederationReference -> NamedExport via the
    // exporter's entry surface, key (project, entryName, branch).
    for &slot in indexes.readers(NodeType::DynamicModuleFederationReference) {
        let reader = &nodes[slot];
        let tokens: Vec<&str> = reader.name.split('.').collect();
        if tokens.len() < 2 {
            continue;
        }
        let key = (
            tokens[0].to_string(),
            tokens[1].to_string(),
            reader.branch.clone(),
        );
        if let Some(candidates) = indexes.named_exports_by_entry.get(&key) {
            state.process_match(reader, candidates, &nodes);
        }
    }

    let outcome = store.insert_connections(&state.to_create);
    errors.extend(outcome.errors);

    // Cycle report over everything now visible: pre-existing edges plus the
    // batch just written.
    let vertices: Vec<VertexData> = nodes.iter().map(VertexData::from_node).collect();
    let links: Vec<(String, String)> = state.existing.into_iter().collect();
    let graph = OrthogonalGraph::build(vertices, &links);
    let cycles = find_cycles(&graph);

    Ok(render_synthesis_envelope(
        outcome.created,
        state.skipped,
        &errors,
        &graph,
        &cycles,
    ))
}
