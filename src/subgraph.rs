use ahash::AHashSet;
use rusqlite::Connection;

use crate::cycles::find_cycles;
use crate::errors::CodeDepsError;
use crate::json::render_graph_envelope;
use crate::model::{NodeRecord, VertexData};
use crate::ortho::OrthogonalGraph;
use crate::store::DepStore;

/// Depth cap applied when the caller passes none.
pub const DEFAULT_DEPTH: u32 = 100;

/// Materializes the bounded neighborhood around `node_id` and renders it as
/// an envelope. Returns `None` when the starting node does not exist, which
/// the SQL surface maps to `NULL`.
pub fn node_dependency_graph(
    conn: &Connection,
    node_id: &str,
    max_depth: u32,
) -> Result<Option<String>, CodeDepsError> {
    let store = DepStore::new(conn);
    let Some(root) = store.node_by_id(node_id)? else {
        return Ok(None);
    };
    let (nodes, links) = collect_component(&store, root, max_depth)?;
    let vertices = nodes.iter().map(VertexData::from_node).collect();
    let graph = OrthogonalGraph::build(vertices, &links);
    let cycles = find_cycles(&graph);
    Ok(Some(render_graph_envelope(&graph, &cycles)))
}

/// Level-capped frontier expansion over the `Connection` relation. Each pass
/// pulls every edge touching the frontier, records first-seen pairs, and
/// batch-fetches the attributes of newly reached endpoints. Endpoints whose
/// node row has vanished stay in the frontier so their remaining edges are
/// still discovered; the arena builder drops the unresolvable ones.
fn collect_component(
    store: &DepStore<'_>,
    root: NodeRecord,
    max_depth: u32,
) -> Result<(Vec<NodeRecord>, Vec<(String, String)>), CodeDepsError> {
    let root_id = root.id.clone();
    let mut nodes = vec![root];
    let mut visited: AHashSet<String> = AHashSet::new();
    visited.insert(root_id.clone());
    let mut seen_links: AHashSet<(String, String)> = AHashSet::new();
    let mut links = Vec::new();
    let mut frontier = vec![root_id];
    let mut depth = 0;

    while !frontier.is_empty() && depth < max_depth {
        let mut pending = Vec::new();
        for (from, to) in store.connections_touching(&frontier)? {
            if !seen_links.insert((from.clone(), to.clone())) {
                continue;
            }
            links.push((from.clone(), to.clone()));
            for endpoint in [from, to] {
                if visited.insert(endpoint.clone()) {
                    pending.push(endpoint);
                }
            }
        }
        nodes.extend(store.nodes_by_ids(&pending)?);
        frontier = pending;
        depth += 1;
    }
    Ok((nodes, links))
}
