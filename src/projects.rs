use ahash::AHashSet;
use rusqlite::Connection;

use crate::cycles::find_cycles;
use crate::errors::CodeDepsError;
use crate::json::{render_graph_envelope, write_graph_envelope, JsonBuf, ENVELOPE_RESERVE};
use crate::model::{ProjectRecord, VertexData};
use crate::ortho::OrthogonalGraph;
use crate::store::DepStore;

/// Effective depth for wildcard seeds: large enough to exhaust any real
/// component.
const WILDCARD_DEPTH: u32 = 1_000_000;

/// Materializes the project-level graph around `project_id` on `branch`, or
/// one envelope per weakly connected component when `project_id` is `"*"`.
/// Returns `None` when the seed project does not exist.
pub fn project_dependency_graph(
    conn: &Connection,
    project_id: &str,
    branch: &str,
    max_depth: u32,
) -> Result<Option<String>, CodeDepsError> {
    let store = DepStore::new(conn);
    if project_id == "*" {
        return all_project_graphs(&store, branch).map(Some);
    }
    let Some(seed) = store.project_by_id(project_id)? else {
        return Ok(None);
    };
    let component = collect_component(&store, seed, branch, max_depth)?;
    let graph = component.into_graph(branch);
    let cycles = find_cycles(&graph);
    Ok(Some(render_graph_envelope(&graph, &cycles)))
}

struct ProjectComponent {
    projects: Vec<ProjectRecord>,
    links: Vec<(String, String)>,
    members: AHashSet<String>,
}

impl ProjectComponent {
    fn into_graph(self, branch: &str) -> OrthogonalGraph {
        let vertices = self
            .projects
            .iter()
            .map(|p| VertexData::from_project(p, branch))
            .collect();
        OrthogonalGraph::build(vertices, &self.links)
    }
}

/// Same level-capped skeleton as the node materializer, lifted to project
/// granularity: a frontier step reaches every project on the far side of a
/// node-edge touching the frontier, in both directions at once. Edges are
/// kept distinct by `(fromProjectId, toProjectId)`.
fn collect_component(
    store: &DepStore<'_>,
    seed: ProjectRecord,
    branch: &str,
    max_depth: u32,
) -> Result<ProjectComponent, CodeDepsError> {
    let seed_id = seed.id.clone();
    let mut projects = vec![seed];
    let mut members: AHashSet<String> = AHashSet::new();
    members.insert(seed_id.clone());
    let mut seen_links: AHashSet<(String, String)> = AHashSet::new();
    let mut links = Vec::new();
    let mut frontier = vec![seed_id];
    let mut depth = 0;

    while !frontier.is_empty() && depth < max_depth {
        let mut pending = Vec::new();
        for (from, to) in store.project_edges_touching(&frontier, branch)? {
            if !seen_links.insert((from.clone(), to.clone())) {
                continue;
            }
            links.push((from.clone(), to.clone()));
            for endpoint in [from, to] {
                if members.insert(endpoint.clone()) {
                    pending.push(endpoint);
                }
            }
        }
        for id in &pending {
            // A projectId with no Project row leaves its edges to be dropped
            // by the arena builder, mirroring orphan node tolerance.
            if let Some(project) = store.project_by_id(id)? {
                projects.push(project);
            }
        }
        frontier = pending;
        depth += 1;
    }
    Ok(ProjectComponent {
        projects,
        links,
        members,
    })
}

/// Wildcard sweep: seeds in table order, each unabsorbed seed grows its full
/// component, and every project lands in exactly one envelope.
fn all_project_graphs(store: &DepStore<'_>, branch: &str) -> Result<String, CodeDepsError> {
    let mut absorbed: AHashSet<String> = AHashSet::new();
    let mut buf = JsonBuf::with_capacity(ENVELOPE_RESERVE);
    buf.begin_array();
    for id in store.all_project_ids()? {
        if absorbed.contains(&id) {
            continue;
        }
        let Some(seed) = store.project_by_id(&id)? else {
            continue;
        };
        let component = collect_component(store, seed, branch, WILDCARD_DEPTH)?;
        absorbed.extend(component.members.iter().cloned());
        let graph = component.into_graph(branch);
        let cycles = find_cycles(&graph);
        write_graph_envelope(&mut buf, &graph, &cycles);
    }
    buf.end_array();
    Ok(buf.finish())
}
