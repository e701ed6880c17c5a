use ahash::AHashMap;

use crate::model::VertexData;

/// Sentinel for an empty adjacency slot.
pub const NIL: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct OrthoVertex {
    pub data: VertexData,
    pub first_in: i64,
    pub first_out: i64,
    pub in_degree: u32,
    pub out_degree: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub from_id: String,
    pub to_id: String,
}

/// Each edge is threaded through two singly linked lists at once: `tail_next`
/// chains the outgoing edges of `tail_vertex`, `head_next` the incoming edges
/// of `head_vertex`. New edges splice in at the head, so walking a chain
/// yields reverse insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoEdge {
    pub data: EdgeData,
    pub tail_vertex: usize,
    pub head_vertex: usize,
    pub head_next: i64,
    pub tail_next: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrthogonalGraph {
    pub vertices: Vec<OrthoVertex>,
    pub edges: Vec<OrthoEdge>,
}

impl OrthogonalGraph {
    /// Builds the arena in O(|V|+|E|). Vertices keep their arrival order as
    /// dense indices; edges referencing an id outside `data` are skipped
    /// silently (the store tolerates orphan rows).
    pub fn build(data: Vec<VertexData>, links: &[(String, String)]) -> Self {
        let mut vertices: Vec<OrthoVertex> = data
            .into_iter()
            .map(|d| OrthoVertex {
                data: d,
                first_in: NIL,
                first_out: NIL,
                in_degree: 0,
                out_degree: 0,
            })
            .collect();
        let index: AHashMap<String, usize> = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.data.id.clone(), i))
            .collect();

        let mut edges: Vec<OrthoEdge> = Vec::with_capacity(links.len());
        for (from, to) in links {
            let (Some(&tail), Some(&head)) = (index.get(from), index.get(to)) else {
                continue;
            };
            let slot = edges.len() as i64;
            edges.push(OrthoEdge {
                data: EdgeData {
                    from_id: from.clone(),
                    to_id: to.clone(),
                },
                tail_vertex: tail,
                head_vertex: head,
                head_next: vertices[head].first_in,
                tail_next: vertices[tail].first_out,
            });
            vertices[tail].first_out = slot;
            vertices[tail].out_degree += 1;
            vertices[head].first_in = slot;
            vertices[head].in_degree += 1;
        }
        OrthogonalGraph { vertices, edges }
    }

    /// Outgoing neighbor indices of `vertex`, reverse insertion order.
    pub fn outgoing(&self, vertex: usize) -> Vec<usize> {
        let mut neighbors = Vec::new();
        let mut cursor = self.vertices[vertex].first_out;
        while cursor != NIL {
            let edge = &self.edges[cursor as usize];
            neighbors.push(edge.head_vertex);
            cursor = edge.tail_next;
        }
        neighbors
    }

    /// Incoming neighbor indices of `vertex`, reverse insertion order.
    pub fn incoming(&self, vertex: usize) -> Vec<usize> {
        let mut neighbors = Vec::new();
        let mut cursor = self.vertices[vertex].first_in;
        while cursor != NIL {
            let edge = &self.edges[cursor as usize];
            neighbors.push(edge.tail_vertex);
            cursor = edge.head_next;
        }
        neighbors
    }
}
