use crate::ortho::{OrthogonalGraph, NIL};

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Frame {
    vertex: usize,
    cursor: i64,
}

/// Iterative Gray/Black depth-first sweep over the whole arena, one cycle
/// per back edge. A back edge into a Gray vertex closes the active path; the
/// emitted cycle is the path sliced from the first occurrence of the target,
/// with the target repeated at the end. Recursion depth is bounded only by
/// heap.
pub fn find_cycles(graph: &OrthogonalGraph) -> Vec<Vec<usize>> {
    let mut color = vec![Color::White; graph.vertices.len()];
    let mut cycles = Vec::new();

    for root in 0..graph.vertices.len() {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Gray;
        let mut path = vec![root];
        let mut stack = vec![Frame {
            vertex: root,
            cursor: graph.vertices[root].first_out,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.cursor == NIL {
                color[frame.vertex] = Color::Black;
                path.pop();
                stack.pop();
                continue;
            }
            let edge = &graph.edges[frame.cursor as usize];
            frame.cursor = edge.tail_next;
            let head = edge.head_vertex;
            match color[head] {
                Color::Gray => {
                    // Gray vertices are exactly the ones on the active path.
                    let start = path.iter().position(|&v| v == head).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(head);
                    cycles.push(cycle);
                }
                Color::White => {
                    color[head] = Color::Gray;
                    path.push(head);
                    stack.push(Frame {
                        vertex: head,
                        cursor: graph.vertices[head].first_out,
                    });
                }
                Color::Black => {}
            }
        }
    }
    cycles
}
