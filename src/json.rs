use crate::model::VertexData;
use crate::ortho::{OrthoEdge, OrthoVertex, OrthogonalGraph};

/// Initial reservation for envelope buffers. Materialized graphs routinely
/// serialize to megabytes; one up-front allocation keeps the append path
/// realloc-free for the common case.
pub const ENVELOPE_RESERVE: usize = 4 * 1024 * 1024;

/// Streaming JSON builder over a plain `String`. Callers drive structure via
/// `begin_*`/`end_*`/`key`; comma placement is tracked per open container.
/// Escapes exactly `"` `\` `/` backspace formfeed `\n` `\r` `\t`; everything
/// else is copied verbatim (input is trusted UTF-8 from the store).
pub struct JsonBuf {
    out: String,
    // One flag per open container: true once it holds at least one entry.
    comma: Vec<bool>,
}

impl JsonBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        JsonBuf {
            out: String::with_capacity(capacity),
            comma: Vec::new(),
        }
    }

    pub fn begin_object(&mut self) {
        self.separate();
        self.out.push('{');
        self.comma.push(false);
    }

    pub fn end_object(&mut self) {
        self.comma.pop();
        self.out.push('}');
    }

    pub fn begin_array(&mut self) {
        self.separate();
        self.out.push('[');
        self.comma.push(false);
    }

    pub fn end_array(&mut self) {
        self.comma.pop();
        self.out.push(']');
    }

    pub fn key(&mut self, key: &str) {
        self.separate();
        self.push_escaped(key);
        self.out.push(':');
        // The upcoming value belongs to this key; suppress its separator.
        if let Some(last) = self.comma.last_mut() {
            *last = false;
        }
    }

    pub fn string(&mut self, value: &str) {
        self.separate();
        self.push_escaped(value);
    }

    pub fn int(&mut self, value: i64) {
        self.separate();
        self.out.push_str(&value.to_string());
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn separate(&mut self) {
        if let Some(last) = self.comma.last_mut() {
            if *last {
                self.out.push(',');
            }
            *last = true;
        }
    }

    fn push_escaped(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '/' => self.out.push_str("\\/"),
                '\u{0008}' => self.out.push_str("\\b"),
                '\u{000C}' => self.out.push_str("\\f"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                other => self.out.push(other),
            }
        }
        self.out.push('"');
    }
}

/// Renders a materialized sub-graph envelope: `vertices`, `edges`, and
/// `cycles` only when at least one cycle exists.
pub fn render_graph_envelope(graph: &OrthogonalGraph, cycles: &[Vec<usize>]) -> String {
    let mut buf = JsonBuf::with_capacity(ENVELOPE_RESERVE);
    write_graph_envelope(&mut buf, graph, cycles);
    buf.finish()
}

pub(crate) fn write_graph_envelope(buf: &mut JsonBuf, graph: &OrthogonalGraph, cycles: &[Vec<usize>]) {
    buf.begin_object();
    buf.key("vertices");
    buf.begin_array();
    for vertex in &graph.vertices {
        write_vertex(buf, vertex);
    }
    buf.end_array();
    buf.key("edges");
    buf.begin_array();
    for edge in &graph.edges {
        write_edge(buf, edge);
    }
    buf.end_array();
    if !cycles.is_empty() {
        buf.key("cycles");
        write_cycles(buf, graph, cycles);
    }
    buf.end_object();
}

/// Renders the synthesis envelope: counters, accumulated host error
/// messages, then every cycle visible in the post-insert graph.
pub fn render_synthesis_envelope(
    created: usize,
    skipped: usize,
    errors: &[String],
    graph: &OrthogonalGraph,
    cycles: &[Vec<usize>],
) -> String {
    let mut buf = JsonBuf::with_capacity(ENVELOPE_RESERVE);
    buf.begin_object();
    buf.key("createdConnections");
    buf.int(created as i64);
    buf.key("skippedConnections");
    buf.int(skipped as i64);
    buf.key("errors");
    buf.begin_array();
    for message in errors {
        buf.string(message);
    }
    buf.end_array();
    buf.key("cycles");
    write_cycles(&mut buf, graph, cycles);
    buf.end_object();
    buf.finish()
}

fn write_cycles(buf: &mut JsonBuf, graph: &OrthogonalGraph, cycles: &[Vec<usize>]) {
    buf.begin_array();
    for cycle in cycles {
        buf.begin_array();
        for &vertex in cycle {
            let data = &graph.vertices[vertex].data;
            buf.begin_object();
            buf.key("id");
            buf.string(&data.id);
            buf.key("name");
            buf.string(&data.name);
            buf.key("type");
            buf.string(&data.kind);
            buf.end_object();
        }
        buf.end_array();
    }
    buf.end_array();
}

fn write_vertex(buf: &mut JsonBuf, vertex: &OrthoVertex) {
    buf.begin_object();
    buf.key("data");
    write_vertex_data(buf, &vertex.data);
    buf.key("firstIn");
    buf.int(vertex.first_in);
    buf.key("firstOut");
    buf.int(vertex.first_out);
    buf.key("inDegree");
    buf.int(vertex.in_degree as i64);
    buf.key("outDegree");
    buf.int(vertex.out_degree as i64);
    buf.end_object();
}

fn write_vertex_data(buf: &mut JsonBuf, data: &VertexData) {
    buf.begin_object();
    buf.key("id");
    buf.string(&data.id);
    buf.key("name");
    buf.string(&data.name);
    buf.key("type");
    buf.string(&data.kind);
    buf.key("branch");
    buf.string(&data.branch);
    if !data.project_name.is_empty() {
        buf.key("projectName");
        buf.string(&data.project_name);
    }
    if !data.project_id.is_empty() {
        buf.key("projectId");
        buf.string(&data.project_id);
    }
    if !data.relative_path.is_empty() {
        buf.key("relativePath");
        buf.string(&data.relative_path);
        buf.key("startLine");
        buf.int(data.start_line);
        buf.key("startColumn");
        buf.int(data.start_column);
    } else if !data.addr.is_empty() {
        buf.key("addr");
        buf.string(&data.addr);
    } else {
        buf.key("_");
        buf.int(0);
    }
    buf.end_object();
}

fn write_edge(buf: &mut JsonBuf, edge: &OrthoEdge) {
    buf.begin_object();
    buf.key("data");
    buf.begin_object();
    buf.key("id");
    buf.string(&format!("{}-{}", edge.data.from_id, edge.data.to_id));
    buf.key("fromId");
    buf.string(&edge.data.from_id);
    buf.key("toId");
    buf.string(&edge.data.to_id);
    buf.end_object();
    buf.key("tailvertex");
    buf.int(edge.tail_vertex as i64);
    buf.key("headvertex");
    buf.int(edge.head_vertex as i64);
    buf.key("headnext");
    buf.int(edge.head_next);
    buf.key("tailnext");
    buf.int(edge.tail_next);
    buf.end_object();
}
