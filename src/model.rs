use serde::{Deserialize, Serialize};

/// One row of the `Node` table: a single code-level observation recorded by
/// an external analyzer. Nullable columns surface as empty strings / zero so
/// the envelope's emptiness rules can be applied uniformly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub project_name: String,
    pub project_id: String,
    pub branch: String,
    pub relative_path: String,
    pub start_line: i64,
    pub start_column: i64,
    pub meta: String,
}

/// One row of the `Project` table. `addr` and `kind` are opaque attributes
/// carried into the project-level envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub addr: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The closed set of node types the synthesis rules understand. Rows whose
/// `type` column falls outside this set still materialize; they just never
/// participate in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    NamedImport,
    NamedExport,
    RuntimeDynamicImport,
    DynamicModuleFederationReference,
    GlobalVarRead,
    GlobalVarWrite,
    WebStorageRead,
    WebStorageWrite,
    EventOn,
    EventEmit,
    UrlParamRead,
    UrlParamWrite,
}

impl NodeType {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "NamedImport" => NodeType::NamedImport,
            "NamedExport" => NodeType::NamedExport,
            "RuntimeDynamicImport" => NodeType::RuntimeDynamicImport,
            "DynamicModuleFederationReference" => NodeType::DynamicModuleFederationReference,
            "GlobalVarRead" => NodeType::GlobalVarRead,
            "GlobalVarWrite" => NodeType::GlobalVarWrite,
            "WebStorageRead" => NodeType::WebStorageRead,
            "WebStorageWrite" => NodeType::WebStorageWrite,
            "EventOn" => NodeType::EventOn,
            "EventEmit" => NodeType::EventEmit,
            "UrlParamRead" => NodeType::UrlParamRead,
            "UrlParamWrite" => NodeType::UrlParamWrite,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::NamedImport => "NamedImport",
            NodeType::NamedExport => "NamedExport",
            NodeType::RuntimeDynamicImport => "RuntimeDynamicImport",
            NodeType::DynamicModuleFederationReference => "DynamicModuleFederationReference",
            NodeType::GlobalVarRead => "GlobalVarRead",
            NodeType::GlobalVarWrite => "GlobalVarWrite",
            NodeType::WebStorageRead => "WebStorageRead",
            NodeType::WebStorageWrite => "WebStorageWrite",
            NodeType::EventOn => "EventOn",
            NodeType::EventEmit => "EventEmit",
            NodeType::UrlParamRead => "UrlParamRead",
            NodeType::UrlParamWrite => "UrlParamWrite",
        }
    }
}

/// Unified vertex payload for the orthogonal graph. Node-backed vertices
/// fill the locator columns; project-backed vertices fill `addr`. Emission
/// rules for the `data` object live in `json`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub branch: String,
    pub project_name: String,
    pub project_id: String,
    pub relative_path: String,
    pub start_line: i64,
    pub start_column: i64,
    pub addr: String,
}

impl VertexData {
    pub fn from_node(node: &NodeRecord) -> Self {
        VertexData {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind.clone(),
            branch: node.branch.clone(),
            project_name: node.project_name.clone(),
            project_id: node.project_id.clone(),
            relative_path: node.relative_path.clone(),
            start_line: node.start_line,
            start_column: node.start_column,
            addr: String::new(),
        }
    }

    pub fn from_project(project: &ProjectRecord, branch: &str) -> Self {
        VertexData {
            id: project.id.clone(),
            name: project.name.clone(),
            kind: project.kind.clone(),
            branch: branch.to_string(),
            project_name: String::new(),
            project_id: String::new(),
            relative_path: String::new(),
            start_line: 0,
            start_column: 0,
            addr: project.addr.clone(),
        }
    }
}

/// Pulls the `entryName` value out of a `meta` JSON fragment with a plain
/// byte scan. Returns `""` whenever the fragment does not carry the field in
/// the expected `"entryName" … "value"` shape; malformed input never errors.
pub fn entry_name(meta: &str) -> &str {
    const KEY: &str = "\"entryName\"";
    let Some(pos) = meta.find(KEY) else {
        return "";
    };
    let rest = &meta[pos + KEY.len()..];
    let Some(open) = rest.find('"') else {
        return "";
    };
    let value = &rest[open + 1..];
    let Some(close) = value.find('"') else {
        return "";
    };
    &value[..close]
}
