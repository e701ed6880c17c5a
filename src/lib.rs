//! Cross-project code dependency graphs inside SQLite.
//!
//! Analyzers populate the `Node`, `Project` and `Connection` tables; this
//! crate adds three scalar SQL functions over them: `auto_create_connections`
//! synthesizes missing cross-project edges from matching rules,
//! `get_node_dependency_graph` and `get_project_dependency_graph` materialize
//! bounded neighborhoods as orthogonal-list JSON envelopes with cycle
//! reports.
//!
//! Embedded use: call [`register_functions`] on a `rusqlite::Connection`.
//! Loadable extension: build with
//! `cargo build --release --no-default-features --features loadable_extension`
//! and `.load` the resulting library.

pub mod cycles;
pub mod errors;
#[cfg(feature = "loadable_extension")]
pub mod ext;
pub mod functions;
pub mod json;
pub mod model;
pub mod ortho;
pub mod projects;
pub mod schema;
pub mod store;
pub mod subgraph;
pub mod synthesis;
#[cfg(feature = "watch")]
pub mod watch;

pub use crate::errors::CodeDepsError;
pub use crate::functions::register_functions;
pub use crate::model::{NodeRecord, NodeType, ProjectRecord, VertexData};
pub use crate::ortho::{OrthoEdge, OrthoVertex, OrthogonalGraph};
pub use crate::schema::ensure_schema;
