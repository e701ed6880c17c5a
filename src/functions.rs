use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::{Connection, Error};

use crate::errors::CodeDepsError;
use crate::subgraph::DEFAULT_DEPTH;
use crate::{projects, subgraph, synthesis};

/// Registers the three scalar functions on `conn` under UTF-8 text encoding.
/// The graph functions take a variadic arity so a missing optional depth and
/// a missing required argument can be told apart and reported precisely.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "auto_create_connections",
        0,
        FunctionFlags::SQLITE_UTF8,
        |ctx| {
            let conn = unsafe { ctx.get_connection()? };
            synthesis::auto_create_connections(&conn).map_err(user_error)
        },
    )?;

    conn.create_scalar_function(
        "get_node_dependency_graph",
        -1,
        FunctionFlags::SQLITE_UTF8,
        |ctx| {
            if ctx.len() < 1 {
                return Err(requires("Requires nodeId"));
            }
            let Some(node_id) = ctx.get::<Option<String>>(0)? else {
                return Ok(None);
            };
            let depth = depth_arg(ctx, 1)?;
            let conn = unsafe { ctx.get_connection()? };
            subgraph::node_dependency_graph(&conn, &node_id, depth).map_err(user_error)
        },
    )?;

    conn.create_scalar_function(
        "get_project_dependency_graph",
        -1,
        FunctionFlags::SQLITE_UTF8,
        |ctx| {
            if ctx.len() < 2 {
                return Err(requires("Requires projectId and branch"));
            }
            let Some(project_id) = ctx.get::<Option<String>>(0)? else {
                return Ok(None);
            };
            let Some(branch) = ctx.get::<Option<String>>(1)? else {
                return Ok(None);
            };
            let depth = depth_arg(ctx, 2)?;
            let conn = unsafe { ctx.get_connection()? };
            projects::project_dependency_graph(&conn, &project_id, &branch, depth)
                .map_err(user_error)
        },
    )?;

    Ok(())
}

/// Optional trailing depth argument: absent or `NULL` falls back to the
/// default; negatives clamp to zero.
fn depth_arg(ctx: &Context<'_>, index: usize) -> rusqlite::Result<u32> {
    if ctx.len() <= index {
        return Ok(DEFAULT_DEPTH);
    }
    match ctx.get::<Option<i64>>(index)? {
        Some(depth) => Ok(depth.clamp(0, u32::MAX as i64) as u32),
        None => Ok(DEFAULT_DEPTH),
    }
}

fn user_error(err: CodeDepsError) -> Error {
    Error::UserFunctionError(Box::new(err))
}

fn requires(message: &str) -> Error {
    Error::UserFunctionError(Box::new(CodeDepsError::invalid_input(message)))
}
