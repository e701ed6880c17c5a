use rusqlite::hooks::Action;
use rusqlite::Connection;

/// Change notification for the `Node` table, kept out of the function
/// surface on purpose: nothing here is registered by the extension entry
/// point, and no callback outlives the guard. Hosts that want to react to
/// analyzer writes install it on their own connection.
pub struct NodeWatch<'conn> {
    conn: &'conn Connection,
}

impl<'conn> NodeWatch<'conn> {
    /// Installs an update hook on `conn` that forwards `Node`-table changes
    /// to `on_change`. Changes to any other table are ignored. The hook is
    /// cleared when the returned guard drops.
    pub fn install<F>(conn: &'conn Connection, mut on_change: F) -> Self
    where
        F: FnMut(Action, i64) + Send + 'static,
    {
        conn.update_hook(Some(
            move |action: Action, _db: &str, table: &str, rowid: i64| {
                if table == "Node" {
                    on_change(action, rowid);
                }
            },
        ));
        NodeWatch { conn }
    }
}

impl Drop for NodeWatch<'_> {
    fn drop(&mut self) {
        self.conn
            .update_hook(None::<fn(Action, &str, &str, i64)>);
    }
}
