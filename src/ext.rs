use std::os::raw::{c_char, c_int};

use rusqlite::{ffi, Connection};

use crate::functions::register_functions;

/// Entry point SQLite resolves when the compiled library is loaded with
/// `.load` / `sqlite3_load_extension`. Registers the three scalar functions
/// on the loading connection.
///
/// # Safety
///
/// Called by SQLite with valid pointers during extension loading.
#[no_mangle]
pub unsafe extern "C" fn sqlite3_extension_init(
    db: *mut ffi::sqlite3,
    pz_err_msg: *mut *mut c_char,
    p_api: *mut ffi::sqlite3_api_routines,
) -> c_int {
    if p_api.is_null() {
        return ffi::SQLITE_ERROR;
    }
    match extension_init(db, p_api) {
        Ok(()) => ffi::SQLITE_OK,
        Err(err) => unsafe { rusqlite::to_sqlite_error(&err, pz_err_msg) },
    }
}

fn extension_init(
    db: *mut ffi::sqlite3,
    p_api: *mut ffi::sqlite3_api_routines,
) -> rusqlite::Result<()> {
    let conn = unsafe { Connection::extension_init2(db, p_api)? };
    register_functions(&conn)
}
