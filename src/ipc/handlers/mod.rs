pub mod checklist;
pub mod core;
pub mod report;
pub mod roster;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::sheets::{LoadError, Snapshot};

pub(super) fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Current table snapshot, loading (or reloading after the cache window)
/// on demand. Loader failures become wire errors as-is.
pub(super) fn snapshot<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a Snapshot, serde_json::Value> {
    let Some(config) = state.config.as_ref() else {
        return Err(err(&req.id, "no_source", "select a workbook source first", None));
    };
    state.cache.current(config).map_err(|e| load_error(req, e))
}

pub(super) fn load_error(req: &Request, e: LoadError) -> serde_json::Value {
    let LoadError {
        code,
        message,
        details,
    } = e;
    err(&req.id, &code, message, details)
}
