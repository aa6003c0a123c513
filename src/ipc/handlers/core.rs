use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;

use crate::config::{SheetSource, SourceConfig};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::sheets::{Snapshot, SnapshotCache};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "source": state.config.as_ref().map(|c| c.source.describe()),
            "cacheAgeSecs": state.cache.age().map(|d| d.as_secs()),
            "workbookDigest": state.cache.digest(),
            "sessionCount": state.sessions.len(),
        }),
    )
}

fn snapshot_summary(snapshot: &Snapshot) -> serde_json::Value {
    json!({
        "classCount": snapshot.classes.len(),
        "locationCount": snapshot.location_count,
        "assignmentCount": snapshot.assignment_count,
        "taskRowCount": snapshot.task_rows.len(),
        "standardItemCount": snapshot.standard_item_count,
        "checkTypeCount": snapshot.standards.len(),
        "checkTypes": snapshot.standards.check_types().collect::<Vec<_>>(),
        "workbookDigest": snapshot.digest,
        "loadedAt": snapshot.loaded_at_unix,
        "warnings": snapshot.warnings,
    })
}

/// Points the service at a workbook and loads it immediately, so a bad
/// source fails here rather than on the first checklist request. State only
/// changes when the load succeeds.
fn handle_source_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let url = req.params.get("url").and_then(|v| v.as_str());
    let path = req.params.get("path").and_then(|v| v.as_str());
    let source = match (url, path) {
        (Some(u), None) => SheetSource::Url(u.trim().to_string()),
        (None, Some(p)) => SheetSource::File(PathBuf::from(p)),
        _ => {
            return err(
                &req.id,
                "bad_params",
                "exactly one of params.url or params.path is required",
                None,
            )
        }
    };

    let mut config = SourceConfig::new(source);
    if let Some(ttl) = req.params.get("cacheTtlSecs").and_then(|v| v.as_u64()) {
        config.cache_ttl = Duration::from_secs(ttl);
    }
    if let Some(tag) = req.params.get("indoorCheckType").and_then(|v| v.as_str()) {
        config.indoor_check_type = tag.trim().to_string();
    }

    let mut cache = SnapshotCache::new();
    let result = match cache.current(&config) {
        Ok(snapshot) => snapshot_summary(snapshot),
        Err(e) => return super::load_error(req, e),
    };

    state.config = Some(config);
    state.cache = cache;
    state.sessions.clear();
    ok(&req.id, result)
}

/// Forced rebuild regardless of the cache window.
fn handle_source_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(config) = state.config.as_ref() else {
        return err(&req.id, "no_source", "select a workbook source first", None);
    };
    match state.cache.refresh(config) {
        Ok(snapshot) => ok(&req.id, snapshot_summary(snapshot)),
        Err(e) => super::load_error(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "source.select" => Some(handle_source_select(state, req)),
        "source.refresh" => Some(handle_source_refresh(state, req)),
        _ => None,
    }
}
