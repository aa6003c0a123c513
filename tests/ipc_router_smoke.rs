
use serde_json::json;
use test_support::{
    login_101, request, request_ok, select_default_source, spawn_sidecar, temp_dir,
    view_item_keys,
};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("sweepd-router-smoke");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("source").map(|v| v.is_null()).unwrap_or(false));

    let _ = select_default_source(&mut stdin, &mut reader, &workspace);

    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert!(health
        .get("workbookDigest")
        .and_then(|v| v.as_str())
        .is_some());

    let grades = request_ok(&mut stdin, &mut reader, "3", "grades.list", json!({}));
    assert_eq!(grades.get("grades"), Some(&json!(["7", "8"])));

    let classes = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "classes.list",
        json!({ "grade": "7" }),
    );
    assert_eq!(
        classes
            .get("classes")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(2)
    );

    let session_id = login_101(&mut stdin, &mut reader);

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "checklist.view",
        json!({ "sessionId": session_id }),
    );
    let keys = view_item_keys(&view);
    assert!(!keys.is_empty());

    let submitted = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "checklist.submit",
        json!({ "sessionId": session_id, "checkedKeys": keys }),
    );
    assert_eq!(
        submitted.get("status").and_then(|v| v.as_str()),
        Some("completed")
    );

    let out_dir = workspace.join("exports");
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "report.export",
        json!({ "classCode": "101", "outDir": out_dir.to_string_lossy() }),
    );
    assert!(exported.get("path").and_then(|v| v.as_str()).is_some());

    let batch = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "report.exportAll",
        json!({ "outDir": out_dir.to_string_lossy() }),
    );
    assert!(batch.get("sectionCount").and_then(|v| v.as_u64()).unwrap_or(0) > 0);

    let unknown = request(&mut stdin, &mut reader, "9", "planner.noSuchThing", json!({}));
    assert_eq!(unknown.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );
}
