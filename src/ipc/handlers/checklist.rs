use std::collections::HashSet;

use chrono::Local;
use serde_json::json;

use super::{required_str, snapshot};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::view::{evaluate_submission, render_checklist, ChecklistView};

/// Renders the logged-in class's checklist view, or the error that stops it.
fn view_for_session(
    state: &mut AppState,
    req: &Request,
) -> Result<ChecklistView, serde_json::Value> {
    let session_id = required_str(req, "sessionId")?;
    let Some(session) = state.sessions.get(&session_id).cloned() else {
        return Err(err(&req.id, "not_found", "unknown session", None));
    };

    let snapshot = snapshot(state, req)?;
    // A refresh may have dropped the class from the workbook mid-session.
    let Some(class) = snapshot
        .classes
        .iter()
        .find(|c| c.code == session.class_code)
    else {
        return Err(err(
            &req.id,
            "not_found",
            "class no longer present in workbook",
            Some(json!({ "classCode": session.class_code })),
        ));
    };

    Ok(render_checklist(
        class,
        &snapshot.task_rows,
        &snapshot.standards,
        Local::now().date_naive(),
    ))
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    match view_for_session(state, req) {
        Ok(view) => ok(&req.id, json!({ "view": view })),
        Err(resp) => resp,
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match view_for_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let checked: HashSet<String> = req
        .params
        .get("checkedKeys")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();
    let feedback = req
        .params
        .get("feedback")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if !view.has_tasks {
        return ok(
            &req.id,
            json!({ "status": "empty", "warnings": view.warnings }),
        );
    }

    let outcome = evaluate_submission(&view, &checked);
    if !outcome.complete {
        return err(
            &req.id,
            "incomplete_checklist",
            "還有項目未勾選喔！",
            Some(json!({
                "missingCount": outcome.missing.len(),
                "missingKeys": outcome.missing,
            })),
        );
    }

    // Feedback is surfaced to the operator log only; there is no write path
    // back to the workbook.
    if let Some(text) = &feedback {
        log::info!("feedback from {}: {}", view.class_code, text);
    }

    ok(
        &req.id,
        json!({
            "status": "completed",
            "message": "檢查完成，資料已送出！",
            "checkedCount": view.checkbox_count(),
            "feedback": feedback,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "checklist.view" => Some(handle_view(state, req)),
        "checklist.submit" => Some(handle_submit(state, req)),
        _ => None,
    }
}
