use serde_json::json;
use uuid::Uuid;

use super::{required_str, snapshot};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match snapshot(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let mut grades: Vec<String> = snapshot.classes.iter().map(|c| c.grade.clone()).collect();
    grades.sort();
    grades.dedup();
    ok(&req.id, json!({ "grades": grades }))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grade = match required_str(req, "grade") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let snapshot = match snapshot(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let classes: Vec<serde_json::Value> = snapshot
        .classes
        .iter()
        .filter(|c| c.grade == grade)
        .map(|c| {
            json!({
                "code": c.code,
                "displayName": c.display_name,
                "label": format!("{} - {}", c.code, c.display_name),
            })
        })
        .collect();

    // An empty grade is a workbook gap, not a failure; the page keeps
    // rendering with the warning.
    let warning = classes
        .is_empty()
        .then(|| "此年級無班級資料。".to_string());
    ok(
        &req.id,
        json!({ "grade": grade, "classes": classes, "warning": warning }),
    )
}

fn handle_session_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grade = match required_str(req, "grade") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_code = match required_str(req, "classCode") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let snapshot = match snapshot(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(class) = snapshot
        .classes
        .iter()
        .find(|c| c.code == class_code && c.grade == grade)
    else {
        return err(
            &req.id,
            "not_found",
            "class not found for grade",
            Some(json!({ "grade": grade, "classCode": class_code })),
        );
    };

    let display_name = class.display_name.clone();
    let session_id = Uuid::new_v4().to_string();
    state.sessions.insert(
        session_id.clone(),
        Session {
            class_code: class_code.clone(),
        },
    );

    ok(
        &req.id,
        json!({
            "sessionId": session_id,
            "classCode": class_code,
            "displayName": display_name,
            "greeting": format!("歡迎 {} - {}！請完成今日掃區檢查。", class_code, display_name),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_grades_list(state, req)),
        "classes.list" => Some(handle_classes_list(state, req)),
        "session.login" => Some(handle_session_login(state, req)),
        _ => None,
    }
}
