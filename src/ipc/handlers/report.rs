use std::path::PathBuf;

use chrono::Local;
use serde_json::json;

use super::{required_str, snapshot};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::report::{batch_file_name, batch_report, class_file_name, class_report};

fn indoor_check_type(state: &AppState) -> String {
    state
        .config
        .as_ref()
        .map(|c| c.indoor_check_type.clone())
        .unwrap_or_default()
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_code = match required_str(req, "classCode") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let out_dir = match required_str(req, "outDir") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };

    let indoor = indoor_check_type(state);
    let snapshot = match snapshot(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(class) = snapshot.classes.iter().find(|c| c.code == class_code) else {
        return err(
            &req.id,
            "not_found",
            "class not found",
            Some(json!({ "classCode": class_code })),
        );
    };
    if !snapshot.task_rows.iter().any(|r| r.class_code == class_code) {
        return err(
            &req.id,
            "no_tasks",
            "這個班級目前沒有分配到任何掃區。",
            Some(json!({ "classCode": class_code })),
        );
    }

    let doc = class_report(
        class,
        &snapshot.task_rows,
        &snapshot.standards,
        &indoor,
        Local::now().date_naive(),
    );
    let file_name = class_file_name(&class_code);
    write_document(req, &doc, &out_dir, &file_name, json!({}))
}

fn handle_export_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_dir = match required_str(req, "outDir") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };

    let indoor = indoor_check_type(state);
    let snapshot = match snapshot(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let (doc, skipped) = batch_report(
        &snapshot.classes,
        &snapshot.task_rows,
        &snapshot.standards,
        &indoor,
        Local::now().date_naive(),
    );
    if doc.sections.is_empty() {
        return err(
            &req.id,
            "no_tasks",
            "沒有任何班級分配到掃區。",
            None,
        );
    }

    let class_count = snapshot.classes.len() - skipped.len();
    write_document(
        req,
        &doc,
        &out_dir,
        &batch_file_name(),
        json!({ "classCount": class_count, "skippedClasses": skipped }),
    )
}

fn write_document(
    req: &Request,
    doc: &crate::docx::DocxDocument,
    out_dir: &std::path::Path,
    file_name: &str,
    mut extra: serde_json::Value,
) -> serde_json::Value {
    let out_path = out_dir.join(file_name);
    let bytes = match doc.to_bytes() {
        Ok(b) => b,
        Err(e) => return err(&req.id, "export_failed", format!("{e:?}"), None),
    };
    if let Err(e) = std::fs::create_dir_all(out_dir) {
        return err(&req.id, "export_failed", e.to_string(), None);
    }
    if let Err(e) = std::fs::write(&out_path, &bytes) {
        return err(&req.id, "export_failed", e.to_string(), None);
    }

    extra["path"] = json!(out_path.to_string_lossy());
    extra["fileName"] = json!(file_name);
    extra["sectionCount"] = json!(doc.sections.len());
    extra["byteCount"] = json!(bytes.len());
    ok(&req.id, extra)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "report.export" => Some(handle_export(state, req)),
        "report.exportAll" => Some(handle_export_all(state, req)),
        _ => None,
    }
}
