
use serde_json::json;
use test_support::{
    login_101, request_ok, select_default_source, sheet, spawn_sidecar, temp_dir, view_item_keys,
    write_workbook,
};

fn view_for(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
    session_id: &str,
) -> serde_json::Value {
    request_ok(
        stdin,
        reader,
        "view",
        "checklist.view",
        json!({ "sessionId": session_id }),
    )
}

#[test]
fn indoor_location_renders_two_sub_headers_and_six_checkboxes() {
    let workspace = temp_dir("sweepd-view-indoor");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_default_source(&mut stdin, &mut reader, &workspace);
    let session_id = login_101(&mut stdin, &mut reader);

    let result = view_for(&mut stdin, &mut reader, &session_id);
    let view = result.get("view").expect("view");
    assert_eq!(view.get("hasTasks"), Some(&json!(true)));
    assert_eq!(view.get("classCode"), Some(&json!("101")));

    let locations = view
        .get("locations")
        .and_then(|v| v.as_array())
        .expect("locations");
    assert_eq!(locations.len(), 2);

    // L1 is the indoor classroom: two sub-categories of three items each.
    let indoor = &locations[0];
    assert_eq!(indoor.get("title"), Some(&json!("仁愛樓 1F 101教室")));
    let groups = indoor
        .get("subGroups")
        .and_then(|v| v.as_array())
        .expect("subGroups");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].get("subCategory"), Some(&json!("地板")));
    assert_eq!(groups[1].get("subCategory"), Some(&json!("黑板")));
    let item_total: usize = groups
        .iter()
        .map(|g| g.get("items").and_then(|v| v.as_array()).map(|a| a.len()).unwrap_or(0))
        .sum();
    assert_eq!(item_total, 6);

    // The outdoor note comes through highlighted; blank notes stay null.
    let outdoor = &locations[1];
    assert_eq!(outdoor.get("note"), Some(&json!("每週五需刷洗水溝")));
    assert!(indoor.get("note").map(|v| v.is_null()).unwrap_or(false));
}

#[test]
fn class_without_assignments_gets_empty_state() {
    let workspace = temp_dir("sweepd-view-empty");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_default_source(&mut stdin, &mut reader, &workspace);

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "login",
        "session.login",
        json!({ "grade": "8", "classCode": "201" }),
    );
    let session_id = login
        .get("sessionId")
        .and_then(|v| v.as_str())
        .expect("sessionId");

    let result = view_for(&mut stdin, &mut reader, session_id);
    let view = result.get("view").expect("view");
    assert_eq!(view.get("hasTasks"), Some(&json!(false)));
    assert_eq!(
        view.get("locations").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );
    let warnings = view
        .get("warnings")
        .and_then(|v| v.as_array())
        .expect("warnings");
    assert!(warnings
        .iter()
        .any(|w| w.as_str().unwrap_or("").contains("沒有分配到任何掃區")));
}

#[test]
fn unmatched_check_type_degrades_to_placeholder_for_that_location_only() {
    let workspace = temp_dir("sweepd-view-placeholder");
    let workbook = workspace.join("sweep-areas.xlsx");
    write_workbook(
        &workbook,
        &[
            sheet(
                "班級清單",
                &["班級代碼", "年級", "顯示名稱"],
                &[&["101", "7", "七年一班"]],
            ),
            sheet(
                "地點資料庫",
                &["地點ID", "大樓", "樓層", "詳細位置", "檢查類型"],
                &[
                    &["L1", "仁愛樓", "1F", "101教室", "教室內"],
                    &["L2", "", "", "游泳池畔", "泳池"],
                ],
            ),
            sheet(
                "掃區分配總表",
                &["地點ID", "負責班級", "特別注意事項"],
                &[&["L1", "101", ""], &["L2", "101", ""]],
            ),
            sheet(
                "檢查標準",
                &["檢查類型", "子分類", "檢查細項"],
                &[&["教室內", "地板", "掃地"]],
            ),
        ],
    );

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let select = request_ok(
        &mut stdin,
        &mut reader,
        "select",
        "source.select",
        json!({ "path": workbook.to_string_lossy() }),
    );
    // The snapshot itself reports the unmatched check-type once.
    let warnings = select
        .get("warnings")
        .and_then(|v| v.as_array())
        .expect("warnings");
    assert!(warnings
        .iter()
        .any(|w| w.as_str().unwrap_or("").contains("泳池")));

    let session_id = login_101(&mut stdin, &mut reader);
    let result = view_for(&mut stdin, &mut reader, &session_id);
    let view = result.get("view").expect("view");
    let locations = view
        .get("locations")
        .and_then(|v| v.as_array())
        .expect("locations");
    assert_eq!(locations.len(), 2);

    assert_eq!(locations[0].get("standardsMissing"), Some(&json!(false)));
    assert_eq!(locations[1].get("standardsMissing"), Some(&json!(true)));
    assert!(locations[1]
        .get("placeholder")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .contains("找不到類型「泳池」"));

    // Only the matched location contributes checkboxes.
    let keys = view_item_keys(&result);
    assert_eq!(keys, vec!["101_L1_掃地".to_string()]);
}

#[test]
fn classes_list_for_unknown_grade_warns_instead_of_failing() {
    let workspace = temp_dir("sweepd-view-nograde");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_default_source(&mut stdin, &mut reader, &workspace);

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "classes",
        "classes.list",
        json!({ "grade": "9" }),
    );
    assert_eq!(
        result.get("classes").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );
    assert!(result
        .get("warning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .contains("無班級資料"));
}
