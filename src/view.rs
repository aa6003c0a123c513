use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::derive::{StandardGroups, TaskRow};
use crate::model::ClassRecord;

/// The interactive page for one logged-in class, as data. The front end
/// renders this verbatim: one section per assigned location, one checkbox
/// per checklist item, two columns per sub-category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistView {
    pub grade: String,
    pub class_code: String,
    pub class_name: String,
    pub date: String,
    pub has_tasks: bool,
    pub locations: Vec<LocationSection>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSection {
    pub location_id: String,
    pub title: String,
    pub check_type: String,
    /// Highlighted note shown above the checklist when present.
    pub note: Option<String>,
    pub standards_missing: bool,
    /// Shown in place of the checklist when `standards_missing`.
    pub placeholder: Option<String>,
    pub sub_groups: Vec<ViewSubGroup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSubGroup {
    pub sub_category: Option<String>,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// Stable key the submit round-trip is keyed on.
    pub key: String,
    pub label: String,
    /// 0 or 1: which of the two display columns the item lands in.
    pub column: u8,
}

pub fn item_key(class_code: &str, location_id: &str, item: &str) -> String {
    format!("{}_{}_{}", class_code, location_id, item)
}

/// Pure render of the checklist page for `class`. Rows belonging to other
/// classes are ignored, so callers can pass the whole snapshot unfiltered.
pub fn render_checklist(
    class: &ClassRecord,
    task_rows: &[TaskRow],
    standards: &StandardGroups,
    today: NaiveDate,
) -> ChecklistView {
    let mut locations = Vec::new();
    let mut warnings = Vec::new();

    for row in task_rows.iter().filter(|r| r.class_code == class.code) {
        let group = standards.for_check_type(&row.check_type);
        let standards_missing = group.is_none();
        let mut sub_groups = Vec::new();
        if let Some(group) = group {
            for sub in &group.sub_groups {
                let items = sub
                    .items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| ChecklistItem {
                        key: item_key(&class.code, &row.location_id, item),
                        label: item.clone(),
                        column: (idx % 2) as u8,
                    })
                    .collect();
                sub_groups.push(ViewSubGroup {
                    sub_category: sub.sub_category.clone(),
                    items,
                });
            }
        } else {
            warnings.push(format!(
                "找不到類型「{}」的檢查標準（{}）",
                row.check_type,
                row.full_location_name()
            ));
        }

        locations.push(LocationSection {
            location_id: row.location_id.clone(),
            title: row.full_location_name(),
            check_type: row.check_type.clone(),
            note: if row.note.is_empty() {
                None
            } else {
                Some(row.note.clone())
            },
            standards_missing,
            placeholder: standards_missing
                .then(|| format!("找不到類型「{}」的檢查標準。", row.check_type)),
            sub_groups,
        });
    }

    let has_tasks = !locations.is_empty();
    if !has_tasks {
        warnings.push("這個班級目前沒有分配到任何掃區。".to_string());
    }

    ChecklistView {
        grade: class.grade.clone(),
        class_code: class.code.clone(),
        class_name: class.display_name.clone(),
        date: today.format("%Y-%m-%d").to_string(),
        has_tasks,
        locations,
        warnings,
    }
}

impl ChecklistView {
    pub fn expected_keys(&self) -> Vec<String> {
        self.locations
            .iter()
            .flat_map(|l| l.sub_groups.iter())
            .flat_map(|g| g.items.iter())
            .map(|i| i.key.clone())
            .collect()
    }

    pub fn checkbox_count(&self) -> usize {
        self.locations
            .iter()
            .flat_map(|l| l.sub_groups.iter())
            .map(|g| g.items.len())
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub complete: bool,
    pub missing: Vec<String>,
}

/// Submission passes only when every expected checkbox key was checked.
/// Nothing is stored either way; resubmission is the only recovery path.
pub fn evaluate_submission(view: &ChecklistView, checked: &HashSet<String>) -> SubmitOutcome {
    let missing: Vec<String> = view
        .expected_keys()
        .into_iter()
        .filter(|k| !checked.contains(k))
        .collect();
    SubmitOutcome {
        complete: missing.is_empty(),
        missing,
    }
}
