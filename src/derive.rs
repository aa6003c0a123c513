use std::collections::HashMap;

use crate::model::{AssignmentRecord, ClassRecord, LocationRecord, StandardItem};

/// One class's responsibility for one location: the assignment row joined
/// with its location attributes and its class record.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub location_id: String,
    pub class_code: String,
    pub grade: String,
    pub class_display: String,
    pub building: String,
    pub floor: String,
    pub detail: String,
    pub check_type: String,
    pub note: String,
}

impl TaskRow {
    /// Display title for the location, e.g. "仁愛樓 3F 走廊".
    pub fn full_location_name(&self) -> String {
        let mut parts = Vec::new();
        for p in [&self.building, &self.floor, &self.detail] {
            if !p.is_empty() {
                parts.push(p.as_str());
            }
        }
        parts.join(" ")
    }
}

/// Left-join assignments onto locations by location id, then onto classes by
/// class code. An unmatched location leaves the location attributes blank; a
/// blank or unmatched class code drops the row. Source order is preserved;
/// unmatched location ids come back as warnings so the workbook can be fixed.
pub fn derive_task_rows(
    assignments: &[AssignmentRecord],
    locations: &[LocationRecord],
    classes: &[ClassRecord],
) -> (Vec<TaskRow>, Vec<String>) {
    let location_by_id: HashMap<&str, &LocationRecord> = locations
        .iter()
        .map(|l| (l.location_id.as_str(), l))
        .collect();
    let class_by_code: HashMap<&str, &ClassRecord> =
        classes.iter().map(|c| (c.code.as_str(), c)).collect();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for a in assignments {
        if a.class_code.is_empty() {
            continue;
        }
        let Some(class) = class_by_code.get(a.class_code.as_str()) else {
            warnings.push(format!(
                "掃區分配總表：負責班級「{}」不在班級清單中（地點 {}）",
                a.class_code, a.location_id
            ));
            continue;
        };

        let location = location_by_id.get(a.location_id.as_str());
        if location.is_none() {
            warnings.push(format!("掃區分配總表：地點ID「{}」不在地點資料庫中", a.location_id));
        }

        rows.push(TaskRow {
            location_id: a.location_id.clone(),
            class_code: class.code.clone(),
            grade: class.grade.clone(),
            class_display: class.display_name.clone(),
            building: location.map(|l| l.building.clone()).unwrap_or_default(),
            floor: location.map(|l| l.floor.clone()).unwrap_or_default(),
            detail: location.map(|l| l.detail.clone()).unwrap_or_default(),
            check_type: location.map(|l| l.check_type.clone()).unwrap_or_default(),
            note: a.note.clone(),
        });
    }

    (rows, warnings)
}

/// Checklist items for one sub-category, in sheet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubGroup {
    pub sub_category: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CheckTypeGroup {
    pub check_type: String,
    pub sub_groups: Vec<SubGroup>,
}

/// Standards grouped by check-type, then sub-category. Both levels keep
/// first-occurrence order from the sheet; items with no sub-category form an
/// unlabeled group at the position they first appear.
#[derive(Debug, Clone, Default)]
pub struct StandardGroups {
    groups: Vec<CheckTypeGroup>,
}

impl StandardGroups {
    pub fn for_check_type(&self, check_type: &str) -> Option<&CheckTypeGroup> {
        self.groups.iter().find(|g| g.check_type == check_type)
    }

    pub fn check_types(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.check_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn group_standards(items: &[StandardItem]) -> StandardGroups {
    let mut groups: Vec<CheckTypeGroup> = Vec::new();

    for item in items {
        if item.check_type.is_empty() {
            continue;
        }
        let group = match groups.iter_mut().find(|g| g.check_type == item.check_type) {
            Some(g) => g,
            None => {
                groups.push(CheckTypeGroup {
                    check_type: item.check_type.clone(),
                    sub_groups: Vec::new(),
                });
                groups.last_mut().expect("just pushed")
            }
        };

        let sub = match group
            .sub_groups
            .iter_mut()
            .find(|s| s.sub_category == item.sub_category)
        {
            Some(s) => s,
            None => {
                group.sub_groups.push(SubGroup {
                    sub_category: item.sub_category.clone(),
                    items: Vec::new(),
                });
                group.sub_groups.last_mut().expect("just pushed")
            }
        };
        sub.items.push(item.item.clone());
    }

    StandardGroups { groups }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(code: &str, grade: &str, name: &str) -> ClassRecord {
        ClassRecord {
            code: code.to_string(),
            grade: grade.to_string(),
            display_name: name.to_string(),
        }
    }

    fn location(id: &str, building: &str, floor: &str, detail: &str, ct: &str) -> LocationRecord {
        LocationRecord {
            location_id: id.to_string(),
            building: building.to_string(),
            floor: floor.to_string(),
            detail: detail.to_string(),
            check_type: ct.to_string(),
        }
    }

    fn assignment(id: &str, class: &str, note: &str) -> AssignmentRecord {
        AssignmentRecord {
            location_id: id.to_string(),
            class_code: class.to_string(),
            note: note.to_string(),
        }
    }

    fn standard(ct: &str, sub: Option<&str>, item: &str) -> StandardItem {
        StandardItem {
            check_type: ct.to_string(),
            sub_category: sub.map(|s| s.to_string()),
            item: item.to_string(),
        }
    }

    #[test]
    fn every_task_row_resolves_to_a_class() {
        let classes = vec![class("101", "7", "七年一班")];
        let locations = vec![location("L1", "仁愛樓", "1F", "教室", "教室內")];
        let assignments = vec![
            assignment("L1", "101", ""),
            assignment("L1", "999", ""),
            assignment("L1", "", ""),
        ];

        let (rows, warnings) = derive_task_rows(&assignments, &locations, &classes);
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|r| classes.iter().any(|c| c.code == r.class_code)));
        // Unknown code warns; blank code is silently a spacer.
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("999"));
    }

    #[test]
    fn unmatched_location_keeps_row_with_blank_attributes() {
        let classes = vec![class("101", "7", "七年一班")];
        let assignments = vec![assignment("GHOST", "101", "小心地滑")];

        let (rows, warnings) = derive_task_rows(&assignments, &[], &classes);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].building, "");
        assert_eq!(rows[0].check_type, "");
        assert_eq!(rows[0].note, "小心地滑");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn task_rows_keep_assignment_sheet_order() {
        let classes = vec![class("101", "7", "七年一班"), class("102", "7", "七年二班")];
        let locations = vec![
            location("L1", "A", "1F", "", "教室內"),
            location("L2", "B", "2F", "", "外掃區"),
        ];
        let assignments = vec![
            assignment("L2", "102", ""),
            assignment("L1", "101", ""),
            assignment("L1", "102", ""),
        ];

        let (rows, _) = derive_task_rows(&assignments, &locations, &classes);
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.location_id.as_str(), r.class_code.as_str()))
            .collect();
        assert_eq!(order, vec![("L2", "102"), ("L1", "101"), ("L1", "102")]);
    }

    #[test]
    fn full_location_name_skips_blank_parts() {
        let classes = vec![class("101", "7", "七年一班")];
        let locations = vec![location("L1", "仁愛樓", "", "中庭", "外掃區")];
        let (rows, _) = derive_task_rows(&[assignment("L1", "101", "")], &locations, &classes);
        assert_eq!(rows[0].full_location_name(), "仁愛樓 中庭");
    }

    #[test]
    fn grouping_keeps_source_order_not_lexicographic() {
        let items = vec![
            standard("教室內", Some("黑板"), "板溝無粉筆灰"),
            standard("外掃區", None, "無垃圾"),
            standard("教室內", Some("地板"), "掃地"),
            standard("教室內", Some("黑板"), "黑板擦乾淨"),
            standard("教室內", Some("地板"), "拖地"),
        ];
        let groups = group_standards(&items);

        let types: Vec<&str> = groups.check_types().collect();
        assert_eq!(types, vec!["教室內", "外掃區"]);

        let indoor = groups.for_check_type("教室內").unwrap();
        let subs: Vec<Option<&str>> = indoor
            .sub_groups
            .iter()
            .map(|s| s.sub_category.as_deref())
            .collect();
        assert_eq!(subs, vec![Some("黑板"), Some("地板")]);
        assert_eq!(indoor.sub_groups[0].items, vec!["板溝無粉筆灰", "黑板擦乾淨"]);
        let total: usize = indoor.sub_groups.iter().map(|s| s.items.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn regrouping_identical_input_is_stable() {
        let items = vec![
            standard("教室內", Some("地板"), "掃地"),
            standard("教室內", None, "關燈"),
            standard("外掃區", Some("水溝"), "無落葉"),
        ];
        let a = group_standards(&items);
        let b = group_standards(&items);

        let flat = |g: &StandardGroups| -> Vec<(String, Vec<SubGroup>)> {
            g.check_types()
                .map(|ct| {
                    (
                        ct.to_string(),
                        g.for_check_type(ct).unwrap().sub_groups.clone(),
                    )
                })
                .collect()
        };
        assert_eq!(flat(&a), flat(&b));
    }

    #[test]
    fn unlabeled_sub_group_survives_at_source_position() {
        let items = vec![
            standard("教室內", None, "關燈"),
            standard("教室內", Some("地板"), "掃地"),
            standard("教室內", None, "關窗"),
        ];
        let groups = group_standards(&items);
        let indoor = groups.for_check_type("教室內").unwrap();
        assert_eq!(indoor.sub_groups.len(), 2);
        assert_eq!(indoor.sub_groups[0].sub_category, None);
        assert_eq!(indoor.sub_groups[0].items, vec!["關燈", "關窗"]);
    }

    #[test]
    fn unknown_check_type_lookup_is_none() {
        let groups = group_standards(&[standard("教室內", None, "掃地")]);
        assert!(groups.for_check_type("泳池").is_none());
    }
}
