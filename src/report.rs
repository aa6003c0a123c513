use chrono::NaiveDate;

use crate::derive::{StandardGroups, TaskRow};
use crate::docx::{DocSection, DocxDocument, SectionStart};
use crate::model::ClassRecord;

pub const REPORT_TITLE: &str = "校園掃區檢核表";
const INDOOR_LABEL: &str = "室內掃區";
const OUTDOOR_LABEL: &str = "室外掃區";

pub fn class_file_name(class_code: &str) -> String {
    format!("掃區檢核表_{}.docx", class_code)
}

pub fn batch_file_name() -> String {
    "掃區檢核表_全校.docx".to_string()
}

/// Printable checklist for one class: an indoor section and an
/// everything-else section, each carrying the class header, the location
/// checklists and the signature grid. The outdoor section starts on a fresh
/// odd page so double-sided printing keeps the two apart.
pub fn class_report(
    class: &ClassRecord,
    task_rows: &[TaskRow],
    standards: &StandardGroups,
    indoor_check_type: &str,
    today: NaiveDate,
) -> DocxDocument {
    let mut doc = DocxDocument::new();
    doc.sections = class_sections(
        class,
        task_rows,
        standards,
        indoor_check_type,
        today,
        SectionStart::NextPage,
    );
    doc
}

/// Whole-institution export: every class with task rows, in class-code
/// order, each class's first section forced onto a fresh odd page. Classes
/// with nothing assigned are skipped and reported back.
pub fn batch_report(
    classes: &[ClassRecord],
    task_rows: &[TaskRow],
    standards: &StandardGroups,
    indoor_check_type: &str,
    today: NaiveDate,
) -> (DocxDocument, Vec<String>) {
    let mut ordered: Vec<&ClassRecord> = classes.iter().collect();
    ordered.sort_by(|a, b| a.code.cmp(&b.code));

    let mut doc = DocxDocument::new();
    let mut skipped = Vec::new();
    for class in ordered {
        let first_start = if doc.sections.is_empty() {
            SectionStart::NextPage
        } else {
            SectionStart::OddPage
        };
        let sections = class_sections(
            class,
            task_rows,
            standards,
            indoor_check_type,
            today,
            first_start,
        );
        if sections.is_empty() {
            skipped.push(class.code.clone());
        } else {
            doc.sections.extend(sections);
        }
    }
    (doc, skipped)
}

fn class_sections(
    class: &ClassRecord,
    task_rows: &[TaskRow],
    standards: &StandardGroups,
    indoor_check_type: &str,
    today: NaiveDate,
    first_start: SectionStart,
) -> Vec<DocSection> {
    let rows: Vec<&TaskRow> = task_rows
        .iter()
        .filter(|r| r.class_code == class.code)
        .collect();
    let (indoor, outdoor): (Vec<&TaskRow>, Vec<&TaskRow>) = rows
        .into_iter()
        .partition(|r| r.check_type == indoor_check_type);

    let mut sections = Vec::new();
    for (label, partition) in [(INDOOR_LABEL, indoor), (OUTDOOR_LABEL, outdoor)] {
        if partition.is_empty() {
            continue;
        }
        let start = if sections.is_empty() {
            first_start
        } else {
            SectionStart::OddPage
        };
        sections.push(partition_section(
            class, label, &partition, standards, today, start,
        ));
    }
    sections
}

fn partition_section(
    class: &ClassRecord,
    label: &str,
    rows: &[&TaskRow],
    standards: &StandardGroups,
    today: NaiveDate,
    start: SectionStart,
) -> DocSection {
    let mut section = DocSection::new(start);
    section.heading(1, format!("{} {}", class.display_name, REPORT_TITLE));
    section.paragraph(format!(
        "班級代碼：{}　年級：{}　日期：{}",
        class.code,
        class.grade,
        today.format("%Y-%m-%d")
    ));
    section.heading(2, label);

    for row in rows {
        location_blocks(&mut section, row, standards);
    }

    signature_grid(&mut section, today);
    section
}

fn location_blocks(section: &mut DocSection, row: &TaskRow, standards: &StandardGroups) {
    section.heading(2, row.full_location_name());
    if !row.note.is_empty() {
        section.note(format!("注意：{}", row.note));
    }

    let Some(group) = standards.for_check_type(&row.check_type) else {
        section.paragraph(format!("（找不到類型「{}」的檢查標準）", row.check_type));
        return;
    };

    for sub in &group.sub_groups {
        if let Some(name) = &sub.sub_category {
            section.label(format!("◆ {}", name));
        }
        section.table(checkbox_rows(&sub.items));
    }
}

/// Items flow left-to-right into a two-column grid, one checkbox glyph per
/// cell; an odd item count leaves the last cell blank.
fn checkbox_rows(items: &[String]) -> Vec<Vec<String>> {
    items
        .chunks(2)
        .map(|pair| {
            let mut row: Vec<String> = pair.iter().map(|i| format!("□ {}", i)).collect();
            row.resize(2, String::new());
            row
        })
        .collect()
}

fn signature_grid(section: &mut DocSection, today: NaiveDate) {
    section.paragraph(String::new());
    section.table(vec![
        vec![
            format!("檢查日期：{}", today.format("%m/%d")),
            "班級導師簽章".to_string(),
            "檢查人員簽章".to_string(),
        ],
        vec![String::new(), String::new(), String::new()],
    ]);
}
