use std::io::Cursor;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use calamine::{Data, Reader, Xlsx};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::{export_url, SheetSource, SourceConfig};
use crate::derive::{derive_task_rows, group_standards, StandardGroups, TaskRow};
use crate::model::{
    AssignmentRecord, ClassRecord, LocationRecord, SchemaError, SheetTable, StandardItem,
    SHEET_ASSIGNMENTS, SHEET_CLASSES, SHEET_LOCATIONS, SHEET_STANDARDS,
};

/// Loader failure with a wire-ready code. Mirrors the shape handlers expect
/// when mapping into an error envelope.
#[derive(Debug, Clone)]
pub struct LoadError {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl LoadError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        LoadError {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: &str, message: impl Into<String>, details: serde_json::Value) -> Self {
        LoadError {
            code: code.to_string(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for LoadError {}

impl From<SchemaError> for LoadError {
    fn from(e: SchemaError) -> Self {
        LoadError::with_details(
            "schema_mismatch",
            e.to_string(),
            json!({ "sheet": e.sheet, "column": e.column }),
        )
    }
}

/// Everything derived from one successful workbook read. Immutable once
/// built; replaced wholesale when the cache window lapses.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub classes: Vec<ClassRecord>,
    pub task_rows: Vec<TaskRow>,
    pub standards: StandardGroups,
    pub warnings: Vec<String>,
    pub digest: String,
    pub loaded_at_unix: u64,
    pub location_count: usize,
    pub assignment_count: usize,
    pub standard_item_count: usize,
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn fetch_workbook_bytes(source: &SheetSource) -> Result<Vec<u8>, LoadError> {
    match source {
        SheetSource::Url(share_url) => {
            let url = export_url(share_url);
            let client = reqwest::blocking::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .map_err(|e| LoadError::new("source_unreachable", e.to_string()))?;
            let resp = client
                .get(&url)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(|e| {
                    LoadError::with_details(
                        "source_unreachable",
                        e.to_string(),
                        json!({ "url": url }),
                    )
                })?;
            let bytes = resp
                .bytes()
                .map_err(|e| LoadError::new("source_unreachable", e.to_string()))?;
            Ok(bytes.to_vec())
        }
        SheetSource::File(path) => std::fs::read(path).map_err(|e| {
            LoadError::with_details(
                "source_unreachable",
                e.to_string(),
                json!({ "path": path.to_string_lossy() }),
            )
        }),
    }
}

/// Workbook cells come back typed from calamine; the pipeline wants the text
/// the sheet shows. Integer-valued floats print without the trailing ".0" so
/// numeric class codes match their text form.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(_) => String::new(),
    }
}

pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<SheetTable>, LoadError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| LoadError::new("workbook_invalid", e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let mut tables = Vec::new();
    for required in [
        SHEET_CLASSES,
        SHEET_LOCATIONS,
        SHEET_ASSIGNMENTS,
        SHEET_STANDARDS,
    ] {
        if !sheet_names.iter().any(|n| n == required) {
            return Err(LoadError::with_details(
                "missing_sheet",
                format!("找不到工作表：「{}」", required),
                json!({ "sheet": required, "found": sheet_names.clone() }),
            ));
        }
        let range = workbook
            .worksheet_range(required)
            .map_err(|e| LoadError::new("workbook_invalid", e.to_string()))?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = rows_iter
            .next()
            .map(|r| r.iter().map(cell_text).collect())
            .unwrap_or_default();
        let rows: Vec<Vec<String>> = rows_iter
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        tables.push(SheetTable {
            name: required.to_string(),
            headers,
            rows,
        });
    }
    Ok(tables)
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn build_snapshot(config: &SourceConfig) -> Result<Snapshot, LoadError> {
    let bytes = fetch_workbook_bytes(&config.source)?;
    let digest = digest_hex(&bytes);
    let tables = parse_workbook(&bytes)?;
    // parse_workbook returns the four sheets in required order.
    let [classes_t, locations_t, assignments_t, standards_t]: [SheetTable; 4] = tables
        .try_into()
        .map_err(|_| LoadError::new("workbook_invalid", "unexpected sheet count"))?;

    let classes = ClassRecord::from_table(&classes_t)?;
    let locations = LocationRecord::from_table(&locations_t)?;
    let assignments = AssignmentRecord::from_table(&assignments_t)?;
    let standard_items = StandardItem::from_table(&standards_t)?;

    let (task_rows, mut warnings) = derive_task_rows(&assignments, &locations, &classes);
    let standards = group_standards(&standard_items);
    if standards.is_empty() {
        warnings.push("檢查標準：工作表沒有任何檢查項目".to_string());
    }

    // A task row whose check-type has no standards group still renders, with
    // a placeholder; report it here so the workbook owner sees it once.
    let mut missing_types: Vec<&str> = Vec::new();
    for row in &task_rows {
        if row.check_type.is_empty() || standards.for_check_type(&row.check_type).is_some() {
            continue;
        }
        if !missing_types.contains(&row.check_type.as_str()) {
            missing_types.push(&row.check_type);
        }
    }
    for t in missing_types {
        warnings.push(format!("檢查標準：找不到類型「{}」的檢查項目", t));
    }

    let loaded_at_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    Ok(Snapshot {
        classes,
        task_rows,
        standards,
        warnings,
        digest,
        loaded_at_unix,
        location_count: locations.len(),
        assignment_count: assignments.len(),
        standard_item_count: standard_items.len(),
    })
}

struct CachedSnapshot {
    fetched_at: Instant,
    snapshot: Snapshot,
}

/// Single-slot memoization of the last successful read. Within the TTL the
/// remote fetch is skipped; after it, the next access rebuilds the snapshot
/// wholesale. A failed rebuild surfaces its error instead of stale data.
#[derive(Default)]
pub struct SnapshotCache {
    slot: Option<CachedSnapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        SnapshotCache { slot: None }
    }

    pub fn age(&self) -> Option<Duration> {
        self.slot.as_ref().map(|c| c.fetched_at.elapsed())
    }

    pub fn digest(&self) -> Option<&str> {
        self.slot.as_ref().map(|c| c.snapshot.digest.as_str())
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn current(&mut self, config: &SourceConfig) -> Result<&Snapshot, LoadError> {
        let stale = match &self.slot {
            None => true,
            Some(c) => c.fetched_at.elapsed() >= config.cache_ttl,
        };
        if stale {
            log::info!("loading workbook from {}", config.source.describe());
            let snapshot = build_snapshot(config)?;
            if !snapshot.warnings.is_empty() {
                for w in &snapshot.warnings {
                    log::warn!("workbook: {}", w);
                }
            }
            self.slot = Some(CachedSnapshot {
                fetched_at: Instant::now(),
                snapshot,
            });
        }
        match self.slot.as_ref() {
            Some(c) => Ok(&c.snapshot),
            None => Err(LoadError::new("no_snapshot", "workbook has not been loaded")),
        }
    }

    pub fn refresh(&mut self, config: &SourceConfig) -> Result<&Snapshot, LoadError> {
        self.invalidate();
        self.current(config)
    }
}
