// Sheet and column names are the integration contract with the shared
// workbook. The workbook is maintained by the school's hygiene section in
// Chinese; these exact strings are what the loader must find.
pub const SHEET_CLASSES: &str = "班級清單";
pub const SHEET_LOCATIONS: &str = "地點資料庫";
pub const SHEET_ASSIGNMENTS: &str = "掃區分配總表";
pub const SHEET_STANDARDS: &str = "檢查標準";

pub const COL_CLASS_CODE: &str = "班級代碼";
pub const COL_GRADE: &str = "年級";
pub const COL_DISPLAY_NAME: &str = "顯示名稱";

pub const COL_LOCATION_ID: &str = "地點ID";
pub const COL_BUILDING: &str = "大樓";
pub const COL_FLOOR: &str = "樓層";
pub const COL_DETAIL: &str = "詳細位置";
pub const COL_CHECK_TYPE: &str = "檢查類型";

pub const COL_RESPONSIBLE_CLASS: &str = "負責班級";
pub const COL_NOTE: &str = "特別注意事項";

pub const COL_SUB_CATEGORY: &str = "子分類";
pub const COL_ITEM: &str = "檢查細項";

/// One worksheet read as text. Every cell is stringified at load time, the
/// way the original read the workbook with `dtype=str`; typing happens in
/// the record constructors below.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A required column is missing from a sheet. Carried up as a
/// `schema_mismatch` wire error naming both sides of the contract.
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub sheet: String,
    pub column: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sheet 「{}」 is missing column 「{}」", self.sheet, self.column)
    }
}

impl std::error::Error for SchemaError {}

impl SheetTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == column)
    }

    fn require_column(&self, column: &str) -> Result<usize, SchemaError> {
        self.column_index(column).ok_or_else(|| SchemaError {
            sheet: self.name.clone(),
            column: column.to_string(),
        })
    }

    fn cell<'a>(&'a self, row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(|s| s.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub code: String,
    pub grade: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct LocationRecord {
    pub location_id: String,
    pub building: String,
    pub floor: String,
    pub detail: String,
    pub check_type: String,
}

#[derive(Debug, Clone)]
pub struct AssignmentRecord {
    pub location_id: String,
    pub class_code: String,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct StandardItem {
    pub check_type: String,
    pub sub_category: Option<String>,
    pub item: String,
}

impl ClassRecord {
    /// Validates the class-list schema once and types every row. Rows with a
    /// blank class code are skipped (the workbook keeps spacer rows).
    pub fn from_table(table: &SheetTable) -> Result<Vec<ClassRecord>, SchemaError> {
        let code = table.require_column(COL_CLASS_CODE)?;
        let grade = table.require_column(COL_GRADE)?;
        let display = table.require_column(COL_DISPLAY_NAME)?;

        let mut out = Vec::new();
        for row in &table.rows {
            let code_v = table.cell(row, code).trim();
            if code_v.is_empty() {
                continue;
            }
            out.push(ClassRecord {
                code: code_v.to_string(),
                grade: table.cell(row, grade).trim().to_string(),
                display_name: table.cell(row, display).trim().to_string(),
            });
        }
        Ok(out)
    }
}

impl LocationRecord {
    pub fn from_table(table: &SheetTable) -> Result<Vec<LocationRecord>, SchemaError> {
        let id = table.require_column(COL_LOCATION_ID)?;
        let building = table.require_column(COL_BUILDING)?;
        let floor = table.require_column(COL_FLOOR)?;
        let detail = table.require_column(COL_DETAIL)?;
        let check_type = table.require_column(COL_CHECK_TYPE)?;

        let mut out = Vec::new();
        for row in &table.rows {
            let id_v = table.cell(row, id).trim();
            if id_v.is_empty() {
                continue;
            }
            out.push(LocationRecord {
                location_id: id_v.to_string(),
                building: table.cell(row, building).trim().to_string(),
                floor: table.cell(row, floor).trim().to_string(),
                detail: table.cell(row, detail).trim().to_string(),
                check_type: table.cell(row, check_type).trim().to_string(),
            });
        }
        Ok(out)
    }
}

impl AssignmentRecord {
    pub fn from_table(table: &SheetTable) -> Result<Vec<AssignmentRecord>, SchemaError> {
        let id = table.require_column(COL_LOCATION_ID)?;
        let class = table.require_column(COL_RESPONSIBLE_CLASS)?;
        let note = table.require_column(COL_NOTE)?;

        let mut out = Vec::new();
        for row in &table.rows {
            let id_v = table.cell(row, id).trim();
            if id_v.is_empty() {
                continue;
            }
            out.push(AssignmentRecord {
                location_id: id_v.to_string(),
                class_code: table.cell(row, class).trim().to_string(),
                note: table.cell(row, note).trim().to_string(),
            });
        }
        Ok(out)
    }
}

impl StandardItem {
    /// The sub-category column is optional; sheets without it behave as one
    /// unlabeled group per check-type.
    pub fn from_table(table: &SheetTable) -> Result<Vec<StandardItem>, SchemaError> {
        let check_type = table.require_column(COL_CHECK_TYPE)?;
        let item = table.require_column(COL_ITEM)?;
        let sub = table.column_index(COL_SUB_CATEGORY);

        let mut out = Vec::new();
        for row in &table.rows {
            let item_v = table.cell(row, item).trim();
            if item_v.is_empty() {
                continue;
            }
            let sub_v = sub
                .map(|idx| table.cell(row, idx).trim().to_string())
                .filter(|s| !s.is_empty());
            out.push(StandardItem {
                check_type: table.cell(row, check_type).trim().to_string(),
                sub_category: sub_v,
                item: item_v.to_string(),
            });
        }
        Ok(out)
    }
}
