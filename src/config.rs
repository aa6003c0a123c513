use std::path::PathBuf;
use std::time::Duration;

/// Where the shared workbook lives. The original deployment points at a
/// Google Sheets share link; local files exist so the service can run
/// against an exported copy (and so tests can run offline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    Url(String),
    File(PathBuf),
}

impl SheetSource {
    pub fn describe(&self) -> String {
        match self {
            SheetSource::Url(u) => u.clone(),
            SheetSource::File(p) => p.to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub source: SheetSource,
    pub cache_ttl: Duration,
    /// Check-type tag that marks a location as indoor for the printable
    /// report's indoor/other partition.
    pub indoor_check_type: String,
}

pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
pub const DEFAULT_INDOOR_CHECK_TYPE: &str = "教室內";

impl SourceConfig {
    pub fn new(source: SheetSource) -> Self {
        SourceConfig {
            source,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            indoor_check_type: DEFAULT_INDOOR_CHECK_TYPE.to_string(),
        }
    }

    /// Source taken from the environment, if configured. URL wins over file
    /// when both are set.
    pub fn from_env() -> Option<Self> {
        if let Ok(url) = std::env::var("SWEEPD_SHEET_URL") {
            if !url.trim().is_empty() {
                return Some(SourceConfig::new(SheetSource::Url(url.trim().to_string())));
            }
        }
        if let Ok(path) = std::env::var("SWEEPD_SHEET_FILE") {
            if !path.trim().is_empty() {
                return Some(SourceConfig::new(SheetSource::File(PathBuf::from(path.trim()))));
            }
        }
        None
    }
}

/// Rewrite a Google Sheets share link into its xlsx export form.
/// `https://docs.google.com/spreadsheets/d/<id>/edit?usp=sharing`
/// becomes `https://docs.google.com/spreadsheets/d/<id>/export?format=xlsx`.
/// Anything without an `/edit` segment is used as-is.
pub fn export_url(share_url: &str) -> String {
    match share_url.find("/edit") {
        Some(idx) => format!("{}/export?format=xlsx", &share_url[..idx]),
        None => share_url.to_string(),
    }
}
