use std::collections::HashMap;

use serde::Deserialize;

use crate::config::SourceConfig;
use crate::sheets::SnapshotCache;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A logged-in class. "Login" is a dropdown selection, not authentication;
/// the session only pins which class the checklist requests are about.
#[derive(Debug, Clone)]
pub struct Session {
    pub class_code: String,
}

pub struct AppState {
    pub config: Option<SourceConfig>,
    pub cache: SnapshotCache,
    pub sessions: HashMap<String, Session>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            config: None,
            cache: SnapshotCache::new(),
            sessions: HashMap::new(),
        }
    }
}
