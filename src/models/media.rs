use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A photo or video found in one of the working folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Stable id for outward listings (the file name).
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "createdTime")]
    pub created_at: DateTime<Utc>,
    pub mime_type: &'static str,
    pub size: u64,
}
