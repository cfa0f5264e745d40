use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{PhotoboothError, Result};

/// Identity of an input file at the moment it was probed.
///
/// The fingerprint covers content, byte size and creation time; the other
/// fields are diagnostics copied into the ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub name: String,
    pub fingerprint: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileIdentity {
    /// Short fingerprint prefix for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.fingerprint[..self.fingerprint.len().min(8)]
    }
}

/// Fingerprint a file: SHA-256 over its bytes, its size and its creation time.
///
/// Falls back to the modification time where the platform has no birth time.
pub fn fingerprint(path: &Path, name: &str) -> Result<FileIdentity> {
    let wrap = |source: std::io::Error| PhotoboothError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(path).map_err(wrap)?;
    let modified = meta.modified().map_err(wrap)?;
    let created = meta.created().unwrap_or(modified);

    let file = File::open(path).map_err(wrap)?;
    let mut hasher = Sha256::new();
    digest_reader(file, &mut hasher).map_err(wrap)?;
    let created_at = to_utc(created);
    hasher.update(meta.len().to_string().as_bytes());
    hasher.update(iso_millis(&created_at).as_bytes());

    Ok(FileIdentity {
        path: path.to_path_buf(),
        name: name.to_string(),
        fingerprint: format!("{:x}", hasher.finalize()),
        size: meta.len(),
        created_at,
        modified_at: to_utc(modified),
    })
}

/// PERF: streams through an 8KB buffer instead of reading the whole photo.
fn digest_reader(file: File, hasher: &mut Sha256) -> std::io::Result<()> {
    let mut reader = BufReader::with_capacity(8192, file);
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..bytes_read]);
    }
}

#[must_use]
pub fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
#[must_use]
pub fn iso_millis(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
