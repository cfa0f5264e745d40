//! Ledger maintenance: dump, reset and prune processing history.

use serde::Serialize;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::FileRecord;

#[derive(Debug, Clone, Serialize)]
pub struct RecordsResult {
    pub count: usize,
    pub records: Vec<FileRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetResult {
    pub cleared: usize,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneResult {
    pub removed: usize,
    pub remaining: usize,
}

#[must_use]
pub fn list_records(ledger: &Ledger) -> RecordsResult {
    let records = ledger.records();
    RecordsResult {
        count: records.len(),
        records,
    }
}

/// Forget every processed photo. Everything in the input folder becomes
/// eligible again on the next tick.
pub fn reset_history(ledger: &mut Ledger) -> Result<ResetResult> {
    let cleared = ledger.count();
    ledger.reset_all()?;
    Ok(ResetResult {
        cleared,
        message: "Input processing history cleared. \
                  All images in input folder will be treated as new.",
    })
}

pub fn prune_history(ledger: &mut Ledger, days: u32) -> Result<PruneResult> {
    let removed = ledger.prune_older_than(days)?;
    Ok(PruneResult {
        removed,
        remaining: ledger.count(),
    })
}
