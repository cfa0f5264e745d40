// Pedantic lint configuration for the crate.
// Most of these are reasonable but too strict for this codebase:
// - cast_possible_wrap: Millisecond timestamps never exceed i64
// - missing_errors_doc: Error handling is self-evident from Result types
// - missing_panics_doc: Panics are rare and documented inline
// - items_after_statements: Output structs are clearer near their usage
// - needless_pass_by_value: Sometimes clearer semantically
// - option_if_let_else: if-let is often clearer
// - module_name_repetitions: `watcher::WatcherStatus` reads better at call sites
// - manual_let_else: if-let with early return is often clearer in context
#![allow(
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::items_after_statements,
    clippy::needless_pass_by_value,
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::manual_let_else
)]

pub mod cli;
pub mod collab;
pub mod config;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod models;
pub mod operations;
pub mod publish;
pub mod watcher;
