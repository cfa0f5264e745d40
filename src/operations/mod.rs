//! Outward queries and commands.
//!
//! These are the operations a front end (the CLI here, a gallery server
//! elsewhere) calls into; each returns a serializable result.

pub mod history;
pub mod status;
pub mod videos;

pub use history::{
    list_records, prune_history, reset_history, PruneResult, RecordsResult, ResetResult,
};
pub use status::{get_status, StatusResult};
pub use videos::{
    delete_video, list_output_videos, list_screensaver_videos, DeleteResult, VideosResult,
};
