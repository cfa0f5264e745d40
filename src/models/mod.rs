pub mod file;
pub mod media;

pub use file::{FileRecord, RecordState};
pub use media::MediaFile;
