//! Gallery and screensaver listings.

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::ingest::scanner::Scanner;
use crate::models::MediaFile;
use crate::publish;

/// Videos found in one folder.
#[derive(Debug, Clone, Serialize)]
pub struct VideosResult {
    pub count: usize,
    pub videos: Vec<MediaFile>,
}

impl From<Vec<MediaFile>> for VideosResult {
    fn from(videos: Vec<MediaFile>) -> Self {
        Self {
            count: videos.len(),
            videos,
        }
    }
}

/// Result of deleting a video.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub name: String,
    pub deleted: bool,
}

/// Published videos, newest first.
#[must_use]
pub fn list_output_videos(config: &Config) -> VideosResult {
    Scanner::new(config.output_dir()).list_videos().into()
}

/// Fallback loop videos shown when nothing new is published.
#[must_use]
pub fn list_screensaver_videos(config: &Config) -> VideosResult {
    Scanner::new(config.screensaver_dir()).list_videos().into()
}

/// Delete a video from output or, failing that, the screensaver folder.
pub fn delete_video(config: &Config, name: &str) -> Result<DeleteResult> {
    let folders = [config.output_dir(), config.screensaver_dir()];
    let deleted = publish::delete_video(name, &folders)?;
    Ok(DeleteResult {
        name: name.to_string(),
        deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_each_folder_separately() {
        let tmp = TempDir::new().unwrap();
        let config = Config::new(tmp.path());
        config.ensure_dirs().unwrap();
        std::fs::write(config.output_dir().join("1_a_halloween.mp4"), b"v").unwrap();
        std::fs::write(config.output_dir().join("1_a_halloween.txt"), b"d").unwrap();
        std::fs::write(config.screensaver_dir().join("loop1.mp4"), b"v").unwrap();
        std::fs::write(config.screensaver_dir().join("loop2.webm"), b"v").unwrap();

        let output = list_output_videos(&config);
        assert_eq!(output.count, 1);
        assert_eq!(output.videos[0].mime_type, "video/mp4");
        assert_eq!(list_screensaver_videos(&config).count, 2);
    }

    #[test]
    fn delete_reports_missing() {
        let tmp = TempDir::new().unwrap();
        let config = Config::new(tmp.path());
        config.ensure_dirs().unwrap();
        let result = delete_video(&config, "nope.mp4").unwrap();
        assert!(!result.deleted);
    }
}
