use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::ingest::hasher::to_utc;
use crate::models::MediaFile;

/// Photo extensions accepted from the input folder.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "raw", "cr2", "nef",
];

/// Video extensions listed from the output and screensaver folders.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Non-recursive folder scanner.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Photos in the folder, newest-created first.
    ///
    /// A missing or unreadable folder yields an empty list.
    #[must_use]
    pub fn list_input_files(&self) -> Vec<MediaFile> {
        let mut files = self.list_matching(is_image_file);
        sort_newest_first(&mut files);
        files
    }

    /// Videos in the folder, newest-created first.
    #[must_use]
    pub fn list_videos(&self) -> Vec<MediaFile> {
        let mut files = self.list_matching(is_video_file);
        sort_newest_first(&mut files);
        files
    }

    fn list_matching(&self, accept: fn(&str) -> bool) -> Vec<MediaFile> {
        if !self.root.is_dir() {
            tracing::debug!(dir = %self.root.display(), "folder missing, nothing to scan");
            return Vec::new();
        }

        WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(true) // skip dotfiles like .DS_Store
            .max_depth(Some(1))
            .follow_links(false)
            .build()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::warn!(dir = %self.root.display(), "scan error: {err}");
                    None
                }
            })
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                if !accept(&name) {
                    return None;
                }
                // The file may disappear between listing and stat.
                let meta = e.metadata().ok()?;
                let modified = meta.modified().ok()?;
                let created = meta.created().unwrap_or(modified);
                Some(MediaFile {
                    id: name.clone(),
                    mime_type: mime_type(&name),
                    path: e.into_path(),
                    name,
                    created_at: to_utc(created),
                    size: meta.len(),
                })
            })
            .collect()
    }
}

fn sort_newest_first(files: &mut [MediaFile]) {
    files.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

#[must_use]
pub fn is_image_file(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[must_use]
pub fn is_video_file(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Map a file name to its MIME type.
#[must_use]
pub fn mime_type(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn lists_only_images() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg", 0);
        touch(tmp.path(), "b.PNG", 0);
        touch(tmp.path(), "notes.txt", 0);
        touch(tmp.path(), "clip.mp4", 0);
        touch(tmp.path(), ".hidden.jpg", 0);

        let files = Scanner::new(tmp.path()).list_input_files();
        let mut names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
        assert!(files.iter().all(|f| f.mime_type.starts_with("image/")));
    }

    #[test]
    fn does_not_recurse() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        touch(&tmp.path().join("nested"), "deep.jpg", 0);
        touch(tmp.path(), "top.jpg", 0);

        let files = Scanner::new(tmp.path()).list_input_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "top.jpg");
    }

    #[test]
    fn missing_folder_is_empty() {
        let tmp = TempDir::new().unwrap();
        let files = Scanner::new(tmp.path().join("nope")).list_input_files();
        assert!(files.is_empty());
    }

    fn media(name: &str, created_secs: i64) -> MediaFile {
        MediaFile {
            id: name.into(),
            name: name.into(),
            path: PathBuf::from(name),
            created_at: chrono::DateTime::from_timestamp(created_secs, 0).unwrap(),
            mime_type: mime_type(name),
            size: 0,
        }
    }

    #[test]
    fn sorted_newest_first() {
        let mut files = vec![
            media("old.jpg", 1_000),
            media("b.jpg", 3_000),
            media("new.jpg", 5_000),
            media("a.jpg", 3_000),
        ];
        sort_newest_first(&mut files);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["new.jpg", "a.jpg", "b.jpg", "old.jpg"]);
    }

    #[test]
    fn listing_is_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "one.jpg", 0);
        touch(tmp.path(), "two.jpg", 0);
        let files = Scanner::new(tmp.path()).list_input_files();
        assert_eq!(files.len(), 2);
        assert!(files[0].created_at >= files[1].created_at);
        if files[0].created_at == files[1].created_at {
            assert_eq!(files[0].name, "one.jpg");
        }
    }

    #[test]
    fn lists_videos() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.mp4", 0);
        touch(tmp.path(), "b.webm", 0);
        touch(tmp.path(), "a.txt", 0);
        let files = Scanner::new(tmp.path()).list_videos();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_type("x.JPEG"), "image/jpeg");
        assert_eq!(mime_type("x.mov"), "video/quicktime");
        assert_eq!(mime_type("x.cr2"), "application/octet-stream");
        assert_eq!(mime_type("noext"), "application/octet-stream");
    }

    #[test]
    fn extension_checks() {
        assert!(is_image_file("IMG_0001.NEF"));
        assert!(!is_image_file("video.mp4"));
        assert!(is_video_file("clip.MKV"));
        assert!(!is_video_file("photo.jpg"));
    }
}
