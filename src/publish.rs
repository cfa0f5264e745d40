//! Output publisher: moves generated artifacts out of the scratch folder.
//!
//! Copy-then-delete rather than rename, since scratch and output may sit on
//! different filesystems.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::collab::placeholder::PLACEHOLDER_SUFFIX;
use crate::error::{PhotoboothError, Result};

/// Name a published artifact: `<millis>_<stem>_halloween.<ext>`.
#[must_use]
pub fn final_name(original_name: &str, artifact: &Path, now: DateTime<Utc>) -> String {
    let stem = original_name.split('.').next().unwrap_or(original_name);
    let ext = artifact
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    format!("{}_{stem}_halloween.{ext}", now.timestamp_millis())
}

/// Description file that accompanies a scratch artifact.
///
/// `video_1_x.mp4` pairs with `video_1_x.txt`; a placeholder
/// `video_1_x_placeholder.jpg` pairs with `video_1_x.txt`.
#[must_use]
pub fn companion_for(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(PLACEHOLDER_SUFFIX) {
        Some(base) => artifact.with_file_name(format!("{base}.txt")),
        None => artifact.with_extension("txt"),
    }
}

/// Point the `Video file:` line of a description at `final_name`.
pub fn rewrite_video_file_line(content: &str, final_name: &str) -> Result<String> {
    let re = Regex::new(r"(?m)^Video file:.*$")
        .map_err(|e| PhotoboothError::Other(format!("invalid regex: {e}")))?;
    let replacement = format!("Video file: {final_name}");
    Ok(re
        .replace(content, regex::NoExpand(&replacement))
        .into_owned())
}

/// Copy `scratch` into `destination` as `final_name`, bring its description
/// along, then remove the scratch copies.
///
/// Only the artifact copy can fail the publish; the description is
/// best-effort.
pub async fn publish(scratch: &Path, final_name: &str, destination: &Path) -> Result<PathBuf> {
    let target = destination.join(final_name);
    let wrap = |source: std::io::Error| PhotoboothError::Publish {
        path: target.clone(),
        source,
    };
    tokio::fs::create_dir_all(destination).await.map_err(wrap)?;
    tokio::fs::copy(scratch, &target).await.map_err(wrap)?;
    tracing::info!(target = %target.display(), "artifact saved to output folder");

    let companion = companion_for(scratch);
    let has_companion = tokio::fs::try_exists(&companion).await.unwrap_or(false);
    if has_companion {
        let companion_target = target.with_extension("txt");
        if let Err(e) = copy_companion(&companion, &companion_target, final_name).await {
            tracing::warn!(
                companion = %companion.display(),
                "could not publish description: {e}"
            );
        }
    }

    if let Err(e) = tokio::fs::remove_file(scratch).await {
        tracing::warn!(scratch = %scratch.display(), "could not clean up scratch artifact: {e}");
    }
    if has_companion {
        if let Err(e) = tokio::fs::remove_file(&companion).await {
            tracing::warn!(scratch = %companion.display(), "could not clean up description: {e}");
        }
    }

    Ok(target)
}

async fn copy_companion(source: &Path, target: &Path, final_name: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(source).await?;
    let content = rewrite_video_file_line(&content, final_name)?;
    tokio::fs::write(target, content).await?;
    Ok(())
}

/// Delete a published video (and its description) from the first folder
/// that holds it.
pub fn delete_video(name: &str, folders: &[PathBuf]) -> Result<bool> {
    if name.is_empty() || Path::new(name).components().count() != 1 {
        return Err(PhotoboothError::Other(format!("invalid video name: {name}")));
    }
    for folder in folders {
        let path = folder.join(name);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            let description = path.with_extension("txt");
            if description.is_file() {
                std::fs::remove_file(&description)?;
            }
            tracing::info!(path = %path.display(), "deleted video");
            return Ok(true);
        }
    }
    Ok(false)
}
