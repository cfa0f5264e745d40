use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;

use crate::collab::Generator;
use crate::error::Result;
use crate::ingest::hasher::iso_millis;

/// Suffix marking a placeholder artifact; its description drops the suffix.
pub const PLACEHOLDER_SUFFIX: &str = "_placeholder";

/// Stands in for a real video: copies the photo into the scratch folder and
/// writes a description next to it.
#[derive(Debug, Clone)]
pub struct PlaceholderGenerator {
    temp: PathBuf,
}

impl PlaceholderGenerator {
    pub fn new(temp: impl Into<PathBuf>) -> Self {
        Self { temp: temp.into() }
    }
}

#[async_trait]
impl Generator for PlaceholderGenerator {
    async fn generate(
        &self,
        directive: &str,
        image: &Path,
        original_name: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.temp).await?;

        let stem = Path::new(original_name)
            .file_stem()
            .map_or_else(|| original_name.to_string(), |s| s.to_string_lossy().into_owned());
        let ext = image.extension().and_then(|e| e.to_str()).unwrap_or("jpg");
        let now = Utc::now();
        let base = format!("video_{}_{stem}", now.timestamp_millis());

        let artifact_name = format!("{base}{PLACEHOLDER_SUFFIX}.{ext}");
        let artifact = self.temp.join(&artifact_name);
        let description = format!(
            "# Halloween Video - Placeholder\n\
             Generated from: {original_name}\n\
             Prompt: {directive}\n\
             Timestamp: {}\n\
             Model: Placeholder (video generation unavailable)\n\
             Video file: {artifact_name}\n\
             \n\
             This would be replaced by a generated video.\n",
            iso_millis(&now)
        );

        tokio::fs::copy(image, &artifact).await?;
        tokio::fs::write(self.temp.join(format!("{base}.txt")), description).await?;
        tracing::warn!(artifact = %artifact.display(), "created placeholder instead of a video");
        Ok(artifact)
    }
}

/// Wraps a generator and substitutes a placeholder when it fails.
#[derive(Debug, Clone)]
pub struct WithPlaceholder<G> {
    inner: G,
    placeholder: PlaceholderGenerator,
}

impl<G> WithPlaceholder<G> {
    pub fn new(inner: G, placeholder: PlaceholderGenerator) -> Self {
        Self { inner, placeholder }
    }
}

#[async_trait]
impl<G: Generator> Generator for WithPlaceholder<G> {
    async fn generate(
        &self,
        directive: &str,
        image: &Path,
        original_name: &str,
    ) -> Result<PathBuf> {
        match self.inner.generate(directive, image, original_name).await {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                tracing::warn!(file = original_name, "generation failed, using placeholder: {e}");
                self.placeholder
                    .generate(directive, image, original_name)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhotoboothError;
    use tempfile::TempDir;

    struct Failing;

    #[async_trait]
    impl Generator for Failing {
        async fn generate(&self, _directive: &str, _image: &Path, _name: &str) -> Result<PathBuf> {
            Err(PhotoboothError::RateLimited {
                service: "generation",
                detail: "429".into(),
            })
        }
    }

    fn image(dir: &Path) -> PathBuf {
        let path = dir.join("photo1.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn placeholder_writes_artifact_and_description() {
        let tmp = TempDir::new().unwrap();
        let img = image(tmp.path());
        let temp = tmp.path().join("temp");
        let generator = PlaceholderGenerator::new(&temp);

        let artifact = generator.generate("fog", &img, "photo1.jpg").await.unwrap();
        let name = artifact.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("video_"));
        assert!(name.ends_with("_photo1_placeholder.jpg"));
        assert_eq!(std::fs::read(&artifact).unwrap(), b"jpeg bytes");

        let txt = temp.join(name.replace("_placeholder.jpg", ".txt"));
        let content = std::fs::read_to_string(txt).unwrap();
        assert!(content.contains("Prompt: fog"));
        assert!(content.contains(&format!("Video file: {name}")));
    }

    #[tokio::test]
    async fn wrapper_falls_back_on_error() {
        let tmp = TempDir::new().unwrap();
        let img = image(tmp.path());
        let generator =
            WithPlaceholder::new(Failing, PlaceholderGenerator::new(tmp.path().join("temp")));
        let artifact = generator.generate("fog", &img, "photo1.jpg").await.unwrap();
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn placeholder_propagates_missing_image() {
        let tmp = TempDir::new().unwrap();
        let generator = PlaceholderGenerator::new(tmp.path());
        let result = generator
            .generate("fog", &tmp.path().join("gone.jpg"), "gone.jpg")
            .await;
        assert!(result.is_err());
    }
}
