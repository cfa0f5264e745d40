//! External collaborators the pipeline calls out to.
//!
//! The vendor services (image analysis, video generation) live behind two
//! small async traits. Stock adapters run an operator-supplied program or
//! produce a placeholder artifact.

pub mod command;
pub mod placeholder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;

pub use command::{CommandAnalyzer, CommandGenerator};
pub use placeholder::{PlaceholderGenerator, WithPlaceholder};

/// Turns a photo into a free-form generation directive.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image: &Path) -> Result<String>;
}

/// Produces a video artifact from a directive and the source photo.
///
/// Implementations may return a placeholder artifact instead of failing.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, directive: &str, image: &Path, original_name: &str)
        -> Result<PathBuf>;
}

/// Analyzer that returns the same directive for every photo.
#[derive(Debug, Clone)]
pub struct FixedPromptAnalyzer {
    prompt: String,
}

impl FixedPromptAnalyzer {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

#[async_trait]
impl Analyzer for FixedPromptAnalyzer {
    async fn analyze(&self, _image: &Path) -> Result<String> {
        Ok(self.prompt.clone())
    }
}

/// Build the collaborators described by the config.
pub fn from_config(config: &Config) -> (Arc<dyn Analyzer>, Arc<dyn Generator>) {
    let settings = &config.settings.collaborators;
    let temp = config.temp_dir();

    let analyzer: Arc<dyn Analyzer> = if settings.analysis_command.is_empty() {
        Arc::new(FixedPromptAnalyzer::new(settings.prompt.clone()))
    } else {
        Arc::new(CommandAnalyzer::new(settings.analysis_command.clone(), &temp))
    };

    let placeholder = PlaceholderGenerator::new(&temp);
    let generator: Arc<dyn Generator> = if settings.generation_command.is_empty() {
        Arc::new(placeholder)
    } else {
        let command = CommandGenerator::new(settings.generation_command.clone(), &temp);
        if settings.placeholder_fallback {
            Arc::new(WithPlaceholder::new(command, placeholder))
        } else {
            Arc::new(command)
        }
    };

    (analyzer, generator)
}
