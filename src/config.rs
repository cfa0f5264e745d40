use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PhotoboothError, Result};

/// Default directory name for photobooth state.
const STATE_DIR: &str = ".photobooth";
/// Default ledger filename.
const LEDGER_FILE: &str = "processed-files.json";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";

/// Directive used when no analysis command is configured.
pub const DEFAULT_PROMPT: &str = "Animate this photo into a short, eerie Halloween scene: \
     slow creeping fog, flickering candlelight, subtle supernatural movement, \
     keep the people recognizable and the camera steady.";

/// Project-level configuration resolved from the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory the photobooth runs in.
    pub project_root: PathBuf,
    /// Path to the `.photobooth/` directory.
    pub state_dir: PathBuf,
    /// Path to the processed-file ledger.
    pub ledger_path: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// User settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .photobooth/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Folder layout.
    pub folders: FolderSettings,
    /// Poll loop tuning.
    pub watcher: WatcherSettings,
    /// External analysis/generation programs.
    pub collaborators: CollaboratorSettings,
}

/// Folder names, relative to the project root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderSettings {
    pub input: String,
    pub output: String,
    pub screensaver: String,
    pub temp: String,
    /// Custom ledger location (relative to the project root).
    pub ledger: Option<String>,
}

impl Default for FolderSettings {
    fn default() -> Self {
        Self {
            input: "input".into(),
            output: "output".into(),
            screensaver: "screensaver".into(),
            temp: "temp".into(),
            ledger: None,
        }
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    /// Seconds between poll ticks.
    pub poll_interval_secs: u64,
    /// Minutes after which a processing record counts as abandoned.
    pub stale_lock_minutes: u64,
    /// Age in days used by `prune` when no explicit value is given.
    pub prune_days: u32,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            stale_lock_minutes: 10,
            prune_days: 30,
        }
    }
}

/// Collaborator settings.
///
/// Commands are argv vectors; `{image}`, `{prompt}`, `{name}` and `{temp}`
/// are substituted before the program is spawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorSettings {
    /// Directive returned when `analysis_command` is empty.
    pub prompt: String,
    pub analysis_command: Vec<String>,
    pub generation_command: Vec<String>,
    /// Substitute a placeholder artifact when generation fails.
    pub placeholder_fallback: bool,
}

impl Default for CollaboratorSettings {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.into(),
            analysis_command: Vec::new(),
            generation_command: Vec::new(),
            placeholder_fallback: true,
        }
    }
}

impl Config {
    /// Create config for a given project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let state_dir = project_root.join(STATE_DIR);
        let config_path = state_dir.join(CONFIG_FILE);

        let settings = Self::load_settings(&config_path).unwrap_or_default();
        let ledger_path = match &settings.folders.ledger {
            Some(custom) => project_root.join(custom),
            None => state_dir.join(LEDGER_FILE),
        };

        Self {
            project_root,
            state_dir,
            ledger_path,
            config_path,
            settings,
        }
    }

    /// Create config from the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PhotoboothError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd))
    }

    /// Load settings from config.toml if it exists.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        match toml::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    "invalid config, using defaults: {e}"
                );
                None
            }
        }
    }

    /// Save current settings to config.toml.
    pub fn save_settings(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)?;
        let content = toml::to_string_pretty(&self.settings)
            .map_err(|e| PhotoboothError::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Create the state directory and every working folder.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)?;
        for dir in [
            self.input_dir(),
            self.output_dir(),
            self.screensaver_dir(),
            self.temp_dir(),
        ] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                tracing::info!(dir = %dir.display(), "created folder");
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn input_dir(&self) -> PathBuf {
        self.project_root.join(&self.settings.folders.input)
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.project_root.join(&self.settings.folders.output)
    }

    #[must_use]
    pub fn screensaver_dir(&self) -> PathBuf {
        self.project_root.join(&self.settings.folders.screensaver)
    }

    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.project_root.join(&self.settings.folders.temp)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings.watcher.poll_interval_secs.max(1))
    }

    #[must_use]
    pub fn stale_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.watcher.stale_lock_minutes.saturating_mul(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_new_sets_paths() {
        let cfg = Config::new("/tmp/booth");
        assert_eq!(cfg.project_root, PathBuf::from("/tmp/booth"));
        assert_eq!(cfg.state_dir, PathBuf::from("/tmp/booth/.photobooth"));
        assert_eq!(
            cfg.ledger_path,
            PathBuf::from("/tmp/booth/.photobooth/processed-files.json")
        );
        assert_eq!(cfg.input_dir(), PathBuf::from("/tmp/booth/input"));
        assert_eq!(cfg.temp_dir(), PathBuf::from("/tmp/booth/temp"));
    }

    #[test]
    fn ensure_dirs_creates_every_folder() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::new(tmp.path());
        cfg.ensure_dirs().unwrap();
        assert!(cfg.state_dir.is_dir());
        assert!(cfg.input_dir().is_dir());
        assert!(cfg.output_dir().is_dir());
        assert!(cfg.screensaver_dir().is_dir());
        assert!(cfg.temp_dir().is_dir());
    }

    #[test]
    fn default_settings() {
        let settings = UserSettings::default();
        assert_eq!(settings.watcher.poll_interval_secs, 15);
        assert_eq!(settings.watcher.stale_lock_minutes, 10);
        assert_eq!(settings.watcher.prune_days, 30);
        assert_eq!(settings.folders.output, "output");
        assert!(settings.collaborators.placeholder_fallback);
        assert!(settings.collaborators.analysis_command.is_empty());
        assert_eq!(settings.collaborators.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn save_and_load_settings() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::new(tmp.path());
        cfg.settings.watcher.poll_interval_secs = 3;
        cfg.settings.folders.ledger = Some("ledger.json".into());
        cfg.settings.collaborators.generation_command = vec!["gen".into(), "{image}".into()];
        cfg.save_settings().unwrap();

        let cfg2 = Config::new(tmp.path());
        assert_eq!(cfg2.settings.watcher.poll_interval_secs, 3);
        assert_eq!(cfg2.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg2.ledger_path, tmp.path().join("ledger.json"));
        assert_eq!(cfg2.settings.collaborators.generation_command.len(), 2);
    }

    #[test]
    fn load_invalid_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let state_dir = tmp.path().join(".photobooth");
        std::fs::create_dir_all(&state_dir).unwrap();
        std::fs::write(state_dir.join("config.toml"), "invalid toml {{{{").unwrap();

        let cfg = Config::new(tmp.path());
        assert_eq!(cfg.settings.watcher.poll_interval_secs, 15);
        assert_eq!(cfg.stale_lock_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let mut cfg = Config::new("/tmp/booth");
        cfg.settings.watcher.poll_interval_secs = 0;
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn huge_stale_lock_saturates() {
        let mut cfg = Config::new("/tmp/booth");
        cfg.settings.watcher.stale_lock_minutes = u64::MAX;
        assert_eq!(cfg.stale_lock_timeout(), Duration::from_secs(u64::MAX));
    }
}
