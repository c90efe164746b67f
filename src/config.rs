// file: src/config.rs
// description: intake policy configuration with toml and environment support
// reference: https://docs.rs/config

use crate::error::{IntakeError, Result};
use crate::models::FileRecordSnapshot;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Immutable per-session intake policy. Hand it to the orchestrator once; it is
/// frozen behind an `Arc` from then on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntakeConfiguration {
    pub file_kind: FileKind,
    pub capacity: usize,
    pub max_file_size: Option<u64>,
    pub requirement: CountRequirement,
    pub accept_invalid_files: bool,
    pub require_all_valid: bool,
    pub auto_advance: AutoAdvanceConfig,
    pub progress: ProgressConfig,
    pub labels: Option<DisplayLabels>,
    #[serde(skip)]
    pub continue_condition: Option<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CountRequirement {
    pub min: usize,
    pub max: Option<usize>,
    pub exact: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoAdvanceConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    /// Accepted for compatibility with existing page configs; has no effect.
    pub disable_on_return: bool,
    #[serde(skip)]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub duration_ms: u64,
    pub disabled: bool,
}

/// Status texts for renderers. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayLabels {
    pub validating: String,
    pub valid: String,
    pub invalid: String,
}

/// Caller supplied predicate over the current records.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&[FileRecordSnapshot]) -> bool + Send + Sync>);

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&[FileRecordSnapshot]) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn evaluate(&self, records: &[FileRecordSnapshot]) -> bool {
        (self.0)(records)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

impl FileKind {
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Image => "Image",
            FileKind::Video => "Video",
        }
    }

    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            FileKind::Pdf => &["pdf"],
            FileKind::Image => &["jpg", "jpeg", "png", "gif", "webp", "svg"],
            FileKind::Video => &["mp4", "avi", "mov", "wmv", "flv", "mkv"],
        }
    }

    pub fn accepts_extension(self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.accepted_extensions().contains(&extension.as_str())
    }
}

impl Default for CountRequirement {
    fn default() -> Self {
        Self {
            min: 1,
            max: None,
            exact: None,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            disabled: false,
        }
    }
}

impl ProgressConfig {
    pub fn enabled(&self) -> bool {
        !self.disabled
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl AutoAdvanceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl DisplayLabels {
    pub fn for_kind(kind: FileKind) -> Self {
        Self {
            validating: format!("Reading {}...", kind.label()),
            valid: format!("Valid {}", kind.label()),
            invalid: "Error".to_string(),
        }
    }
}

impl Default for IntakeConfiguration {
    fn default() -> Self {
        Self::default_config()
    }
}

impl IntakeConfiguration {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FILE_INTAKE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| IntakeError::Config(e.to_string()))?;

        let config: IntakeConfiguration = settings
            .try_deserialize()
            .map_err(|e| IntakeError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            file_kind: FileKind::Pdf,
            capacity: 10,
            max_file_size: Some(50 * 1024 * 1024),
            requirement: CountRequirement::default(),
            accept_invalid_files: false,
            require_all_valid: true,
            auto_advance: AutoAdvanceConfig::default(),
            progress: ProgressConfig::default(),
            labels: None,
            continue_condition: None,
        }
    }

    /// Replaces every built-in continuation check with `predicate`.
    pub fn with_continue_condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[FileRecordSnapshot]) -> bool + Send + Sync + 'static,
    {
        self.continue_condition = Some(Condition::new(predicate));
        self
    }

    /// Overrides the gate verdict when deciding whether to auto-advance.
    pub fn with_auto_advance_condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[FileRecordSnapshot]) -> bool + Send + Sync + 'static,
    {
        self.auto_advance.condition = Some(Condition::new(predicate));
        self
    }

    pub fn labels(&self) -> DisplayLabels {
        self.labels
            .clone()
            .unwrap_or_else(|| DisplayLabels::for_kind(self.file_kind))
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(IntakeError::Config(
                "capacity must be greater than 0".to_string(),
            ));
        }

        if self.requirement.exact == Some(0) {
            return Err(IntakeError::Config(
                "exact file requirement must be greater than 0".to_string(),
            ));
        }

        if let Some(max) = self.requirement.max
            && self.requirement.min > max
        {
            return Err(IntakeError::Config(format!(
                "minimum file requirement ({}) exceeds maximum ({})",
                self.requirement.min, max
            )));
        }

        if self.progress.enabled() && self.progress.duration_ms == 0 {
            return Err(IntakeError::Config(
                "progress duration must be greater than 0 unless progress is disabled".to_string(),
            ));
        }

        Ok(())
    }
}
