//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scratch directory for normalized sources and extracted clips.
    pub processing_dir: PathBuf,

    /// Directory where compiled highlight reels are written.
    pub output_dir: PathBuf,

    /// Segment detection parameters.
    pub detection: DetectionDefaults,

    /// Source normalization parameters.
    pub normalization: NormalizationDefaults,

    /// External pose-estimation sidecar.
    pub pose: PoseSidecarConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default segment detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionDefaults {
    /// Minimum mean landmark displacement that counts as motion.
    pub movement_threshold: f64,

    /// Consecutive moving frames needed to open a segment.
    pub min_moving_frames: u32,

    /// Consecutive stationary frames that close an open segment.
    pub max_stationary_frames: u32,

    /// Segments closer than this are merged (seconds).
    pub merge_gap_secs: f64,

    /// Context added before each segment (seconds).
    pub pre_buffer_secs: f64,

    /// Context added after each segment (seconds).
    pub post_buffer_secs: f64,
}

/// Default normalization parameters. `None` keeps the source value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationDefaults {
    /// Output height before detection (aspect ratio preserved).
    pub target_height: Option<u32>,

    /// Output frame rate before detection.
    pub target_fps: Option<f64>,
}

/// How to launch the pose-estimation sidecar process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSidecarConfig {
    /// Executable to spawn. `None` means no sidecar is configured.
    pub command: Option<String>,

    /// Arguments passed to the executable.
    pub args: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs_default_data();
        Self {
            processing_dir: data_dir.join("processing"),
            output_dir: data_dir.join("downloads"),
            detection: DetectionDefaults::default(),
            normalization: NormalizationDefaults::default(),
            pose: PoseSidecarConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DetectionDefaults {
    fn default() -> Self {
        Self {
            movement_threshold: 0.02,
            min_moving_frames: 3,
            max_stationary_frames: 20,
            merge_gap_secs: 1.0,
            pre_buffer_secs: 2.0,
            post_buffer_secs: 3.0,
        }
    }
}

impl Default for NormalizationDefaults {
    fn default() -> Self {
        Self {
            target_height: Some(720),
            target_fps: Some(30.0),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from `path` (or the standard location), falling back to
    /// defaults, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
        let mut config = Self::load_file(&config_path).unwrap_or_default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    fn load_file(config_path: &Path) -> Option<Self> {
        if !config_path.exists() {
            return None;
        }
        match std::fs::read_to_string(config_path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                None
            }
        }
    }

    /// Apply `REELCUT_*` overrides using the given variable lookup.
    ///
    /// A zero target height or frame rate disables that normalization step.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_env::<f64>(&lookup, "REELCUT_MOVEMENT_THRESHOLD") {
            self.detection.movement_threshold = value;
        }
        if let Some(value) = parse_env::<u32>(&lookup, "REELCUT_TARGET_HEIGHT") {
            self.normalization.target_height = (value > 0).then_some(value);
        }
        if let Some(value) = parse_env::<f64>(&lookup, "REELCUT_TARGET_FPS") {
            self.normalization.target_fps = (value > 0.0).then_some(value);
        }
        if let Some(dir) = lookup("REELCUT_PROCESSING_DIR").filter(|v| !v.is_empty()) {
            self.processing_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("REELCUT_OUTPUT_DIR").filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcut").join("config.json")
}

/// Default data directory.
fn dirs_default_data() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("reelcut")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_detection_defaults() {
        let defaults = DetectionDefaults::default();
        assert!((defaults.movement_threshold - 0.02).abs() < 1e-12);
        assert!((defaults.merge_gap_secs - 1.0).abs() < 1e-12);
        assert!((defaults.pre_buffer_secs - 2.0).abs() < 1e-12);
        assert!((defaults.post_buffer_secs - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_env_override_disables_normalization_target() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(lookup_from(&[
            ("REELCUT_TARGET_HEIGHT", "0"),
            ("REELCUT_TARGET_FPS", "24"),
            ("REELCUT_MOVEMENT_THRESHOLD", "0.05"),
        ]));
        assert_eq!(config.normalization.target_height, None);
        assert_eq!(config.normalization.target_fps, Some(24.0));
        assert!((config.detection.movement_threshold - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_env_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(lookup_from(&[("REELCUT_TARGET_HEIGHT", "tall")]));
        assert_eq!(config.normalization.target_height, Some(720));
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"detection":{"min_moving_frames":5}}"#).unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.detection.min_moving_frames, 5);
        assert_eq!(config.detection.max_stationary_frames, 20);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_corrupt_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_file(&path).is_none());
    }
}
