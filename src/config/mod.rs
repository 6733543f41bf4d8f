//! Configuration module for the fusion evaluator

mod template;

use crate::evaluate::ErrorPolicy;
use crate::fusion::{FusionWeights, DEFAULT_KEY_WIDTH, DEFAULT_LABEL_BASE};
use crate::record::RecordFormat;
use crate::store::StoreEngine;
use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use template::{generate_commented_config_template, generate_config_template};

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "latefusion.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration file version
    pub version: String,

    /// Prediction stores
    #[serde(default)]
    pub stores: StoreConfig,

    /// Record encoding
    #[serde(default)]
    pub record: RecordConfig,

    /// Fusion parameters
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Evaluation run
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Locations of the two prediction stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database engine of both stores
    #[serde(default)]
    pub engine: StoreEngine,

    /// Store holding the RGB model's records
    pub rgb_path: PathBuf,

    /// Store holding the depth model's records
    pub depth_path: PathBuf,

    /// Digits in the zero-padded record keys
    #[serde(default = "default_key_width")]
    pub key_width: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default)]
    pub format: RecordFormat,
}

/// Fusion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "default_weight")]
    pub rgb_weight: f64,

    #[serde(default = "default_weight")]
    pub depth_weight: f64,

    /// Added to the winning class position (1 = 1-based labels)
    #[serde(default = "default_label_base")]
    pub label_base: usize,
}

/// Evaluation run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Sample list, one sample per line
    pub list_path: PathBuf,

    /// Abort the run or skip the sample when fusion fails
    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// 0-based whitespace column holding the true class label
    #[serde(default)]
    pub ground_truth_column: Option<usize>,

    /// Print overall accuracy after the predictions
    #[serde(default)]
    pub report_accuracy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            stores: StoreConfig::default(),
            record: RecordConfig::default(),
            fusion: FusionConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            engine: StoreEngine::default(),
            rgb_path: PathBuf::from("./chalearn_isogr_rgb_test_rst"),
            depth_path: PathBuf::from("./chalearn_isogr_depth_test_rst"),
            key_width: default_key_width(),
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rgb_weight: default_weight(),
            depth_weight: default_weight(),
            label_base: default_label_base(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            list_path: PathBuf::from("isogr_images_split/test_list.txt"),
            on_error: ErrorPolicy::default(),
            ground_truth_column: None,
            report_accuracy: false,
        }
    }
}

// --------- Helper default functions for serde ---------
fn default_key_width() -> usize {
    DEFAULT_KEY_WIDTH
}
fn default_weight() -> f64 {
    0.5
}
fn default_label_base() -> usize {
    DEFAULT_LABEL_BASE
}

impl FusionConfig {
    pub fn weights(&self) -> FusionWeights {
        FusionWeights::new(self.rgb_weight, self.depth_weight)
    }
}

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Save the configuration to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::ConfigError(
                "Config version must be set (e.g., '0.1.0')".to_string(),
            ));
        }
        // Stores
        if self.stores.rgb_path.as_os_str().is_empty() {
            return Err(Error::ConfigError("stores.rgb_path must be set".to_string()));
        }
        if self.stores.depth_path.as_os_str().is_empty() {
            return Err(Error::ConfigError("stores.depth_path must be set".to_string()));
        }
        if self.stores.key_width == 0 {
            return Err(Error::ConfigError("stores.key_width must be > 0".to_string()));
        }
        // Fusion
        for (name, weight) in [("rgb_weight", self.fusion.rgb_weight), ("depth_weight", self.fusion.depth_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::ConfigError(format!(
                    "fusion.{} must be a finite, non-negative number (got {})",
                    name, weight
                )));
            }
        }
        if self.fusion.rgb_weight == 0.0 && self.fusion.depth_weight == 0.0 {
            return Err(Error::ConfigError("fusion weights cannot both be zero".to_string()));
        }
        // Evaluation
        if self.evaluation.list_path.as_os_str().is_empty() {
            return Err(Error::ConfigError("evaluation.list_path must be set".to_string()));
        }
        if self.evaluation.report_accuracy && self.evaluation.ground_truth_column.is_none() {
            return Err(Error::ConfigError(
                "evaluation.report_accuracy requires evaluation.ground_truth_column".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        // Try to load from current directory
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::from_file(local);
        }

        // Try to load from user config directory
        if let Some(mut path) = dirs::config_dir() {
            path.push("latefusion");
            path.push(CONFIG_FILE_NAME);
            if path.exists() {
                return Self::from_file(path);
            }
        }

        // Return default config if no config file found
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(rgb) = env::var("LATEFUSION_RGB_DB") {
            self.stores.rgb_path = PathBuf::from(rgb);
        }

        if let Ok(depth) = env::var("LATEFUSION_DEPTH_DB") {
            self.stores.depth_path = PathBuf::from(depth);
        }

        if let Ok(list) = env::var("LATEFUSION_LIST") {
            self.evaluation.list_path = PathBuf::from(list);
        }

        Ok(())
    }
}
