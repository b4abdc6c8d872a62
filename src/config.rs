//! TOML-based analysis configuration.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level analysis configuration parsed from TOML.
///
/// All fields except `dataset.root_dir` have defaults. Load from TOML with
/// [`AnalysisConfig::from_toml_file`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Dataset layout and roster cache location.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Building selection parameters.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Hypothetical transformer parameters for aggregation.
    #[serde(default)]
    pub transformer: TransformerConfig,
}

/// Dataset layout and roster cache location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Root directory holding one subdirectory per building.
    pub root_dir: String,
    /// Upgrade scenario subdirectories to load per building.
    pub upgrades: Vec<String>,
    /// Path of the cached building roster.
    pub cache_file: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root_dir: String::new(),
            upgrades: vec!["up00".to_string()],
            cache_file: "cached_building_ids.csv".to_string(),
        }
    }
}

/// Building selection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Number of buildings to analyze (must be > 0).
    pub n_buildings: usize,
    /// Draw a random subset instead of taking the roster head.
    pub randomized: bool,
    /// Seed for the randomized draw; omitted means OS entropy.
    pub seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            n_buildings: 10,
            randomized: false,
            seed: None,
        }
    }
}

/// Hypothetical transformer parameters for aggregation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformerConfig {
    /// Nameplate rating (kVA, must be > 0).
    pub rating_kva: f64,
    /// Assumed power factor (must be in (0.0, 1.0]).
    pub power_factor: f64,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            rating_kva: 50.0,
            power_factor: 0.9,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"selection.n_buildings"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl AnalysisConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let d = &self.dataset;
        if d.root_dir.is_empty() {
            errors.push(ConfigError {
                field: "dataset.root_dir".into(),
                message: "must be set".into(),
            });
        }
        if d.upgrades.is_empty() {
            errors.push(ConfigError {
                field: "dataset.upgrades".into(),
                message: "must name at least one upgrade".into(),
            });
        }
        if d.cache_file.is_empty() {
            errors.push(ConfigError {
                field: "dataset.cache_file".into(),
                message: "must be set".into(),
            });
        }

        if self.selection.n_buildings == 0 {
            errors.push(ConfigError {
                field: "selection.n_buildings".into(),
                message: "must be > 0".into(),
            });
        }

        let t = &self.transformer;
        if t.rating_kva <= 0.0 {
            errors.push(ConfigError {
                field: "transformer.rating_kva".into(),
                message: "must be > 0".into(),
            });
        }
        if !(t.power_factor > 0.0 && t.power_factor <= 1.0) {
            errors.push(ConfigError {
                field: "transformer.power_factor".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }

        errors
    }
}
