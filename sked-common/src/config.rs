//! Configuration model and TOML loading
//!
//! Two layers of configuration:
//! 1. **Engine thresholds** ([`MatchConfig`]): similarity cutoffs, candidate cap,
//!    bonus weights. Immutable once handed to the scorer/resolver.
//! 2. **Presentation** ([`FormatConfig`]): how resolved airings are rendered.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`SKED_CONFIG`)
//! 3. User config file (`~/.config/sked/config.toml`)
//! 4. Compiled defaults
//!
//! A missing file is not fatal: a warning is logged and defaults are used.
//! A file that exists but does not parse is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SKED_CONFIG";

/// Matching thresholds and scoring weights
///
/// Ratio thresholds are on the 0-100 scale, coefficient thresholds on 0-1.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Whole-string similarity cutoff
    pub base_ratio: f64,
    /// Best-aligned substring similarity cutoff
    pub partial_ratio: f64,
    /// Token-set similarity cutoff
    pub token_set_ratio: f64,
    /// Token-sort similarity cutoff
    pub token_sort_ratio: f64,
    /// Minimum Jaccard coefficient over word sets
    pub jaccard_min: f64,
    /// Word-overlap ratio must exceed this
    pub word_overlap_min: f64,
    /// Cross-token partial match ratio must exceed this
    pub cross_token_min: f64,
    /// Minimum token length (in chars) considered by the cross-token metric
    pub cross_token_min_len: usize,
    /// Maximum number of distinct base titles kept per lookup
    pub max_candidates: usize,
    /// Union airings of candidates sharing any episode with the report title
    pub allow_episode_partial: bool,
    /// Treat literal substring containment as a forced match
    pub allow_contains: bool,

    pub jaccard_weight: f64,
    pub word_overlap_weight: f64,
    pub cross_token_weight: f64,
    pub jaccard_bonus: f64,
    pub word_overlap_bonus: f64,
    pub cross_token_bonus: f64,
    /// Must exceed the best score reachable without containment
    pub contains_bonus: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            base_ratio: 60.0,
            partial_ratio: 70.0,
            token_set_ratio: 70.0,
            token_sort_ratio: 70.0,
            jaccard_min: 0.25,
            word_overlap_min: 0.6,
            cross_token_min: 0.3,
            cross_token_min_len: 4,
            max_candidates: 12,
            allow_episode_partial: true,
            allow_contains: true,
            jaccard_weight: 30.0,
            word_overlap_weight: 20.0,
            cross_token_weight: 15.0,
            jaccard_bonus: 5.0,
            word_overlap_bonus: 5.0,
            cross_token_bonus: 5.0,
            contains_bonus: 100.0,
        }
    }
}

impl MatchConfig {
    /// Highest composite score a base can reach without the containment bonus
    pub fn max_score_without_contains(&self) -> f64 {
        100.0
            + self.jaccard_weight
            + self.word_overlap_weight
            + self.cross_token_weight
            + self.jaccard_bonus
            + self.word_overlap_bonus
            + self.cross_token_bonus
    }

    /// Lowest composite score of a base that contains, or is contained in,
    /// the report base (its partial ratio is pinned to 100)
    pub fn min_score_with_contains(&self) -> f64 {
        100.0 + self.contains_bonus
    }

    /// Check ranges and the containment-dominance constraint
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("base_ratio", self.base_ratio),
            ("partial_ratio", self.partial_ratio),
            ("token_set_ratio", self.token_set_ratio),
            ("token_sort_ratio", self.token_sort_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::Config(format!(
                    "matching.{} must be within 0-100, got {}",
                    name, value
                )));
            }
        }

        let coefficients = [
            ("jaccard_min", self.jaccard_min),
            ("word_overlap_min", self.word_overlap_min),
            ("cross_token_min", self.cross_token_min),
        ];
        for (name, value) in coefficients {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "matching.{} must be within 0-1, got {}",
                    name, value
                )));
            }
        }

        let weights = [
            self.jaccard_weight,
            self.word_overlap_weight,
            self.cross_token_weight,
            self.jaccard_bonus,
            self.word_overlap_bonus,
            self.cross_token_bonus,
            self.contains_bonus,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(
                "matching weights and bonuses must be finite and non-negative".to_string(),
            ));
        }

        if self.max_candidates == 0 {
            return Err(Error::Config(
                "matching.max_candidates must be at least 1".to_string(),
            ));
        }

        if self.allow_contains
            && self.min_score_with_contains() <= self.max_score_without_contains()
        {
            return Err(Error::Config(format!(
                "matching.contains_bonus ({}) must exceed {} so containment dominates ranking",
                self.contains_bonus,
                self.max_score_without_contains() - 100.0
            )));
        }

        Ok(())
    }
}

/// Rendering of resolved airings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// chrono strftime pattern for one airing
    pub pattern: String,
    /// Joins rendered airings
    pub separator: String,
    /// Maximum number of airings rendered per report title
    pub limit: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            pattern: "%d.%m.%Y %H:%M".to_string(),
            separator: "; ".to_string(),
            limit: 50,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level TOML file layout
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub matching: MatchConfig,
    pub format: FormatConfig,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.matching.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

/// Locate the config file following the priority order in the module docs
///
/// Returns `None` when no tier names a file.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("sked").join("config.toml"))
        .filter(|p| p.exists())
}

/// Resolve and load configuration, degrading to defaults when no file exists
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using compiled defaults");
        return Ok(TomlConfig::default());
    }

    let config = TomlConfig::load(&path)?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}
