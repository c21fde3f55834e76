//! Indicator tables and application configuration.
//!
//! Every constant the engine classifies against lives in [`IndicatorConfig`],
//! so several grading scales can be analysed side by side without any
//! global state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::Subject;

/// CV bounds (percent) for the cohesion note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohesionThresholds {
    /// Below this: full cohesion.
    pub full: f64,
    /// Below this: relative cohesion.
    pub relative: f64,
    /// Below this: still relative cohesion; at or above: dispersion.
    pub relative_upper: f64,
}

impl Default for CohesionThresholds {
    fn default() -> Self {
        Self {
            full: 15.0,
            relative: 20.0,
            relative_upper: 25.0,
        }
    }
}

/// Minimum subject mean for each performance note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceThresholds {
    pub excellent: f64,
    pub good_and_stable: f64,
    pub good_but_variable: f64,
    pub acceptable: f64,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            excellent: 17.0,
            good_and_stable: 15.0,
            good_but_variable: 12.0,
            acceptable: 10.0,
        }
    }
}

/// Minimum general average for each orientation track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationThresholds {
    pub scientific: f64,
    pub technical: f64,
    pub vocational: f64,
}

impl Default for OrientationThresholds {
    fn default() -> Self {
        Self {
            scientific: 16.0,
            technical: 14.0,
            vocational: 10.0,
        }
    }
}

/// Minimum personal mean for each mention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionThresholds {
    pub excellence: f64,
    pub congratulations: f64,
    pub encouragement: f64,
    pub honor_roll: f64,
}

impl Default for MentionThresholds {
    fn default() -> Self {
        Self {
            excellence: 18.0,
            congratulations: 15.0,
            encouragement: 14.0,
            honor_roll: 12.0,
        }
    }
}

/// Cut-offs for the "students in difficulty" and "excellent students" lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightThresholds {
    /// General averages strictly below this (and above 0) are in difficulty.
    pub difficulty_below: f64,
    /// General averages at or above this are excellent.
    pub excellent_from: f64,
}

impl Default for HighlightThresholds {
    fn default() -> Self {
        Self {
            difficulty_below: 10.0,
            excellent_from: 16.0,
        }
    }
}

/// Triggers for the generated recommendations. Rates are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub min_success_rate: f64,
    pub max_repeat_rate: f64,
    pub min_subject_success_rate: f64,
    pub max_difficulty_share: f64,
    /// Female to male ratio above which a gender-balance note is emitted.
    pub gender_imbalance_ratio: f64,
    pub min_class_mean: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            min_success_rate: 70.0,
            max_repeat_rate: 20.0,
            min_subject_success_rate: 60.0,
            max_difficulty_share: 30.0,
            gender_imbalance_ratio: 1.5,
            min_class_mean: 8.0,
        }
    }
}

/// Constant tables for one grading scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Subjects analysed, in report order.
    pub subjects: Vec<Subject>,
    /// Top of the grading scale.
    pub max_score: f64,
    /// Scores at or above this count as a success.
    pub pass_mark: f64,
    /// Lower bound of the near-pass band.
    pub near_pass_mark: f64,
    pub cohesion: CohesionThresholds,
    pub performance: PerformanceThresholds,
    pub orientation: OrientationThresholds,
    pub mentions: MentionThresholds,
    pub highlights: HighlightThresholds,
    pub recommendations: RecommendationThresholds,
    /// Subjects averaged into the science sub-average.
    pub science_subjects: Vec<Subject>,
    /// Subjects averaged into the arts sub-average.
    pub arts_subjects: Vec<Subject>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            subjects: Subject::ALL.to_vec(),
            max_score: 20.0,
            pass_mark: 10.0,
            near_pass_mark: 8.0,
            cohesion: CohesionThresholds::default(),
            performance: PerformanceThresholds::default(),
            orientation: OrientationThresholds::default(),
            mentions: MentionThresholds::default(),
            highlights: HighlightThresholds::default(),
            recommendations: RecommendationThresholds::default(),
            science_subjects: vec![
                Subject::NaturalScience,
                Subject::Physics,
                Subject::Mathematics,
            ],
            arts_subjects: vec![Subject::Arabic, Subject::French, Subject::HistoryGeography],
        }
    }
}

/// `true` when every value is strictly greater than the next one.
fn strictly_descending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] > w[1])
}

impl IndicatorConfig {
    /// Check that the tables are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subjects.is_empty() {
            return Err(ConfigError::EmptySubjectList);
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(&dup) = self.subjects.iter().find(|&&s| !seen.insert(s)) {
            return Err(ConfigError::DuplicateSubject(dup));
        }

        let max = self.max_score;
        for (name, value) in [
            ("pass_mark", self.pass_mark),
            ("near_pass_mark", self.near_pass_mark),
        ] {
            if !(value > 0.0 && value <= max) {
                return Err(ConfigError::MarkOutOfRange { name, value, max });
            }
        }
        if !strictly_descending(&[self.pass_mark, self.near_pass_mark]) {
            return Err(ConfigError::ThresholdsOutOfOrder { table: "pass mark" });
        }

        let c = &self.cohesion;
        // CV grows as cohesion worsens.
        if !strictly_descending(&[c.relative_upper, c.relative, c.full, 0.0]) {
            return Err(ConfigError::ThresholdsOutOfOrder { table: "cohesion" });
        }

        let p = &self.performance;
        if !strictly_descending(&[p.excellent, p.good_and_stable, p.good_but_variable, p.acceptable, 0.0]) {
            return Err(ConfigError::ThresholdsOutOfOrder {
                table: "performance",
            });
        }

        let o = &self.orientation;
        if !strictly_descending(&[o.scientific, o.technical, o.vocational, 0.0]) {
            return Err(ConfigError::ThresholdsOutOfOrder {
                table: "orientation",
            });
        }

        let m = &self.mentions;
        if !strictly_descending(&[m.excellence, m.congratulations, m.encouragement, m.honor_roll, 0.0]) {
            return Err(ConfigError::ThresholdsOutOfOrder { table: "mention" });
        }

        Ok(())
    }
}

/// Top-level bulletin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletinConfig {
    /// School name printed on reports.
    #[serde(default)]
    pub school_name: String,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Report formats written when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Indicator table overrides.
    #[serde(default)]
    pub indicators: IndicatorConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./bulletin-reports")
}
fn default_format() -> String {
    "json".to_string()
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self {
            school_name: String::new(),
            output_dir: default_output_dir(),
            default_format: default_format(),
            indicators: IndicatorConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `bulletin.toml` in the current directory
/// 2. `~/.config/bulletin/config.toml`
///
/// Environment variable overrides: `BULLETIN_SCHOOL_NAME`, `BULLETIN_OUTPUT_DIR`.
pub fn load_config() -> Result<BulletinConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<BulletinConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("bulletin.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => BulletinConfig::default(),
    };

    if let Ok(name) = std::env::var("BULLETIN_SCHOOL_NAME") {
        config.school_name = name;
    }
    if let Ok(dir) = std::env::var("BULLETIN_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    Ok(config)
}

/// Parse and validate a TOML config string.
pub fn parse_config_str(content: &str) -> Result<BulletinConfig> {
    let mut config: BulletinConfig = toml::from_str(content)?;
    config.school_name = resolve_env_vars(&config.school_name);
    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    config.indicators.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("bulletin"))
}
