use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ClientError, ClientResult};

/// Forecasting policy identifier.
///
/// Emitted with every forecast report so a change to the defaults below shows
/// up in diffs of archived reports.
pub const FORECAST_POLICY_VERSION: &str = "forecast/v1";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const HOME_ENV_VAR: &str = "LARDER_HOME";

/// Tunables for one pipeline run.
///
/// Every field has a default; a TOML file only needs to name the settings it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Months forecast past the last history month.
    pub forecast_horizon: usize,
    /// Forecasts are capped at `max raw usage * clip_factor`.
    pub clip_factor: f64,
    /// Scale of the Laplace prior on trend slope changes.
    pub trend_flexibility: f64,
    /// Minimum similarity (0-100) for a fuzzy item-name match.
    pub fuzzy_threshold: f64,
    pub grams_per_pound: f64,
    pub frequency_factors: FrequencyFactors,
    /// Year attached to month labels that only carry a month name.
    pub default_year: i32,
    pub max_fit_iterations: usize,
    /// Extra sales-name aliases, checked after the built-in ones.
    pub aliases: Vec<AliasSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrequencyFactors {
    pub weekly: f64,
    pub biweekly: f64,
    pub monthly: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasSetting {
    pub from: String,
    pub to: String,
}

impl Default for FrequencyFactors {
    fn default() -> Self {
        Self {
            weekly: 4.33,
            biweekly: 2.16,
            monthly: 1.0,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: 3,
            clip_factor: 5.0,
            trend_flexibility: 0.01,
            fuzzy_threshold: 70.0,
            grams_per_pound: 453.592,
            frequency_factors: FrequencyFactors::default(),
            default_year: 2025,
            max_fit_iterations: 100_000,
            aliases: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str, source: Option<&Path>) -> ClientResult<Self> {
        let parsed = toml::from_str::<Self>(content)
            .map_err(|error| ClientError::config_invalid(source, error.message()))?;
        parsed.validate(source)?;
        Ok(parsed)
    }

    pub fn validate(&self, source: Option<&Path>) -> ClientResult<()> {
        if !is_positive(self.clip_factor) {
            return Err(ClientError::config_invalid(
                source,
                "`clip_factor` must be a positive number.",
            ));
        }
        if !is_positive(self.trend_flexibility) {
            return Err(ClientError::config_invalid(
                source,
                "`trend_flexibility` must be a positive number.",
            ));
        }
        if !is_positive(self.grams_per_pound) {
            return Err(ClientError::config_invalid(
                source,
                "`grams_per_pound` must be a positive number.",
            ));
        }
        if !self.fuzzy_threshold.is_finite() || !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(ClientError::config_invalid(
                source,
                "`fuzzy_threshold` must be between 0 and 100.",
            ));
        }
        let factors = self.frequency_factors;
        for (name, value) in [
            ("weekly", factors.weekly),
            ("biweekly", factors.biweekly),
            ("monthly", factors.monthly),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ClientError::config_invalid(
                    source,
                    &format!("`frequency_factors.{name}` must be zero or positive."),
                ));
            }
        }
        if self.max_fit_iterations == 0 {
            return Err(ClientError::config_invalid(
                source,
                "`max_fit_iterations` must be at least 1.",
            ));
        }
        Ok(())
    }
}

/// Loads the run configuration.
///
/// An explicit path must exist. Without one, `<larder home>/config.toml` is
/// used when present, otherwise the defaults.
pub fn load_config(
    explicit_path: Option<&Path>,
    home_override: Option<&Path>,
) -> ClientResult<PipelineConfig> {
    if let Some(path) = explicit_path {
        return read_config_file(path);
    }

    let Some(home) = resolve_larder_home(home_override) else {
        return Ok(PipelineConfig::default());
    };
    let candidate = home.join(CONFIG_FILE_NAME);
    if !candidate.is_file() {
        return Ok(PipelineConfig::default());
    }
    read_config_file(&candidate)
}

pub fn resolve_larder_home(home_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = home_override {
        return Some(path.to_path_buf());
    }
    if let Some(override_path) = std::env::var_os(HOME_ENV_VAR) {
        return Some(PathBuf::from(override_path));
    }
    home::home_dir().map(|path| path.join(".larder"))
}

fn read_config_file(path: &Path) -> ClientResult<PipelineConfig> {
    let content = fs::read_to_string(path).map_err(|error| {
        ClientError::config_invalid(Some(path), &format!("could not read file: {error}"))
    })?;
    let config = PipelineConfig::from_toml(&content, Some(path))?;
    tracing::debug!(path = %path.display(), "loaded pipeline config");
    Ok(config)
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::Builder;

    use super::{PipelineConfig, load_config};

    #[test]
    fn defaults_match_documented_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.forecast_horizon, 3);
        assert!((config.clip_factor - 5.0).abs() < f64::EPSILON);
        assert!((config.trend_flexibility - 0.01).abs() < f64::EPSILON);
        assert!((config.fuzzy_threshold - 70.0).abs() < f64::EPSILON);
        assert!((config.grams_per_pound - 453.592).abs() < f64::EPSILON);
        assert!((config.frequency_factors.weekly - 4.33).abs() < f64::EPSILON);
        assert!((config.frequency_factors.biweekly - 2.16).abs() < f64::EPSILON);
        assert!((config.frequency_factors.monthly - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_overrides_only_named_settings() {
        let parsed = PipelineConfig::from_toml(
            "forecast_horizon = 6\n[frequency_factors]\nweekly = 4.0\n",
            None,
        );
        assert!(parsed.is_ok());
        if let Ok(config) = parsed {
            assert_eq!(config.forecast_horizon, 6);
            assert!((config.frequency_factors.weekly - 4.0).abs() < f64::EPSILON);
            assert!((config.frequency_factors.biweekly - 2.16).abs() < f64::EPSILON);
            assert!((config.clip_factor - 5.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn aliases_parse_as_ordered_tables() {
        let parsed = PipelineConfig::from_toml(
            "[[aliases]]\nfrom = \"big bowl pho\"\nto = \"beef pho\"\n",
            None,
        );
        assert!(parsed.is_ok());
        if let Ok(config) = parsed {
            assert_eq!(config.aliases.len(), 1);
            assert_eq!(config.aliases[0].to, "beef pho");
        }
    }

    #[test]
    fn rejects_out_of_range_settings() {
        for body in [
            "clip_factor = 0.0",
            "trend_flexibility = -1.0",
            "fuzzy_threshold = 120.0",
            "grams_per_pound = 0.0",
            "max_fit_iterations = 0",
            "[frequency_factors]\nmonthly = -1.0",
            "unknown_setting = 1",
        ] {
            let parsed = PipelineConfig::from_toml(body, None);
            assert!(parsed.is_err(), "expected rejection for `{body}`");
            if let Err(error) = parsed {
                assert_eq!(error.code, "config_invalid");
            }
        }
    }

    #[test]
    fn home_config_is_used_when_present() {
        let dir = Builder::new().prefix("larder-config").tempdir();
        assert!(dir.is_ok());
        if let Ok(home) = dir {
            let missing = load_config(None, Some(home.path()));
            assert!(missing.is_ok());
            if let Ok(config) = missing {
                assert_eq!(config, PipelineConfig::default());
            }

            let written = fs::write(home.path().join("config.toml"), "clip_factor = 3.0\n");
            assert!(written.is_ok());
            let loaded = load_config(None, Some(home.path()));
            assert!(loaded.is_ok());
            if let Ok(config) = loaded {
                assert!((config.clip_factor - 3.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let loaded = load_config(Some(std::path::Path::new("/nonexistent/larder.toml")), None);
        assert!(loaded.is_err());
    }
}
