use std::path::{Path, PathBuf};
use std::time::Duration;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::drivers::{DashboardError, PlotStyle, DEFAULT_ALARM_LIMIT, DEFAULT_GRID_SIZE};
use crate::types::SpectrumStyle;
/// Dashboard settings, read from a JSON file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding `AccelerometerData.csv` and `StatisticsData.csv`.
    pub data_dir: PathBuf,
    /// Nodes per side of every resampled surface.
    pub grid_size: usize,
    pub alarm_limit: f64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub refresh_interval_secs: u64,
    pub spectrum_style: SpectrumStyle,
    pub plot: PlotConfig,
}
impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            grid_size: DEFAULT_GRID_SIZE,
            alarm_limit: DEFAULT_ALARM_LIMIT,
            cache_ttl_secs: 180,
            cache_capacity: 100,
            refresh_interval_secs: 60,
            spectrum_style: SpectrumStyle::Bars,
            plot: PlotConfig::default(),
        }
    }
}
/// Largest accepted plot side, in pixels.
pub const MAX_PLOT_SIDE: u32 = 8192;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
}
impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
        }
    }
}
impl DashboardConfig {
    /// Loads and validates a config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("config file {} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
    pub fn from_json(raw: &str) -> Result<Self, DashboardError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.grid_size < 2 {
            return Err(DashboardError::Config(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if !(self.alarm_limit.is_finite() && self.alarm_limit > 0.0) {
            return Err(DashboardError::Config(format!(
                "alarm_limit must be positive, got {}",
                self.alarm_limit
            )));
        }
        if self.cache_ttl_secs == 0 {
            return Err(DashboardError::Config("cache_ttl_secs must be positive".into()));
        }
        if self.cache_capacity == 0 {
            return Err(DashboardError::Config("cache_capacity must be positive".into()));
        }
        for side in [self.plot.width, self.plot.height] {
            if side == 0 || side > MAX_PLOT_SIDE {
                return Err(DashboardError::Config(format!(
                    "plot sides must be within 1..={MAX_PLOT_SIDE}, got {}x{}",
                    self.plot.width, self.plot.height
                )));
            }
        }
        Ok(())
    }
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
    pub fn plot_style(&self) -> PlotStyle {
        PlotStyle::default().with_size(self.plot.width, self.plot.height)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn empty_object_gives_defaults() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.grid_size, 100);
        assert_eq!(config.cache_ttl(), Duration::from_secs(180));
        assert_eq!(config.spectrum_style, SpectrumStyle::Bars);
    }
    #[test]
    fn partial_config_overrides_fields() {
        let config = DashboardConfig::from_json(
            r#"{"data_dir": "/srv/vib", "spectrum_style": "lines", "plot": {"width": 640}}"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/vib"));
        assert_eq!(config.spectrum_style, SpectrumStyle::Lines);
        assert_eq!(config.plot, PlotConfig { width: 640, height: 400 });
        assert_eq!(config.plot_style().width, 640);
    }
    #[test]
    fn invalid_values_are_rejected() {
        for raw in [
            r#"{"grid_size": 1}"#,
            r#"{"alarm_limit": 0.0}"#,
            r#"{"alarm_limit": -3.0}"#,
            r#"{"cache_ttl_secs": 0}"#,
            r#"{"cache_capacity": 0}"#,
            r#"{"plot": {"width": 0}}"#,
            r#"{"plot": {"width": 100000, "height": 100000}}"#,
        ] {
            assert!(
                matches!(DashboardConfig::from_json(raw), Err(DashboardError::Config(_))),
                "{raw}"
            );
        }
        assert!(matches!(
            DashboardConfig::from_json("{not json"),
            Err(DashboardError::ConfigParse(_))
        ));
    }
    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("vibemon-no-such-config.json");
        assert_eq!(DashboardConfig::load(path).unwrap(), DashboardConfig::default());
    }
}
