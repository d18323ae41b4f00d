use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::imputer::DEFAULT_MAX_PASSES;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "CHANGPING_AIR_CONFIG";

/// Dashboard settings. Every field has a default, so a config file only
/// needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Station file opened at startup.
    pub data_path: PathBuf,
    /// Columns cleaned of outliers, in this order.
    pub impute_columns: Vec<String>,
    /// Pass limit for each column's imputation loop.
    pub max_passes: usize,
    /// Pollutants averaged per quarter for the trend chart.
    pub trend_pollutants: Vec<String>,
    /// Columns of the correlation heatmap.
    pub correlation_columns: Vec<String>,
    /// Columns shown in the before/after boxplot grid.
    pub boxplot_columns: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/PRSA_Data_Changping_20130301-20170228.csv"),
            impute_columns: strings(&["O3", "SO2", "NO2"]),
            max_passes: DEFAULT_MAX_PASSES,
            trend_pollutants: strings(&["SO2", "NO2"]),
            correlation_columns: strings(&["TEMP", "O3"]),
            boxplot_columns: strings(&["TEMP", "O3", "SO2", "NO2"]),
        }
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl DashboardConfig {
    /// Read the file named by [`CONFIG_ENV`], falling back to defaults when
    /// the variable is unset or the file cannot be used.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(config) => {
                log::info!("Using config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config)
    }
}
