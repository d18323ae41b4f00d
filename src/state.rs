use std::path::{Path, PathBuf};

use crate::config::DashboardConfig;
use crate::data::loader::load_file;
use crate::data::model::AirQualityDataset;
use crate::data::pipeline::Analysis;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// File the current dataset came from.
    pub source: Option<PathBuf>,

    /// Table as loaded, before any cleaning.
    pub raw: Option<AirQualityDataset>,

    /// Cleaned table and derived charts (None until a load succeeds).
    pub analysis: Option<Analysis>,

    /// "Show boxplots before imputation" checkbox.
    pub show_before: bool,

    /// "Show boxplots after imputation" checkbox.
    pub show_after: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            source: None,
            raw: None,
            analysis: None,
            show_before: false,
            show_after: false,
            status_message: None,
        }
    }

    /// Load the configured station file, if it exists.
    pub fn load_default(&mut self) {
        let path = self.config.data_path.clone();
        if path.exists() {
            self.load_path(&path);
        } else {
            log::warn!("Default data file {} not found", path.display());
            self.status_message = Some(format!(
                "{} not found, use File → Open…",
                path.display()
            ));
        }
    }

    /// Load a file and run the cleaning pipeline on it.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                self.source = Some(path.to_path_buf());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and derive everything drawn from it.
    pub fn set_dataset(&mut self, dataset: AirQualityDataset) {
        match Analysis::run(&dataset, &self.config) {
            Ok(analysis) => {
                self.analysis = Some(analysis);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to analyse dataset: {e:#}");
                self.analysis = None;
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
        self.raw = Some(dataset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    #[test]
    fn bad_dataset_keeps_raw_and_reports_error() {
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(AirQualityDataset::from_columns(vec![(
            "year".to_string(),
            Column::Numeric(vec![Some(2013.0)]),
        )]));

        assert!(state.raw.is_some());
        assert!(state.analysis.is_none());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("lacks numeric column")));
    }

    #[test]
    fn missing_default_file_sets_status() {
        let config = DashboardConfig {
            data_path: PathBuf::from("/nonexistent/station.csv"),
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load_default();

        assert!(state.raw.is_none());
        assert!(state.status_message.is_some());
    }
}
