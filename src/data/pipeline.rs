use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};

use super::aggregate::{CorrelationMatrix, QuarterlySeries, correlation_matrix, quarterly_means};
use super::imputer::{ImputationReport, OutlierImputer};
use super::loader::{REQUIRED_COLUMNS, require_columns};
use super::model::AirQualityDataset;
use super::stats::BoxSummary;
use crate::config::DashboardConfig;

/// Everything the dashboard draws, derived once per loaded file.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub rows_loaded: usize,
    pub boxes_before: BTreeMap<String, BoxSummary>,
    pub boxes_after: BTreeMap<String, BoxSummary>,
    pub reports: Vec<ImputationReport>,
    /// Rows removed for having a missing cell after imputation.
    pub dropped_rows: usize,
    pub cleaned: AirQualityDataset,
    pub quarterly: QuarterlySeries,
    pub correlation: CorrelationMatrix,
}

impl Analysis {
    /// Impute outliers, drop incomplete rows, then aggregate.
    ///
    /// `raw` is left untouched; the cleaned copy is kept in the result.
    pub fn run(raw: &AirQualityDataset, config: &DashboardConfig) -> Result<Self> {
        require_columns(raw, &REQUIRED_COLUMNS)?;
        if raw.is_empty() {
            bail!("Dataset has no rows");
        }

        let boxes_before = box_summaries(raw, &config.boxplot_columns);

        let mut cleaned = raw.clone();
        let imputer = OutlierImputer::new(config.max_passes);
        let reports = imputer
            .impute_all(&mut cleaned, &config.impute_columns)
            .context("imputing outliers")?;

        let dropped_rows = cleaned.drop_incomplete_rows();
        log::info!(
            "Dropped {dropped_rows} incomplete row(s), {} remain",
            cleaned.len()
        );

        let boxes_after = box_summaries(&cleaned, &config.boxplot_columns);
        let quarterly = quarterly_means(&cleaned, &config.trend_pollutants)?;
        let correlation = correlation_matrix(&cleaned, &config.correlation_columns)?;

        Ok(Analysis {
            rows_loaded: raw.len(),
            boxes_before,
            boxes_after,
            reports,
            dropped_rows,
            cleaned,
            quarterly,
            correlation,
        })
    }
}

fn box_summaries(dataset: &AirQualityDataset, columns: &[String]) -> BTreeMap<String, BoxSummary> {
    columns
        .iter()
        .filter_map(|name| match dataset.numeric(name) {
            Ok(cells) => BoxSummary::from_cells(cells).map(|s| (name.clone(), s)),
            Err(e) => {
                log::warn!("No boxplot for {name}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::stats::{IqrBounds, sorted_present};

    /// Two quarters of hourly readings with one spike per pollutant and a
    /// row with a missing SO2 reading.
    fn station_csv() -> String {
        let mut text = String::from("No,year,month,day,hour,SO2,NO2,O3,TEMP,wd\n");
        let mut no = 1;
        for (month, base) in [(2, 10.0), (5, 4.0)] {
            for day in 1..=10 {
                let so2 = base + (day % 3) as f64;
                let no2 = 2.0 * base + (day % 4) as f64;
                let o3 = 30.0 + day as f64;
                let temp = month as f64 + day as f64 / 10.0;
                text.push_str(&format!(
                    "{no},2014,{month},{day},12,{so2},{no2},{o3},{temp},N\n"
                ));
                no += 1;
            }
        }
        text.push_str(&format!("{no},2014,5,20,3,900,900,900,20,N\n"));
        no += 1;
        text.push_str(&format!("{no},2014,5,21,4,NA,20,40,21,N\n"));
        text
    }

    #[test]
    fn run_cleans_drops_and_aggregates() {
        let raw = read_csv(station_csv().as_bytes()).unwrap();
        let analysis = Analysis::run(&raw, &DashboardConfig::default()).unwrap();

        assert_eq!(analysis.rows_loaded, 22);
        assert_eq!(analysis.dropped_rows, 1);
        assert_eq!(analysis.cleaned.len(), 21);
        assert_eq!(
            analysis.reports.iter().map(|r| r.column.as_str()).collect::<Vec<_>>(),
            vec!["O3", "SO2", "NO2"]
        );
        assert!(analysis.reports.iter().all(|r| r.replaced >= 1));

        for column in ["O3", "SO2", "NO2"] {
            let cells = analysis.cleaned.numeric(column).unwrap();
            let bounds = IqrBounds::from_sorted(&sorted_present(cells)).unwrap();
            assert!(cells.iter().flatten().all(|v| bounds.contains(*v)), "{column}");
        }

        assert_eq!(analysis.quarterly.labels(), vec!["2014Q1", "2014Q2"]);
        assert_eq!(analysis.correlation.columns, vec!["TEMP", "O3"]);
        assert!(analysis.boxes_before["SO2"].fliers.contains(&900.0));
        assert!(!analysis.boxes_after["SO2"].fliers.contains(&900.0));
    }

    #[test]
    fn raw_table_is_not_modified() {
        let raw = read_csv(station_csv().as_bytes()).unwrap();
        let before = raw.clone();
        Analysis::run(&raw, &DashboardConfig::default()).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn header_only_file_is_rejected() {
        let raw = read_csv("year,month,day,hour,TEMP,O3,SO2,NO2\n".as_bytes()).unwrap();
        let err = Analysis::run(&raw, &DashboardConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "Dataset has no rows");
    }

    #[test]
    fn missing_schema_columns_fail_early() {
        let raw = read_csv("year,month\n2014,1\n".as_bytes()).unwrap();
        let err = Analysis::run(&raw, &DashboardConfig::default()).unwrap_err();
        assert!(err.to_string().contains("TEMP"));
    }
}
