//! Iterative median imputation of IQR outliers.
//!
//! Each pass recomputes the quartile fences from the current column,
//! replaces every value strictly outside them with the current median and
//! starts over, until a pass finds nothing to replace.

use thiserror::Error;

use super::model::{AirQualityDataset, ColumnKind};
use super::stats::{IqrBounds, quantile_sorted, sorted_present};

/// Default upper bound on passes before giving up on a column.
pub const DEFAULT_MAX_PASSES: usize = 100;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImputeError {
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    #[error("Column '{column}' is {found}, expected numeric values")]
    TypeMismatch { column: String, found: ColumnKind },

    #[error("Column '{column}' still has outliers after {limit} passes")]
    IterationLimitExceeded { column: String, limit: usize },
}

/// Outcome of cleaning one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationReport {
    pub column: String,
    /// Quantile computations performed, including the final clean one.
    pub passes: usize,
    /// Cells overwritten across all passes.
    pub replaced: usize,
    /// Fences of the final pass; `None` when the column has no values.
    pub bounds: Option<IqrBounds>,
}

/// Replaces IQR outliers in a numeric column with the column median.
#[derive(Debug, Clone, Copy)]
pub struct OutlierImputer {
    max_passes: usize,
}

impl Default for OutlierImputer {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl OutlierImputer {
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }

    /// Clean `column` of `dataset` in place.
    ///
    /// On error the column may have been partially rewritten by the passes
    /// that completed before the limit was hit.
    pub fn impute(
        &self,
        dataset: &mut AirQualityDataset,
        column: &str,
    ) -> Result<ImputationReport, ImputeError> {
        let cells = dataset.numeric_mut(column)?;
        let mut replaced = 0;

        for pass in 1..=self.max_passes {
            let sorted = sorted_present(cells);
            let (Some(bounds), Some(fill)) =
                (IqrBounds::from_sorted(&sorted), quantile_sorted(&sorted, 0.5))
            else {
                log::debug!("{column}: no values present, nothing to clean");
                return Ok(ImputationReport {
                    column: column.to_string(),
                    passes: pass,
                    replaced,
                    bounds: None,
                });
            };

            let outliers: Vec<usize> = cells
                .iter()
                .enumerate()
                .filter_map(|(i, c)| match c {
                    Some(v) if !v.is_nan() && !bounds.contains(*v) => Some(i),
                    _ => None,
                })
                .collect();

            if outliers.is_empty() {
                log::info!(
                    "{column}: clean after {pass} pass(es), {replaced} value(s) replaced"
                );
                return Ok(ImputationReport {
                    column: column.to_string(),
                    passes: pass,
                    replaced,
                    bounds: Some(bounds),
                });
            }

            log::debug!(
                "{column}: pass {pass} fences [{:.3}, {:.3}], replacing {} value(s) with {fill:.3}",
                bounds.lower,
                bounds.upper,
                outliers.len()
            );
            for i in &outliers {
                cells[*i] = Some(fill);
            }
            replaced += outliers.len();
        }

        log::warn!("{column}: gave up after {} passes", self.max_passes);
        Err(ImputeError::IterationLimitExceeded {
            column: column.to_string(),
            limit: self.max_passes,
        })
    }

    /// Clean several columns one after another, each on the result of the
    /// previous. Stops at the first failing column.
    pub fn impute_all<S: AsRef<str>>(
        &self,
        dataset: &mut AirQualityDataset,
        columns: &[S],
    ) -> Result<Vec<ImputationReport>, ImputeError> {
        columns
            .iter()
            .map(|c| self.impute(dataset, c.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;
    use pretty_assertions::assert_eq;

    fn dataset(name: &str, values: &[f64]) -> AirQualityDataset {
        AirQualityDataset::from_columns(vec![(
            name.to_string(),
            Column::Numeric(values.iter().copied().map(Some).collect()),
        )])
    }

    fn values(ds: &AirQualityDataset, name: &str) -> Vec<f64> {
        ds.numeric(name).unwrap().iter().flatten().copied().collect()
    }

    fn assert_clean(ds: &AirQualityDataset, name: &str) {
        let cells = ds.numeric(name).unwrap();
        let bounds = IqrBounds::from_sorted(&sorted_present(cells)).unwrap();
        for v in cells.iter().flatten() {
            assert!(bounds.contains(*v), "{v} outside [{}, {}]", bounds.lower, bounds.upper);
        }
    }

    #[test]
    fn replaces_single_spike_with_median() {
        let mut ds = dataset("SO2", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let report = OutlierImputer::default().impute(&mut ds, "SO2").unwrap();

        assert_eq!(values(&ds, "SO2"), vec![1.0, 2.0, 3.0, 4.0, 5.0, 3.5]);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.passes, 2);
        assert_clean(&ds, "SO2");
    }

    #[test]
    fn second_run_is_a_noop() {
        let mut ds = dataset("SO2", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let imputer = OutlierImputer::default();
        imputer.impute(&mut ds, "SO2").unwrap();
        let after_first = ds.clone();

        let report = imputer.impute(&mut ds, "SO2").unwrap();
        assert_eq!(report.replaced, 0);
        assert_eq!(report.passes, 1);
        assert_eq!(ds, after_first);
    }

    #[test]
    fn clean_column_takes_exactly_one_pass() {
        let original: Vec<f64> = (1..=20).map(f64::from).collect();
        let mut ds = dataset("NO2", &original);
        let report = OutlierImputer::default().impute(&mut ds, "NO2").unwrap();

        assert_eq!(report.passes, 1);
        assert_eq!(report.replaced, 0);
        assert_eq!(values(&ds, "NO2"), original);
    }

    #[test]
    fn two_extremes_converge_quickly_and_keep_inliers() {
        let mut input: Vec<f64> = (1..=10).map(f64::from).collect();
        input.push(500.0);
        input.push(-500.0);
        let mut ds = dataset("O3", &input);

        let report = OutlierImputer::default().impute(&mut ds, "O3").unwrap();
        assert!(report.passes <= 5, "took {} passes", report.passes);
        assert_eq!(report.replaced, 2);

        let out = values(&ds, "O3");
        assert_eq!(&out[..10], &input[..10]);
        assert_eq!(&out[10..], &[5.5, 5.5]);
        assert_clean(&ds, "O3");
    }

    #[test]
    fn zero_iqr_collapses_outliers_onto_median() {
        let mut ds = dataset("SO2", &[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 100.0]);
        let report = OutlierImputer::default().impute(&mut ds, "SO2").unwrap();

        assert_eq!(values(&ds, "SO2"), vec![5.0; 8]);
        assert_eq!(report.passes, 2);
        let bounds = report.bounds.unwrap();
        assert_eq!(bounds.iqr, 0.0);
    }

    #[test]
    fn missing_cells_are_left_alone() {
        let mut ds = AirQualityDataset::from_columns(vec![(
            "NO2".to_string(),
            Column::Numeric(vec![
                Some(1.0),
                None,
                Some(2.0),
                Some(3.0),
                Some(4.0),
                Some(5.0),
                Some(100.0),
            ]),
        )]);
        OutlierImputer::default().impute(&mut ds, "NO2").unwrap();

        let cells = ds.numeric("NO2").unwrap();
        assert_eq!(cells[1], None);
        assert_eq!(cells[6], Some(3.5));
    }

    #[test]
    fn nan_cells_are_not_outliers() {
        let mut ds = AirQualityDataset::from_columns(vec![(
            "O3".to_string(),
            Column::Numeric(vec![
                Some(1.0),
                Some(2.0),
                Some(3.0),
                Some(f64::NAN),
                Some(4.0),
                Some(5.0),
            ]),
        )]);
        let report = OutlierImputer::default().impute(&mut ds, "O3").unwrap();

        assert_eq!(report.replaced, 0);
        assert_eq!(report.passes, 1);
        assert!(ds.numeric("O3").unwrap()[3].is_some_and(f64::is_nan));
    }

    #[test]
    fn empty_and_all_missing_columns_are_trivially_clean() {
        let mut ds = dataset("O3", &[]);
        let report = OutlierImputer::default().impute(&mut ds, "O3").unwrap();
        assert_eq!(report.passes, 1);
        assert_eq!(report.bounds, None);

        let mut ds = AirQualityDataset::from_columns(vec![(
            "O3".to_string(),
            Column::Numeric(vec![None, None]),
        )]);
        let report = OutlierImputer::default().impute(&mut ds, "O3").unwrap();
        assert_eq!(report.replaced, 0);
    }

    #[test]
    fn unknown_column_is_reported() {
        let mut ds = dataset("O3", &[1.0]);
        let err = OutlierImputer::default().impute(&mut ds, "PM10").unwrap_err();
        assert_eq!(err, ImputeError::ColumnNotFound("PM10".to_string()));
    }

    #[test]
    fn text_column_is_a_type_mismatch() {
        let mut ds = AirQualityDataset::from_columns(vec![(
            "wd".to_string(),
            Column::Text(vec![Some("NW".into())]),
        )]);
        let err = OutlierImputer::default().impute(&mut ds, "wd").unwrap_err();
        assert_eq!(
            err,
            ImputeError::TypeMismatch {
                column: "wd".to_string(),
                found: ColumnKind::Text,
            }
        );
    }

    #[test]
    fn pass_limit_surfaces_as_error() {
        let mut ds = dataset("SO2", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let err = OutlierImputer::new(1).impute(&mut ds, "SO2").unwrap_err();
        assert_eq!(
            err,
            ImputeError::IterationLimitExceeded {
                column: "SO2".to_string(),
                limit: 1,
            }
        );
    }

    #[test]
    fn columns_are_cleaned_independently() {
        let spiky = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let mut ds = AirQualityDataset::from_columns(vec![
            ("O3".to_string(), Column::Numeric(spiky.iter().copied().map(Some).collect())),
            ("SO2".to_string(), Column::Numeric(spiky.iter().rev().copied().map(Some).collect())),
            ("TEMP".to_string(), Column::Numeric(spiky.iter().copied().map(Some).collect())),
        ]);
        let mut reversed_order = ds.clone();

        let imputer = OutlierImputer::default();
        let reports = imputer.impute_all(&mut ds, &["O3", "SO2"]).unwrap();
        imputer.impute_all(&mut reversed_order, &["SO2", "O3"]).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(ds, reversed_order);
        assert_eq!(values(&ds, "TEMP"), spiky.to_vec());
    }
}
