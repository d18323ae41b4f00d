use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use super::model::AirQualityDataset;
use super::stats::pearson;

// ---------------------------------------------------------------------------
// Calendar quarters
// ---------------------------------------------------------------------------

/// A calendar quarter, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    /// 1..=4
    pub quarter: u32,
}

impl Quarter {
    pub fn of(date: NaiveDate) -> Self {
        Quarter {
            year: date.year(),
            quarter: date.month0() / 3 + 1,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

/// Mean concentration of each pollutant per quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlySeries {
    pub quarters: Vec<Quarter>,
    /// Per pollutant, in request order: one mean per entry of `quarters`
    /// (`None` if the quarter has no reading).
    pub means: Vec<(String, Vec<Option<f64>>)>,
}

impl QuarterlySeries {
    pub fn labels(&self) -> Vec<String> {
        self.quarters.iter().map(Quarter::to_string).collect()
    }

    pub fn means_of(&self, pollutant: &str) -> Option<&[Option<f64>]> {
        self.means
            .iter()
            .find(|(name, _)| name == pollutant)
            .map(|(_, m)| m.as_slice())
    }
}

/// Bucket rows by the quarter of their `year/month/day/hour` timestamp and
/// average each pollutant within the bucket.
///
/// Rows with a missing or impossible date are skipped.
pub fn quarterly_means<S: AsRef<str>>(
    dataset: &AirQualityDataset,
    pollutants: &[S],
) -> Result<QuarterlySeries> {
    let year = dataset.numeric("year")?;
    let month = dataset.numeric("month")?;
    let day = dataset.numeric("day")?;
    let hour = dataset.numeric("hour")?;

    let series: Vec<(&str, &[Option<f64>])> = pollutants
        .iter()
        .map(|p| {
            let name = p.as_ref();
            dataset
                .numeric(name)
                .map(|cells| (name, cells))
                .with_context(|| format!("averaging '{name}' per quarter"))
        })
        .collect::<Result<_>>()?;

    // quarter → per pollutant (sum, count)
    let mut buckets: BTreeMap<Quarter, Vec<(f64, usize)>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in 0..dataset.len() {
        let Some(date) = row_date(year[row], month[row], day[row], hour[row]) else {
            skipped += 1;
            continue;
        };
        let acc = buckets
            .entry(Quarter::of(date))
            .or_insert_with(|| vec![(0.0, 0); series.len()]);
        for (slot, (_, cells)) in acc.iter_mut().zip(&series) {
            if let Some(v) = cells[row] {
                slot.0 += v;
                slot.1 += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} row(s) without a valid date");
    }

    let quarters: Vec<Quarter> = buckets.keys().copied().collect();
    let mut means = Vec::with_capacity(series.len());
    for (i, (name, _)) in series.iter().enumerate() {
        let column: Vec<Option<f64>> = buckets
            .values()
            .map(|acc| {
                let (sum, count) = acc[i];
                (count > 0).then(|| sum / count as f64)
            })
            .collect();
        means.push((name.to_string(), column));
    }

    Ok(QuarterlySeries { quarters, means })
}

fn row_date(
    year: Option<f64>,
    month: Option<f64>,
    day: Option<f64>,
    hour: Option<f64>,
) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year? as i32, month? as u32, day? as u32)?;
    // Validated like a full timestamp even though only the date is used.
    date.and_hms_opt(hour? as u32, 0, 0)?;
    Some(date)
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Square matrix of pairwise Pearson coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `NaN` where the coefficient is undefined.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }
}

pub fn correlation_matrix<S: AsRef<str>>(
    dataset: &AirQualityDataset,
    columns: &[S],
) -> Result<CorrelationMatrix> {
    let cells: Vec<&[Option<f64>]> = columns
        .iter()
        .map(|c| dataset.numeric(c.as_ref()).context("building correlation matrix"))
        .collect::<Result<_>>()?;

    let n = cells.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                1.0
            } else {
                pearson(cells[i], cells[j]).unwrap_or(f64::NAN)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        values,
    })
}
