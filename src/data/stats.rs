//! Order statistics and correlation over numeric columns.
//!
//! Quantiles use the linear-interpolation estimator (`h = (n - 1) * p`),
//! the same one pandas applies by default. Missing cells are always skipped.

/// Multiplier applied to the IQR to place the outlier fences.
pub const FENCE_FACTOR: f64 = 1.5;

/// Sort present values ascending; NaN is treated as missing.
pub fn sorted_present(cells: &[Option<f64>]) -> Vec<f64> {
    let mut values: Vec<f64> = cells.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    values.sort_by(f64::total_cmp);
    values
}

/// `p`-th quantile of already sorted data. `None` for empty input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lower = h.floor() as usize;
    let frac = h - lower as f64;
    if lower + 1 >= n {
        Some(sorted[n - 1])
    } else {
        Some(sorted[lower] + frac * (sorted[lower + 1] - sorted[lower]))
    }
}

// ---------------------------------------------------------------------------
// IQR fences
// ---------------------------------------------------------------------------

/// Quartiles of a distribution and the Tukey fences derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let q1 = quantile_sorted(sorted, 0.25)?;
        let q3 = quantile_sorted(sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(IqrBounds {
            q1,
            q3,
            iqr,
            lower: q1 - FENCE_FACTOR * iqr,
            upper: q3 + FENCE_FACTOR * iqr,
        })
    }

    /// Inclusive on both fences; only values strictly outside are outliers.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

// ---------------------------------------------------------------------------
// Boxplot summary
// ---------------------------------------------------------------------------

/// Five-number summary for drawing a boxplot, with whiskers at the most
/// extreme observations still inside the fences.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub fliers: Vec<f64>,
}

impl BoxSummary {
    pub fn from_cells(cells: &[Option<f64>]) -> Option<Self> {
        let sorted = sorted_present(cells);
        let bounds = IqrBounds::from_sorted(&sorted)?;
        let median = quantile_sorted(&sorted, 0.5)?;

        let inside = || sorted.iter().copied().filter(|v| bounds.contains(*v));
        let lower_whisker = inside().next().unwrap_or(bounds.q1);
        let upper_whisker = inside().last().unwrap_or(bounds.q3);
        let fliers = sorted
            .iter()
            .copied()
            .filter(|v| !bounds.contains(*v))
            .collect();

        Some(BoxSummary {
            lower_whisker,
            q1: bounds.q1,
            median,
            q3: bounds.q3,
            upper_whisker,
            fliers,
        })
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation over rows where both cells are present.
///
/// Returns `None` with fewer than two complete pairs or zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
