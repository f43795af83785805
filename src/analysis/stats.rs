//! Descriptive statistics over daily volumes

use serde::Serialize;

use super::daily::DailyVolume;

/// Quantile of an ascending slice, linear interpolation between closest ranks
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Five-number summary for a box-and-whisker plot. Whiskers reach the
/// extremes, so no point is ever drawn as an outlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        Some(Self {
            count: sorted.len(),
            min: *sorted.first()?,
            q1: quantile(&sorted, 0.25)?,
            median: quantile(&sorted, 0.5)?,
            q3: quantile(&sorted, 0.75)?,
            max: *sorted.last()?,
        })
    }
}

/// Count, mean, sample standard deviation and quartiles of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    /// `None` with fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let stats = BoxStats::from_values(values)?;
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.len() > 1).then(|| {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (n - 1.0)).sqrt()
        });

        Some(Self {
            count: stats.count,
            mean,
            std,
            min: stats.min,
            p25: stats.q1,
            p50: stats.median,
            p75: stats.q3,
            max: stats.max,
        })
    }
}

/// Summary of the daily table, `None` columns when it is empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSummary {
    pub download_gb: Option<ColumnSummary>,
    pub upload_gb: Option<ColumnSummary>,
}

pub fn describe(daily: &[DailyVolume]) -> VolumeSummary {
    let downloads: Vec<f64> = daily.iter().map(|d| d.download_gb).collect();
    let uploads: Vec<f64> = daily.iter().map(|d| d.upload_gb).collect();
    VolumeSummary {
        download_gb: ColumnSummary::from_values(&downloads),
        upload_gb: ColumnSummary::from_values(&uploads),
    }
}
