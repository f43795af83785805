//! Daily volume aggregation and weekday annotation

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::stats::BoxStats;
use super::GB;
use crate::engine::schema::DAILY_VOLUME;
use crate::engine::Engine;
use crate::error::Result;

/// Download and upload volume summed over one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DailyVolume {
    #[sqlx(rename = "creation_date")]
    pub date: NaiveDate,
    #[sqlx(rename = "download")]
    pub download_gb: f64,
    #[sqlx(rename = "upload")]
    pub upload_gb: f64,
}

/// Group the raw table by date and keep the result in the engine for reuse
pub async fn materialize_daily_volume(engine: &Engine) -> Result<()> {
    let select = format!(
        "SELECT creation_date, \
                CAST(SUM(bytes_downstream) AS REAL) / {GB:?} AS download, \
                CAST(SUM(bytes_upstream) AS REAL) / {GB:?} AS upload \
         FROM ipdr GROUP BY creation_date"
    );
    engine.materialize(DAILY_VOLUME, &select).await
}

/// Read back the daily totals; row order is unspecified
pub async fn daily_volume(engine: &Engine) -> Result<Vec<DailyVolume>> {
    let rows = sqlx::query_as::<_, DailyVolume>(
        "SELECT creation_date, download, upload FROM daily_volume",
    )
    .fetch_all(engine.pool())
    .await?;
    Ok(rows)
}

pub fn sorted_by_date(daily: &[DailyVolume]) -> Vec<DailyVolume> {
    let mut rows = daily.to_vec();
    rows.sort_by_key(|row| row.date);
    rows
}

/// A daily total tagged with the long weekday name of its date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayVolume {
    pub date: NaiveDate,
    pub weekday: String,
    pub download_gb: f64,
}

pub fn annotate_weekdays(daily: &[DailyVolume]) -> Vec<WeekdayVolume> {
    daily
        .iter()
        .map(|row| WeekdayVolume {
            date: row.date,
            weekday: row.date.format("%A").to_string(),
            download_gb: row.download_gb,
        })
        .collect()
}

/// Daily downloads falling on one weekday
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayGroup {
    pub weekday: String,
    pub downloads_gb: Vec<f64>,
    pub stats: BoxStats,
}

/// Group annotated rows Monday through Sunday, values in date order.
/// Weekdays with no data are left out.
pub fn group_by_weekday(rows: &[WeekdayVolume]) -> Vec<WeekdayGroup> {
    let mut ordered = rows.to_vec();
    ordered.sort_by_key(|row| row.date);

    let mut groups: BTreeMap<u32, (String, Vec<f64>)> = BTreeMap::new();
    for row in ordered {
        groups
            .entry(row.date.weekday().num_days_from_monday())
            .or_insert_with(|| (row.weekday.clone(), Vec::new()))
            .1
            .push(row.download_gb);
    }

    groups
        .into_values()
        .filter_map(|(weekday, downloads_gb)| {
            let stats = BoxStats::from_values(&downloads_gb)?;
            Some(WeekdayGroup {
                weekday,
                downloads_gb,
                stats,
            })
        })
        .collect()
}
