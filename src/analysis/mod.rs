//! Analysis pipeline
//!
//! Ingest, aggregate by date, then derive the weekday, area-code and device
//! views. Every stage reads from the engine session it is handed; the raw and
//! daily tables are built once and reused by everything downstream.

pub mod daily;
pub mod ranking;
pub mod stats;

use serde::Serialize;
use tracing::info;

use crate::config::{AnalysisConfig, IngestConfig};
use crate::engine::ingest::{self, IngestReport};
use crate::engine::Engine;
use crate::error::Result;
use daily::{DailyVolume, WeekdayGroup};
use ranking::{AreaCodeRanking, DeviceRanking};
use stats::VolumeSummary;

// Decimal units
pub const KB: f64 = 1000.0;
pub const MB: f64 = KB * 1000.0;
pub const GB: f64 = MB * 1000.0;

/// Every table the charts are drawn from, materialized once per session
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ingest: IngestReport,
    /// Sorted by date
    pub daily: Vec<DailyVolume>,
    pub summary: VolumeSummary,
    pub weekdays: Vec<WeekdayGroup>,
    pub areas: Vec<AreaCodeRanking>,
    pub area_code: String,
    pub top_n: u32,
    pub devices: Vec<DeviceRanking>,
}

pub async fn run(engine: &Engine, ingest_config: &IngestConfig, analysis: &AnalysisConfig) -> Result<AnalysisReport> {
    engine.init_session().await?;

    let ingest = ingest::ingest(engine, &ingest_config.path_pattern).await?;
    info!("Raw table holds {} rows", engine.row_count().await?);

    daily::materialize_daily_volume(engine).await?;
    let daily = daily::sorted_by_date(&daily::daily_volume(engine).await?);
    info!("Daily volume: {} days", daily.len());

    let summary = stats::describe(&daily);
    let weekdays = daily::group_by_weekday(&daily::annotate_weekdays(&daily));

    let areas = ranking::area_code_ranking(engine).await?;
    info!("Area code ranking: {} area codes", areas.len());

    let devices = ranking::device_ranking(engine, &analysis.area_code, analysis.top_n).await?;
    info!(
        "Device ranking for area code {}: {} devices",
        analysis.area_code,
        devices.len()
    );

    Ok(AnalysisReport {
        ingest,
        daily,
        summary,
        weekdays,
        areas,
        area_code: analysis.area_code.clone(),
        top_n: analysis.top_n,
        devices,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::path::Path;

    pub fn write_month(dir: &Path) {
        let rows = [
            // 2017-10-01: third row has no downstream counter
            "cmts01,dhcp,2017-10-01,aa:01,hub1,cg,100000000,1000000000,gold,-3.1,pair",
            "cmts01,dhcp,2017-10-01,aa:02,hub1,cg,200000000,2000000000,gold,-3.1,pair",
            "cmts01,dhcp,2017-10-01,aa:03,hub1,cg,300000000,,gold,-3.1,pair",
            "cmts02,dhcp,2017-10-02,aa:01,hub2,cg,100000000,500000000,gold,-2.0,pair",
            "cmts03,dhcp,2017-10-02,bb:01,hub3,ab,50000000,4000000000,silver,-1.0,pair",
            "cmts03,dhcp,2017-10-09,bb:01,hub3,ab,50000000,1500000000,silver,-1.0,pair",
        ];
        let day_dir = dir.join("ipdr-2017-10");
        fs::create_dir_all(&day_dir).unwrap();
        fs::write(day_dir.join("part-0.csv"), rows.join("\n")).unwrap();
    }

    pub async fn sample_report() -> AnalysisReport {
        let dir = tempfile::tempdir().unwrap();
        write_month(dir.path());
        let config = Config::for_tests(&format!("{}/*2017-10*/*", dir.path().display()));
        let engine = Engine::in_memory().await.unwrap();
        run(&engine, &config.ingest, &config.analysis).await.unwrap()
    }

    #[test]
    fn units_are_decimal() {
        assert_eq!(KB, 1e3);
        assert_eq!(MB, 1e6);
        assert_eq!(GB, 1e9);
    }

    #[tokio::test]
    async fn dropped_row_does_not_count_towards_daily_total() {
        let report = sample_report().await;

        assert_eq!(report.ingest.rows_read, 6);
        assert_eq!(report.ingest.rows_dropped, 1);

        let first = &report.daily[0];
        assert_eq!(first.date.to_string(), "2017-10-01");
        assert_eq!(first.download_gb, 3.0);
        assert_eq!(report.daily.len(), 3);
        assert!(report.daily.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn full_pipeline_tables() {
        let report = sample_report().await;

        // cg: day1 3.0, day2 0.5 -> 1.75; ab: day2 4.0, day9 1.5 -> 2.75
        let areas: Vec<(&str, f64)> = report
            .areas
            .iter()
            .map(|a| (a.area_code.as_str(), a.avg_download_gb))
            .collect();
        assert_eq!(areas, vec![("cg", 1.75), ("ab", 2.75)]);

        let macs: Vec<&str> = report
            .devices
            .iter()
            .map(|d| d.device_mac_address.as_str())
            .collect();
        assert_eq!(macs, vec!["aa:02", "aa:01"]);
        assert_eq!(report.devices[1].total_mb, 1700.0);

        // 2017-10-02 and 2017-10-09 are both Mondays
        assert_eq!(report.weekdays.len(), 2);
        assert_eq!(report.weekdays[0].weekday, "Monday");
        assert_eq!(report.weekdays[0].downloads_gb, vec![4.5, 1.5]);
        assert_eq!(report.weekdays[1].weekday, "Sunday");

        assert_eq!(report.summary.download_gb.as_ref().unwrap().count, 3);
    }

    #[tokio::test]
    async fn rerun_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        write_month(dir.path());
        let config = Config::for_tests(&format!("{}/*2017-10*/*", dir.path().display()));
        let engine = Engine::in_memory().await.unwrap();

        let first = run(&engine, &config.ingest, &config.analysis).await.unwrap();
        let second = run(&engine, &config.ingest, &config.analysis).await.unwrap();

        assert_eq!(first.ingest, second.ingest);
        assert_eq!(first.daily, second.daily);
        assert_eq!(first.weekdays, second.weekdays);
        assert_eq!(first.areas, second.areas);
        assert_eq!(first.devices, second.devices);
    }

    #[tokio::test]
    async fn scoped_to_absent_area_yields_no_devices() {
        let dir = tempfile::tempdir().unwrap();
        write_month(dir.path());
        let mut config = Config::for_tests(&format!("{}/*2017-10*/*", dir.path().display()));
        config.analysis.area_code = "zz".to_string();
        let engine = Engine::in_memory().await.unwrap();

        let report = run(&engine, &config.ingest, &config.analysis).await.unwrap();
        assert!(report.devices.is_empty());
        assert_eq!(report.areas.len(), 2);
    }
}
