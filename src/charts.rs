//! Chart rendering
//!
//! Each result table becomes exactly one plotly chart. Charts are rendered to
//! HTML once, right after the analysis, and only read afterwards.

use plotly::box_plot::{BoxPlot, BoxPoints};
use plotly::common::{Mode, Orientation, Title};
use plotly::layout::{Axis, BarMode};
use plotly::{Bar, Layout, Plot, Scatter};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::analysis::daily::{DailyVolume, WeekdayGroup};
use crate::analysis::ranking::{AreaCodeRanking, DeviceRanking};
use crate::analysis::stats::ColumnSummary;
use crate::analysis::AnalysisReport;
use crate::error::{AnalysisError, Result};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Daily,
    Weekday,
    Areas,
    Devices,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Daily,
        ChartKind::Weekday,
        ChartKind::Areas,
        ChartKind::Devices,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Daily => "daily",
            ChartKind::Weekday => "weekday",
            ChartKind::Areas => "areas",
            ChartKind::Devices => "devices",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown chart '{s}'"))
    }
}

/// Line chart of download and upload GB per day, in date order
pub fn daily_line(daily: &[DailyVolume]) -> Plot {
    let mut rows = daily.to_vec();
    rows.sort_by_key(|row| row.date);

    let dates: Vec<String> = rows.iter().map(|row| row.date.to_string()).collect();
    let downloads: Vec<f64> = rows.iter().map(|row| row.download_gb).collect();
    let uploads: Vec<f64> = rows.iter().map(|row| row.upload_gb).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(dates.clone(), downloads)
            .mode(Mode::Lines)
            .name("download"),
    );
    plot.add_trace(Scatter::new(dates, uploads).mode(Mode::Lines).name("upload"));
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Daily Download & Upload GB"))
            .x_axis(Axis::new().title(Title::with_text("creation_date")))
            .y_axis(Axis::new().title(Title::with_text("GB"))),
    );
    plot
}

/// One box per weekday with whiskers at the group's min and max.
///
/// The box is drawn from the precomputed quartiles so the chart agrees with
/// `WeekdayGroup::stats`; plotly.js would otherwise pick its own quartile
/// method and whisker reach.
pub fn weekday_box(groups: &[WeekdayGroup]) -> Plot {
    let mut plot = Plot::new();
    for group in groups {
        let stats = &group.stats;
        plot.add_trace(
            Box::new(BoxPlot::<String, f64>::default())
                .x(vec![group.weekday.clone()])
                .name(&group.weekday)
                .q1(vec![stats.q1])
                .median(vec![stats.median])
                .q3(vec![stats.q3])
                .lower_fence(vec![stats.min])
                .upper_fence(vec![stats.max])
                .box_points(BoxPoints::False),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Download GB by Day of Week"))
            .show_legend(false)
            .x_axis(Axis::new().title(Title::with_text("day_of_week")))
            .y_axis(Axis::new().title(Title::with_text("download"))),
    );
    plot
}

/// Vertical bars of average daily download, in ranking order
pub fn area_bar(areas: &[AreaCodeRanking]) -> Plot {
    let codes: Vec<String> = areas.iter().map(|a| a.area_code.clone()).collect();
    let averages: Vec<f64> = areas.iter().map(|a| a.avg_download_gb).collect();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(codes, averages).name("download"));
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Top Area Codes by Avg GB Downloaded"))
            .show_legend(false)
            .x_axis(Axis::new().title(Title::with_text("area_code"))),
    );
    plot
}

/// Horizontal bars per device, download and upload stacked
pub fn device_bar(devices: &[DeviceRanking], area_code: &str, top_n: u32) -> Plot {
    let macs: Vec<String> = devices
        .iter()
        .map(|d| d.device_mac_address.clone())
        .collect();
    let downloads: Vec<f64> = devices.iter().map(|d| d.download_mb).collect();
    let uploads: Vec<f64> = devices.iter().map(|d| d.upload_mb).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(downloads, macs.clone())
            .orientation(Orientation::Horizontal)
            .name("download"),
    );
    plot.add_trace(
        Bar::new(uploads, macs)
            .orientation(Orientation::Horizontal)
            .name("upload"),
    );
    plot.set_layout(
        Layout::new()
            .title(Title::with_text(format!(
                "Top {} MAC Addresses for {} Area Code",
                top_n,
                area_code.to_uppercase()
            )))
            .bar_mode(BarMode::Stack)
            .x_axis(Axis::new().title(Title::with_text("MB")))
            .y_axis(Axis::new().title(Title::with_text("cmmacaddress"))),
    );
    plot
}

/// A chart rendered as a standalone page and as an embeddable fragment
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub page: String,
    pub fragment: String,
}

/// All four charts plus the combined dashboard page
#[derive(Debug, Clone)]
pub struct RenderedCharts {
    charts: Vec<RenderedChart>,
    dashboard: String,
}

impl RenderedCharts {
    pub fn render(report: &AnalysisReport) -> Self {
        let charts: Vec<RenderedChart> = ChartKind::ALL
            .into_iter()
            .map(|kind| {
                let plot = build(kind, report);
                RenderedChart {
                    kind,
                    page: plot.to_html(),
                    fragment: plot.to_inline_html(Some(&format!("chart-{kind}"))),
                }
            })
            .collect();
        let dashboard = dashboard_html(report, &charts);
        Self { charts, dashboard }
    }

    pub fn get(&self, kind: ChartKind) -> Option<&RenderedChart> {
        self.charts.iter().find(|chart| chart.kind == kind)
    }

    pub fn dashboard(&self) -> &str {
        &self.dashboard
    }

    /// Write every chart page and `index.html` into `dir`
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let write = |path: PathBuf, contents: &str| -> Result<PathBuf> {
            fs::write(&path, contents).map_err(|source| AnalysisError::Write {
                path: path.display().to_string(),
                source,
            })?;
            Ok(path)
        };

        fs::create_dir_all(dir).map_err(|source| AnalysisError::Write {
            path: dir.display().to_string(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.charts.len() + 1);
        for chart in &self.charts {
            written.push(write(dir.join(format!("{}.html", chart.kind)), &chart.page)?);
        }
        written.push(write(dir.join("index.html"), &self.dashboard)?);

        info!("Wrote {} chart pages to {}", written.len(), dir.display());
        Ok(written)
    }
}

fn build(kind: ChartKind, report: &AnalysisReport) -> Plot {
    match kind {
        ChartKind::Daily => daily_line(&report.daily),
        ChartKind::Weekday => weekday_box(&report.weekdays),
        ChartKind::Areas => area_bar(&report.areas),
        ChartKind::Devices => device_bar(&report.devices, &report.area_code, report.top_n),
    }
}

fn summary_rows(name: &str, summary: Option<&ColumnSummary>) -> String {
    let Some(s) = summary else {
        return format!("<tr><td>{name}</td><td colspan=\"8\">no data</td></tr>");
    };
    let std = s.std.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string());
    format!(
        "<tr><td>{name}</td><td>{}</td><td>{:.3}</td><td>{std}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td></tr>",
        s.count, s.mean, s.min, s.p25, s.p50, s.p75, s.max
    )
}

fn dashboard_html(report: &AnalysisReport, charts: &[RenderedChart]) -> String {
    let ingest = &report.ingest;
    let sections: String = charts
        .iter()
        .map(|chart| format!("<section>{}</section>\n", chart.fragment))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>IPDR Usage Analysis</title>
<script src="{PLOTLY_JS}"></script>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; margin-bottom: 1.5em; }}
td, th {{ border: 1px solid #ccc; padding: 4px 8px; text-align: right; }}
</style>
</head>
<body>
<h1>IPDR Usage Analysis</h1>
<p>{files} files, {kept} rows analysed, {dropped} of {read} rows dropped for missing or malformed fields.</p>
<table>
<tr><th></th><th>count</th><th>mean</th><th>std</th><th>min</th><th>25%</th><th>50%</th><th>75%</th><th>max</th></tr>
{download}
{upload}
</table>
{sections}</body>
</html>
"#,
        files = ingest.files,
        kept = ingest.rows_kept,
        dropped = ingest.rows_dropped,
        read = ingest.rows_read,
        download = summary_rows("download", report.summary.download_gb.as_ref()),
        upload = summary_rows("upload", report.summary.upload_gb.as_ref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stats::BoxStats;
    use crate::analysis::tests::sample_report;
    use serde_json::Value;

    fn json(plot: &Plot) -> Value {
        serde_json::from_str(&plot.to_json()).unwrap()
    }

    #[tokio::test]
    async fn daily_chart_has_two_line_series_in_date_order() {
        let report = sample_report().await;
        let mut shuffled = report.daily.clone();
        shuffled.reverse();

        let plot = json(&daily_line(&shuffled));
        let data = plot["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["type"], "scatter");
        assert_eq!(data[0]["mode"], "lines");
        assert_eq!(data[0]["name"], "download");
        assert_eq!(data[1]["name"], "upload");
        assert_eq!(data[0]["x"][0], "2017-10-01");
        assert_eq!(data[0]["y"][0], 3.0);
    }

    #[tokio::test]
    async fn weekday_chart_has_one_box_per_group() {
        let report = sample_report().await;
        let plot = json(&weekday_box(&report.weekdays));
        let data = plot["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["type"], "box");
        assert_eq!(data[0]["name"], "Monday");
    }

    #[test]
    fn weekday_boxes_use_precomputed_quartiles() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let group = WeekdayGroup {
            weekday: "Tuesday".to_string(),
            stats: BoxStats::from_values(&values).unwrap(),
            downloads_gb: values,
        };

        let plot = json(&weekday_box(&[group]));
        let trace = &plot["data"][0];
        assert_eq!(trace["x"][0], "Tuesday");
        assert_eq!(trace["q1"][0], 1.75);
        assert_eq!(trace["median"][0], 2.5);
        assert_eq!(trace["q3"][0], 3.25);
        assert_eq!(trace["lowerfence"][0], 1.0);
        assert_eq!(trace["upperfence"][0], 4.0);
        assert_eq!(trace["boxpoints"], false);
        assert!(trace.get("y").is_none());
    }

    #[tokio::test]
    async fn device_chart_is_stacked_horizontal() {
        let report = sample_report().await;
        let plot = json(&device_bar(&report.devices, &report.area_code, report.top_n));
        let data = plot["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["type"], "bar");
        assert_eq!(data[0]["orientation"], "h");
        assert_eq!(data[0]["y"][0], "aa:02");
        assert_eq!(plot["layout"]["barmode"], "stack");
        assert_eq!(
            plot["layout"]["title"]["text"],
            "Top 20 MAC Addresses for CG Area Code"
        );
    }

    #[test]
    fn empty_tables_render_empty_charts() {
        let plot = json(&area_bar(&[]));
        assert_eq!(plot["data"][0]["type"], "bar");
        assert_eq!(plot["data"][0]["x"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn chart_names_round_trip() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.name().parse::<ChartKind>().unwrap(), kind);
        }
        assert!("pie".parse::<ChartKind>().is_err());
    }

    #[tokio::test]
    async fn writes_pages_and_dashboard() {
        let report = sample_report().await;
        let charts = RenderedCharts::render(&report);
        let dir = tempfile::tempdir().unwrap();

        let written = charts.write_all(&dir.path().join("out")).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));

        let dashboard = std::fs::read_to_string(dir.path().join("out/index.html")).unwrap();
        assert!(dashboard.contains("chart-daily"));
        assert!(dashboard.contains("chart-devices"));
        assert!(dashboard.contains("1 of 6 rows dropped"));
    }
}
