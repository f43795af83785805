//! Console tables for the report command

use std::fmt::Display;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::*;

use crate::analysis::stats::{ColumnSummary, VolumeSummary};
use crate::engine::ingest::IngestReport;
use crate::engine::{RawUsageRecord, SchemaField};

pub fn as_ascii_table<T, U, V, W>(headers: T, rows: U) -> String
where
    T: IntoIterator,
    T::Item: AsRef<str> + Display,
    U: IntoIterator<Item = V>,
    V: IntoIterator<Item = W>,
    W: AsRef<str> + Display,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.into_iter().map(|h| h.to_string()));
    for row in rows {
        table.add_row(row.into_iter().map(|cell| cell.to_string()));
    }
    table.to_string()
}

pub fn schema_table(fields: &[SchemaField]) -> String {
    as_ascii_table(
        ["column", "type", "nullable"],
        fields.iter().map(|f| {
            vec![
                f.name.clone(),
                f.data_type.clone(),
                f.nullable.to_string(),
            ]
        }),
    )
}

pub fn preview_table(records: &[RawUsageRecord]) -> String {
    as_ascii_table(
        [
            "cmtsdevice",
            "creation_date",
            "cmmacaddress",
            "hub_code",
            "area_code",
            "bytes_upstream",
            "bytes_downstream",
        ],
        records.iter().map(|r| {
            vec![
                r.cmts_device.clone(),
                r.creation_date.to_string(),
                r.device_mac_address.clone(),
                r.hub_code.clone(),
                r.area_code.clone(),
                r.bytes_upstream.to_string(),
                r.bytes_downstream.to_string(),
            ]
        }),
    )
}

pub fn ingest_table(report: &IngestReport) -> String {
    as_ascii_table(
        ["Statistic", "Value"],
        [
            vec!["Files".to_string(), report.files.to_string()],
            vec!["Rows read".to_string(), report.rows_read.to_string()],
            vec!["Rows kept".to_string(), report.rows_kept.to_string()],
            vec!["Rows dropped".to_string(), report.rows_dropped.to_string()],
        ],
    )
}

fn summary_cells(column: Option<&ColumnSummary>) -> Vec<String> {
    match column {
        Some(s) => vec![
            s.count.to_string(),
            format!("{:.3}", s.mean),
            s.std.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string()),
            format!("{:.3}", s.min),
            format!("{:.3}", s.p25),
            format!("{:.3}", s.p50),
            format!("{:.3}", s.p75),
            format!("{:.3}", s.max),
        ],
        None => vec!["0".to_string()],
    }
}

/// `describe()`-style table, one row per statistic and one column per series
pub fn summary_table(summary: &VolumeSummary) -> String {
    let download = summary_cells(summary.download_gb.as_ref());
    let upload = summary_cells(summary.upload_gb.as_ref());
    let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    as_ascii_table(
        ["", "download", "upload"],
        labels.iter().enumerate().map(|(i, label)| {
            vec![
                label.to_string(),
                download.get(i).cloned().unwrap_or_default(),
                upload.get(i).cloned().unwrap_or_default(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_table_lists_all_statistics() {
        let summary = VolumeSummary {
            download_gb: ColumnSummary::from_values(&[1.0, 2.0, 3.0]),
            upload_gb: ColumnSummary::from_values(&[0.5]),
        };
        let table = summary_table(&summary);
        for label in ["count", "mean", "std", "25%", "75%", "max"] {
            assert!(table.contains(label), "missing {label}");
        }
        assert!(table.contains("2.000"));
        assert!(table.contains("0.500"));
    }

    #[test]
    fn empty_summary_reports_zero_count() {
        let summary = VolumeSummary {
            download_gb: None,
            upload_gb: None,
        };
        let table = summary_table(&summary);
        assert!(table.contains("count"));
        assert!(table.contains('0'));
    }

    #[test]
    fn ingest_table_shows_dropped_rows() {
        let table = ingest_table(&IngestReport {
            files: 2,
            rows_read: 10,
            rows_kept: 7,
            rows_dropped: 3,
        });
        assert!(table.contains("Rows dropped"));
        assert!(table.contains('3'));
    }
}
