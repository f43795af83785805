//! CSV ingestion into the engine
//!
//! Cells are parsed leniently (an unparseable value counts as missing) and rows
//! strictly (any missing value drops the whole row). Files are parsed on the
//! blocking pool one at a time and inserted before the next one is read.

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::FIELD_COUNT;
use super::{Engine, RawUsageRecord};
use crate::error::{AnalysisError, Result};

/// Row accounting for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub rows_read: u64,
    pub rows_kept: u64,
    pub rows_dropped: u64,
}

struct ParsedFile {
    records: Vec<RawUsageRecord>,
    rows_read: u64,
    rows_dropped: u64,
}

/// Load every file matching `pattern` into the raw table
pub async fn ingest(engine: &Engine, pattern: &str) -> Result<IngestReport> {
    let paths = match_files(pattern)?;
    if paths.is_empty() {
        warn!("No input files match {}", pattern);
    }

    let mut report = IngestReport {
        files: paths.len(),
        ..Default::default()
    };

    for path in paths {
        let parse_path = path.clone();
        let parsed = tokio::task::spawn_blocking(move || read_file(&parse_path)).await??;

        engine.batch_insert_records(&parsed.records).await?;

        debug!(
            "Ingested {} ({} rows, {} dropped)",
            path.display(),
            parsed.rows_read,
            parsed.rows_dropped
        );
        report.rows_read += parsed.rows_read;
        report.rows_kept += parsed.records.len() as u64;
        report.rows_dropped += parsed.rows_dropped;
    }

    if report.rows_dropped > 0 {
        warn!(
            "Dropped {} of {} rows with missing or malformed fields",
            report.rows_dropped, report.rows_read
        );
    }
    info!(
        "Ingested {} rows from {} files",
        report.rows_kept, report.files
    );

    Ok(report)
}

/// Regular files matching `pattern`, in path order
fn match_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn read_file(path: &Path) -> Result<ParsedFile> {
    let read_error = |source: csv::Error| AnalysisError::Read {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;

    let mut parsed = ParsedFile {
        records: Vec::new(),
        rows_read: 0,
        rows_dropped: 0,
    };

    for result in reader.records() {
        parsed.rows_read += 1;
        match result {
            Ok(record) => match parse_record(&record) {
                Some(row) => parsed.records.push(row),
                None => parsed.rows_dropped += 1,
            },
            Err(e) if e.is_io_error() => return Err(read_error(e)),
            // Undecodable record, same fate as a row with a bad cell
            Err(_) => parsed.rows_dropped += 1,
        }
    }

    Ok(parsed)
}

/// Parse one CSV record, `None` if any of the declared fields is missing or
/// does not parse as its declared type. Extra trailing fields are ignored.
fn parse_record(record: &StringRecord) -> Option<RawUsageRecord> {
    if record.len() < FIELD_COUNT {
        return None;
    }

    let text = |index: usize| -> Option<String> {
        record
            .get(index)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Some(RawUsageRecord {
        cmts_device: text(0)?,
        address_resolution_mode: text(1)?,
        creation_date: parse_date(record.get(2)?)?,
        device_mac_address: text(3)?,
        hub_code: text(4)?,
        area_code: text(5)?,
        bytes_upstream: parse_bytes(record.get(6)?)?,
        bytes_downstream: parse_bytes(record.get(7)?)?,
        service_level: text(8)?,
        optical_rx: text(9)?,
        service_class_pair_name: text(10)?,
    })
}

/// `YYYY-MM-DD`, optionally followed by a time part after a space or `T`
fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    let (date, rest) = (value.get(..10)?, value.get(10..)?);
    if rest.starts_with([' ', 'T']) {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    } else {
        None
    }
}

fn parse_bytes(value: &str) -> Option<i64> {
    value.parse::<i64>().ok()
}
