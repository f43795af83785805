//! Raw IPDR table schema

use std::fmt;

/// Declared type of one raw column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Date,
    Integer,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "string"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Integer => write!(f, "integer"),
        }
    }
}

/// Column order of the headerless CSV files
pub const FIELDS: &[(&str, ColumnType)] = &[
    ("cmtsdevice", ColumnType::Text),
    ("address_resolution", ColumnType::Text),
    ("creation_date", ColumnType::Date),
    ("cmmacaddress", ColumnType::Text),
    ("hub_code", ColumnType::Text),
    ("area_code", ColumnType::Text),
    ("bytes_upstream", ColumnType::Integer),
    ("bytes_downstream", ColumnType::Integer),
    ("dxservicelevel", ColumnType::Text),
    ("optical_rx", ColumnType::Text),
    ("service_class_pair_name", ColumnType::Text),
];

pub const FIELD_COUNT: usize = 11;

pub const RAW_TABLE: &str = "ipdr";

/// Relation holding the daily totals
pub const DAILY_VOLUME: &str = "daily_volume";

/// Everything a session creates, dependents first. Nothing else in the
/// database is touched.
pub const SESSION_RELATIONS: &[&str] = &[DAILY_VOLUME, RAW_TABLE];

// Every column is NOT NULL: rows with a missing cell never reach the engine
pub const CREATE_TABLE: &str = r#"
CREATE TABLE ipdr (
    cmtsdevice TEXT NOT NULL,
    address_resolution TEXT NOT NULL,
    creation_date TEXT NOT NULL,
    cmmacaddress TEXT NOT NULL,
    hub_code TEXT NOT NULL,
    area_code TEXT NOT NULL,
    bytes_upstream INTEGER NOT NULL,
    bytes_downstream INTEGER NOT NULL,
    dxservicelevel TEXT NOT NULL,
    optical_rx TEXT NOT NULL,
    service_class_pair_name TEXT NOT NULL
)
"#;

pub const INSERT_PREFIX: &str = "INSERT INTO ipdr (cmtsdevice, address_resolution, creation_date, cmmacaddress, hub_code, area_code, bytes_upstream, bytes_downstream, dxservicelevel, optical_rx, service_class_pair_name) ";

pub const SELECT_RECORDS: &str = r#"
SELECT cmtsdevice, address_resolution, creation_date, cmmacaddress, hub_code, area_code,
       bytes_upstream, bytes_downstream, dxservicelevel, optical_rx, service_class_pair_name
FROM ipdr
ORDER BY rowid
LIMIT ?
"#;

// For the daily and (date, area) group-bys
pub const CREATE_INDEX_DATE_AREA: &str =
    "CREATE INDEX IF NOT EXISTS idx_ipdr_date_area ON ipdr(creation_date, area_code)";

// For the scoped device drill-down
pub const CREATE_INDEX_AREA_MAC: &str =
    "CREATE INDEX IF NOT EXISTS idx_ipdr_area_mac ON ipdr(area_code, cmmacaddress)";
