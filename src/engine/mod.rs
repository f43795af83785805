//! Query engine session
//!
//! An [`Engine`] is the explicit execution context every pipeline stage runs
//! against. It wraps a single-connection SQLite pool, in memory unless the
//! configuration names a database file.

pub mod ingest;
pub mod schema;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::str::FromStr;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;

const BATCH_SIZE: usize = 500;

/// One row of network usage for one device on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RawUsageRecord {
    #[sqlx(rename = "cmtsdevice")]
    pub cmts_device: String,
    #[sqlx(rename = "address_resolution")]
    pub address_resolution_mode: String,
    pub creation_date: NaiveDate,
    #[sqlx(rename = "cmmacaddress")]
    pub device_mac_address: String,
    pub hub_code: String,
    pub area_code: String,
    pub bytes_upstream: i64,
    pub bytes_downstream: i64,
    #[sqlx(rename = "dxservicelevel")]
    pub service_level: String,
    pub optical_rx: String,
    pub service_class_pair_name: String,
}

/// Declared column of the raw table, as reported by [`Engine::describe_schema`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Clone)]
pub struct Engine {
    pool: Pool<Sqlite>,
    persist: bool,
}

impl Engine {
    pub async fn new(config: &EngineConfig) -> Result<Self> {
        let options = if config.url == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.url)
                .create_if_missing(true)
        };

        // One connection that never expires: an in-memory database lives
        // exactly as long as its connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            persist: config.persist,
        })
    }

    /// Fresh in-memory session with persistence enabled
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        Self::new(&EngineConfig {
            url: ":memory:".to_string(),
            persist: true,
        })
        .await
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Drop the relations a previous session left behind and create the raw
    /// table. Other tables in a file-backed database are left alone.
    pub async fn init_session(&self) -> Result<()> {
        for name in schema::SESSION_RELATIONS {
            self.drop_relation(name).await?;
        }

        sqlx::query(schema::CREATE_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_INDEX_DATE_AREA)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_INDEX_AREA_MAC)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert records in a single transaction, `BATCH_SIZE` rows per statement
    pub async fn batch_insert_records(&self, records: &[RawUsageRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for chunk in records.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(schema::INSERT_PREFIX);
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(&record.cmts_device)
                    .push_bind(&record.address_resolution_mode)
                    .push_bind(record.creation_date)
                    .push_bind(&record.device_mac_address)
                    .push_bind(&record.hub_code)
                    .push_bind(&record.area_code)
                    .push_bind(record.bytes_upstream)
                    .push_bind(record.bytes_downstream)
                    .push_bind(&record.service_level)
                    .push_bind(&record.optical_rx)
                    .push_bind(&record.service_class_pair_name);
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!("Inserted {} records", records.len());
        Ok(())
    }

    /// Make `select` available under `name`: a table when persistence is on,
    /// a view otherwise. Both read back identically.
    pub async fn materialize(&self, name: &str, select: &str) -> Result<()> {
        self.drop_relation(name).await?;

        let kind = if self.persist { "TABLE" } else { "VIEW" };
        sqlx::query(&format!("CREATE {kind} {name} AS {select}"))
            .execute(&self.pool)
            .await?;
        debug!("Materialized {} as {}", name, kind.to_lowercase());
        Ok(())
    }

    /// Drop `name` whether it is a table or a view
    async fn drop_relation(&self, name: &str) -> Result<()> {
        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT type FROM sqlite_master WHERE name = ? AND type IN ('table', 'view')",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let kind = match existing.as_ref().map(|(kind,)| kind.as_str()) {
            Some("view") => "VIEW",
            Some(_) => "TABLE",
            None => return Ok(()),
        };
        sqlx::query(&format!("DROP {kind} {name}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub fn describe_schema(&self) -> Vec<SchemaField> {
        schema::FIELDS
            .iter()
            .map(|(name, data_type)| SchemaField {
                name: name.to_string(),
                data_type: data_type.to_string(),
                nullable: false,
            })
            .collect()
    }

    pub async fn row_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ipdr")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// First `limit` rows in ingestion order
    pub async fn preview(&self, limit: i64) -> Result<Vec<RawUsageRecord>> {
        let rows = sqlx::query_as::<_, RawUsageRecord>(schema::SELECT_RECORDS)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
