//! Area-code and device rankings

use serde::Serialize;

use super::{GB, MB};
use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AreaCodeRanking {
    pub area_code: String,
    pub avg_download_gb: f64,
}

/// Average daily download per area code, smallest first.
///
/// Downloads are summed per (date, area), then averaged over the dates on
/// which the area appears.
pub async fn area_code_ranking(engine: &Engine) -> Result<Vec<AreaCodeRanking>> {
    let rows = sqlx::query_as::<_, AreaCodeRanking>(
        r#"
        SELECT area_code, AVG(download) AS avg_download_gb
        FROM (
            SELECT creation_date, area_code, CAST(SUM(bytes_downstream) AS REAL) / ? AS download
            FROM ipdr
            GROUP BY creation_date, area_code
        )
        GROUP BY area_code
        ORDER BY avg_download_gb ASC, area_code ASC
        "#,
    )
    .bind(GB)
    .fetch_all(engine.pool())
    .await?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DeviceRanking {
    pub device_mac_address: String,
    pub download_mb: f64,
    pub upload_mb: f64,
    pub total_mb: f64,
}

/// Heaviest `top_n` devices of one area code by combined volume
pub async fn device_ranking(engine: &Engine, area_code: &str, top_n: u32) -> Result<Vec<DeviceRanking>> {
    let rows = sqlx::query_as::<_, DeviceRanking>(
        r#"
        SELECT device_mac_address, download AS download_mb, upload AS upload_mb, download + upload AS total_mb
        FROM (
            SELECT cmmacaddress AS device_mac_address,
                   CAST(SUM(bytes_downstream) AS REAL) / ? AS download,
                   CAST(SUM(bytes_upstream) AS REAL) / ? AS upload
            FROM ipdr
            WHERE area_code = ?
            GROUP BY cmmacaddress
        )
        ORDER BY total_mb DESC, device_mac_address ASC
        LIMIT ?
        "#,
    )
    .bind(MB)
    .bind(MB)
    .bind(area_code)
    .bind(i64::from(top_n))
    .fetch_all(engine.pool())
    .await?;
    Ok(rows)
}
