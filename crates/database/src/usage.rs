//! Per-day usage counters, kept alongside the quota for reporting.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::Result;

/// Record one analysis against (user, date).
pub async fn record_usage(pool: &SqlitePool, user_id: i64, date: NaiveDate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_usage (user_id, date, count)
        VALUES (?, ?, 1)
        ON CONFLICT(user_id, date) DO UPDATE SET count = count + 1
        "#,
    )
    .bind(user_id)
    .bind(date)
    .execute(pool)
    .await?;
    Ok(())
}

/// Usage count for (user, date); zero when no row exists.
pub async fn usage_for(pool: &SqlitePool, user_id: i64, date: NaiveDate) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT count FROM daily_usage WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(count.unwrap_or(0))
}
