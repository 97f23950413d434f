//! Sliding-window rate limiting over the shared store.
//!
//! The window is a score-indexed set of request timestamps per user: prune
//! everything older than `now - window`, count, and either reject with a
//! wait hint derived from the oldest surviving entry or append `now`.
//! Because the rows live in the shared database the limit holds globally
//! across processes; an in-process map would not.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Under the limit; the request was recorded.
    Allowed,
    /// Over the limit; the caller should wait the hinted number of seconds.
    Limited { retry_after_secs: u64 },
}

/// Check and record one request for `user_id` at `now_ms`.
///
/// `capacity` requests are allowed per `window_secs` sliding window.
pub async fn check_and_record(
    pool: &SqlitePool,
    user_id: i64,
    capacity: u32,
    window_secs: u64,
    now_ms: i64,
) -> Result<RateDecision> {
    let window_ms = window_secs as i64 * 1000;
    let cutoff = now_ms - window_ms;

    sqlx::query("DELETE FROM rate_events WHERE user_id = ? AND ts_ms < ?")
        .bind(user_id)
        .bind(cutoff)
        .execute(pool)
        .await?;

    let (count, oldest): (i64, Option<i64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), MIN(ts_ms) FROM rate_events WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if count >= capacity as i64 {
        // The slot frees when the oldest surviving entry ages out.
        let oldest = oldest.unwrap_or(now_ms);
        let retry_ms = (oldest + window_ms - now_ms).max(0);
        let retry_after_secs = (retry_ms as u64).div_ceil(1000);
        debug!("rate limited user (count={count}, retry in {retry_after_secs}s)");
        return Ok(RateDecision::Limited { retry_after_secs });
    }

    sqlx::query("INSERT INTO rate_events (user_id, ts_ms) VALUES (?, ?)")
        .bind(user_id)
        .bind(now_ms)
        .execute(pool)
        .await?;
    Ok(RateDecision::Allowed)
}

/// Drop all events older than two windows. Run periodically; stands in for
/// the key TTL of a dedicated key/value store.
pub async fn sweep(pool: &SqlitePool, window_secs: u64, now_ms: i64) -> Result<u64> {
    let cutoff = now_ms - 2 * window_secs as i64 * 1000;
    let result = sqlx::query("DELETE FROM rate_events WHERE ts_ms < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    const R: u32 = 5;
    const W: u64 = 60;

    #[tokio::test]
    async fn test_burst_of_six_rejects_the_sixth() {
        let db = test_db().await;
        let t0: i64 = 1_700_000_000_000;

        // Six requests inside 10 seconds: first five handled.
        for i in 0..5 {
            let decision = check_and_record(db.pool(), 1, R, W, t0 + i * 2000)
                .await
                .unwrap();
            assert_eq!(decision, RateDecision::Allowed);
        }
        let decision = check_and_record(db.pool(), 1, R, W, t0 + 10_000)
            .await
            .unwrap();
        match decision {
            RateDecision::Limited { retry_after_secs } => {
                // Oldest entry is t0, so the hint is >= 50 seconds.
                assert!(retry_after_secs >= 50, "hint was {retry_after_secs}");
            }
            RateDecision::Allowed => panic!("sixth request must be limited"),
        }
    }

    #[tokio::test]
    async fn test_window_slides() {
        let db = test_db().await;
        let t0: i64 = 1_700_000_000_000;

        for i in 0..5 {
            check_and_record(db.pool(), 1, R, W, t0 + i).await.unwrap();
        }
        // Just past the window the old entries are pruned.
        let decision = check_and_record(db.pool(), 1, R, W, t0 + (W as i64 * 1000) + 10)
            .await
            .unwrap();
        assert_eq!(decision, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let db = test_db().await;
        let t0: i64 = 1_700_000_000_000;

        for i in 0..5 {
            check_and_record(db.pool(), 1, R, W, t0 + i).await.unwrap();
        }
        assert_eq!(
            check_and_record(db.pool(), 2, R, W, t0 + 6).await.unwrap(),
            RateDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_sweep_clears_stale_rows() {
        let db = test_db().await;
        let t0: i64 = 1_700_000_000_000;

        check_and_record(db.pool(), 1, R, W, t0).await.unwrap();
        let swept = sweep(db.pool(), W, t0 + 3 * W as i64 * 1000).await.unwrap();
        assert_eq!(swept, 1);
    }
}
