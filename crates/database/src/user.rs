//! User operations: registration, quota accounting, tier lookups.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{Tier, User};

/// Create the user on first contact, or refresh the profile fields.
pub async fn ensure_user(
    pool: &SqlitePool,
    user_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
    daily_quota: i64,
) -> Result<User> {
    let now = Utc::now();
    let today = now.date_naive();

    sqlx::query(
        r#"
        INSERT INTO users (
            user_id, username, first_name, tier,
            daily_quota_remaining, quota_reset_date, total_checks,
            created_at, updated_at
        )
        VALUES (?, ?, ?, 'free', ?, ?, 0, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(username)
    .bind(first_name)
    .bind(daily_quota)
    .bind(today)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_user(pool, user_id).await
}

/// Get a user by platform id.
pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, first_name, tier,
               daily_quota_remaining, quota_reset_date, total_checks,
               created_at, updated_at
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: user_id.to_string(),
    })
}

/// Reset the daily quota when the stored reset date has passed.
async fn roll_quota_if_stale(pool: &SqlitePool, user_id: i64, daily_quota: i64) -> Result<()> {
    let today = Utc::now().date_naive();
    let rolled = sqlx::query(
        r#"
        UPDATE users
        SET daily_quota_remaining = ?, quota_reset_date = ?
        WHERE user_id = ? AND quota_reset_date < ?
        "#,
    )
    .bind(daily_quota)
    .bind(today)
    .bind(user_id)
    .bind(today)
    .execute(pool)
    .await?;
    if rolled.rows_affected() > 0 {
        debug!("reset daily quota for user {user_id}");
    }
    Ok(())
}

/// Atomically charge one analysis against the user's daily quota.
///
/// Pro users are never charged. For free users the decrement is a single
/// guarded UPDATE, so the counter can never go below zero and two rapid
/// uploads cannot double-spend the last check. Returns the user's tier so
/// the caller can pick the job priority.
pub async fn charge_quota(pool: &SqlitePool, user_id: i64, daily_quota: i64) -> Result<Tier> {
    roll_quota_if_stale(pool, user_id, daily_quota).await?;

    let user = get_user(pool, user_id).await?;
    let tier = user.tier()?;
    if tier == Tier::Pro {
        sqlx::query("UPDATE users SET total_checks = total_checks + 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        return Ok(tier);
    }

    let charged = sqlx::query(
        r#"
        UPDATE users
        SET daily_quota_remaining = daily_quota_remaining - 1,
            total_checks = total_checks + 1
        WHERE user_id = ? AND daily_quota_remaining > 0
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    if charged.rows_affected() == 0 {
        return Err(DatabaseError::QuotaExhausted(user_id));
    }
    debug!("charged quota for user {user_id}");
    Ok(tier)
}

/// Compensating increment after a pipeline failure. The refund is capped at
/// the configured daily quota so failures can never mint extra checks.
pub async fn refund_quota(pool: &SqlitePool, user_id: i64, daily_quota: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET daily_quota_remaining = MIN(daily_quota_remaining + 1, ?),
            total_checks = MAX(total_checks - 1, 0)
        WHERE user_id = ? AND tier = 'free'
        "#,
    )
    .bind(daily_quota)
    .bind(user_id)
    .execute(pool)
    .await?;
    debug!("refunded quota for user {user_id}");
    Ok(())
}

/// Set a user's subscription tier (driven by external billing).
pub async fn set_tier(pool: &SqlitePool, user_id: i64, tier: Tier) -> Result<()> {
    let result = sqlx::query("UPDATE users SET tier = ?, updated_at = ? WHERE user_id = ?")
        .bind(tier.as_str())
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: user_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_ensure_user_idempotent() {
        let db = test_db().await;

        let first = ensure_user(db.pool(), 7, Some("ana"), Some("Ana"), 3)
            .await
            .unwrap();
        assert_eq!(first.daily_quota_remaining, 3);

        let second = ensure_user(db.pool(), 7, Some("ana_renamed"), None, 3)
            .await
            .unwrap();
        assert_eq!(second.username.as_deref(), Some("ana_renamed"));
        assert_eq!(second.daily_quota_remaining, 3);
    }

    #[tokio::test]
    async fn test_quota_charge_and_exhaustion() {
        let db = test_db().await;
        ensure_user(db.pool(), 1, None, None, 3).await.unwrap();

        for _ in 0..3 {
            charge_quota(db.pool(), 1, 3).await.unwrap();
        }
        let user = get_user(db.pool(), 1).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 0);
        assert_eq!(user.total_checks, 3);

        let err = charge_quota(db.pool(), 1, 3).await.unwrap_err();
        assert!(matches!(err, DatabaseError::QuotaExhausted(1)));

        // Quota never goes negative.
        let user = get_user(db.pool(), 1).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 0);
    }

    #[tokio::test]
    async fn test_refund_restores_quota() {
        let db = test_db().await;
        ensure_user(db.pool(), 2, None, None, 3).await.unwrap();

        charge_quota(db.pool(), 2, 3).await.unwrap();
        refund_quota(db.pool(), 2, 3).await.unwrap();

        let user = get_user(db.pool(), 2).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 3);
        assert_eq!(user.total_checks, 0);

        // Refund is capped: a spurious extra refund cannot exceed the quota.
        refund_quota(db.pool(), 2, 3).await.unwrap();
        let user = get_user(db.pool(), 2).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 3);
    }

    #[tokio::test]
    async fn test_pro_users_not_charged() {
        let db = test_db().await;
        ensure_user(db.pool(), 3, None, None, 3).await.unwrap();
        set_tier(db.pool(), 3, Tier::Pro).await.unwrap();

        for _ in 0..10 {
            let tier = charge_quota(db.pool(), 3, 3).await.unwrap();
            assert_eq!(tier, Tier::Pro);
        }
        let user = get_user(db.pool(), 3).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 3);
        assert_eq!(user.total_checks, 10);
    }

    #[tokio::test]
    async fn test_stale_quota_rolls_over() {
        let db = test_db().await;
        ensure_user(db.pool(), 4, None, None, 3).await.unwrap();

        // Drain the quota, then age the reset date by a day.
        for _ in 0..3 {
            charge_quota(db.pool(), 4, 3).await.unwrap();
        }
        sqlx::query("UPDATE users SET quota_reset_date = date(quota_reset_date, '-1 day') WHERE user_id = 4")
            .execute(db.pool())
            .await
            .unwrap();

        // Next charge succeeds against the fresh daily allowance.
        charge_quota(db.pool(), 4, 3).await.unwrap();
        let user = get_user(db.pool(), 4).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 2);
    }
}
