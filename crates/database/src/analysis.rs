//! Analysis record operations, including the duplicate-upload index.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use detector_core::{Scenario, VerdictCall};

use crate::error::{DatabaseError, Result};
use crate::models::AnalysisRecord;

/// Everything needed to persist one finished analysis.
#[derive(Debug, Clone)]
pub struct NewAnalysis<'a> {
    pub analysis_id: &'a str,
    pub user_id: i64,
    pub scenario: Scenario,
    pub call: &'a VerdictCall,
    pub result_blob: &'a serde_json::Value,
    pub image_sha256: &'a str,
    pub perceptual_hash: Option<&'a str>,
    pub blob_key: Option<&'a str>,
    pub processing_time_ms: i64,
}

/// Build the user-visible analysis id from the capture time and image hash:
/// `ANL-YYYYMMDD-` plus the first 8 lowercase hex chars of the sha256.
pub fn analysis_id_for(created_at: DateTime<Utc>, image_sha256: &str) -> String {
    let prefix: String = image_sha256.chars().take(8).collect();
    format!("ANL-{}-{}", created_at.format("%Y%m%d"), prefix.to_lowercase())
}

/// Insert a finished analysis.
///
/// The id is deterministic over (day, image bytes), so re-analysing the same
/// bytes on the same day collides; callers receive `AlreadyExists` and reuse
/// the stored record.
pub async fn create_analysis(pool: &SqlitePool, new: NewAnalysis<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analyses (
            analysis_id, user_id, scenario, verdict, confidence, reason,
            result_blob, image_sha256, perceptual_hash, blob_key,
            processing_time_ms, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.analysis_id)
    .bind(new.user_id)
    .bind(new.scenario.as_str())
    .bind(new.call.verdict.as_str())
    .bind(new.call.confidence)
    .bind(new.call.reason.as_str())
    .bind(new.result_blob.to_string())
    .bind(new.image_sha256)
    .bind(new.perceptual_hash)
    .bind(new.blob_key)
    .bind(new.processing_time_ms)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Analysis", new.analysis_id.to_string()))?;

    info!(
        "persisted analysis {} (user={}, verdict={})",
        new.analysis_id,
        new.user_id,
        new.call.verdict
    );
    Ok(())
}

/// Get an analysis by its user-visible id.
pub async fn get_analysis(pool: &SqlitePool, analysis_id: &str) -> Result<AnalysisRecord> {
    sqlx::query_as::<_, AnalysisRecord>(
        r#"
        SELECT analysis_id, user_id, scenario, verdict, confidence, reason,
               result_blob, image_sha256, perceptual_hash, blob_key,
               processing_time_ms, created_at
        FROM analyses
        WHERE analysis_id = ?
        "#,
    )
    .bind(analysis_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Analysis",
        id: analysis_id.to_string(),
    })
}

/// The user's most recent analysis, if any.
pub async fn latest_for_user(pool: &SqlitePool, user_id: i64) -> Result<Option<AnalysisRecord>> {
    let record = sqlx::query_as::<_, AnalysisRecord>(
        r#"
        SELECT analysis_id, user_id, scenario, verdict, confidence, reason,
               result_blob, image_sha256, perceptual_hash, blob_key,
               processing_time_ms, created_at
        FROM analyses
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Duplicate-upload lookup: the most recent analysis of this user with the
/// same perceptual hash inside the rolling window.
///
/// Keyed by perceptual hash rather than byte hash so micro-perturbed
/// re-uploads still hit. A hit retains the original record; the window is
/// not refreshed.
pub async fn find_recent_by_phash(
    pool: &SqlitePool,
    user_id: i64,
    perceptual_hash: &str,
    window_hours: i64,
) -> Result<Option<AnalysisRecord>> {
    let cutoff = Utc::now() - Duration::hours(window_hours);
    let record = sqlx::query_as::<_, AnalysisRecord>(
        r#"
        SELECT analysis_id, user_id, scenario, verdict, confidence, reason,
               result_blob, image_sha256, perceptual_hash, blob_key,
               processing_time_ms, created_at
        FROM analyses
        WHERE user_id = ? AND perceptual_hash = ? AND created_at >= ?
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(perceptual_hash)
    .bind(cutoff)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;
    use crate::user::ensure_user;
    use detector_core::{Verdict, VerdictCall};

    fn sample_call() -> VerdictCall {
        VerdictCall::new(Verdict::Real, 0.9, "Natural photo characteristics")
    }

    async fn persist(pool: &SqlitePool, id: &str, user_id: i64, phash: Option<&str>) {
        let sha = "ab".repeat(32);
        let call = sample_call();
        let blob = serde_json::json!({"verdict": "real"});
        create_analysis(
            pool,
            NewAnalysis {
                analysis_id: id,
                user_id,
                scenario: Scenario::General,
                call: &call,
                result_blob: &blob,
                image_sha256: &sha,
                perceptual_hash: phash,
                blob_key: Some("temp/1/blob.jpg"),
                processing_time_ms: 1200,
            },
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_analysis_id_shape() {
        let ts = "2026-01-13T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let sha = "ABC12345".repeat(8).to_lowercase();
        let id = analysis_id_for(ts, &sha);
        assert_eq!(id, "ANL-20260113-abc12345");

        let re = regex_lite(&id);
        assert!(re, "id must match ^ANL-\\d{{8}}-[0-9a-f]{{8}}$, got {id}");
    }

    // Shape check without pulling in a regex crate: fixed prefix, 8 digits,
    // dash, 8 lowercase hex chars.
    fn regex_lite(id: &str) -> bool {
        let bytes = id.as_bytes();
        id.len() == 21
            && id.starts_with("ANL-")
            && bytes[4..12].iter().all(|b| b.is_ascii_digit())
            && bytes[12] == b'-'
            && bytes[13..21]
                .iter()
                .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        ensure_user(db.pool(), 1, None, None, 3).await.unwrap();
        persist(db.pool(), "ANL-20260113-deadbeef", 1, Some("f0f0")).await;

        let record = get_analysis(db.pool(), "ANL-20260113-deadbeef").await.unwrap();
        assert_eq!(record.user_id, 1);
        assert_eq!(record.verdict().unwrap(), Verdict::Real);
        assert_eq!(record.scenario().unwrap(), Scenario::General);
    }

    #[tokio::test]
    async fn test_duplicate_id_maps_to_already_exists() {
        let db = test_db().await;
        ensure_user(db.pool(), 1, None, None, 3).await.unwrap();
        persist(db.pool(), "ANL-20260113-deadbeef", 1, None).await;

        let sha = "cd".repeat(32);
        let call = sample_call();
        let blob = serde_json::json!({});
        let err = create_analysis(
            db.pool(),
            NewAnalysis {
                analysis_id: "ANL-20260113-deadbeef",
                user_id: 1,
                scenario: Scenario::General,
                call: &call,
                result_blob: &blob,
                image_sha256: &sha,
                perceptual_hash: None,
                blob_key: None,
                processing_time_ms: 900,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_phash_window_lookup() {
        let db = test_db().await;
        ensure_user(db.pool(), 1, None, None, 3).await.unwrap();
        ensure_user(db.pool(), 2, None, None, 3).await.unwrap();
        persist(db.pool(), "ANL-20260113-00000001", 1, Some("cafe01")).await;

        // Same user + hash: hit.
        let hit = find_recent_by_phash(db.pool(), 1, "cafe01", 24).await.unwrap();
        assert_eq!(hit.unwrap().analysis_id, "ANL-20260113-00000001");

        // Different user: miss.
        assert!(find_recent_by_phash(db.pool(), 2, "cafe01", 24)
            .await
            .unwrap()
            .is_none());

        // Outside the window: miss.
        sqlx::query("UPDATE analyses SET created_at = datetime(created_at, '-25 hours')")
            .execute(db.pool())
            .await
            .unwrap();
        assert!(find_recent_by_phash(db.pool(), 1, "cafe01", 24)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_latest_for_user() {
        let db = test_db().await;
        ensure_user(db.pool(), 1, None, None, 3).await.unwrap();
        assert!(latest_for_user(db.pool(), 1).await.unwrap().is_none());

        persist(db.pool(), "ANL-20260113-00000002", 1, None).await;
        let latest = latest_for_user(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(latest.analysis_id, "ANL-20260113-00000002");
    }
}
