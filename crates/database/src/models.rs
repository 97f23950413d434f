//! Database models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use detector_core::{Scenario, Verdict};

use crate::error::DatabaseError;

/// Subscription tier. Free users carry a daily quota; pro users skip it and
/// get high-priority analysis jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DatabaseError> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            other => Err(DatabaseError::CorruptValue(format!("tier: {other}"))),
        }
    }
}

/// A chat platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Stable 64-bit id assigned by the chat platform.
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// "free" or "pro"; see [`Tier`].
    pub tier: String,
    pub daily_quota_remaining: i64,
    pub quota_reset_date: NaiveDate,
    pub total_checks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn tier(&self) -> Result<Tier, DatabaseError> {
        Tier::parse(&self.tier)
    }
}

/// A persisted analysis. Outlives its job; the blob key may dangle after the
/// bucket's TTL expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AnalysisRecord {
    /// User-visible id, `ANL-YYYYMMDD-<hex8>`.
    pub analysis_id: String,
    pub user_id: i64,
    pub scenario: String,
    pub verdict: String,
    pub confidence: f64,
    pub reason: String,
    /// Opaque JSON returned by the detection service.
    pub result_blob: String,
    /// Canonical cryptographic identifier used in forensic messages.
    pub image_sha256: String,
    /// Perceptual hash used by the duplicate-upload index.
    pub perceptual_hash: Option<String>,
    pub blob_key: Option<String>,
    pub processing_time_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn scenario(&self) -> Result<Scenario, DatabaseError> {
        // Rows written before scenarios existed carry NULL-ish tags.
        Scenario::from_legacy(Some(self.scenario.as_str()))
            .map_err(|e| DatabaseError::CorruptValue(e.to_string()))
    }

    pub fn verdict(&self) -> Result<Verdict, DatabaseError> {
        self.verdict
            .parse()
            .map_err(|_| DatabaseError::CorruptValue(format!("verdict: {}", self.verdict)))
    }
}
