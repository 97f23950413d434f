//! Job payloads and priorities.

use serde::{Deserialize, Serialize};

use database::Tier;
use detector_core::Scenario;

use crate::error::QueueError;

/// Queue priority. Strict ordering: lower value dequeues first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobPriority {
    High = 0,
    Default = 1,
    Low = 2,
}

impl JobPriority {
    /// Pro uploads jump the queue.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Pro => Self::High,
            Tier::Free => Self::Default,
        }
    }

    pub(crate) fn from_i64(value: i64) -> Self {
        match value {
            0 => Self::High,
            2 => Self::Low,
            _ => Self::Default,
        }
    }
}

/// One analysis request as enqueued by the gateway and consumed by a worker.
///
/// Every job carries a scenario; the wire form tolerates legacy rows with a
/// missing tag (coerced to `general` at decode), but an unknown tag makes
/// the job fatally bad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub user_id: i64,
    pub chat_id: i64,
    /// The upload message, used for reply threading.
    pub source_message_id: i64,
    /// The progress message created at upload time; every stage edit and the
    /// final result target this id.
    pub progress_msg_id: i64,
    pub blob_key: String,
    /// "free" or "pro" at enqueue time.
    pub tier: String,
    pub scenario: Scenario,
    /// True iff the upload arrived as a document (lossless channel).
    pub preserve_exif: bool,
}

/// Wire form of the payload column. `scenario` is kept stringly-typed so
/// legacy rows decode; validation happens in [`AnalysisJob::from_wire`].
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireJob {
    pub user_id: i64,
    pub chat_id: i64,
    pub source_message_id: i64,
    pub progress_msg_id: i64,
    pub blob_key: String,
    pub tier: String,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub preserve_exif: bool,
}

impl AnalysisJob {
    pub(crate) fn to_wire(&self) -> WireJob {
        WireJob {
            user_id: self.user_id,
            chat_id: self.chat_id,
            source_message_id: self.source_message_id,
            progress_msg_id: self.progress_msg_id,
            blob_key: self.blob_key.clone(),
            tier: self.tier.clone(),
            scenario: Some(self.scenario.as_str().to_string()),
            preserve_exif: self.preserve_exif,
        }
    }

    pub(crate) fn from_wire(job_id: &str, wire: WireJob) -> Result<Self, QueueError> {
        let scenario =
            Scenario::from_legacy(wire.scenario.as_deref()).map_err(|e| QueueError::BadJob {
                job_id: job_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            user_id: wire.user_id,
            chat_id: wire.chat_id,
            source_message_id: wire.source_message_id,
            progress_msg_id: wire.progress_msg_id,
            blob_key: wire.blob_key,
            tier: wire.tier,
            scenario,
            preserve_exif: wire.preserve_exif,
        })
    }
}

/// A job handed to a worker together with its queue bookkeeping.
#[derive(Debug, Clone)]
pub struct LeasedJob {
    pub job_id: String,
    pub job: AnalysisJob,
    pub priority: JobPriority,
    /// 1-based: the attempt currently executing.
    pub attempts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisJob {
        AnalysisJob {
            user_id: 1,
            chat_id: 2,
            source_message_id: 3,
            progress_msg_id: 4,
            blob_key: "temp/1/abc.jpg".into(),
            tier: "free".into(),
            scenario: Scenario::AdultBlackmail,
            preserve_exif: true,
        }
    }

    #[test]
    fn test_wire_round_trip() {
        let job = sample();
        let wire = serde_json::to_string(&job.to_wire()).unwrap();
        let decoded =
            AnalysisJob::from_wire("j1", serde_json::from_str(&wire).unwrap()).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_legacy_missing_scenario_coerced() {
        let wire: WireJob = serde_json::from_str(
            r#"{"user_id":1,"chat_id":2,"source_message_id":3,"progress_msg_id":4,
                "blob_key":"k","tier":"free"}"#,
        )
        .unwrap();
        let job = AnalysisJob::from_wire("j1", wire).unwrap();
        assert_eq!(job.scenario, Scenario::General);
        assert!(!job.preserve_exif);
    }

    #[test]
    fn test_unknown_scenario_is_fatal() {
        let wire: WireJob = serde_json::from_str(
            r#"{"user_id":1,"chat_id":2,"source_message_id":3,"progress_msg_id":4,
                "blob_key":"k","tier":"free","scenario":"casino"}"#,
        )
        .unwrap();
        let err = AnalysisJob::from_wire("j1", wire).unwrap_err();
        assert!(matches!(err, QueueError::BadJob { .. }));
    }

    #[test]
    fn test_priority_for_tier() {
        assert_eq!(JobPriority::for_tier(Tier::Pro), JobPriority::High);
        assert_eq!(JobPriority::for_tier(Tier::Free), JobPriority::Default);
    }
}
