//! Wire types for the verification endpoint.
//!
//! The response is decoded defensively: any subset of `details` may be
//! absent and unknown extra keys must never fail the pipeline.

use serde::{Deserialize, Serialize};

use detector_core::{DetectorSignals, ExtractedMetadata, GpsPoint, RedFlag, VisualWatermark};

/// Requested analysis depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    /// Photo channel: platform re-encoded the image, metadata stripped.
    Basic,
    /// Document channel: original bytes, full metadata validation.
    Detailed,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Detailed => "detailed",
        }
    }
}

/// Visual watermark block on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireVisualWatermark {
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// GPS block on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireGps {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub alt: Option<f64>,
}

/// The `details` object: every field optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VerifyDetails {
    #[serde(default)]
    pub ai_detection_score: Option<f64>,
    #[serde(default)]
    pub fft_score: Option<f64>,
    #[serde(default)]
    pub metadata_fraud_score: Option<f64>,
    #[serde(default)]
    pub face_swap_score: Option<f64>,
    #[serde(default)]
    pub faces_detected: Option<u32>,
    #[serde(default)]
    pub red_flags: Vec<WireRedFlag>,
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default)]
    pub software: Option<String>,
    #[serde(default)]
    pub creator_tool: Option<String>,
    #[serde(default)]
    pub capture_timestamp: Option<String>,
    #[serde(default)]
    pub gps: Option<WireGps>,
    #[serde(default)]
    pub exif_field_count: Option<u32>,
    #[serde(default)]
    pub body_serial_number: Option<String>,
    #[serde(default)]
    pub lens_serial_number: Option<String>,
    #[serde(default)]
    pub screenshot_detected: Option<bool>,
    #[serde(default)]
    pub c2pa_present: Option<bool>,
    #[serde(default)]
    pub ai_software_in_exif: Option<bool>,
    #[serde(default)]
    pub visual_watermark: Option<WireVisualWatermark>,
}

/// A red flag on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireRedFlag {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub trust_level: Option<String>,
}

/// Successful verification response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifyResponse {
    /// The service's own verdict; persisted in the result blob, not used
    /// for the user-facing decision.
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub verdict_reason: Option<String>,
    #[serde(default)]
    pub watermark_detected: Option<bool>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    #[serde(default)]
    pub details: VerifyDetails,
}

impl VerifyResponse {
    /// Flatten the wire shape into the fusion input bundle.
    pub fn signals(&self) -> DetectorSignals {
        let d = &self.details;
        DetectorSignals {
            ai_heuristic: d.ai_detection_score.unwrap_or(0.0),
            fft_score: d.fft_score.unwrap_or(0.0),
            metadata_risk: d.metadata_fraud_score.unwrap_or(0.0),
            face_swap_score: d.face_swap_score.unwrap_or(0.0),
            faces_detected: d.faces_detected.unwrap_or(0),
            visual_watermark: d.visual_watermark.as_ref().and_then(|w| {
                // A watermark block without a generator name is noise.
                w.generator.as_ref().map(|generator| VisualWatermark {
                    generator: generator.clone(),
                    text: w.text.clone().unwrap_or_default(),
                    location: w.location.clone(),
                    confidence: w.confidence.unwrap_or(0.0),
                })
            }),
            c2pa_watermark: d.c2pa_present.unwrap_or(false),
            ai_software_in_exif: d.ai_software_in_exif.unwrap_or(false),
            screenshot_detected: d.screenshot_detected.unwrap_or(false),
            red_flags: d
                .red_flags
                .iter()
                .filter_map(|f| {
                    f.reason.as_ref().map(|reason| RedFlag {
                        reason: reason.clone(),
                        severity: f.severity.clone().unwrap_or_default(),
                        trust_level: f.trust_level.clone(),
                    })
                })
                .collect(),
            metadata: ExtractedMetadata {
                camera_make: d.camera_make.clone(),
                camera_model: d.camera_model.clone(),
                software: d.software.clone(),
                creator_tool: d.creator_tool.clone(),
                capture_timestamp: d.capture_timestamp.clone(),
                gps: d.gps.as_ref().map(|g| GpsPoint {
                    lat: g.lat,
                    lon: g.lon,
                    alt: g.alt,
                }),
                exif_field_count: d.exif_field_count,
                body_serial_number: d.body_serial_number.clone(),
                lens_serial_number: d.lens_serial_number.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_response_decodes() {
        let response: VerifyResponse = serde_json::from_str(r#"{"verdict": "real"}"#).unwrap();
        let signals = response.signals();
        assert_eq!(signals.ai_heuristic, 0.0);
        assert!(signals.visual_watermark.is_none());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let response: VerifyResponse = serde_json::from_str(
            r#"{"details": {"fft_score": 0.7, "experimental_new_detector": {"a": 1}}}"#,
        )
        .unwrap();
        assert_eq!(response.signals().fft_score, 0.7);
    }

    #[test]
    fn test_full_details_mapped() {
        let response: VerifyResponse = serde_json::from_str(
            r#"{
                "verdict": "ai_generated",
                "confidence": 0.9,
                "processing_time_ms": 2340,
                "details": {
                    "ai_detection_score": 0.8,
                    "fft_score": 0.6,
                    "metadata_fraud_score": 45,
                    "face_swap_score": 0.2,
                    "faces_detected": 1,
                    "red_flags": [{"reason": "Missing timestamps", "severity": "medium"}],
                    "camera_make": "Canon",
                    "gps": {"lat": 48.85, "lon": 2.35},
                    "c2pa_present": true,
                    "visual_watermark": {"generator": "Google Gemini/Imagen", "text": "made with google ai"}
                }
            }"#,
        )
        .unwrap();
        let signals = response.signals();
        assert!(signals.c2pa_watermark);
        assert_eq!(signals.metadata_risk, 45.0);
        assert_eq!(signals.red_flags.len(), 1);
        assert_eq!(
            signals.visual_watermark.unwrap().generator,
            "Google Gemini/Imagen"
        );
        assert_eq!(signals.metadata.gps.unwrap().lat, 48.85);
    }

    #[test]
    fn test_watermark_without_generator_dropped() {
        let response: VerifyResponse = serde_json::from_str(
            r#"{"details": {"visual_watermark": {"text": "shutterstock"}}}"#,
        )
        .unwrap();
        assert!(response.signals().visual_watermark.is_none());
    }
}
