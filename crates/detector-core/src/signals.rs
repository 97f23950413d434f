//! The detector signal bundle consumed by verdict fusion.
//!
//! Every field is optional on the wire; the remote service may omit any
//! subset of `details` and may add keys we do not know about. Defaults are
//! chosen so an empty bundle fuses to a sensible low-information verdict.

use serde::{Deserialize, Serialize};

/// A visual AI-generator watermark found by the service's OCR pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualWatermark {
    /// Generator name, e.g. "Google Gemini/Imagen".
    pub generator: String,
    /// The literal text found, e.g. "made with google ai".
    #[serde(default)]
    pub text: String,
    /// Where in the frame the mark was found, e.g. "bottom_right".
    #[serde(default)]
    pub location: Option<String>,
    /// OCR confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
}

/// A single red-flag finding from the metadata validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub reason: String,
    #[serde(default)]
    pub severity: String,
    /// "high" / "medium" when the flag names a trusted editing tool.
    #[serde(default)]
    pub trust_level: Option<String>,
}

/// GPS coordinates extracted from EXIF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub alt: Option<f64>,
}

/// Metadata the service extracted from the image, if any survived transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default)]
    pub software: Option<String>,
    #[serde(default)]
    pub creator_tool: Option<String>,
    /// EXIF-format capture time, e.g. "2025:12:16 07:42:09".
    #[serde(default)]
    pub capture_timestamp: Option<String>,
    #[serde(default)]
    pub gps: Option<GpsPoint>,
    #[serde(default)]
    pub exif_field_count: Option<u32>,
    /// Camera body serial number, when present a strong authenticity signal.
    #[serde(default)]
    pub body_serial_number: Option<String>,
    /// Lens serial number.
    #[serde(default)]
    pub lens_serial_number: Option<String>,
}

impl ExtractedMetadata {
    /// True when either a camera make or model is present.
    pub fn has_device(&self) -> bool {
        let non_empty = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        non_empty(&self.camera_make) || non_empty(&self.camera_model)
    }

    /// Number of serial-number fields present (0, 1, or 2).
    pub fn serial_count(&self) -> u32 {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.body_serial_number) as u32 + present(&self.lens_serial_number) as u32
    }
}

/// The complete per-detector score bundle for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorSignals {
    /// Heuristic AI-generation score in `[0, 1]`.
    #[serde(default)]
    pub ai_heuristic: f64,
    /// Frequency-domain anomaly score in `[0, 1]`.
    #[serde(default)]
    pub fft_score: f64,
    /// Metadata fraud score in `[0, 100]`, higher = more suspicious.
    #[serde(default)]
    pub metadata_risk: f64,
    /// Face-swap artifact score in `[0, 1]`.
    #[serde(default)]
    pub face_swap_score: f64,
    /// Number of faces found; the face term is ignored when zero.
    #[serde(default)]
    pub faces_detected: u32,
    #[serde(default)]
    pub visual_watermark: Option<VisualWatermark>,
    /// A C2PA provenance manifest is embedded in the file.
    #[serde(default)]
    pub c2pa_watermark: bool,
    /// EXIF names a known generative tool.
    #[serde(default)]
    pub ai_software_in_exif: bool,
    #[serde(default)]
    pub screenshot_detected: bool,
    #[serde(default)]
    pub red_flags: Vec<RedFlag>,
    #[serde(default)]
    pub metadata: ExtractedMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bundle_deserializes() {
        let signals: DetectorSignals = serde_json::from_str("{}").unwrap();
        assert_eq!(signals.ai_heuristic, 0.0);
        assert!(signals.visual_watermark.is_none());
        assert!(!signals.metadata.has_device());
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let signals: DetectorSignals =
            serde_json::from_str(r#"{"fft_score": 0.4, "brand_new_field": [1, 2]}"#).unwrap();
        assert_eq!(signals.fft_score, 0.4);
    }

    #[test]
    fn test_serial_count() {
        let mut meta = ExtractedMetadata::default();
        assert_eq!(meta.serial_count(), 0);
        meta.body_serial_number = Some("123".into());
        assert_eq!(meta.serial_count(), 1);
        meta.lens_serial_number = Some("456".into());
        assert_eq!(meta.serial_count(), 2);
        meta.body_serial_number = Some("  ".into());
        assert_eq!(meta.serial_count(), 1);
    }

    #[test]
    fn test_has_device_ignores_blank() {
        let meta = ExtractedMetadata {
            camera_make: Some(String::new()),
            ..Default::default()
        };
        assert!(!meta.has_device());
    }
}
