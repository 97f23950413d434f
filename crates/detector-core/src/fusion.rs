//! Verdict fusion: one pure function from detector signals to a verdict.
//!
//! The rule is a priority cascade - the first matching smoking-gun signal
//! decides, and only when none fires does the weighted score take over. All
//! thresholds here are part of the product contract, not tuning knobs.

use crate::signals::DetectorSignals;
use crate::verdict::{Verdict, VerdictCall};

/// Weight of the heuristic AI score in the combined formula.
const W_AI: f64 = 0.35;
/// Weight of the frequency-domain score.
const W_FFT: f64 = 0.30;
/// Weight of the (normalised) metadata fraud score.
const W_META: f64 = 0.25;
/// Weight of the face-swap score; applied only when a face was found.
const W_FACE: f64 = 0.10;

/// Reduction applied when a strongly trusted photo editor signed the file.
const TRUSTED_STRONG_REDUCTION: f64 = 0.30;
/// Reduction for a medium-trust editor.
const TRUSTED_MEDIUM_REDUCTION: f64 = 0.15;
/// Reduction when both body and lens serial numbers are present.
const BOTH_SERIALS_REDUCTION: f64 = 0.30;
/// Reduction when exactly one serial number is present.
const ONE_SERIAL_REDUCTION: f64 = 0.20;

/// How much an editing tool recorded in EXIF/XMP is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrustLevel {
    /// Lightroom / Capture One: catalog-driven editors never used to fabricate.
    Strong,
    /// Photoshop: legitimate but also the classic manipulation tool.
    Medium,
}

/// Identify a trusted photo editor from the extracted software tags.
///
/// Both the EXIF `Software` and XMP `CreatorTool` fields are consulted; the
/// strongest match across both wins.
fn trusted_editor(signals: &DetectorSignals) -> Option<TrustLevel> {
    let mut level = None;
    for field in [&signals.metadata.software, &signals.metadata.creator_tool] {
        let Some(value) = field.as_deref() else {
            continue;
        };
        let value = value.to_lowercase();
        if value.contains("lightroom") || value.contains("capture one") {
            return Some(TrustLevel::Strong);
        }
        if value.contains("photoshop") {
            level = Some(TrustLevel::Medium);
        }
    }
    level
}

/// Fuse a detector signal bundle into a single `{verdict, confidence, reason}`.
///
/// Deterministic: the same bundle always yields a byte-identical result.
pub fn fuse(signals: &DetectorSignals) -> VerdictCall {
    // Smoking gun 1: a visible AI-generator watermark.
    if let Some(mark) = &signals.visual_watermark {
        return VerdictCall::new(
            Verdict::AiGenerated,
            0.98,
            format!(
                "AI generator watermark detected: {} (\"{}\")",
                mark.generator, mark.text
            ),
        );
    }

    // Smoking gun 2: C2PA provenance manifest.
    if signals.c2pa_watermark {
        return VerdictCall::new(
            Verdict::AiGenerated,
            0.95,
            "Digital provenance (C2PA) manifest present",
        );
    }

    // Smoking gun 3: a generative tool recorded itself in EXIF.
    if signals.ai_software_in_exif {
        return VerdictCall::new(
            Verdict::AiGenerated,
            0.98,
            "AI generation software recorded in image metadata",
        );
    }

    // Smoking gun 4: screenshot, which destroys forensic provenance.
    if signals.screenshot_detected {
        return VerdictCall::new(
            Verdict::Manipulated,
            0.95,
            "Screenshot detected - not an original capture",
        );
    }

    // Smoking gun 5: the metadata validator alone is conclusive.
    if signals.metadata_risk >= 80.0 {
        let verdict = if signals.metadata_risk >= 90.0 {
            Verdict::AiGenerated
        } else {
            Verdict::Manipulated
        };
        let confidence = (signals.metadata_risk / 100.0).min(0.98);
        return VerdictCall::new(
            verdict,
            confidence,
            format!("Metadata fraud score {:.0}/100", signals.metadata_risk),
        );
    }

    weighted_fusion(signals)
}

fn weighted_fusion(signals: &DetectorSignals) -> VerdictCall {
    let face_term = if signals.faces_detected > 0 {
        signals.face_swap_score * W_FACE
    } else {
        0.0
    };

    let mut combined = signals.ai_heuristic * W_AI
        + signals.fft_score * W_FFT
        + (signals.metadata_risk / 100.0) * W_META
        + face_term;

    // Real-camera evidence pulls the score down before thresholding.
    match trusted_editor(signals) {
        Some(TrustLevel::Strong) => combined -= TRUSTED_STRONG_REDUCTION,
        Some(TrustLevel::Medium) => combined -= TRUSTED_MEDIUM_REDUCTION,
        None => {}
    }
    match signals.metadata.serial_count() {
        2 => combined -= BOTH_SERIALS_REDUCTION,
        1 => combined -= ONE_SERIAL_REDUCTION,
        _ => {}
    }
    let combined = combined.clamp(0.0, 1.0);

    // Borderline score with clean, device-bearing EXIF escalates to real.
    let bonus = if signals.metadata_risk < 40.0 && signals.metadata.has_device() {
        (40.0 - signals.metadata_risk) / 100.0
    } else {
        0.0
    };
    if (0.35..0.50).contains(&combined) && bonus > 0.0 {
        let confidence = (1.0 - combined + bonus).max(0.70);
        return VerdictCall::new(
            Verdict::Real,
            confidence,
            "Authentic camera photo with consistent metadata (device verified)",
        );
    }

    if combined >= 0.70 {
        VerdictCall::new(
            Verdict::AiGenerated,
            combined.min(0.95),
            format!("Strong AI generation indicators (combined score {combined:.2})"),
        )
    } else if combined >= 0.50 {
        // Mid band: the dominant visual detector decides the label.
        if signals.ai_heuristic >= signals.fft_score {
            VerdictCall::new(
                Verdict::AiGenerated,
                combined,
                format!("AI generation likely (combined score {combined:.2})"),
            )
        } else {
            VerdictCall::new(
                Verdict::Manipulated,
                combined,
                format!("Manipulation indicators detected (combined score {combined:.2})"),
            )
        }
    } else if combined >= 0.35 {
        VerdictCall::new(
            Verdict::Inconclusive,
            1.0 - combined,
            format!("Mixed signals, manual review recommended (combined score {combined:.2})"),
        )
    } else {
        VerdictCall::new(
            Verdict::Real,
            (1.0 - combined).clamp(0.70, 0.95),
            format!("Natural photo characteristics (combined score {combined:.2})"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{ExtractedMetadata, VisualWatermark};

    fn base() -> DetectorSignals {
        DetectorSignals::default()
    }

    #[test]
    fn test_gemini_watermark_wins() {
        // Watermark beats every other signal, including clean metadata.
        let signals = DetectorSignals {
            visual_watermark: Some(VisualWatermark {
                generator: "Google Gemini/Imagen".into(),
                text: "made with google ai".into(),
                location: Some("bottom_right".into()),
                confidence: 0.90,
            }),
            ai_heuristic: 0.05,
            fft_score: 0.10,
            metadata_risk: 5.0,
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::AiGenerated);
        assert!(call.confidence >= 0.95);
        assert!(call.reason.contains("Google"));
    }

    #[test]
    fn test_c2pa_manifest() {
        let signals = DetectorSignals {
            c2pa_watermark: true,
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::AiGenerated);
        assert_eq!(call.confidence, 0.95);
    }

    #[test]
    fn test_ai_software_in_exif() {
        let signals = DetectorSignals {
            ai_software_in_exif: true,
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::AiGenerated);
        assert_eq!(call.confidence, 0.98);
    }

    #[test]
    fn test_screenshot() {
        let signals = DetectorSignals {
            screenshot_detected: true,
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::Manipulated);
        assert_eq!(call.confidence, 0.95);
    }

    #[test]
    fn test_high_metadata_risk_early_exit() {
        let manipulated = fuse(&DetectorSignals {
            metadata_risk: 85.0,
            ..base()
        });
        assert_eq!(manipulated.verdict, Verdict::Manipulated);
        assert!((manipulated.confidence - 0.85).abs() < 1e-9);

        let generated = fuse(&DetectorSignals {
            metadata_risk: 95.0,
            ..base()
        });
        assert_eq!(generated.verdict, Verdict::AiGenerated);
        assert!((generated.confidence - 0.95).abs() < 1e-9);

        // Confidence caps at 0.98 even for a perfect fraud score.
        let capped = fuse(&DetectorSignals {
            metadata_risk: 100.0,
            ..base()
        });
        assert!((capped.confidence - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_lightroom_dslr_with_serials_is_real() {
        // Canon DSLR JPEG edited in Lightroom: trusted-software strong
        // reduction plus both serial numbers overwhelm a mid fraud score.
        let signals = DetectorSignals {
            metadata_risk: 55.0,
            ai_heuristic: 0.15,
            fft_score: 0.25,
            metadata: ExtractedMetadata {
                software: Some("Adobe Photoshop CS6".into()),
                creator_tool: Some("Adobe Photoshop Lightroom 5.3".into()),
                camera_make: Some("Canon".into()),
                camera_model: Some("EOS 5D Mark III".into()),
                body_serial_number: Some("123456789012".into()),
                lens_serial_number: Some("0000654321".into()),
                ..Default::default()
            },
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::Real);
        assert!(call.confidence >= 0.70);
    }

    #[test]
    fn test_galaxy_photo_good_metadata_bonus() {
        // Borderline combined score (~0.40) plus clean device-bearing EXIF
        // escalates to real instead of inconclusive.
        let signals = DetectorSignals {
            ai_heuristic: 0.39,
            fft_score: 0.63,
            metadata_risk: 30.0,
            metadata: ExtractedMetadata {
                camera_make: Some("samsung".into()),
                camera_model: Some("SM-G991B".into()),
                ..Default::default()
            },
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::Real);
        assert!(call.confidence >= 0.70);
    }

    #[test]
    fn test_borderline_without_device_stays_inconclusive() {
        // Same scores as the galaxy fixture but no device fields: no bonus.
        let signals = DetectorSignals {
            ai_heuristic: 0.39,
            fft_score: 0.63,
            metadata_risk: 30.0,
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::Inconclusive);
    }

    #[test]
    fn test_high_band_is_ai_generated() {
        let signals = DetectorSignals {
            ai_heuristic: 0.90,
            fft_score: 0.85,
            metadata_risk: 60.0,
            ..base()
        };
        let call = fuse(&signals);
        assert_eq!(call.verdict, Verdict::AiGenerated);
        assert!(call.confidence <= 0.95);
    }

    #[test]
    fn test_mid_band_label_follows_dominant_detector() {
        let ai_led = fuse(&DetectorSignals {
            ai_heuristic: 0.80,
            fft_score: 0.50,
            metadata_risk: 40.0,
            ..base()
        });
        assert_eq!(ai_led.verdict, Verdict::AiGenerated);

        let fft_led = fuse(&DetectorSignals {
            ai_heuristic: 0.50,
            fft_score: 0.80,
            metadata_risk: 40.0,
            ..base()
        });
        assert_eq!(fft_led.verdict, Verdict::Manipulated);
    }

    #[test]
    fn test_face_term_ignored_without_faces() {
        let no_face = fuse(&DetectorSignals {
            ai_heuristic: 0.40,
            fft_score: 0.40,
            face_swap_score: 1.0,
            faces_detected: 0,
            ..base()
        });
        let with_face = fuse(&DetectorSignals {
            ai_heuristic: 0.40,
            fft_score: 0.40,
            face_swap_score: 1.0,
            faces_detected: 1,
            ..base()
        });
        // 0.26 vs 0.36: the face term pushes the bundle over the band edge.
        assert_eq!(no_face.verdict, Verdict::Real);
        assert_eq!(with_face.verdict, Verdict::Inconclusive);
    }

    #[test]
    fn test_low_band_confidence_clamped() {
        let call = fuse(&DetectorSignals {
            ai_heuristic: 0.01,
            fft_score: 0.01,
            metadata_risk: 0.0,
            ..base()
        });
        assert_eq!(call.verdict, Verdict::Real);
        assert!(call.confidence <= 0.95);
        assert!(call.confidence >= 0.70);
    }

    #[test]
    fn test_fusion_deterministic() {
        let signals = DetectorSignals {
            ai_heuristic: 0.47,
            fft_score: 0.52,
            metadata_risk: 33.0,
            faces_detected: 2,
            face_swap_score: 0.31,
            ..base()
        };
        let a = fuse(&signals);
        let b = fuse(&signals);
        assert_eq!(a, b);
        assert_eq!(a.reason, b.reason);
    }

    #[test]
    fn test_photoshop_alone_is_medium_trust() {
        // Photoshop without Lightroom gets the smaller reduction.
        let strong = fuse(&DetectorSignals {
            ai_heuristic: 0.40,
            fft_score: 0.60,
            metadata_risk: 50.0,
            metadata: ExtractedMetadata {
                creator_tool: Some("Adobe Photoshop Lightroom Classic".into()),
                ..Default::default()
            },
            ..base()
        });
        let medium = fuse(&DetectorSignals {
            ai_heuristic: 0.40,
            fft_score: 0.60,
            metadata_risk: 50.0,
            metadata: ExtractedMetadata {
                software: Some("Adobe Photoshop 2024".into()),
                ..Default::default()
            },
            ..base()
        });
        // combined raw = 0.445; strong -> 0.145 (real), medium -> 0.295 (real)
        assert_eq!(strong.verdict, Verdict::Real);
        assert_eq!(medium.verdict, Verdict::Real);
        assert!(strong.confidence > medium.confidence);
    }
}
