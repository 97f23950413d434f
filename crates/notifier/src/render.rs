//! Final result message composition.

use detector_core::{DetectorSignals, Scenario, Verdict, VerdictCall};

use crate::geocode::Geocoder;
use crate::humanize::{format_camera_name, format_capture_time, format_software_name};

/// At most this many red flags are shown.
const MAX_RED_FLAGS: usize = 2;

/// Smartphone vendors whose photos are expected to carry GPS.
const MODERN_DEVICE_MAKES: &[&str] = &["apple", "samsung", "google", "xiaomi", "huawei", "oneplus"];

/// Everything the renderer needs for one final message.
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    pub call: &'a VerdictCall,
    pub scenario: Scenario,
    pub signals: &'a DetectorSignals,
    pub analysis_id: &'a str,
    pub image_sha256: &'a str,
    pub processing_time_ms: u64,
}

fn verdict_emoji(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Real => "\u{2705}",
        Verdict::AiGenerated => "\u{1F916}",
        Verdict::Manipulated => "\u{26A0}\u{FE0F}",
        Verdict::Inconclusive => "\u{2753}",
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Real => "REAL PHOTO",
        Verdict::AiGenerated => "AI-GENERATED",
        Verdict::Manipulated => "MANIPULATED",
        Verdict::Inconclusive => "INCONCLUSIVE",
    }
}

/// Render the full forensic body for a finished analysis.
///
/// Composition: verdict header, digital footprint (only when metadata
/// supports it), at most two red flags, a scenario-toned guidance block,
/// and the analysis-id footer. Reverse geocoding goes through `geocoder`
/// and silently degrades to coordinates.
pub async fn render_result(view: &ResultView<'_>, geocoder: &dyn Geocoder) -> String {
    let mut body = String::new();

    // Header.
    body.push_str(&format!(
        "{} <b>{} ({:.1}%)</b>\n",
        verdict_emoji(view.call.verdict),
        verdict_label(view.call.verdict),
        view.call.confidence * 100.0
    ));
    body.push_str(&format!("<i>{}</i>\n\n", view.call.reason));
    body.push_str(&format!(
        "\u{23F1} <b>Analysis time:</b> {:.1}s\n\n",
        view.processing_time_ms as f64 / 1000.0
    ));

    if let Some(footprint) = render_footprint(view, geocoder).await {
        body.push_str(&footprint);
        body.push('\n');
    }

    let flags = red_flags(view.signals);
    if !flags.is_empty() {
        body.push_str("\u{26A0}\u{FE0F} <b>RED FLAGS:</b>\n");
        for flag in flags.iter().take(MAX_RED_FLAGS) {
            body.push_str(&format!("\u{2022} {flag}\n"));
        }
        body.push('\n');
    }

    body.push_str(&guidance(view.scenario, view.call.verdict));
    body.push_str(&format!(
        "\n\u{1F4C4} <b>Analysis ID:</b> <code>{}</code>",
        view.analysis_id
    ));
    if view.scenario == Scenario::AdultBlackmail {
        // The forensic identity pair the safe-response templates cite.
        body.push_str(&format!(
            "\n\u{1F510} <b>SHA-256:</b> <code>{}</code>",
            view.image_sha256
        ));
    }
    body
}

/// The digital footprint block; `None` when no metadata survived.
async fn render_footprint(view: &ResultView<'_>, geocoder: &dyn Geocoder) -> Option<String> {
    let meta = &view.signals.metadata;
    let mut lines = Vec::new();

    if let Some(ts) = meta.capture_timestamp.as_deref() {
        lines.push(format!(
            "\u{1F4C5} <b>Captured:</b> {}",
            format_capture_time(ts)
        ));
    }
    if let Some(software) = meta
        .software
        .as_deref()
        .or(meta.creator_tool.as_deref())
        .filter(|s| !s.trim().is_empty())
    {
        let formatted = format_software_name(
            software,
            meta.camera_make.as_deref().unwrap_or(""),
            meta.camera_model.as_deref().unwrap_or(""),
        );
        lines.push(format!("\u{1F6E0} <b>Created with:</b> {formatted}"));
    }
    if meta.has_device() {
        let device = format_camera_name(
            meta.camera_make.as_deref().unwrap_or(""),
            meta.camera_model.as_deref().unwrap_or(""),
        );
        lines.push(format!("\u{1F4F1} <b>Device:</b> {device}"));
    }
    if let Some(gps) = &meta.gps {
        let maps_url = format!("https://www.google.com/maps?q={},{}", gps.lat, gps.lon);
        let coords = format!(
            "<a href=\"{maps_url}\">{:.4}, {:.4}</a>",
            gps.lat, gps.lon
        );
        match geocoder.reverse(gps.lat, gps.lon).await {
            Some(place) => lines.push(format!("\u{1F4CD} <b>GPS:</b> {place} ({coords})")),
            None => lines.push(format!("\u{1F4CD} <b>GPS:</b> {coords}")),
        }
    }

    if lines.is_empty() {
        return None;
    }
    let mut block = String::from("\u{1F5C2} <b>DIGITAL FOOTPRINT:</b>\n");
    for line in lines {
        block.push_str(&line);
        block.push('\n');
    }
    Some(block)
}

/// Candidate red flags in display priority order.
fn red_flags(signals: &DetectorSignals) -> Vec<String> {
    let mut flags = Vec::new();
    let meta = &signals.metadata;

    if signals.ai_heuristic > 0.7 {
        flags.push("<b>AI pattern:</b> strong (GAN/diffusion signatures)".to_string());
    } else if signals.ai_heuristic > 0.5 {
        flags.push("<b>AI pattern:</b> moderate".to_string());
    }

    if signals.metadata_risk >= 80.0 {
        flags.push(format!(
            "<b>Metadata:</b> stripped or manipulated ({:.0}/100)",
            signals.metadata_risk
        ));
    } else if signals.metadata_risk >= 50.0 {
        flags.push(format!(
            "<b>Metadata:</b> suspicious ({:.0}/100)",
            signals.metadata_risk
        ));
    }

    if let Some(mark) = &signals.visual_watermark {
        flags.push(format!(
            "<b>Visual mark:</b> \"{}\" ({})",
            mark.text, mark.generator
        ));
    }

    if signals.ai_software_in_exif {
        flags.push("<b>Software:</b> AI generation tool recorded in metadata".to_string());
    }

    let is_modern_device = meta
        .camera_make
        .as_deref()
        .map(|m| m.to_lowercase())
        .is_some_and(|m| MODERN_DEVICE_MAKES.iter().any(|v| m.contains(v)));
    if is_modern_device && meta.gps.is_none() {
        flags.push("<b>Location:</b> no GPS despite a modern smartphone".to_string());
    }

    if meta.capture_timestamp.is_none() && meta.has_device() {
        flags.push("<b>Timestamps:</b> missing capture time".to_string());
    }

    if signals.fft_score > 0.6 {
        flags.push("<b>Frequency analysis:</b> generation artifacts detected".to_string());
    }

    if signals.faces_detected > 0 && signals.face_swap_score > 0.5 {
        flags.push(format!(
            "<b>Face integrity:</b> artifacts across {} face(s)",
            signals.faces_detected
        ));
    }

    flags
}

/// The scenario-toned guidance block. Registers are fixed: clinical for
/// adult, reassuring for teenager, educational for general.
fn guidance(scenario: Scenario, verdict: Verdict) -> String {
    match scenario {
        Scenario::AdultBlackmail => adult_guidance(verdict),
        Scenario::TeenagerSos => teen_guidance(verdict),
        Scenario::General => general_guidance(verdict),
    }
}

fn adult_guidance(verdict: Verdict) -> String {
    let mut s = String::from("\u{1F6E1} <b>WHAT TO DO:</b>\n");
    match verdict {
        Verdict::AiGenerated | Verdict::Manipulated => {
            s.push_str(
                "\u{2022} <b>Do not pay</b> the blackmailer\n\
                 \u{2022} Preserve this analysis as legal evidence\n\
                 \u{2022} Report to law enforcement immediately\n\
                 \u{2022} Block the sender\n",
            );
        }
        Verdict::Real => {
            s.push_str(
                "\u{2022} No generation or manipulation detected\n\
                 \u{2022} Preserve the original file and all correspondence\n\
                 \u{2022} If threatened, report to law enforcement regardless\n",
            );
        }
        Verdict::Inconclusive => {
            s.push_str(
                "\u{2022} The automated analysis is not conclusive\n\
                 \u{2022} Request a manual forensic review\n\
                 \u{2022} Preserve all evidence and report if threatened\n",
            );
        }
    }
    s
}

fn teen_guidance(verdict: Verdict) -> String {
    let mut s = String::new();
    match verdict {
        Verdict::AiGenerated | Verdict::Manipulated => {
            s.push_str(
                "\u{1F499} <b>What this means:</b>\n\
                 This picture was made by software. It's not you - it's just code.\n",
            );
        }
        Verdict::Real => {
            s.push_str(
                "\u{1F499} <b>What this means:</b>\n\
                 I couldn't find technical traces of faking here, but that does not \
                 change your options - you are still protected.\n",
            );
        }
        Verdict::Inconclusive => {
            s.push_str(
                "\u{1F499} <b>What this means:</b>\n\
                 I couldn't decide from the technical data alone. That's okay - \
                 we can still act.\n",
            );
        }
    }
    s.push_str(
        "Remember: none of this is your fault. Telling a trusted adult makes this easier, \
         and the buttons below can help you stop the spread.\n",
    );
    s
}

fn general_guidance(verdict: Verdict) -> String {
    let mut s = String::from("\u{1F4D6} <b>Reading this result:</b>\n");
    match verdict {
        Verdict::AiGenerated => s.push_str(
            "The detectors found patterns typical of generative models. \
             Treat the image as synthetic unless the source can prove otherwise.\n",
        ),
        Verdict::Manipulated => s.push_str(
            "The image appears edited after capture. The content may be real, \
             but the file is not an original.\n",
        ),
        Verdict::Real => s.push_str(
            "No generation or manipulation patterns were found. \
             Detection is probabilistic - consider the source and context too.\n",
        ),
        Verdict::Inconclusive => s.push_str(
            "The signals disagree. A higher-quality original (sent as a file) \
             usually produces a sharper verdict.\n",
        ),
    }
    s
}
