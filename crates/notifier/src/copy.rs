//! User-facing copy: onboarding, acknowledgements, errors, and the bodies
//! behind every follow-up callback.
//!
//! Registers are part of the product contract - adult copy is clinical and
//! legal, teenager copy is reassuring and age-appropriate, general copy is
//! educational and neutral.

use detector_core::Scenario;

/// Welcome / scenario selection body (shown on /start and on back-to-menu).
pub fn welcome() -> String {
    "\u{1F44B} <b>Welcome</b>\n\n\
     \u{1F6E1} <b>AI deepfake detection &amp; blackmail protection</b>\n\n\
     Upload a photo and get a forensic verdict in 10-30 seconds:\n\
     \u{2022} AI-generation and manipulation scoring\n\
     \u{2022} Metadata and frequency analysis\n\
     \u{2022} A report you can show to authorities\n\n\
     <b>Choose your scenario:</b>"
        .to_string()
}

/// Adult scenario entry: clinical, objective-led.
pub fn adult_intro() -> String {
    "\u{1F464} <b>Digital Blackmail - Evidence Analysis</b>\n\n\
     \u{1F3AF} <b>Objective:</b> legal evidence and blackmailer containment\n\n\
     \u{1F4F8} Send the blackmail photo now.\n\n\
     You will receive:\n\
     \u{2022} AI-generation score and verdict\n\
     \u{2022} SHA-256 hash for legal proof\n\
     \u{2022} A report ID for authorities\n\n\
     \u{1F4A1} <b>Best accuracy:</b> send as a <b>file</b>, not a photo - \
     that preserves the metadata forensics relies on."
        .to_string()
}

/// Teenager scenario entry: the calming stop screen.
pub fn teen_stop() -> String {
    "\u{1F198} <b>You're safe here. Let's breathe first.</b>\n\n\
     This happens to many people, and <b>it's not your fault</b>.\n\n\
     The facts:\n\
     1\u{FE0F}\u{20E3} Most blackmail photos are AI-generated fakes\n\
     2\u{FE0F}\u{20E3} You have rights and legal protection\n\
     3\u{FE0F}\u{20E3} Telling a trusted adult makes this easier\n\
     4\u{FE0F}\u{20E3} The spread can be stopped\n\n\
     When you're ready, send me the photo and I'll look for the technical \
     proof that it's fake. There's no rush."
        .to_string()
}

/// Teenager flow after tapping "I'm ready".
pub fn teen_ready() -> String {
    "\u{1F4F8} Send me the photo when you're ready.\n\n\
     Take your time. I'll check it for the technical mistakes fakes \
     always leave behind."
        .to_string()
}

/// General scenario entry.
pub fn general_intro() -> String {
    "\u{1F50D} <b>Photo verification</b>\n\n\
     Send any photo and I'll analyse it for AI generation and manipulation.\n\n\
     \u{1F4A1} Sending as a <b>file</b> preserves metadata and gives a much \
     more detailed verdict."
        .to_string()
}

/// The initial progress-message text posted at upload time.
pub fn analysis_started(scenario: Scenario, preserve_exif: bool) -> String {
    let mut s = match scenario {
        Scenario::AdultBlackmail => "\u{1F52C} <b>Forensic analysis started</b>\n\n\
             Running multi-layer detection:\n\
             \u{2022} AI generation patterns\n\
             \u{2022} Face-swap artifacts\n\
             \u{2022} Metadata validation\n\
             \u{2022} Frequency-domain analysis\n"
            .to_string(),
        Scenario::TeenagerSos => "\u{2705} <b>I'm analysing this now</b>\n\n\
             I'm looking for technical mistakes in the photo. If it's fake \
             (which it probably is), I'll show you the proof.\n\n\
             While you wait: remember that <b>none of this is your fault</b>.\n"
            .to_string(),
        Scenario::General => "\u{1F50D} <b>Your photo is being analysed</b>\n\n\
             Multi-detector verification is running.\n"
            .to_string(),
    };
    if preserve_exif {
        s.push_str("\n\u{1F4CE} Full metadata preserved - running the detailed profile.\n");
    }
    s.push_str("\n\u{23F1} This takes 10-30 seconds.");
    s
}

/// Quota refusal.
pub fn quota_exhausted(daily_quota: i64) -> String {
    format!(
        "\u{274C} <b>Daily limit reached</b>\n\n\
         Free tier: {daily_quota} checks per day.\n\n\
         Your quota resets at midnight UTC."
    )
}

/// Rate-limit refusal with the wait hint.
pub fn rate_limited(retry_after_secs: u64) -> String {
    format!(
        "\u{26A0}\u{FE0F} <b>Too many requests</b>\n\n\
         Please slow down and try again in {retry_after_secs} seconds."
    )
}

/// Duplicate-upload notice referencing the original analysis.
pub fn duplicate_notice(analysis_id: &str) -> String {
    format!(
        "\u{267B}\u{FE0F} <b>Duplicate detected</b>\n\n\
         This image matches one you verified recently. Reusing the prior \
         analysis - your quota was not charged.\n\n\
         \u{1F4C4} <b>Analysis ID:</b> <code>{analysis_id}</code>"
    )
}

/// Backpressure refusal.
pub fn overloaded() -> String {
    "\u{23F3} <b>Temporarily overloaded</b>\n\n\
     The analysis queue is full right now. Nothing was charged - \
     please try again in a few minutes."
        .to_string()
}

/// Transient pipeline failure after quota refund.
pub fn transient_failure() -> String {
    "\u{274C} <b>Analysis failed</b>\n\n\
     Something went wrong on our side and your check was not counted.\n\
     Please try again in a few minutes."
        .to_string()
}

/// Unsupported-media refusal with the concrete reason.
pub fn unsupported_media(reason: &str) -> String {
    format!(
        "\u{274C} {reason}\n\n\
         Supported formats: JPEG, PNG, WebP, MPO, HEIC (max 20 MB)."
    )
}

/// Pre-analysis AI watermark short-circuit, toned per scenario.
pub fn ai_watermark_shortcircuit(scenario: Scenario, reason: &str) -> String {
    match scenario {
        Scenario::AdultBlackmail => format!(
            "\u{1F916} <b>Pre-analysis: AI watermark found</b>\n\n\
             \u{26A0}\u{FE0F} {reason}\n\n\
             Definitive: this image was produced by AI software. The full \
             verdict and report follow."
        ),
        Scenario::TeenagerSos => "\u{2705} <b>Good news!</b>\n\n\
             This photo has AI tags inside it. That means it was \
             <b>made by a computer</b>, not a real camera.\n\n\
             It's not you. It's just code - and none of this is your fault."
            .to_string(),
        Scenario::General => format!(
            "\u{1F916} <b>AI watermark detected</b>\n\n\
             \u{26A0}\u{FE0F} {reason}\n\n\
             The image identifies itself as AI-generated."
        ),
    }
}

/// Screenshot refusal, toned per scenario.
pub fn screenshot_rejected(scenario: Scenario, reason: &str) -> String {
    match scenario {
        Scenario::TeenagerSos => "\u{1F4F1} I can see this is a screenshot.\n\n\
             Can you send me the <b>original photo</b> instead? That way I can \
             check all the hidden data inside it."
            .to_string(),
        _ => format!(
            "\u{1F4F1} <b>Screenshot detected</b>\n\n\
             \u{26A0}\u{FE0F} {reason}\n\n\
             Screenshots cannot be forensically verified - please send the \
             original photo file."
        ),
    }
}

/// Nudge when the adult flow expects a photo but got text.
pub fn adult_waiting_prompt() -> String {
    "\u{1F4F8} Please send the blackmail photo.\n\n\
     \u{1F4A1} Send it as a <b>file</b> for best results - that preserves \
     the metadata."
        .to_string()
}

/// Nudge when the teenager flow expects a photo but got text.
pub fn teen_waiting_prompt() -> String {
    "\u{1F4F8} Send me the photo when you're ready.\n\n\
     There's no rush. Take your time."
        .to_string()
}

/// Hint shown when an upload arrives with no scenario flow active.
pub fn upload_hint() -> String {
    "\u{1F44B} Please choose a scenario first - it shapes the analysis and \
     the help you get afterwards."
        .to_string()
}

/// /help body.
pub fn help() -> String {
    "<b>\u{1F4D6} How this works:</b>\n\n\
     1. Pick a scenario with /start\n\
     2. Send the photo (as a file for best accuracy)\n\
     3. Receive a verdict with confidence in 10-30 seconds\n\n\
     <b>Commands:</b>\n\
     /start - choose a scenario\n\
     /help - this help\n\
     /status - your plan and remaining checks\n\n\
     <b>Free tier:</b> 3 checks per day.\n\
     <b>Pro tier:</b> unlimited checks with priority processing."
        .to_string()
}

/// /status body.
pub fn status(tier: &str, quota_remaining: i64, daily_quota: i64, total_checks: i64) -> String {
    let mut s = format!("<b>\u{1F4CA} Your status</b>\n\n<b>Plan:</b> {}\n", tier.to_uppercase());
    if tier == "pro" {
        s.push_str("<b>Checks today:</b> unlimited \u{2705}\n");
    } else {
        s.push_str(&format!(
            "<b>Checks today:</b> {quota_remaining}/{daily_quota}\n"
        ));
    }
    s.push_str(&format!("<b>Total checks:</b> {total_checks}\n"));
    s
}

/// Counter-measures menu body (adult register: clinical, legal).
pub fn counter_measures(analysis_id: &str, image_sha256: &str) -> String {
    format!(
        "\u{1F6E1} <b>Counter-measures</b>\n\n\
         <b>Your forensic identity:</b>\n\
         \u{2022} Report ID: <code>{analysis_id}</code>\n\
         \u{2022} SHA-256: <code>{image_sha256}</code>\n\n\
         <b>Available strategies:</b>\n\n\
         \u{1F4AC} <b>Safe response</b> - templated replies citing your \
         forensic evidence, built to end contact rather than continue it\n\n\
         \u{1F6AB} <b>StopNCII</b> - blocks intimate images from spreading \
         across major platforms\n\n\
         \u{1F6A8} <b>FBI IC3</b> - the Internet Crime Complaint Center for \
         US-based incidents\n\n\
         \u{26A0}\u{FE0F} <b>Never pay a blackmailer.</b> Payment escalates \
         demands and funds further crime."
    )
}

/// The four safe-response templates with the forensic identity filled in.
pub fn safe_response_templates(analysis_id: &str, image_sha256: &str) -> String {
    let mut s = String::from(
        "\u{1F4AC} <b>Safe response templates</b>\n\n\
         Copy one, send it once, then block the sender:\n\n",
    );
    let templates = [
        (
            "Forensic evidence",
            format!(
                "I have submitted your image to professional forensic analysis. \
                 The report confirms it is fabricated. The incident is documented \
                 under report ID {analysis_id} with file hash {image_sha256}. \
                 This has been reported to cybercrime authorities; any further \
                 contact will be forwarded to law enforcement."
            ),
        ),
        (
            "Legal notice",
            format!(
                "This is formal notice: I hold forensic proof (report {analysis_id}) \
                 that the image is fabricated. All communications are logged and \
                 preserved. Extortion is a federal crime under 18 U.S.C. 875. \
                 Cease all contact immediately."
            ),
        ),
        (
            "Technical",
            format!(
                "The image was analysed with face-swap detection, metadata \
                 validation and frequency-domain analysis. Result: fabrication. \
                 Documented evidence: {analysis_id} / {image_sha256}. Distribution \
                 of this material constitutes criminal harassment."
            ),
        ),
        (
            "Brief",
            format!(
                "I have forensic proof this is fake (report {analysis_id}). \
                 It has been reported. Do not contact me again."
            ),
        ),
    ];
    for (i, (name, text)) in templates.iter().enumerate() {
        s.push_str(&format!("<b>{}. {name}</b>\n<code>{text}</code>\n\n", i + 1));
    }
    s.push_str(
        "\u{26A0}\u{FE0F} Send once, do not negotiate, save everything as evidence.",
    );
    s
}

/// Parent-helper body (teenager register).
pub fn tell_parents(analysis_id: &str) -> String {
    format!(
        "\u{1F91D} <b>How to tell your parents</b>\n\n\
         <b>Why tell them?</b>\n\
         \u{2022} They can help you report this\n\
         \u{2022} You don't have to handle it alone\n\
         \u{2022} It's much easier when you have proof\n\n\
         <b>What to say:</b>\n\
         \"I need to show you something serious. Someone is trying to \
         blackmail me with a fake photo. I had it analysed, and here's the \
         proof it's AI-generated.\"\n\n\
         Then show them the report <code>{analysis_id}</code> (button below).\n\n\
         <b>Remember:</b> they may be shocked at first, but they'll be angry \
         at the blackmailer, not at you. This happens to thousands of people - \
         you're not alone, and none of this is your fault."
    )
}

/// Step-by-step conversation script (teenager register).
pub fn conversation_script() -> String {
    "\u{1F4AC} <b>Conversation script</b>\n\n\
     <b>Step 1 - pick the moment:</b> when they're not busy or stressed, \
     in private, when you feel calm enough.\n\n\
     <b>Step 2 - open simply:</b> \"Something happened online and I need \
     your help. I'm okay, but it's serious.\"\n\n\
     <b>Step 3 - show the proof:</b> the PDF report and screenshots of the \
     messages. Do not send the blackmailer anything.\n\n\
     <b>If they ask \"are you sure it's fake?\":</b> show the confidence \
     score - real cameras don't leave those patterns.\n\n\
     <b>If they ask \"did you send photos?\":</b> be honest. Even then, \
     blackmail is still a crime and you are still the victim.\n\n\
     You're doing the right thing by telling someone. None of this is \
     your fault."
        .to_string()
}

/// Stop-the-spread body (teenager register).
pub fn stop_spread() -> String {
    "\u{1F6AB} <b>Stop the spread</b>\n\n\
     <b>Take It Down</b> is a free, anonymous service by NCMEC: it creates \
     a fingerprint of the image (the photo never leaves your device) and \
     participating platforms block it from being uploaded.\n\n\
     <b>What to do now:</b>\n\
     1\u{FE0F}\u{20E3} Use Take It Down (button below)\n\
     2\u{FE0F}\u{20E3} Don't reply to the blackmailer, don't pay\n\
     3\u{FE0F}\u{20E3} Save screenshots of everything\n\
     4\u{FE0F}\u{20E3} Tell a trusted adult\n\n\
     It's not your fault, and it can be stopped."
        .to_string()
}

/// "What is sextortion?" education body (teenager register).
pub fn sextortion_education() -> String {
    "\u{1F4DA} <b>What is sextortion?</b>\n\n\
     Sextortion is when someone threatens to share private or faked images \
     of you unless you pay or send more. It is a crime - the person doing \
     it is the criminal, never you.\n\n\
     <b>The playbook they use:</b> pressure, deadlines, \"everyone will \
     see\". It's designed to stop you thinking. You've already broken the \
     playbook by checking the image.\n\n\
     <b>What helps:</b> not paying, not negotiating, saving evidence, \
     telling a trusted adult, and reporting. All of it works better with \
     the analysis report you now have."
        .to_string()
}

/// "What is AI-generated content?" education body (general register).
pub fn ai_content_education() -> String {
    "\u{1F916} <b>What is AI-generated content?</b>\n\n\
     Generative models (diffusion models, GANs) can produce photorealistic \
     images from text or reference photos. They are behind most fabricated \
     \"evidence\" images today.\n\n\
     <b>How detection works here:</b>\n\
     \u{2022} Metadata: real cameras leave consistent fingerprints\n\
     \u{2022} Frequency analysis: generators leave spectral artifacts\n\
     \u{2022} Watermarks: many generators tag their output (C2PA, visible marks)\n\
     \u{2022} Face forensics: swapped faces have geometric seams\n\n\
     No single detector is proof; the verdict fuses all of them."
        .to_string()
}

/// "How to spot fake images" education body (general register).
pub fn spot_fakes_education() -> String {
    "\u{1F50E} <b>How to spot fake images</b>\n\n\
     \u{2022} <b>Hands, ears, teeth:</b> generators still struggle with them\n\
     \u{2022} <b>Text in the image:</b> garbled signage is a classic tell\n\
     \u{2022} <b>Lighting:</b> shadows that disagree about the sun\n\
     \u{2022} <b>Backgrounds:</b> melted or repeating patterns\n\
     \u{2022} <b>Provenance:</b> no original source, only re-posts\n\n\
     And when eyes aren't enough - run it through an analysis like this one."
        .to_string()
}

/// Caption attached to a delivered PDF report.
pub fn pdf_caption(analysis_id: &str, verdict: &str, confidence: f64) -> String {
    format!(
        "\u{1F4C4} <b>Forensic analysis report</b>\n\n\
         Analysis ID: <code>{analysis_id}</code>\n\
         Verdict: <b>{}</b>\n\
         Confidence: {:.1}%",
        verdict.to_uppercase(),
        confidence * 100.0
    )
}

/// Share text for the general scenario's "Share Result" button.
pub fn share_text(analysis_id: &str, verdict: &str, confidence: f64) -> String {
    format!(
        "I verified this image: {} at {:.1}% confidence (report {analysis_id}).",
        verdict.to_uppercase(),
        confidence * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teen_register_substrings() {
        assert!(teen_stop().contains("not your fault"));
        assert!(stop_spread().contains("not your fault"));
        assert!(tell_parents("ANL-1").contains("none of this is your fault"));
        assert!(ai_watermark_shortcircuit(Scenario::TeenagerSos, "x").contains("made by a computer"));
    }

    #[test]
    fn test_adult_register_substrings() {
        assert!(adult_intro().contains("legal evidence"));
        assert!(counter_measures("ANL-1", "ff".repeat(32).as_str()).contains("Never pay"));
    }

    #[test]
    fn test_general_register_is_neutral() {
        let body = general_intro();
        assert!(!body.contains("blackmail"));
        assert!(!body.contains("fault"));
    }

    #[test]
    fn test_templates_cite_forensic_identity() {
        let sha = "ab".repeat(32);
        let body = safe_response_templates("ANL-20260113-abc12345", &sha);
        assert!(body.contains("ANL-20260113-abc12345"));
        assert!(body.contains(&sha));
    }

    #[test]
    fn test_duplicate_notice_references_prior_id() {
        let body = duplicate_notice("ANL-20260113-abc12345");
        assert!(body.contains("ANL-20260113-abc12345"));
        assert!(body.contains("not charged"));
    }

    #[test]
    fn test_rate_limit_hint_embeds_wait() {
        assert!(rate_limited(52).contains("52 seconds"));
    }
}
