//! The screening pass itself.

use std::io::Cursor;

use tracing::{debug, warn};

use crate::phash::perceptual_hash;

/// Known AI-generation tool signatures looked for in EXIF text fields.
const AI_SOFTWARE_SIGNATURES: &[&str] = &[
    "midjourney",
    "dall-e",
    "dalle",
    "stable diffusion",
    "stablediffusion",
    "photoshop generative",
    "firefly",
    "leonardo.ai",
    "bluewillow",
    "nijijourney",
    "artbreeder",
    "craiyon",
    "nightcafe",
    "wombo",
    "deepai",
    "runway",
    "canva ai",
    "google ai",
    "imagen",
];

/// Screen-capture tool signatures.
const SCREENSHOT_SOFTWARE: &[&str] = &[
    "screenshot",
    "snagit",
    "lightshot",
    "greenshot",
    "sharex",
    "gyazo",
    "screenpresso",
    "monosnap",
    "skitch",
    "screencapture",
];

/// Pixel-exact display resolutions that betray a screenshot when no camera
/// metadata is present.
const SCREEN_RESOLUTIONS: &[(u32, u32)] = &[
    (1920, 1080),
    (2560, 1440),
    (3840, 2160),
    (1366, 768),
    (1440, 900),
    (1600, 900),
    (1080, 1920),
    (1080, 2340),
    (1440, 3040),
    (2340, 1080),
    (3040, 1440),
    (750, 1334),
    (1125, 2436),
    (828, 1792),
    (1440, 2960),
];

/// Detected container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    /// Multi-picture JPEG container (stereo/burst captures).
    Mpo,
    Heic,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Mpo => "mpo",
            Self::Heic => "heic",
        }
    }

    /// File extension for blob keys.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Mpo => "mpo",
            Self::Heic => "heic",
        }
    }
}

/// EXIF fields the probe cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifProbe {
    pub software: Option<String>,
    pub artist: Option<String>,
    pub copyright: Option<String>,
    pub user_comment: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
}

impl ExifProbe {
    fn has_camera_fields(&self) -> bool {
        self.make.is_some() || self.model.is_some() || self.lens_model.is_some()
    }
}

/// A fully screened, acceptable upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageProfile {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    /// Hex-encoded 64-bit perceptual hash.
    pub perceptual_hash: String,
    pub exif: ExifProbe,
}

/// Screening outcome. Only `Valid` proceeds to quota spend and enqueue.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenReport {
    Valid(ImageProfile),
    /// Upload exceeds the size cap.
    TooLarge { size_bytes: usize, max_bytes: usize },
    /// Bytes are not one of the accepted container formats.
    UnsupportedFormat,
    /// Recognized container but the decoder could not read it.
    Undecodable { reason: String },
    /// An AI-generator tag was found during validation; the pipeline
    /// short-circuits to verdict `ai_generated` at confidence 0.98.
    AiWatermark { reason: String },
    /// The upload is a screen capture, not an original photo.
    Screenshot { reason: String },
}

/// Pre-flight image screener.
#[derive(Debug, Clone)]
pub struct Screener {
    max_bytes: usize,
}

impl Screener {
    /// `max_mb` is the upload cap; 20 MB in the shipped configuration.
    pub fn new(max_mb: usize) -> Self {
        Self {
            max_bytes: max_mb * 1024 * 1024,
        }
    }

    /// Run every check in cost order: size, format sniff, decode, EXIF
    /// probe, screenshot heuristic, perceptual hash.
    pub fn screen(&self, bytes: &[u8]) -> ScreenReport {
        if bytes.len() > self.max_bytes {
            return ScreenReport::TooLarge {
                size_bytes: bytes.len(),
                max_bytes: self.max_bytes,
            };
        }

        let Some(kind) = sniff_format(bytes) else {
            return ScreenReport::UnsupportedFormat;
        };

        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                // HEIC is accepted at sniff level but has no built-in codec;
                // give the user a concrete way out instead of a decode dump.
                let reason = if kind == ImageKind::Heic {
                    "HEIC image could not be decoded; please resend as JPEG or PNG".to_string()
                } else {
                    format!("image could not be decoded ({e})")
                };
                warn!("screening: undecodable {} upload", kind.as_str());
                return ScreenReport::Undecodable { reason };
            }
        };

        let exif = read_exif(bytes);

        if let Some(reason) = detect_ai_signature(&exif) {
            warn!("screening: AI watermark hit: {reason}");
            return ScreenReport::AiWatermark { reason };
        }

        if let Some(reason) = detect_screenshot(&exif, decoded.width(), decoded.height()) {
            debug!("screening: screenshot hit: {reason}");
            return ScreenReport::Screenshot { reason };
        }

        let hash = perceptual_hash(&decoded);
        debug!(
            "screening passed: {} {}x{} phash={}",
            kind.as_str(),
            decoded.width(),
            decoded.height(),
            hash
        );
        ScreenReport::Valid(ImageProfile {
            kind,
            width: decoded.width(),
            height: decoded.height(),
            perceptual_hash: hash,
            exif,
        })
    }
}

/// Identify the container from magic bytes.
fn sniff_format(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.len() < 12 {
        return None;
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some(ImageKind::Png);
    }
    if bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some(ImageKind::WebP);
    }
    if &bytes[4..8] == b"ftyp" {
        let brand = &bytes[8..12];
        if matches!(brand, b"heic" | b"heix" | b"hevc" | b"heif" | b"mif1" | b"msf1") {
            return Some(ImageKind::Heic);
        }
        return None;
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        // MPO is a JPEG container with an MPF APP2 segment near the head.
        let head = &bytes[..bytes.len().min(4096)];
        if head.windows(4).any(|w| w == b"MPF\0") {
            return Some(ImageKind::Mpo);
        }
        return Some(ImageKind::Jpeg);
    }
    None
}

/// Pull the probe fields out of EXIF, tolerating files with none.
fn read_exif(bytes: &[u8]) -> ExifProbe {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
        return ExifProbe::default();
    };

    let text_field = |tag: exif::Tag| -> Option<String> {
        exif.get_field(tag, exif::In::PRIMARY).map(|field| {
            field
                .display_value()
                .to_string()
                .trim_matches('"')
                .trim()
                .to_string()
        })
    };

    ExifProbe {
        software: text_field(exif::Tag::Software),
        artist: text_field(exif::Tag::Artist),
        copyright: text_field(exif::Tag::Copyright),
        user_comment: text_field(exif::Tag::UserComment),
        make: text_field(exif::Tag::Make),
        model: text_field(exif::Tag::Model),
        lens_model: text_field(exif::Tag::LensModel),
    }
}

/// AI-generator probe over the EXIF text fields.
fn detect_ai_signature(exif: &ExifProbe) -> Option<String> {
    let fields = [
        ("software", &exif.software),
        ("artist", &exif.artist),
        ("copyright", &exif.copyright),
        ("comment", &exif.user_comment),
    ];
    for (label, value) in fields {
        let Some(value) = value.as_deref() else {
            continue;
        };
        let lower = value.to_lowercase();
        for signature in AI_SOFTWARE_SIGNATURES {
            if lower.contains(signature) {
                return Some(format!("AI generator tag in {label}: {value}"));
            }
        }
    }
    None
}

/// Screenshot heuristic: capture-tool signatures, or a bare display
/// resolution with no camera metadata at all.
fn detect_screenshot(exif: &ExifProbe, width: u32, height: u32) -> Option<String> {
    if let Some(software) = exif.software.as_deref() {
        let lower = software.to_lowercase();
        for indicator in SCREENSHOT_SOFTWARE {
            if lower.contains(indicator) {
                return Some(format!("screen-capture tool recorded: {software}"));
            }
        }
    }
    for field in [exif.make.as_deref(), exif.model.as_deref()] {
        if field.is_some_and(|v| v.to_lowercase().contains("screenshot")) {
            return Some("screenshot keyword in device info".to_string());
        }
    }
    if SCREEN_RESOLUTIONS.contains(&(width, height)) && !exif.has_camera_fields() {
        return Some(format!("display resolution {width}x{height} with no camera metadata"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let v = ((x ^ y) & 0xFF) as u8;
            *pixel = Rgb([v, v.wrapping_mul(3), v.wrapping_add(17)]);
        }
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_valid_png_passes() {
        let screener = Screener::new(20);
        match screener.screen(&png_bytes(120, 80)) {
            ScreenReport::Valid(profile) => {
                assert_eq!(profile.kind, ImageKind::Png);
                assert_eq!(profile.width, 120);
                assert_eq!(profile.perceptual_hash.len(), 16);
            }
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn test_size_cap() {
        // A 1 MB cap rejects a zero-filled 2 MB payload before sniffing.
        let screener = Screener::new(1);
        let report = screener.screen(&vec![0u8; 2 * 1024 * 1024]);
        assert!(matches!(report, ScreenReport::TooLarge { .. }));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let screener = Screener::new(20);
        let report = screener.screen(b"this is definitely not an image at all..");
        assert_eq!(report, ScreenReport::UnsupportedFormat);
    }

    #[test]
    fn test_truncated_png_is_undecodable() {
        let screener = Screener::new(20);
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(32);
        assert!(matches!(
            screener.screen(&bytes),
            ScreenReport::Undecodable { .. }
        ));
    }

    #[test]
    fn test_heic_brand_sniffed() {
        let mut bytes = vec![0u8; 64];
        bytes[3] = 0x18;
        bytes[4..8].copy_from_slice(b"ftyp");
        bytes[8..12].copy_from_slice(b"heic");
        assert_eq!(sniff_format(&bytes), Some(ImageKind::Heic));

        // ...and rejected with the resend hint, since no codec exists.
        let screener = Screener::new(20);
        match screener.screen(&bytes) {
            ScreenReport::Undecodable { reason } => assert!(reason.contains("JPEG")),
            other => panic!("expected undecodable, got {other:?}"),
        }
    }

    #[test]
    fn test_mpo_marker_detected() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE2];
        bytes.extend_from_slice(b"..MPF\0....");
        assert_eq!(sniff_format(&bytes), Some(ImageKind::Mpo));
    }

    #[test]
    fn test_ai_signature_probe() {
        let exif = ExifProbe {
            software: Some("Midjourney v6".into()),
            ..Default::default()
        };
        let reason = detect_ai_signature(&exif).unwrap();
        assert!(reason.contains("Midjourney"));

        let clean = ExifProbe {
            software: Some("Adobe Photoshop Lightroom".into()),
            ..Default::default()
        };
        assert!(detect_ai_signature(&clean).is_none());
    }

    #[test]
    fn test_screenshot_software_probe() {
        let exif = ExifProbe {
            software: Some("Snagit 2024".into()),
            ..Default::default()
        };
        assert!(detect_screenshot(&exif, 800, 600).is_some());
    }

    #[test]
    fn test_screenshot_resolution_needs_missing_camera_fields() {
        let bare = ExifProbe::default();
        assert!(detect_screenshot(&bare, 1920, 1080).is_some());

        let with_camera = ExifProbe {
            make: Some("Canon".into()),
            ..Default::default()
        };
        assert!(detect_screenshot(&with_camera, 1920, 1080).is_none());
        assert!(detect_screenshot(&bare, 1234, 567).is_none());
    }

    #[test]
    fn test_screenshot_resolution_rejected_end_to_end() {
        let screener = Screener::new(20);
        let report = screener.screen(&png_bytes(1366, 768));
        assert!(matches!(report, ScreenReport::Screenshot { .. }));
    }
}
