//! Humanisation of raw metadata values.

use chrono::NaiveDateTime;

/// Format an EXIF capture time for display.
///
/// Input is EXIF-style ("2025:12:16 07:42:09") or ISO-ish
/// ("2025-12-16 07:42:09"); output is "16 Dec 2025, 07:42". Unparseable
/// values pass through unchanged.
pub fn format_capture_time(raw: &str) -> String {
    let normalized = raw.replacen(':', "-", 2);
    match NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt.format("%d %b %Y, %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Normalise a software tag.
///
/// Apple devices write a bare version number ("26.2") into `Software`;
/// prefix it with "iOS" when the device fields agree, otherwise "Version".
pub fn format_software_name(software: &str, camera_make: &str, camera_model: &str) -> String {
    let software = software.trim();
    let is_bare_version =
        !software.is_empty() && software.chars().all(|c| c.is_ascii_digit() || c == '.');
    if is_bare_version {
        let make = camera_make.to_lowercase();
        let model = camera_model.to_lowercase();
        if make.contains("apple") || model.contains("iphone") {
            return format!("iOS {software}");
        }
        return format!("Version {software}");
    }
    software.to_string()
}

/// Properly case a camera make/model pair.
///
/// "apple" + "iphone 13" becomes "Apple iPhone 13"; Canon EOS models are
/// upper-cased; duplicated make prefixes are collapsed.
pub fn format_camera_name(make: &str, model: &str) -> String {
    let make = title_case(make.trim());
    let model_raw = model.trim();
    let model_lower = model_raw.to_lowercase();

    let model = if model_lower.contains("iphone") {
        let rest: Vec<&str> = model_raw.split_whitespace().skip(1).collect();
        if rest.is_empty() {
            "iPhone".to_string()
        } else {
            format!("iPhone {}", rest.join(" "))
        }
    } else if model_lower.contains("eos") {
        model_raw.to_uppercase()
    } else if model_lower.contains("galaxy") {
        title_case(model_raw)
    } else {
        model_raw.to_string()
    };

    match (make.is_empty(), model.is_empty()) {
        (true, true) => "Unknown".to_string(),
        (false, true) => make,
        (true, false) => title_case(&model),
        (false, false) => {
            if model.to_lowercase().contains(&make.to_lowercase()) {
                title_case(&model)
            } else {
                format!("{make} {model}")
            }
        }
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_time_exif_format() {
        assert_eq!(format_capture_time("2025:12:16 07:42:09"), "16 Dec 2025, 07:42");
    }

    #[test]
    fn test_capture_time_dashed_format() {
        assert_eq!(format_capture_time("2025-12-16 07:42:09"), "16 Dec 2025, 07:42");
    }

    #[test]
    fn test_capture_time_garbage_passthrough() {
        assert_eq!(format_capture_time("yesterday-ish"), "yesterday-ish");
    }

    #[test]
    fn test_bare_ios_version() {
        assert_eq!(format_software_name("26.2", "Apple", "iPhone 13"), "iOS 26.2");
        assert_eq!(format_software_name("26.2", "", ""), "Version 26.2");
    }

    #[test]
    fn test_named_software_passthrough() {
        assert_eq!(
            format_software_name("Adobe Photoshop 2024", "", ""),
            "Adobe Photoshop 2024"
        );
    }

    #[test]
    fn test_iphone_casing() {
        assert_eq!(format_camera_name("apple", "iphone 13"), "Apple iPhone 13");
    }

    #[test]
    fn test_canon_eos_uppercased() {
        assert_eq!(format_camera_name("canon", "eos r5"), "Canon EOS R5");
    }

    #[test]
    fn test_galaxy_title_cased() {
        assert_eq!(format_camera_name("samsung", "galaxy s23"), "Samsung Galaxy S23");
    }

    #[test]
    fn test_duplicate_make_collapsed() {
        assert_eq!(format_camera_name("canon", "canon powershot"), "Canon Powershot");
    }

    #[test]
    fn test_missing_everything() {
        assert_eq!(format_camera_name("", ""), "Unknown");
        assert_eq!(format_camera_name("nikon", ""), "Nikon");
    }
}
