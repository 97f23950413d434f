//! Keyboard builders for every flow.

use chat_api::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use detector_core::Scenario;

/// Initial scenario selection.
pub fn scenario_selection_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(InlineKeyboardButton::callback(
            "\u{1F464} I'm being blackmailed",
            "scenario:adult",
        ))
        .row(InlineKeyboardButton::callback(
            "\u{1F198} I need help (Teenager)",
            "scenario:teen",
        ))
        .row(InlineKeyboardButton::callback(
            "\u{1F50D} Verify a photo",
            "scenario:general",
        ))
}

/// "I'm ready" step of the teenager flow.
pub fn teen_ready_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(InlineKeyboardButton::callback(
            "\u{2705} I'm ready to send the photo",
            "teen:ready",
        ))
        .row(back_to_menu())
}

/// The mandatory scenario-specific keyboard under a final result message.
pub fn result_keyboard(scenario: Scenario, analysis_id: &str) -> InlineKeyboardMarkup {
    match scenario {
        Scenario::AdultBlackmail => InlineKeyboardMarkup::new()
            .row(InlineKeyboardButton::callback(
                "\u{1F4C4} Get Forensic PDF",
                format!("pdf:{analysis_id}"),
            ))
            .row(InlineKeyboardButton::callback(
                "\u{1F6E1} Counter-measures",
                "adult:counter",
            ))
            .row(back_to_menu()),
        Scenario::TeenagerSos => InlineKeyboardMarkup::new()
            .row(InlineKeyboardButton::callback(
                "\u{1F4C4} Get PDF Report",
                format!("pdf:{analysis_id}"),
            ))
            .row(InlineKeyboardButton::callback(
                "\u{1F91D} How to tell my parents",
                "teen:parents",
            ))
            .row(InlineKeyboardButton::callback(
                "\u{1F6AB} Stop the Spread",
                "teen:spread",
            ))
            .row(InlineKeyboardButton::callback(
                "\u{1F4DA} What is sextortion?",
                "teen:education",
            ))
            .row(back_to_menu()),
        Scenario::General => InlineKeyboardMarkup::new()
            .row(InlineKeyboardButton::callback(
                "\u{1F916} What is AI-generated content?",
                "edu:ai_content",
            ))
            .row(InlineKeyboardButton::callback(
                "\u{1F50E} How to spot fake images",
                "edu:spot_fakes",
            ))
            .row(InlineKeyboardButton::callback(
                "\u{1F4E4} Share Result",
                format!("share:{analysis_id}"),
            ))
            .row(back_to_menu()),
    }
}

/// Counter-measures menu (adult scenario).
pub fn counter_measures_keyboard(analysis_id: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(InlineKeyboardButton::callback(
            "\u{1F4AC} Generate Safe Response",
            "counter:templates",
        ))
        .row(InlineKeyboardButton::link(
            "\u{1F6AB} Report to StopNCII",
            "https://stopncii.org/",
        ))
        .row(InlineKeyboardButton::link(
            "\u{1F6A8} Report to FBI IC3",
            "https://www.ic3.gov/",
        ))
        .row(InlineKeyboardButton::callback(
            "\u{1F4C4} Download PDF Report",
            format!("pdf:{analysis_id}"),
        ))
        .row(back_to_menu())
}

/// Parent-helper keyboard (teenager scenario).
pub fn tell_parents_keyboard(analysis_id: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(InlineKeyboardButton::callback(
            "\u{1F4C4} Get PDF Report (show to parents)",
            format!("pdf:{analysis_id}"),
        ))
        .row(InlineKeyboardButton::callback(
            "\u{1F4AC} See conversation script",
            "teen:script",
        ))
        .row(back_to_menu())
}

/// Emergency protection resources (teenager scenario).
pub fn stop_spread_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(InlineKeyboardButton::link(
            "\u{1F517} Take It Down (anonymous removal)",
            "https://takeitdown.ncmec.org/",
        ))
        .row(InlineKeyboardButton::link(
            "\u{1F6A8} Report to NCMEC",
            "https://report.cybertip.org/",
        ))
        .row(back_to_menu())
}

/// Single back-to-menu row used under informational bodies.
pub fn menu_only_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new().row(back_to_menu())
}

fn back_to_menu() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("\u{1F519} Back to Main Menu", "scenario:menu")
}
