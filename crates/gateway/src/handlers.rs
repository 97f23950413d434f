//! Event routing tables: commands and callback actions.

/// Slash commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Status,
}

/// Parse a message text into a command, tolerating bot-name suffixes
/// ("/start@verilens_bot").
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?.split('@').next()?;
    match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "status" => Some(Command::Status),
        _ => None,
    }
}

/// Callback actions wired to the inline keyboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackRoute {
    ScenarioAdult,
    ScenarioTeen,
    ScenarioGeneral,
    BackToMenu,
    TeenReady,
    AdultCounterMeasures,
    CounterTemplates,
    TeenTellParents,
    TeenConversationScript,
    TeenStopSpread,
    TeenEducation,
    EduAiContent,
    EduSpotFakes,
    Pdf(String),
    Share(String),
}

/// Parse the callback data written by the keyboard builders.
pub fn parse_callback(data: &str) -> Option<CallbackRoute> {
    if let Some(analysis_id) = data.strip_prefix("pdf:") {
        return Some(CallbackRoute::Pdf(analysis_id.to_string()));
    }
    if let Some(analysis_id) = data.strip_prefix("share:") {
        return Some(CallbackRoute::Share(analysis_id.to_string()));
    }
    match data {
        "scenario:adult" => Some(CallbackRoute::ScenarioAdult),
        "scenario:teen" => Some(CallbackRoute::ScenarioTeen),
        "scenario:general" => Some(CallbackRoute::ScenarioGeneral),
        "scenario:menu" => Some(CallbackRoute::BackToMenu),
        "teen:ready" => Some(CallbackRoute::TeenReady),
        "adult:counter" => Some(CallbackRoute::AdultCounterMeasures),
        "counter:templates" => Some(CallbackRoute::CounterTemplates),
        "teen:parents" => Some(CallbackRoute::TeenTellParents),
        "teen:script" => Some(CallbackRoute::TeenConversationScript),
        "teen:spread" => Some(CallbackRoute::TeenStopSpread),
        "teen:education" => Some(CallbackRoute::TeenEducation),
        "edu:ai_content" => Some(CallbackRoute::EduAiContent),
        "edu:spot_fakes" => Some(CallbackRoute::EduSpotFakes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/start@verilens_bot"), Some(Command::Start));
        assert_eq!(parse_command("  /help now"), Some(Command::Help));
        assert_eq!(parse_command("/status"), Some(Command::Status));
        assert_eq!(parse_command("/subscribe"), None);
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_callback_parsing() {
        assert_eq!(parse_callback("scenario:adult"), Some(CallbackRoute::ScenarioAdult));
        assert_eq!(parse_callback("teen:ready"), Some(CallbackRoute::TeenReady));
        assert_eq!(
            parse_callback("pdf:ANL-20260113-abc12345"),
            Some(CallbackRoute::Pdf("ANL-20260113-abc12345".to_string()))
        );
        assert_eq!(
            parse_callback("share:ANL-1"),
            Some(CallbackRoute::Share("ANL-1".to_string()))
        );
        assert_eq!(parse_callback("unknown:thing"), None);
    }

    #[test]
    fn test_every_keyboard_callback_routes() {
        // The keyboards and the router must stay in sync.
        use detector_core::Scenario;
        let keyboards = [
            notifier::scenario_selection_keyboard(),
            notifier::keyboards::teen_ready_keyboard(),
            notifier::result_keyboard(Scenario::AdultBlackmail, "ANL-1"),
            notifier::result_keyboard(Scenario::TeenagerSos, "ANL-1"),
            notifier::result_keyboard(Scenario::General, "ANL-1"),
            notifier::keyboards::counter_measures_keyboard("ANL-1"),
            notifier::keyboards::tell_parents_keyboard("ANL-1"),
            notifier::keyboards::stop_spread_keyboard(),
            notifier::keyboards::menu_only_keyboard(),
        ];
        for keyboard in keyboards {
            for row in &keyboard.inline_keyboard {
                for button in row {
                    if let Some(data) = &button.callback_data {
                        assert!(
                            parse_callback(data).is_some(),
                            "unrouted callback: {data}"
                        );
                    }
                }
            }
        }
    }
}
