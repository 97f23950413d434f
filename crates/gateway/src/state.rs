//! Conversation state machine storage.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use detector_core::Scenario;

/// Inactivity TTL for conversation state.
const STATE_TTL: Duration = Duration::from_secs(3600);

/// Per-(chat, user) conversation state. Tagged union; the variant carries
/// exactly the fields that are meaningful in it.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationState {
    SelectingScenario,
    AdultWaitingForEvidence,
    TeenagerStopShown,
    TeenagerWaitingForPhoto,
    AnalysisInFlight {
        job_id: String,
        progress_msg_id: i64,
        scenario: Scenario,
    },
    ReviewingResult {
        analysis_id: String,
        scenario: Scenario,
    },
}

impl ConversationState {
    /// The scenario an upload in this state runs under.
    ///
    /// The legacy path (no selection, or still on the selection screen) is
    /// `general`. An upload while a result is pending or being reviewed
    /// reuses the last selected scenario - the latest scenario event wins.
    pub fn upload_scenario(state: Option<&Self>) -> Scenario {
        match state {
            Some(Self::AdultWaitingForEvidence) => Scenario::AdultBlackmail,
            // A photo on the stop screen counts as the implicit "I'm ready".
            Some(Self::TeenagerStopShown) | Some(Self::TeenagerWaitingForPhoto) => {
                Scenario::TeenagerSos
            }
            Some(Self::AnalysisInFlight { scenario, .. })
            | Some(Self::ReviewingResult { scenario, .. }) => *scenario,
            Some(Self::SelectingScenario) | None => Scenario::General,
        }
    }
}

/// In-process state store with a 1 h inactivity TTL.
///
/// The gateway is a single process handling events serially, so process
/// memory is a valid home for conversation state - unlike the rate-limit
/// and duplicate indexes, which must be shared and live in the database.
#[derive(Debug, Default)]
pub struct StateStore {
    states: Mutex<HashMap<(i64, i64), (ConversationState, Instant)>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for (chat, user), dropping it if expired.
    pub fn get(&self, chat_id: i64, user_id: i64) -> Option<ConversationState> {
        let mut states = self.states.lock().unwrap();
        match states.get(&(chat_id, user_id)) {
            Some((state, touched)) if touched.elapsed() < STATE_TTL => Some(state.clone()),
            Some(_) => {
                states.remove(&(chat_id, user_id));
                None
            }
            None => None,
        }
    }

    /// Set the state, refreshing the TTL.
    pub fn set(&self, chat_id: i64, user_id: i64, state: ConversationState) {
        self.states
            .lock()
            .unwrap()
            .insert((chat_id, user_id), (state, Instant::now()));
    }

    /// Clear the state (the /start path).
    pub fn clear(&self, chat_id: i64, user_id: i64) {
        self.states.lock().unwrap().remove(&(chat_id, user_id));
    }

    /// Drop every expired entry; called opportunistically.
    pub fn prune(&self) {
        self.states
            .lock()
            .unwrap()
            .retain(|_, (_, touched)| touched.elapsed() < STATE_TTL);
    }
}
