//! Message rendering for the verification bot.
//!
//! Everything user-visible lives here: the final verdict message (header,
//! digital footprint, red flags, footer), the scenario-specific action
//! keyboards and their fixed tone registers, the in-place progress
//! templates, and the bodies behind every follow-up callback
//! (counter-measures, parent helper, stop-the-spread, education).
//!
//! Rendering is deterministic; the only I/O is the optional reverse
//! geocoding lookup behind the [`Geocoder`] seam, which degrades to raw
//! coordinates on any failure or timeout.

pub mod copy;
mod geocode;
mod humanize;
pub mod keyboards;
mod progress;
mod render;
pub mod surface;

pub use geocode::{Geocoder, NominatimGeocoder, NoopGeocoder};
pub use humanize::{format_camera_name, format_capture_time, format_software_name};
pub use keyboards::{result_keyboard, scenario_selection_keyboard};
pub use progress::{ProgressNotifier, Stage, SMOOTHNESS_DELAY_TOTAL};
pub use render::{render_result, ResultView};
pub use surface::{MessageSurface, RecordingSurface};
