//! Session continuity: restart scheduling, bridging replay and timestamp
//! correction.
//!
//! The streaming service caps how long a single recognition stream may
//! live.  This module makes that cap invisible: [`SessionManager`] rotates
//! sessions on a timer, [`plan_replay`] decides which tail of the previous
//! session's audio must be re-sent so no speech is lost or duplicated, and
//! [`corrected_time_ms`] maps each per-session timestamp onto the single
//! monotonic transcript timeline.

mod corrector;
mod manager;
mod timing;

pub use corrector::{corrected_time_ms, TranscriptEmitter};
pub use manager::{SessionError, SessionManager};
pub use timing::{clamp_offset, plan_replay, ReplayPlan, TimingState};
