//! Input-event list: which buttons are pressed/released at which frame,
//! supplied by the host so a run is reproducible across invocations.

use crate::error::ProfilerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonId {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAction {
    Press,
    Release,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEvent {
    pub frame: u64,
    pub button: ButtonId,
    pub action: InputAction,
}

/// Validate and sort a raw input-event list. A malformed list — an event
/// referencing a frame outside the simulated range — is a fatal, reported
/// error rather than something to patch over.
pub fn normalize(mut events: Vec<InputEvent>, frames: u64) -> Result<Vec<InputEvent>, ProfilerError> {
    for ev in &events {
        if ev.frame >= frames {
            return Err(ProfilerError::MalformedInputEvents(format!(
                "event at frame {} is outside the simulated range 0..{}",
                ev.frame, frames
            )));
        }
    }
    events.sort_by_key(|e| e.frame);
    Ok(events)
}
