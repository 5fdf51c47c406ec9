//! Profiler configuration. Lives independently of the CLI so a host other
//! than `profiler-cli` (a test harness, a future GUI) can drive a run
//! without touching argv.

use crate::error::ProfilerError;
use serde::{Deserialize, Serialize};

/// Which frames get written into the trace at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    /// Capture from `start_frame` through the end of the run.
    All,
    /// Capture only on the final frame.
    Exit,
    /// Capture nothing; useful for `--verify-determinism` style dry runs.
    None,
}

impl Default for CaptureMode {
    fn default() -> Self {
        CaptureMode::All
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// First frame to simulate, 0-indexed.
    #[serde(default)]
    pub start_frame: u64,
    /// Number of frames to simulate starting at `start_frame`.
    pub frames: u64,
    #[serde(default)]
    pub capture_mode: CaptureMode,
    /// Interrupt indices (0..5, VBL/LCD/TIM/SIO/JOY) the driver masks out of
    /// `IE` before the run starts, for isolating one interrupt source.
    #[serde(default)]
    pub disabled_interrupts: Vec<u8>,
    #[serde(default)]
    pub verbose: bool,
}

impl ProfilerConfig {
    pub fn validate(&self) -> Result<(), ProfilerError> {
        if self.frames == 0 {
            return Err(ProfilerError::InvalidConfig("frames must be at least 1".into()));
        }
        if let Some(bad) = self.disabled_interrupts.iter().find(|&&i| i > 4) {
            return Err(ProfilerError::InvalidConfig(format!(
                "disabled_interrupts entry {bad} out of range 0..=4"
            )));
        }
        Ok(())
    }
}
