//! Error kinds for `profiler-core`. Most failure modes (resolver misses,
//! RETI underflow, ignored-symbol hits) are non-fatal by design and are
//! absorbed silently rather than surfaced here; this enum only covers what
//! genuinely needs to bubble up to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("malformed input-event list: {0}")]
    MalformedInputEvents(String),

    #[error("invalid profiler configuration: {0}")]
    InvalidConfig(String),
}
