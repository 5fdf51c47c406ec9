//! Trace Emitter: accumulates open/close events and serializes them into a
//! Speedscope-compatible "evented" profile, with post-hoc filtering of
//! everything that happened before the capture window started.

use crate::symbol::SymbolMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "C")]
    Close,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub frame: usize,
    pub at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shared {
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub src: String,
    pub at: u64,
    #[serde(rename = "frameNumber")]
    pub frame_number: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "type")]
    pub profile_type: &'static str,
    pub name: String,
    pub unit: &'static str,
    #[serde(rename = "startValue")]
    pub start_value: u64,
    #[serde(rename = "endValue")]
    pub end_value: u64,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub shared: Shared,
    pub profiles: Vec<Profile>,
    pub captures: Vec<Capture>,
}

/// One still-open frame, tracked so `finalize` can tell whether an open/close
/// pair happened entirely before the capture window started.
#[derive(Debug, Clone, Copy)]
struct RawEvent {
    event_type: EventType,
    symbol_index: usize,
    at: u64,
    /// For closes, the cycle at which the matching open happened; used for
    /// the pre-capture filter. Unused for opens.
    opened_at: u64,
}

pub struct TraceEmitter {
    frame_names: Vec<String>,
    events: Vec<RawEvent>,
    captures: Vec<Capture>,
}

impl TraceEmitter {
    pub fn new(symbol_map: &SymbolMap) -> Self {
        let frame_names = symbol_map.symbols().iter().map(|s| s.symbol.clone()).collect();
        TraceEmitter { frame_names, events: Vec::new(), captures: Vec::new() }
    }

    pub fn open(&mut self, symbol_index: usize, at: u64) {
        self.events.push(RawEvent { event_type: EventType::Open, symbol_index, at, opened_at: at });
    }

    pub fn close(&mut self, symbol_index: usize, at: u64, opened_at: u64) {
        // A close may never precede its own open in wall-clock terms.
        let at = at.max(opened_at);
        self.events.push(RawEvent { event_type: EventType::Close, symbol_index, at, opened_at });
    }

    pub fn capture(&mut self, src: String, at: u64, frame_number: u64) {
        self.captures.push(Capture { src, at, frame_number });
    }

    /// Sort events by `at` (opens before closes on a tie), drop every
    /// open/close pair that closed at or before `capture_start_cycle`, and
    /// compute `endValue` from whatever remains. Frames still open when the
    /// run ended are expected to have already been closed via
    /// `CallStackEngine::shutdown` before this is called.
    pub fn finalize(&self, capture_start_cycle: u64) -> Trace {
        let mut events = self.events.clone();
        events.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| match (a.event_type, b.event_type) {
            (EventType::Open, EventType::Close) => std::cmp::Ordering::Less,
            (EventType::Close, EventType::Open) => std::cmp::Ordering::Greater,
            _ => std::cmp::Ordering::Equal,
        }));

        // Walk once, keeping a per-symbol LIFO of opens still "pending a
        // verdict". A close that lands entirely before the capture window
        // drops both itself and its matching open; everything else survives.
        let mut pending: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
        let mut keep = vec![true; events.len()];
        for (i, ev) in events.iter().enumerate() {
            match ev.event_type {
                EventType::Open => pending.entry(ev.symbol_index).or_default().push(i),
                EventType::Close => {
                    if let Some(open_i) = pending.entry(ev.symbol_index).or_default().pop() {
                        if ev.at < capture_start_cycle {
                            keep[open_i] = false;
                            keep[i] = false;
                        }
                    }
                }
            }
        }

        let mut end_value = capture_start_cycle;
        let mut out = Vec::with_capacity(events.len());
        for (i, ev) in events.into_iter().enumerate() {
            if !keep[i] {
                continue;
            }
            end_value = end_value.max(ev.at);
            out.push(Event { event_type: ev.event_type, frame: ev.symbol_index, at: ev.at });
        }

        Trace {
            schema: "https://www.speedscope.app/file-format-schema.json",
            shared: Shared {
                frames: self.frame_names.iter().map(|name| Frame { name: name.clone() }).collect(),
            },
            profiles: vec![Profile {
                profile_type: "evented",
                name: "gb-profile".to_string(),
                unit: "none",
                start_value: capture_start_cycle,
                end_value,
                events: out,
            }],
            captures: self.captures.clone(),
        }
    }
}
