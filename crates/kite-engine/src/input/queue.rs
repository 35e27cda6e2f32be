use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::api::error::Result;

/// A discrete input from the host, tagged by `type` in JSON
/// (`{"type": "key_down", "key_code": 39}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    KeyDown { key_code: u32 },
    KeyUp { key_code: u32 },
    /// Host-defined event (touch buttons, debug menu). `kind` identifies it;
    /// `a`, `b`, `c` carry arbitrary data.
    Custom { kind: u32, a: f32, b: f32, c: f32 },
}

impl InputEvent {
    /// Parse a recorded event list, e.g. a replay script.
    pub fn list_from_json(json: &str) -> Result<Vec<InputEvent>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Events pushed by the host between simulation steps.
///
/// Bounded: once `limit` events are pending the oldest is dropped, so a
/// stalled simulation cannot grow the queue without end.
#[derive(Debug, Clone)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
    limit: usize,
}

impl InputQueue {
    pub const DEFAULT_LIMIT: usize = 256;

    pub fn new() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            events: VecDeque::with_capacity(limit.min(32)),
            limit,
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        if self.events.len() >= self.limit {
            if let Some(dropped) = self.events.pop_front() {
                log::warn!("input queue full ({}), dropping {:?}", self.limit, dropped);
            }
        }
        self.events.push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
