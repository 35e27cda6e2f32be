use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Horizontal facing of an entity. Renderers mirror sprites on `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    /// -1.0 for left, 1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Facing implied by a horizontal velocity; `None` when standing still.
    pub fn from_velocity(vx: f32) -> Option<Self> {
        if vx < 0.0 {
            Some(Direction::Left)
        } else if vx > 0.0 {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// A gameplay event raised by state logic for the host to consume.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: u32) -> Self {
        Self {
            kind: kind as f32,
            ..Default::default()
        }
    }

    pub fn with_payload(mut self, a: f32, b: f32, c: f32) -> Self {
        self.a = a;
        self.b = b;
        self.c = c;
        self
    }
}
