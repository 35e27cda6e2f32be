//! Axis-aligned hitboxes: overlap tests and penetration-side classification.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Debug-overlay tint for a hitbox. Purely a tag; the core never draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const RED: Colour = Colour::rgba(255, 0, 0, 255);
    pub const GREEN: Colour = Colour::rgba(0, 255, 0, 255);
    pub const BLUE: Colour = Colour::rgba(0, 0, 255, 255);
    pub const WHITE: Colour = Colour::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Colour = Colour::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Colour::RED
    }
}

/// The side of the *other* box through which a box appears to have entered.
///
/// `Top` means the box's top edge is inside the other's bottom face
/// (it came from below), `Bottom` means it landed on the other's top face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionDirection {
    Top,
    Bottom,
    Left,
    Right,
}

impl CollisionDirection {
    /// Fallback order used by [`TieBreak::Priority`].
    pub const PRIORITY: [CollisionDirection; 4] = [
        CollisionDirection::Top,
        CollisionDirection::Bottom,
        CollisionDirection::Left,
        CollisionDirection::Right,
    ];
}

/// What to do when two or more penetration distances tie for the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Report no direction; resolution is skipped this tick.
    #[default]
    Skip,
    /// Pick the first tied side in `Top > Bottom > Left > Right` order.
    Priority,
}

/// Axis-aligned rectangle `[x, x + w] × [y, y + h]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hitbox {
    pub position: Vec2,
    pub dimensions: Vec2,
    #[serde(default)]
    pub colour: Colour,
}

impl Hitbox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            dimensions: Vec2::new(width, height),
            colour: Colour::default(),
        }
    }

    pub fn with_colour(mut self, colour: Colour) -> Self {
        self.colour = colour;
        self
    }

    /// Replace the whole rectangle at once.
    pub fn set(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.position = Vec2::new(x, y);
        self.dimensions = Vec2::new(width, height);
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn width(&self) -> f32 {
        self.dimensions.x
    }

    pub fn height(&self) -> f32 {
        self.dimensions.y
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.dimensions.x
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.dimensions.y
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.dimensions * 0.5
    }

    /// Zero (or negative) width or height. Such boxes never collide.
    pub fn is_degenerate(&self) -> bool {
        self.dimensions.x <= 0.0 || self.dimensions.y <= 0.0
    }

    /// Overlap test with inclusive edges: boxes sharing an edge collide.
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        self.right() >= other.x()
            && self.x() <= other.right()
            && self.bottom() >= other.y()
            && self.y() <= other.bottom()
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x() && point.x <= self.right() && point.y >= self.y() && point.y <= self.bottom()
    }

    /// Penetration distances against `other`, in `Top, Bottom, Left, Right` order.
    pub fn penetration(&self, other: &Hitbox) -> [(CollisionDirection, f32); 4] {
        [
            (CollisionDirection::Top, other.bottom() - self.y()),
            (CollisionDirection::Bottom, self.bottom() - other.y()),
            (CollisionDirection::Left, other.right() - self.x()),
            (CollisionDirection::Right, self.right() - other.x()),
        ]
    }

    /// The side of `other` this box penetrated least. `None` when the
    /// smallest distance is shared by two or more sides.
    pub fn collision_direction(&self, other: &Hitbox) -> Option<CollisionDirection> {
        self.collision_direction_with(other, TieBreak::Skip)
    }

    /// Like [`Hitbox::collision_direction`] with an explicit tie policy.
    pub fn collision_direction_with(
        &self,
        other: &Hitbox,
        tie_break: TieBreak,
    ) -> Option<CollisionDirection> {
        let candidates = self.penetration(other);
        let min = candidates
            .iter()
            .map(|&(_, d)| d)
            .fold(f32::INFINITY, f32::min);

        // Candidates are already in priority order.
        let mut tied = candidates.iter().filter(|&&(_, d)| d == min);
        let first = tied.next().map(|&(dir, _)| dir)?;

        match (tie_break, tied.next()) {
            (_, None) => Some(first),
            (TieBreak::Priority, Some(_)) => Some(first),
            (TieBreak::Skip, Some(_)) => None,
        }
    }
}
