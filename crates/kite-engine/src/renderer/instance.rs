use bytemuck::{Pod, Zeroable};

use crate::components::hitbox::Hitbox;

/// Per-entity data handed to the external renderer each tick.
/// 8 floats = 32 bytes stride, so hosts can read the buffer as a flat f32 array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// X position in world space (top-left of the sprite box).
    pub x: f32,
    /// Y position in world space.
    pub y: f32,
    /// Sprite box width in world units.
    pub width: f32,
    /// Sprite box height in world units.
    pub height: f32,
    /// Frame index from the current animation.
    pub frame: f32,
    /// -1.0 facing left, 1.0 facing right.
    pub direction: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub alpha: f32,
    /// Owning entity id, or 0 for state-drawn extras.
    pub entity: f32,
}

impl RenderInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Everything the renderer needs for one frame.
pub struct RenderBuffer {
    pub instances: Vec<RenderInstance>,
    /// Hitbox outlines for the optional debug overlay.
    pub debug_boxes: Vec<Hitbox>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            debug_boxes: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.debug_boxes.clear();
    }

    pub fn push(&mut self, instance: RenderInstance) {
        self.instances.push(instance);
    }

    pub fn push_debug(&mut self, hitbox: Hitbox) {
        self.debug_boxes.push(hitbox);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Instance data as a flat float slice.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
