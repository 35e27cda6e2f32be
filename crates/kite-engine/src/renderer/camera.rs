use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::error::Result;
use crate::api::types::EntityId;
use crate::components::hitbox::Hitbox;
use crate::core::scene::Scene;

/// Horizontal speed above which the camera starts leading the subject.
const LOOKAHEAD_THRESHOLD_X: f32 = 10.0;
/// Vertical threshold; higher so ordinary jumps do not bob the view.
const LOOKAHEAD_THRESHOLD_Y: f32 = 50.0;

/// Tuning for [`Camera`]. Rates are per second; a rate of zero or less snaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Viewport size in screen pixels.
    pub viewport: Vec2,
    /// Screen pixels per world unit. Must be positive; anything else is
    /// replaced by 1.
    pub zoom: f32,
    pub smooth_speed_x: f32,
    pub smooth_speed_y: f32,
    pub deadzone_width: f32,
    pub deadzone_height: f32,
    pub lookahead_x: f32,
    pub lookahead_y: f32,
    pub lookahead_smooth: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(800.0, 600.0),
            zoom: 1.0,
            smooth_speed_x: 5.0,
            smooth_speed_y: 5.0,
            deadzone_width: 64.0,
            deadzone_height: 48.0,
            lookahead_x: 48.0,
            lookahead_y: 24.0,
            lookahead_smooth: 3.0,
        }
    }
}

impl CameraConfig {
    /// Parse a config, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CameraConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Replace a zoom that is zero, negative or NaN with 1.
    pub fn sanitized(self) -> Self {
        if self.zoom > 0.0 {
            return self;
        }
        log::warn!("camera zoom {} is not positive, using 1", self.zoom);
        Self { zoom: 1.0, ..self }
    }
}

/// Follows one entity around a bounded scene.
///
/// `position` is the top-left corner of the visible area in world units. The
/// camera never shows anything outside `[0, scene]`; when the scene is
/// smaller than the visible area the camera sits at the origin.
///
/// The clamp bound is in world units: `position` stays within
/// `[0, scene - viewport / zoom]` per axis, which at zoom 1 is exactly
/// `[0, scene - viewport]`. The viewport itself is in screen pixels.
#[derive(Debug, Clone)]
pub struct Camera {
    pub config: CameraConfig,
    /// Entity to follow, read by id every update.
    pub subject: Option<EntityId>,
    /// Scene size in world units.
    pub scene: Vec2,
    pub position: Vec2,
    current_lookahead: Vec2,
}

/// Fraction of the remaining distance covered this tick for an exponential
/// approach at `rate` per second.
fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 {
        1.0
    } else {
        1.0 - (-rate * dt).exp()
    }
}

fn lookahead_axis(velocity: f32, threshold: f32, distance: f32) -> f32 {
    if velocity.abs() > threshold {
        velocity.signum() * distance
    } else {
        0.0
    }
}

impl Camera {
    /// A camera over a scene the size of the viewport. A non-positive zoom
    /// in `config` is replaced by 1.
    pub fn new(config: CameraConfig) -> Self {
        let config = config.sanitized();
        Self {
            config,
            subject: None,
            scene: config.viewport,
            position: Vec2::ZERO,
            current_lookahead: Vec2::ZERO,
        }
    }

    // -- Builder methods --

    pub fn with_scene(mut self, scene: Vec2) -> Self {
        self.set_scene(scene);
        self
    }

    pub fn following(mut self, subject: EntityId) -> Self {
        self.subject = Some(subject);
        self
    }

    // -- Setters --

    pub fn set_scene(&mut self, scene: Vec2) {
        self.scene = scene;
        self.position = self.clamp(self.position);
    }

    pub fn set_subject(&mut self, subject: Option<EntityId>) {
        self.subject = subject;
        self.current_lookahead = Vec2::ZERO;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom > 0.0 {
            self.config.zoom = zoom;
            self.position = self.clamp(self.position);
        }
    }

    /// Visible area in world units.
    pub fn visible_size(&self) -> Vec2 {
        let zoom = if self.config.zoom > 0.0 { self.config.zoom } else { 1.0 };
        self.config.viewport / zoom
    }

    pub fn current_lookahead(&self) -> Vec2 {
        self.current_lookahead
    }

    fn clamp(&self, position: Vec2) -> Vec2 {
        let max = (self.scene - self.visible_size()).max(Vec2::ZERO);
        position.clamp(Vec2::ZERO, max)
    }

    /// Advance toward the subject looked up in `scene`. Without a subject,
    /// or when it has been despawned, the camera holds still.
    pub fn update(&mut self, scene: &Scene, dt: f32) {
        let Some(entity) = self.subject.and_then(|id| scene.get(id)) else {
            return;
        };
        let (center, velocity) = (entity.body.center(), entity.body.velocity);
        self.follow(center, velocity, dt);
    }

    /// One tick of follow logic for a subject centred at `center` moving at
    /// `velocity`.
    pub fn follow(&mut self, center: Vec2, velocity: Vec2, dt: f32) {
        let cfg = self.config;

        let lookahead_target = Vec2::new(
            lookahead_axis(velocity.x, LOOKAHEAD_THRESHOLD_X, cfg.lookahead_x),
            lookahead_axis(velocity.y, LOOKAHEAD_THRESHOLD_Y, cfg.lookahead_y),
        );
        self.current_lookahead +=
            (lookahead_target - self.current_lookahead) * smoothing_factor(cfg.lookahead_smooth, dt);

        let view = self.visible_size();
        let view_center = self.position + view * 0.5;
        let half_deadzone = Vec2::new(cfg.deadzone_width, cfg.deadzone_height) * 0.5;

        // Only the part of the subject's offset outside the deadzone moves the target.
        let offset = center - view_center;
        let excess = offset - offset.clamp(-half_deadzone, half_deadzone);
        let target = self.clamp(self.position + excess + self.current_lookahead);

        self.position.x += (target.x - self.position.x) * smoothing_factor(cfg.smooth_speed_x, dt);
        self.position.y += (target.y - self.position.y) * smoothing_factor(cfg.smooth_speed_y, dt);
        self.position = self.clamp(self.position);
    }

    /// Centre on `center` immediately (level start, respawn).
    pub fn snap_to(&mut self, center: Vec2) {
        self.current_lookahead = Vec2::ZERO;
        self.position = self.clamp(center - self.visible_size() * 0.5);
    }

    pub fn snap_to_subject(&mut self, scene: &Scene) {
        if let Some(entity) = self.subject.and_then(|id| scene.get(id)) {
            let center = entity.body.center();
            self.snap_to(center);
        }
    }

    /// Translation a renderer applies to world coordinates.
    pub fn render_offset(&self) -> Vec2 {
        -self.position
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        (point - self.position) * self.config.zoom
    }

    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        point / self.config.zoom + self.position
    }

    /// Whether any part of `rect` is inside the visible area.
    pub fn is_visible(&self, rect: &Hitbox) -> bool {
        let view = self.visible_size();
        let visible = Hitbox::new(self.position.x, self.position.y, view.x, view.y);
        visible.overlaps(rect)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
