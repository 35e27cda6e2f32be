use serde::{Deserialize, Serialize};

use crate::api::error::{EngineError, Result};
use crate::api::types::{EntityId, GameEvent};
use crate::components::entity::Entity;
use crate::components::hitbox::{Hitbox, TieBreak};
use crate::components::level::Level;
use crate::core::context::Commands;
use crate::core::scene::{CollisionPair, Scene};
use crate::core::time::FixedTimestep;
use crate::core::timer::{TaskHandle, Timer};
use crate::extensions::tween::EntityTweens;
use crate::input::state::InputState;
use crate::renderer::camera::{Camera, CameraConfig};
use crate::renderer::instance::RenderBuffer;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Cap on fixed steps run for one host frame (default: 10).
    pub max_steps_per_frame: u32,
    pub camera: CameraConfig,
    /// What to do with an ambiguous collision direction (default: skip).
    pub tie_break: TieBreak,
    /// List hitboxes in the render buffer for an overlay.
    pub debug_hitboxes: bool,
    /// Initial render instance capacity (default: 512).
    pub max_instances: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_steps_per_frame: FixedTimestep::DEFAULT_MAX_STEPS,
            camera: CameraConfig::default(),
            tie_break: TieBreak::Skip,
            debug_hitboxes: false,
            max_instances: 512,
        }
    }
}

impl GameConfig {
    /// Parse a config, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        if !(config.fixed_dt > 0.0) {
            log::warn!("fixed_dt {} is not positive, using the default", config.fixed_dt);
            return Ok(Self {
                fixed_dt: Self::default().fixed_dt,
                ..config
            });
        }
        Ok(config)
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Load the level, spawn entities, point the camera.
    fn init(&mut self, ctx: &mut EngineContext);

    /// Game-level logic run before every fixed step: win conditions,
    /// reacting to the previous step's collisions and events.
    fn update(&mut self, _ctx: &mut EngineContext, _input: &InputState) {}

    /// Optional pass for extra render data after the scene is drawn.
    fn render(&self, _ctx: &EngineContext, _frame: &mut RenderBuffer) {}
}

/// All simulation state, advanced one fixed step at a time by [`EngineContext::step`].
pub struct EngineContext {
    pub scene: Scene,
    pub timer: Timer,
    pub tweens: EntityTweens,
    pub camera: Camera,
    pub tie_break: TieBreak,
    level: Level,
    solids: Vec<Hitbox>,
    commands: Commands,
    events: Vec<GameEvent>,
    collisions: Vec<CollisionPair>,
    errors: Vec<(EntityId, EngineError)>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::from_config(&GameConfig::default())
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            scene: Scene::with_capacity(config.max_instances),
            timer: Timer::new(),
            tweens: EntityTweens::new(),
            camera: Camera::new(config.camera),
            tie_break: config.tie_break,
            level: Level::empty(),
            solids: Vec::new(),
            commands: Commands::new(),
            events: Vec::new(),
            collisions: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add an entity to the scene. Returns its id.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        self.scene.spawn(entity)
    }

    /// Remove an entity right away, skipping any death sequence.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        if self.camera.subject == Some(id) {
            self.camera.set_subject(None);
        }
        self.scene.despawn(id)
    }

    /// Tween fields of a live entity (`x`, `y`, `vx`, `vy`) to `end_values`
    /// over `duration` seconds, ticked by [`EngineContext::step`].
    pub fn tween_entity(
        &mut self,
        id: EntityId,
        properties: &[&str],
        end_values: &[f32],
        duration: f32,
        callback: impl FnOnce() + 'static,
    ) -> Result<TaskHandle> {
        self.tweens
            .add(&mut self.scene, id, properties, end_values, duration, callback)
    }

    /// Replace the level: rebuilds the solid geometry and the camera bounds.
    pub fn set_level(&mut self, level: Level) {
        self.solids = level.solid_hitboxes();
        self.camera.set_scene(level.bounds());
        log::info!(
            "level {}x{} loaded, {} solid boxes",
            level.cols(),
            level.rows(),
            self.solids.len()
        );
        self.level = level;
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Extra static obstacle not described by the tile grid.
    pub fn add_solid(&mut self, hitbox: Hitbox) {
        self.solids.push(hitbox);
    }

    pub fn solids(&self) -> &[Hitbox] {
        &self.solids
    }

    /// Emit a game event for the host.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last [`EngineContext::clear_frame_data`].
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Entity pairs that overlapped during the steps of this frame.
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collisions
    }

    /// Entities whose state machine rejected a transition this frame.
    pub fn errors(&self) -> &[(EntityId, EngineError)] {
        &self.errors
    }

    /// Clear per-frame transient data (events, collisions, errors).
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
        self.collisions.clear();
        self.errors.clear();
    }

    /// One fixed step: scheduler, entity tweens, entities, deferred commands, solid
    /// resolution, pairwise collisions, eviction, camera.
    pub fn step(&mut self, dt: f32, input: &InputState) {
        self.timer.update(dt);
        self.tweens.update(&mut self.scene, dt);

        let errors = self
            .scene
            .update(dt, input, &self.level, &mut self.timer, &mut self.commands);
        self.errors.extend(errors);
        self.apply_commands();

        self.scene.resolve_solids(&self.solids, self.tie_break);
        self.scene.collisions_into(self.tie_break, &mut self.collisions);

        for id in self.scene.evict_cleaned_up() {
            if self.camera.subject == Some(id) {
                self.camera.set_subject(None);
            }
        }

        self.camera.update(&self.scene, dt);
    }

    fn apply_commands(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        for id in self.commands.take_despawns() {
            self.despawn(id);
        }
        for entity in self.commands.take_spawns() {
            self.scene.spawn(entity);
        }
        self.events.extend(self.commands.take_events());
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
