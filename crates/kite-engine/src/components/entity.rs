use glam::Vec2;

use crate::api::error::Result;
use crate::api::types::{Direction, EntityId};
use crate::components::animation::AnimationSet;
use crate::components::hitbox::{CollisionDirection, Hitbox, TieBreak};
use crate::components::level::TileLookup;
use crate::core::context::TickContext;
use crate::core::fsm::{State, StateMachine, StateParams, Transition};
use crate::renderer::instance::RenderBuffer;

/// Handle to one of a body's hitbox-offset profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitboxProfileId(usize);

impl HitboxProfileId {
    /// The profile every body starts with.
    pub const DEFAULT: HitboxProfileId = HitboxProfileId(0);
}

/// Everything about an entity except its behavior: the data states mutate
/// and the renderer reads.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub dimensions: Vec2,
    pub velocity: Vec2,
    /// Per-axis speed cap applied by the movement helpers.
    pub velocity_limit: Vec2,
    /// Derived from position and the active offset profile; frozen once dead.
    pub hitbox: Hitbox,
    pub total_health: i32,
    pub current_health: i32,
    pub animations: AnimationSet,
    pub direction: Direction,
    /// Resolved against level solids after each tick.
    pub solid: bool,
    /// Set by a terminal state once the death animation is over.
    pub clean_up: bool,
    is_dead: bool,
    profiles: Vec<(String, Hitbox)>,
    active_profile: HitboxProfileId,
}

impl Body {
    pub fn new(position: Vec2, dimensions: Vec2) -> Self {
        let mut body = Self {
            position,
            dimensions,
            velocity: Vec2::ZERO,
            velocity_limit: Vec2::splat(f32::INFINITY),
            hitbox: Hitbox::default(),
            total_health: 1,
            current_health: 1,
            animations: AnimationSet::new(),
            direction: Direction::Right,
            solid: true,
            clean_up: false,
            is_dead: false,
            profiles: vec![("default".to_string(), Hitbox::default())],
            active_profile: HitboxProfileId::DEFAULT,
        };
        body.sync_hitbox();
        body
    }

    // -- Builder pattern --

    pub fn with_velocity_limit(mut self, limit: Vec2) -> Self {
        self.velocity_limit = limit;
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.total_health = health;
        self.current_health = health;
        self
    }

    /// Offsets of the default profile: hitbox = position + offsets.position,
    /// dimensions + offsets.dimensions.
    pub fn with_hitbox_offsets(mut self, offsets: Hitbox) -> Self {
        self.profiles[0].1 = offsets;
        self.sync_hitbox();
        self
    }

    pub fn with_hitbox_profile(mut self, name: impl Into<String>, offsets: Hitbox) -> Self {
        self.add_hitbox_profile(name, offsets);
        self
    }

    pub fn with_animations(mut self, animations: AnimationSet) -> Self {
        self.animations = animations;
        self
    }

    pub fn non_solid(mut self) -> Self {
        self.solid = false;
        self
    }

    // -- Hitbox profiles --

    /// Register a named offset preset (a crouch or roll pose). Re-adding a
    /// name replaces its offsets and keeps its handle.
    pub fn add_hitbox_profile(&mut self, name: impl Into<String>, offsets: Hitbox) -> HitboxProfileId {
        let name = name.into();
        if let Some(idx) = self.profiles.iter().position(|(n, _)| *n == name) {
            self.profiles[idx].1 = offsets;
            return HitboxProfileId(idx);
        }
        self.profiles.push((name, offsets));
        HitboxProfileId(self.profiles.len() - 1)
    }

    pub fn hitbox_offsets(&self) -> &Hitbox {
        &self.profiles[self.active_profile.0].1
    }

    pub fn active_hitbox_profile(&self) -> HitboxProfileId {
        self.active_profile
    }

    /// Switch to the named profile and return the previously active handle,
    /// which the caller must hand back to [`Body::restore_hitbox_profile`]
    /// when the pose ends. Unknown names change nothing and return `None`.
    pub fn use_hitbox_profile(&mut self, name: &str) -> Option<HitboxProfileId> {
        let idx = self.profiles.iter().position(|(n, _)| n == name)?;
        let previous = self.active_profile;
        self.active_profile = HitboxProfileId(idx);
        self.sync_hitbox();
        Some(previous)
    }

    pub fn restore_hitbox_profile(&mut self, id: HitboxProfileId) {
        if id.0 < self.profiles.len() {
            self.active_profile = id;
            self.sync_hitbox();
        }
    }

    /// Recompute the hitbox from position and the active offsets. Dead
    /// bodies keep whatever hitbox they died with.
    pub fn sync_hitbox(&mut self) {
        if self.is_dead {
            return;
        }
        let offsets = *self.hitbox_offsets();
        let position = self.position + offsets.position;
        let dimensions = self.dimensions + offsets.dimensions;
        self.hitbox.set(position.x, position.y, dimensions.x, dimensions.y);
    }

    /// Collapse the hitbox to nothing so it can no longer collide.
    pub fn zero_hitbox(&mut self) {
        self.hitbox.set(0.0, 0.0, 0.0, 0.0);
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.dimensions * 0.5
    }

    // -- Movement --

    /// `position += velocity * dt`.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Add `force * dt` to velocity, capped per axis by `velocity_limit`.
    pub fn accelerate(&mut self, force: Vec2, dt: f32) {
        self.velocity += force * dt;
        self.clamp_velocity();
    }

    /// Pull horizontal velocity toward zero by `friction * dt` without
    /// crossing it.
    pub fn decelerate(&mut self, friction: f32, dt: f32) {
        let step = friction * dt;
        if self.velocity.x > 0.0 {
            self.velocity.x = (self.velocity.x - step).max(0.0);
        } else if self.velocity.x < 0.0 {
            self.velocity.x = (self.velocity.x + step).min(0.0);
        }
    }

    pub fn apply_gravity(&mut self, gravity: f32, dt: f32) {
        self.accelerate(Vec2::new(0.0, gravity), dt);
    }

    pub fn clamp_velocity(&mut self) {
        self.velocity = self.velocity.clamp(-self.velocity_limit, self.velocity_limit);
    }

    /// Face the direction of horizontal travel; unchanged when standing still.
    pub fn face_velocity(&mut self) {
        if let Some(direction) = Direction::from_velocity(self.velocity.x) {
            self.direction = direction;
        }
    }

    /// A solid tile directly below either bottom corner of the hitbox.
    pub fn is_on_ground(&self, level: &dyn TileLookup) -> bool {
        let y = self.hitbox.bottom() + 1.0;
        level.is_solid_at(Vec2::new(self.hitbox.x(), y))
            || level.is_solid_at(Vec2::new(self.hitbox.right() - 1.0, y))
    }

    /// A solid tile directly above either top corner of the hitbox.
    pub fn is_under_ceiling(&self, level: &dyn TileLookup) -> bool {
        let y = self.hitbox.y() - 1.0;
        level.is_solid_at(Vec2::new(self.hitbox.x(), y))
            || level.is_solid_at(Vec2::new(self.hitbox.right() - 1.0, y))
    }

    // -- Collision resolution --

    /// Push this body out of `obstacle` through the side it penetrated least,
    /// so the hitbox face rests exactly on the obstacle's face. The offset
    /// between position and hitbox is preserved.
    ///
    /// Returns the side resolved, or `None` when the boxes do not overlap,
    /// the body is dead, or the direction is ambiguous under `tie_break`.
    pub fn resolve_against(&mut self, obstacle: &Hitbox, tie_break: TieBreak) -> Option<CollisionDirection> {
        if self.is_dead || !self.hitbox.overlaps(obstacle) {
            return None;
        }
        let direction = self.hitbox.collision_direction_with(obstacle, tie_break)?;

        let offset = self.hitbox.position - self.position;
        let mut target = self.hitbox.position;
        match direction {
            CollisionDirection::Top => target.y = obstacle.bottom(),
            CollisionDirection::Bottom => target.y = obstacle.y() - self.hitbox.height(),
            CollisionDirection::Left => target.x = obstacle.right(),
            CollisionDirection::Right => target.x = obstacle.x() - self.hitbox.width(),
        }
        self.position = target - offset;
        self.sync_hitbox();
        Some(direction)
    }

    // -- Health --

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    fn check_death(&mut self) -> bool {
        if !self.is_dead && self.current_health <= 0 {
            self.current_health = 0;
            self.is_dead = true;
            return true;
        }
        false
    }

    /// Subtract `amount` from health. Returns true if this call killed the body.
    pub fn damage(&mut self, amount: i32) -> bool {
        if self.is_dead {
            return false;
        }
        self.current_health -= amount;
        self.check_death()
    }

    /// Restore health up to the total. The dead stay dead.
    pub fn heal(&mut self, amount: i32) {
        if self.is_dead {
            return;
        }
        self.current_health = (self.current_health + amount).min(self.total_health);
        self.check_death();
    }

    /// Forced death (pits, instant-kill hazards) regardless of health.
    pub fn kill(&mut self) {
        self.current_health = 0;
        self.is_dead = true;
    }
}

/// A simulated thing in the scene: body data plus the state machine that
/// drives it.
#[derive(Debug)]
pub struct Entity {
    /// Assigned by the scene on spawn.
    pub id: EntityId,
    /// String tag for finding entities by role ("player", "enemy").
    pub tag: String,
    pub body: Body,
    pub state_machine: StateMachine,
    initial: Option<Transition>,
}

impl Entity {
    pub fn new(body: Body) -> Self {
        Self {
            id: EntityId(0),
            tag: String::new(),
            body,
            state_machine: StateMachine::new(),
            initial: None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_state(mut self, name: impl Into<String>, state: impl State + 'static) -> Self {
        self.state_machine.add(name, state);
        self
    }

    /// Enter `name` with `params` at the start of the entity's first update.
    pub fn starting_in(mut self, name: impl Into<String>, params: StateParams) -> Self {
        self.initial = Some(Transition::to(name).with_params(params));
        self
    }

    pub fn current_state(&self) -> Option<&str> {
        self.state_machine.current_name()
    }

    pub fn change_state(&mut self, name: &str, params: &StateParams, ctx: &mut TickContext<'_>) -> Result<()> {
        self.state_machine.change(name, params, &mut self.body, ctx)
    }

    /// One tick, in order: state machine, animation, `position += velocity * dt`,
    /// hitbox sync (while alive). Entities flagged `clean_up` are left untouched.
    ///
    /// A rejected transition is reported after the physics steps have run, so
    /// one misconfigured state does not freeze the entity in place.
    pub fn update(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> Result<()> {
        if self.body.clean_up {
            return Ok(());
        }

        let mut result = Ok(());
        if let Some(initial) = self.initial.take() {
            result = self.state_machine.change(&initial.to, &initial.params, &mut self.body, ctx);
        }
        if result.is_ok() {
            result = self.state_machine.update(dt, &mut self.body, ctx);
        }

        self.body.animations.update(dt);
        self.body.integrate(dt);
        self.body.sync_hitbox();
        result
    }

    pub fn render(&self, frame: &mut RenderBuffer) {
        self.state_machine.render(&self.body, frame);
    }
}
