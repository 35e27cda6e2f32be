//! Reusable states shared by most entity kinds.

use glam::Vec2;

use crate::components::entity::Body;
use crate::core::context::TickContext;
use crate::core::fsm::{State, StateParams, Transition};

/// Terminal state: stop, drop the hitbox, play the death animation and flag
/// the entity for eviction once it has finished.
///
/// With no animation registered under `animation` the entity is cleaned up on
/// its next update.
#[derive(Debug, Clone)]
pub struct Dying {
    animation: String,
}

impl Dying {
    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
        }
    }
}

impl State for Dying {
    fn enter(&mut self, body: &mut Body, _ctx: &mut TickContext<'_>, _params: &StateParams) {
        if !body.is_dead() {
            body.kill();
        }
        body.velocity = Vec2::ZERO;
        body.zero_hitbox();
        if !body.animations.play(&self.animation) {
            body.animations.stop();
        }
    }

    fn update(&mut self, body: &mut Body, _ctx: &mut TickContext<'_>, _dt: f32) -> Option<Transition> {
        if body.animations.is_done() {
            body.clean_up = true;
        }
        None
    }
}
