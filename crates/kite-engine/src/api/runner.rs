use crate::api::game::{EngineContext, Game, GameConfig};
use crate::api::types::GameEvent;
use crate::core::time::FixedTimestep;
use crate::input::queue::{InputEvent, InputQueue};
use crate::input::state::InputState;
use crate::renderer::instance::RenderBuffer;
use crate::systems::render::build_render_buffer;

/// Generic game runner that wires up the engine loop.
///
/// The host pushes input events as they arrive and calls [`GameRunner::tick`]
/// once per display frame with the real elapsed time; the runner turns that
/// into fixed simulation steps and rebuilds the render buffer.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    queue: InputQueue,
    input: InputState,
    render_buffer: RenderBuffer,
    timestep: FixedTimestep,
    config: GameConfig,
    initialized: bool,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt).with_max_steps(config.max_steps_per_frame);

        Self {
            ctx: EngineContext::from_config(&config),
            render_buffer: RenderBuffer::with_capacity(config.max_instances),
            queue: InputQueue::new(),
            input: InputState::new(),
            timestep,
            config,
            game,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.game.init(&mut self.ctx);
        self.ctx.camera.snap_to_subject(&self.ctx.scene);
        self.initialized = true;
        log::info!(
            "game initialized: {} entities, dt {:.4}s",
            self.ctx.scene.len(),
            self.config.fixed_dt
        );
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Host lost focus: release every held key.
    pub fn release_all_input(&mut self) {
        self.queue.drain();
        self.input.reset();
    }

    /// Run one frame: fixed steps for `dt` seconds of real time, then the
    /// render snapshot. Does nothing before [`GameRunner::init`].
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        let steps = self.timestep.accumulate(dt);
        // Events stay queued until a step actually runs, so a quick tap
        // between two steps still registers as a press.
        let events = if steps > 0 { self.queue.drain() } else { Vec::new() };

        let step_dt = self.timestep.dt();
        for step in 0..steps {
            self.input.begin_step();
            if step == 0 {
                self.input.apply_all(&events);
            }
            self.game.update(&mut self.ctx, &self.input);
            self.ctx.step(step_dt, &self.input);
        }

        build_render_buffer(
            &self.ctx.scene,
            Some(&self.ctx.camera),
            &mut self.render_buffer,
            self.config.debug_hitboxes,
        );
        self.game.render(&self.ctx, &mut self.render_buffer);
    }

    // ---- Accessors for the host ----

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render_buffer
    }

    pub fn game_events(&self) -> &[GameEvent] {
        self.ctx.events()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fixed steps run since start.
    pub fn tick_count(&self) -> u64 {
        self.timestep.ticks()
    }

    /// How far between two fixed steps this frame ended, for interpolation.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::components::entity::{Body, Entity};
    use crate::core::context::TickContext;
    use crate::core::fsm::{State, StateParams, Transition};
    use crate::input::state::keys;
    use glam::Vec2;

    /// Walks while RIGHT is held, counts jump presses.
    struct Walk;

    impl State for Walk {
        fn update(&mut self, body: &mut Body, ctx: &mut TickContext<'_>, _dt: f32) -> Option<Transition> {
            body.velocity.x = ctx.input.axis(keys::LEFT, keys::RIGHT) * 60.0;
            if ctx.input.just_pressed(keys::SPACE) {
                ctx.commands.emit(GameEvent::new(1));
            }
            None
        }
    }

    #[derive(Default)]
    struct Demo {
        player: Option<EntityId>,
        updates: u32,
    }

    impl Game for Demo {
        fn config(&self) -> GameConfig {
            GameConfig {
                fixed_dt: 0.25,
                ..Default::default()
            }
        }

        fn init(&mut self, ctx: &mut EngineContext) {
            let body = Body::new(Vec2::ZERO, Vec2::new(8.0, 8.0));
            self.player = Some(ctx.spawn(Entity::new(body).with_state("walk", Walk)));
        }

        fn update(&mut self, _ctx: &mut EngineContext, _input: &InputState) {
            self.updates += 1;
        }
    }

    #[test]
    fn tick_before_init_is_ignored() {
        let mut runner = GameRunner::new(Demo::default());
        runner.tick(1.0);
        assert_eq!(runner.tick_count(), 0);
        assert_eq!(runner.game().updates, 0);
    }

    #[test]
    fn held_key_moves_the_player_each_step() {
        let mut runner = GameRunner::new(Demo::default());
        runner.init();
        runner.push_input(InputEvent::KeyDown { key_code: keys::RIGHT });

        runner.tick(0.5);
        assert_eq!(runner.tick_count(), 2);
        assert_eq!(runner.game().updates, 2);

        let id = runner.game().player.unwrap();
        let body = &runner.context().scene.get(id).unwrap().body;
        assert_eq!(body.position.x, 30.0);
        assert_eq!(runner.render_buffer().instance_count(), 1);
    }

    #[test]
    fn press_registers_once_across_steps() {
        let mut runner = GameRunner::new(Demo::default());
        runner.init();
        runner.push_input(InputEvent::KeyDown { key_code: keys::SPACE });

        // No step runs yet: the press waits in the queue.
        runner.tick(0.1);
        assert!(runner.game_events().is_empty());

        runner.tick(0.5);
        assert_eq!(runner.game_events().len(), 1);
        assert!(runner.input().is_down(keys::SPACE));
        assert!(!runner.input().just_pressed(keys::SPACE));
    }
}
