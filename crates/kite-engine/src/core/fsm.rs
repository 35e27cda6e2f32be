//! Finite state machine driving an entity's behavior.
//!
//! Each behavior (idle, walking, attacking, dying, ...) is one type
//! implementing [`State`]. The machine owns the registered states by name and
//! keeps exactly one of them current. States never own their entity: the
//! entity's [`Body`] and a [`TickContext`] are lent to every call.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;

use crate::api::error::{EngineError, Result};
use crate::components::entity::Body;
use crate::core::context::TickContext;
use crate::renderer::instance::RenderBuffer;

/// Parameters handed to [`State::enter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateParams {
    values: HashMap<String, f32>,
}

impl StateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f32) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn with_vec2(self, key: &str, value: Vec2) -> Self {
        self.with(format!("{}.x", key), value.x)
            .with(format!("{}.y", key), value.y)
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    pub fn get_or(&self, key: &str, default: f32) -> f32 {
        self.get(key).unwrap_or(default)
    }

    pub fn get_vec2(&self, key: &str) -> Option<Vec2> {
        let x = self.get(&format!("{}.x", key))?;
        let y = self.get(&format!("{}.y", key))?;
        Some(Vec2::new(x, y))
    }

    /// True when `key` is present and non-zero.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).map(|v| v != 0.0).unwrap_or(false)
    }
}

/// A transition requested by a running state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub to: String,
    pub params: StateParams,
}

impl Transition {
    pub fn to(name: impl Into<String>) -> Self {
        Self {
            to: name.into(),
            params: StateParams::default(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: f32) -> Self {
        self.params = self.params.with(key, value);
        self
    }

    pub fn with_params(mut self, params: StateParams) -> Self {
        self.params = params;
        self
    }
}

/// One behavior of an entity. Every method defaults to a no-op.
pub trait State {
    /// Called once on registration with the name the state is stored under.
    fn set_name(&mut self, _name: &str) {}

    fn enter(&mut self, _body: &mut Body, _ctx: &mut TickContext<'_>, _params: &StateParams) {}

    fn exit(&mut self, _body: &mut Body, _ctx: &mut TickContext<'_>) {}

    /// Advance by `dt`. Returning a transition switches state (exit, then
    /// enter) before the machine's `update` returns; returning this state's
    /// own name re-enters it.
    fn update(&mut self, _body: &mut Body, _ctx: &mut TickContext<'_>, _dt: f32) -> Option<Transition> {
        None
    }

    /// Push extra render data (muzzle flashes, charge meters).
    fn render(&self, _body: &Body, _frame: &mut RenderBuffer) {}
}

#[derive(Default)]
pub struct StateMachine {
    states: HashMap<String, Box<dyn State>>,
    current: Option<String>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `state` under `name`, replacing any state already there.
    ///
    /// The most recently added state becomes current *without* `enter()`;
    /// follow with [`StateMachine::change`] to run entry logic.
    pub fn add(&mut self, name: impl Into<String>, state: impl State + 'static) {
        self.add_boxed(name, Box::new(state));
    }

    pub fn add_boxed(&mut self, name: impl Into<String>, mut state: Box<dyn State>) {
        let name = name.into();
        state.set_name(&name);
        self.states.insert(name.clone(), state);
        self.current = Some(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Exit the current state, then enter `name` with `params`.
    ///
    /// An unregistered `name` is rejected before anything runs: the current
    /// state stays current and its `exit()` is not called.
    pub fn change(
        &mut self,
        name: &str,
        params: &StateParams,
        body: &mut Body,
        ctx: &mut TickContext<'_>,
    ) -> Result<()> {
        if !self.states.contains_key(name) {
            log::warn!(
                "entity {:?}: rejected transition {:?} -> {:?} (not registered)",
                ctx.entity,
                self.current,
                name
            );
            return Err(EngineError::UnknownState(name.to_string()));
        }

        if let Some(current) = self.current.as_ref() {
            if let Some(state) = self.states.get_mut(current) {
                state.exit(body, ctx);
            }
        }

        log::debug!("entity {:?}: {:?} -> {}", ctx.entity, self.current, name);
        self.current = Some(name.to_string());

        if let Some(state) = self.states.get_mut(name) {
            state.enter(body, ctx, params);
        }
        Ok(())
    }

    /// Update the current state and apply any transition it requests.
    pub fn update(&mut self, dt: f32, body: &mut Body, ctx: &mut TickContext<'_>) -> Result<()> {
        let Some(current) = self.current.as_ref() else {
            return Ok(());
        };

        let transition = match self.states.get_mut(current) {
            Some(state) => state.update(body, ctx, dt),
            None => None,
        };

        match transition {
            Some(t) => self.change(&t.to, &t.params, body, ctx),
            None => Ok(()),
        }
    }

    pub fn render(&self, body: &Body, frame: &mut RenderBuffer) {
        if let Some(state) = self.current.as_ref().and_then(|name| self.states.get(name)) {
            state.render(body, frame);
        }
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StateMachine")
            .field("states", &names)
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::components::level::Level;
    use crate::core::context::Commands;
    use crate::core::timer::Timer;
    use crate::input::state::InputState;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every lifecycle call; optionally requests a transition on update.
    struct Recorder {
        name: String,
        log: Log,
        next: Option<Transition>,
    }

    impl Recorder {
        fn new(log: &Log) -> Self {
            Self {
                name: String::new(),
                log: Rc::clone(log),
                next: None,
            }
        }

        fn then(mut self, transition: Transition) -> Self {
            self.next = Some(transition);
            self
        }
    }

    impl State for Recorder {
        fn set_name(&mut self, name: &str) {
            self.name = name.to_string();
        }

        fn enter(&mut self, _body: &mut Body, _ctx: &mut TickContext<'_>, params: &StateParams) {
            self.log
                .borrow_mut()
                .push(format!("{}.enter({})", self.name, params.get_or("p", 0.0)));
        }

        fn exit(&mut self, _body: &mut Body, _ctx: &mut TickContext<'_>) {
            self.log.borrow_mut().push(format!("{}.exit", self.name));
        }

        fn update(&mut self, _body: &mut Body, _ctx: &mut TickContext<'_>, _dt: f32) -> Option<Transition> {
            self.log.borrow_mut().push(format!("{}.update", self.name));
            self.next.clone()
        }
    }

    struct World {
        input: InputState,
        level: Level,
        timer: Timer,
        commands: Commands,
    }

    impl World {
        fn new() -> Self {
            Self {
                input: InputState::new(),
                level: Level::empty(),
                timer: Timer::new(),
                commands: Commands::new(),
            }
        }

        fn ctx(&mut self) -> TickContext<'_> {
            TickContext::new(EntityId(1), &self.input, &self.level, &mut self.timer, &mut self.commands)
        }
    }

    fn body() -> Body {
        Body::new(Vec2::ZERO, Vec2::new(16.0, 16.0))
    }

    #[test]
    fn last_added_is_current_without_enter() {
        let log = Log::default();
        let mut fsm = StateMachine::new();
        assert_eq!(fsm.current_name(), None);

        fsm.add("a", Recorder::new(&log));
        fsm.add("b", Recorder::new(&log));
        assert_eq!(fsm.current_name(), Some("b"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn exit_runs_before_enter() {
        let log = Log::default();
        let mut world = World::new();
        let mut body = body();
        let mut fsm = StateMachine::new();
        fsm.add("B", Recorder::new(&log));
        fsm.add("A", Recorder::new(&log));

        let params = StateParams::new().with("p", 7.0);
        fsm.change("B", &params, &mut body, &mut world.ctx()).unwrap();

        assert_eq!(*log.borrow(), vec!["A.exit", "B.enter(7)"]);
        assert_eq!(fsm.current_name(), Some("B"));
    }

    #[test]
    fn unknown_state_is_rejected_without_side_effects() {
        let log = Log::default();
        let mut world = World::new();
        let mut body = body();
        let mut fsm = StateMachine::new();
        fsm.add("idle", Recorder::new(&log));

        let err = fsm
            .change("flying", &StateParams::new(), &mut body, &mut world.ctx())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownState(ref n) if n == "flying"));
        assert_eq!(fsm.current_name(), Some("idle"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn update_applies_requested_transition() {
        let log = Log::default();
        let mut world = World::new();
        let mut body = body();
        let mut fsm = StateMachine::new();
        fsm.add("fall", Recorder::new(&log));
        fsm.add("jump", Recorder::new(&log).then(Transition::to("fall").with("p", 2.0)));
        fsm.change("jump", &StateParams::new(), &mut body, &mut world.ctx()).unwrap();
        log.borrow_mut().clear();

        fsm.update(0.016, &mut body, &mut world.ctx()).unwrap();
        assert_eq!(*log.borrow(), vec!["jump.update", "jump.exit", "fall.enter(2)"]);
        assert_eq!(fsm.current_name(), Some("fall"));
    }

    #[test]
    fn self_transition_reenters_same_instance() {
        let log = Log::default();
        let mut world = World::new();
        let mut body = body();
        let mut fsm = StateMachine::new();
        fsm.add("attack", Recorder::new(&log).then(Transition::to("attack")));

        fsm.update(0.016, &mut body, &mut world.ctx()).unwrap();
        assert_eq!(*log.borrow(), vec!["attack.update", "attack.exit", "attack.enter(0)"]);
        assert_eq!(fsm.current_name(), Some("attack"));
    }

    #[test]
    fn update_with_no_states_is_a_noop() {
        let mut world = World::new();
        let mut body = body();
        let mut fsm = StateMachine::new();
        assert!(fsm.update(1.0, &mut body, &mut world.ctx()).is_ok());
    }

    #[test]
    fn params_round_trip_vectors_and_flags() {
        let p = StateParams::new()
            .with_vec2("knockback", Vec2::new(-3.0, 1.5))
            .with("crouch", 1.0);
        assert_eq!(p.get_vec2("knockback"), Some(Vec2::new(-3.0, 1.5)));
        assert!(p.flag("crouch"));
        assert!(!p.flag("roll"));
    }
}
