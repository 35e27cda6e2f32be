use crate::api::types::{EntityId, GameEvent};
use crate::components::entity::Entity;
use crate::components::level::TileLookup;
use crate::core::timer::Timer;
use crate::input::state::InputState;

/// Deferred scene mutations requested by states mid-tick.
/// Applied by the engine after every entity has updated.
#[derive(Debug, Default)]
pub struct Commands {
    spawns: Vec<Entity>,
    despawns: Vec<EntityId>,
    events: Vec<GameEvent>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity (a projectile, a dropped pickup) for insertion.
    pub fn spawn(&mut self, entity: Entity) {
        self.spawns.push(entity);
    }

    /// Remove an entity immediately, skipping its death states.
    pub fn despawn(&mut self, id: EntityId) {
        self.despawns.push(id);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn take_spawns(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.spawns)
    }

    pub fn take_despawns(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.despawns)
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty() && self.despawns.is_empty() && self.events.is_empty()
    }
}

/// What a state sees of the world while it runs.
///
/// Input and level geometry are read-only; the scheduler and the command
/// buffer are the only shared things a state may mutate.
pub struct TickContext<'a> {
    /// The entity whose state machine is running.
    pub entity: EntityId,
    pub input: &'a InputState,
    pub level: &'a dyn TileLookup,
    pub timer: &'a mut Timer,
    pub commands: &'a mut Commands,
}

impl<'a> TickContext<'a> {
    pub fn new(
        entity: EntityId,
        input: &'a InputState,
        level: &'a dyn TileLookup,
        timer: &'a mut Timer,
        commands: &'a mut Commands,
    ) -> Self {
        Self {
            entity,
            input,
            level,
            timer,
            commands,
        }
    }
}
