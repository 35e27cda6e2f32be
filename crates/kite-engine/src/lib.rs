pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod input;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::error::{EngineError, Result};
pub use api::game::{Game, GameConfig, EngineContext};
pub use api::runner::GameRunner;
pub use api::types::{Direction, EntityId, GameEvent};
pub use components::animation::{Animation, AnimationDef, AnimationSet};
pub use components::entity::{Body, Entity, HitboxProfileId};
pub use components::hitbox::{CollisionDirection, Colour, Hitbox, TieBreak};
pub use components::level::{Level, Tile, TileLookup};
pub use core::context::{Commands, TickContext};
pub use core::fsm::{State, StateMachine, StateParams, Transition};
pub use core::scene::{CollisionPair, Scene};
pub use core::states::Dying;
pub use core::time::FixedTimestep;
pub use core::timer::{Task, TaskClock, TaskHandle, TaskSpawner, Timer};
pub use renderer::camera::{Camera, CameraConfig};
pub use renderer::instance::{RenderBuffer, RenderInstance};
pub use input::{keys, InputEvent, InputQueue, InputState};

// Extensions: opt-in systems on top of the scheduler
pub use extensions::{tween_task, EntityTweens, Properties, Tweenable};
