use thiserror::Error;

use crate::api::types::EntityId;

/// Errors surfaced by the simulation core.
///
/// All of them are local to the tick that produced them; nothing here is
/// retried or carried across ticks.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A transition named a state that was never registered.
    #[error("unknown state: {0}")]
    UnknownState(String),
    /// A tween named a property its target does not expose.
    #[error("unknown tween property: {0}")]
    UnknownProperty(String),
    /// A tween was given a different number of properties and end values.
    #[error("tween expects one end value per property ({properties} properties, {values} values)")]
    TweenArity { properties: usize, values: usize },
    /// An entity tween named an id that is not in the scene.
    #[error("unknown entity: {0:?}")]
    UnknownEntity(EntityId),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("level error: {0}")]
    Level(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
