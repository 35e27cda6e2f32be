// extensions/mod.rs
//
// Optional extension modules built on the core scheduler.
// Games opt in; nothing in core depends on them. The engine context
// ticks entity tweens alongside the scene.

pub mod tween;

pub use tween::{tween_task, EntityTweens, Properties, Tweenable};
