// extensions/tween.rs
//
// Value interpolation built on the scheduler's continuous-mode task.
//
// Usage:
//   let fade = Rc::new(RefCell::new(Properties::new().with("alpha", 1.0)));
//   timer.tween(&fade, &["alpha"], &[0.0], 0.5, || {})?;
//   timer.update(dt);  // alpha walks linearly to exactly 0.0

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use crate::api::error::{EngineError, Result};
use crate::api::types::EntityId;
use crate::components::entity::Body;
use crate::core::scene::Scene;
use crate::core::timer::{Task, TaskHandle, TaskSpawner, Timer};

/// Anything with named numeric fields a tween can drive.
pub trait Tweenable {
    /// Current value of `property`, or `None` if the target has no such field.
    fn get(&self, property: &str) -> Option<f32>;
    /// Write `property`. Returns false if the target has no such field.
    fn set(&mut self, property: &str, value: f32) -> bool;
}

impl Tweenable for Vec2 {
    fn get(&self, property: &str) -> Option<f32> {
        match property {
            "x" => Some(self.x),
            "y" => Some(self.y),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: f32) -> bool {
        match property {
            "x" => self.x = value,
            "y" => self.y = value,
            _ => return false,
        }
        true
    }
}

/// A bag of named floats for cosmetic values a host wants animated
/// (flash opacity, score counters, shake strength).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, f32>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f32) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }
}

impl Tweenable for Properties {
    fn get(&self, property: &str) -> Option<f32> {
        self.value(property)
    }

    fn set(&mut self, property: &str, value: f32) -> bool {
        match self.values.get_mut(property) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Entity fields: `x`, `y` move the body (and its hitbox), `vx`, `vy` set
/// its velocity.
impl Tweenable for Body {
    fn get(&self, property: &str) -> Option<f32> {
        match property {
            "x" => Some(self.position.x),
            "y" => Some(self.position.y),
            "vx" => Some(self.velocity.x),
            "vy" => Some(self.velocity.y),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: f32) -> bool {
        match property {
            "x" => self.position.x = value,
            "y" => self.position.y = value,
            "vx" => self.velocity.x = value,
            "vy" => self.velocity.y = value,
            _ => return false,
        }
        if matches!(property, "x" | "y") {
            self.sync_hitbox();
        }
        true
    }
}

/// One interpolated field.
#[derive(Debug, Clone)]
struct Track {
    property: String,
    start: f32,
    end: f32,
}

impl Track {
    /// Linear value at `elapsed`, never past `end` in the direction of travel.
    fn sample(&self, elapsed: f32, duration: f32) -> f32 {
        if elapsed >= duration {
            return self.end;
        }
        let value = self.start + (self.end - self.start) * (elapsed / duration);
        if self.end >= self.start {
            value.min(self.end)
        } else {
            value.max(self.end)
        }
    }
}

/// Pair each property with its end value, reading start values from `current`.
fn tracks_for<T: Tweenable + ?Sized>(current: &T, properties: &[&str], end_values: &[f32]) -> Result<Vec<Track>> {
    if properties.len() != end_values.len() {
        return Err(EngineError::TweenArity {
            properties: properties.len(),
            values: end_values.len(),
        });
    }
    properties
        .iter()
        .zip(end_values)
        .map(|(&property, &end)| {
            current
                .get(property)
                .map(|start| Track {
                    property: property.to_string(),
                    start,
                    end,
                })
                .ok_or_else(|| EngineError::UnknownProperty(property.to_string()))
        })
        .collect()
}

fn apply_tracks<T: Tweenable + ?Sized>(target: &mut T, tracks: &[Track], elapsed: f32, duration: f32) {
    for track in tracks {
        target.set(&track.property, track.sample(elapsed, duration));
    }
}

/// Build a tween task without scheduling it. Start values are read now.
///
/// `duration <= 0` writes the end values immediately, runs the callback and
/// returns `Ok(None)`. The task does not finish, and its callback does not
/// run, until the end values have actually been written: a tick where the
/// target is borrowed elsewhere is retried on the next update.
pub fn tween_task<T: Tweenable + 'static>(
    target: &Rc<RefCell<T>>,
    properties: &[&str],
    end_values: &[f32],
    duration: f32,
    callback: impl FnOnce() + 'static,
) -> Result<Option<Task>> {
    let tracks = tracks_for(&*target.borrow(), properties, end_values)?;

    if duration <= 0.0 {
        if let Ok(mut current) = target.try_borrow_mut() {
            apply_tracks(&mut *current, &tracks, 0.0, 0.0);
            drop(current);
            callback();
            return Ok(None);
        }
    }
    // A zero-length tween on a busy target lands on the next update instead.
    let duration = duration.max(f32::MIN_POSITIVE);

    let settled = Rc::new(Cell::new(false));
    let reached_end = Rc::clone(&settled);
    let target = Rc::clone(target);
    let task = Task::new(move |elapsed| {
        // Skip the frame rather than panic if the host holds a borrow.
        let Ok(mut target) = target.try_borrow_mut() else {
            log::warn!("tween target busy, skipping frame at {:.3}s", elapsed);
            return;
        };
        apply_tracks(&mut *target, &tracks, elapsed, duration);
        if elapsed >= duration {
            reached_end.set(true);
        }
    })
    .lasting(duration)
    .hold_until(settled)
    .then(callback);

    Ok(Some(task))
}

impl Timer {
    /// Interpolate `properties` of `target` linearly to `end_values` over
    /// `duration` seconds. The last tick writes the end values exactly.
    pub fn tween<T: Tweenable + 'static>(
        &mut self,
        target: &Rc<RefCell<T>>,
        properties: &[&str],
        end_values: &[f32],
        duration: f32,
        callback: impl FnOnce() + 'static,
    ) -> Result<TaskHandle> {
        Ok(match tween_task(target, properties, end_values, duration, callback)? {
            Some(task) => self.add(task),
            None => TaskHandle::completed(),
        })
    }
}

impl TaskSpawner {
    /// [`Timer::tween`] from inside a running action.
    pub fn tween<T: Tweenable + 'static>(
        &self,
        target: &Rc<RefCell<T>>,
        properties: &[&str],
        end_values: &[f32],
        duration: f32,
        callback: impl FnOnce() + 'static,
    ) -> Result<TaskHandle> {
        Ok(match tween_task(target, properties, end_values, duration, callback)? {
            Some(task) => self.add(task),
            None => TaskHandle::completed(),
        })
    }
}

struct EntityTween {
    entity: EntityId,
    tracks: Vec<Track>,
    elapsed: f32,
    duration: f32,
    handle: TaskHandle,
    callback: Option<Box<dyn FnOnce()>>,
}

/// Tweens on scene entities, addressed by id instead of a shared cell.
///
/// Entities live inside the [`Scene`], so these cannot be plain timer
/// tasks; the owner ticks them with the scene after the timer. A tween whose
/// entity leaves the scene is dropped without running its callback.
#[derive(Default)]
pub struct EntityTweens {
    active: Vec<EntityTween>,
}

impl EntityTweens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpolate `properties` of entity `id` to `end_values` over
    /// `duration` seconds. Start values are read from the body now.
    ///
    /// Fails with [`EngineError::UnknownEntity`] if `id` is not in `scene`,
    /// and like [`tween_task`] on a bad property list.
    pub fn add(
        &mut self,
        scene: &mut Scene,
        id: EntityId,
        properties: &[&str],
        end_values: &[f32],
        duration: f32,
        callback: impl FnOnce() + 'static,
    ) -> Result<TaskHandle> {
        let body = &mut scene.get_mut(id).ok_or(EngineError::UnknownEntity(id))?.body;
        let tracks = tracks_for(&*body, properties, end_values)?;

        if duration <= 0.0 {
            apply_tracks(body, &tracks, 0.0, 0.0);
            callback();
            return Ok(TaskHandle::completed());
        }

        let handle = TaskHandle::pending();
        self.active.push(EntityTween {
            entity: id,
            tracks,
            elapsed: 0.0,
            duration,
            handle: handle.clone(),
            callback: Some(Box::new(callback)),
        });
        Ok(handle)
    }

    /// Advance every tween by `dt` and write the sampled values. Finished
    /// tweens land exactly on their end values, then run their callback.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        let mut finished = Vec::new();
        self.active.retain_mut(|tween| {
            if tween.handle.is_done() {
                return false;
            }
            let Some(entity) = scene.get_mut(tween.entity) else {
                log::debug!("entity {} left the scene, dropping its tween", tween.entity.0);
                tween.handle.clear();
                return false;
            };
            tween.elapsed += dt;
            apply_tracks(&mut entity.body, &tween.tracks, tween.elapsed, tween.duration);
            if tween.elapsed < tween.duration {
                return true;
            }
            // Mark done before the callback so it sees a finished handle.
            tween.handle.clear();
            if let Some(callback) = tween.callback.take() {
                finished.push(callback);
            }
            false
        });
        for callback in finished {
            callback();
        }
    }

    /// Drop every tween without running callbacks.
    pub fn clear(&mut self) {
        for tween in self.active.drain(..) {
            tween.handle.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity::Entity;

    #[test]
    fn tween_lands_exactly_on_end_value() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::ZERO));
        let done = Rc::new(Cell::new(0));
        let flag = Rc::clone(&done);

        timer
            .tween(&obj, &["x"], &[100.0], 1.0, move || flag.set(flag.get() + 1))
            .unwrap();

        let mut last = 0.0;
        for _ in 0..70 {
            timer.update(1.0 / 60.0);
            let x = obj.borrow().x;
            assert!(x <= 100.0, "overshot: {}", x);
            assert!(x >= last, "went backwards: {} < {}", x, last);
            last = x;
        }

        assert_eq!(obj.borrow().x, 100.0);
        assert_eq!(done.get(), 1);
        assert!(timer.is_empty());
    }

    #[test]
    fn tween_downwards_clamps_with_max() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Properties::new().with("alpha", 1.0)));
        timer.tween(&obj, &["alpha"], &[0.0], 0.3, || {}).unwrap();

        timer.update(0.1);
        let mid = obj.borrow().value("alpha").unwrap();
        assert!(mid < 1.0 && mid > 0.0);

        timer.update(0.7);
        assert_eq!(obj.borrow().value("alpha"), Some(0.0));
    }

    #[test]
    fn tween_halfway() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::new(0.0, 10.0)));
        timer.tween(&obj, &["x", "y"], &[50.0, 20.0], 2.0, || {}).unwrap();

        timer.update(1.0);
        let v = *obj.borrow();
        assert!((v.x - 25.0).abs() < 1e-4);
        assert!((v.y - 15.0).abs() < 1e-4);
    }

    #[test]
    fn tween_rejects_unknown_property() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::ZERO));
        let err = timer.tween(&obj, &["z"], &[1.0], 1.0, || {}).unwrap_err();
        assert!(matches!(err, EngineError::UnknownProperty(ref p) if p == "z"));
        assert!(timer.is_empty());
    }

    #[test]
    fn tween_rejects_mismatched_lengths() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::ZERO));
        let err = timer.tween(&obj, &["x", "y"], &[1.0], 1.0, || {}).unwrap_err();
        assert!(matches!(err, EngineError::TweenArity { properties: 2, values: 1 }));
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::ZERO));
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let handle = timer
            .tween(&obj, &["y"], &[-4.0], 0.0, move || flag.set(true))
            .unwrap();

        assert_eq!(obj.borrow().y, -4.0);
        assert!(fired.get());
        assert!(handle.is_done());
        assert!(timer.is_empty());
    }

    #[test]
    fn cancelled_tween_stops_midway() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::ZERO));
        let handle = timer.tween(&obj, &["x"], &[10.0], 1.0, || {}).unwrap();
        timer.update(0.5);
        handle.clear();
        timer.update(0.5);
        assert!((obj.borrow().x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn busy_target_on_last_tick_still_lands_on_end_value() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Vec2::ZERO));
        let fired = Rc::new(Cell::new(0));
        let flag = Rc::clone(&fired);
        let handle = timer
            .tween(&obj, &["x"], &[100.0], 1.0, move || flag.set(flag.get() + 1))
            .unwrap();

        timer.update(0.5);
        let guard = obj.borrow();
        timer.update(0.6);
        drop(guard);

        // The final write was skipped, so the tween is still pending.
        assert_eq!(obj.borrow().x, 50.0);
        assert_eq!(fired.get(), 0);
        assert!(!handle.is_done());
        assert!(!timer.is_empty());

        timer.update(1.0 / 60.0);
        assert_eq!(obj.borrow().x, 100.0);
        assert_eq!(fired.get(), 1);
        assert!(timer.is_empty());
    }

    #[test]
    fn zero_duration_on_busy_target_lands_next_update() {
        let mut timer = Timer::new();
        let obj = Rc::new(RefCell::new(Properties::new().with("alpha", 1.0)));
        let guard = obj.borrow();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let handle = timer.tween(&obj, &["alpha"], &[0.0], 0.0, move || flag.set(true)).unwrap();
        drop(guard);

        assert!(!fired.get());
        timer.update(1.0 / 60.0);
        assert_eq!(obj.borrow().value("alpha"), Some(0.0));
        assert!(fired.get());
        assert!(handle.is_done());
    }

    fn scene_with_body() -> (Scene, EntityId) {
        let mut scene = Scene::new();
        let id = scene.spawn(Entity::new(Body::new(Vec2::new(10.0, 20.0), Vec2::new(8.0, 8.0))));
        (scene, id)
    }

    #[test]
    fn body_exposes_position_and_velocity() {
        let mut body = Body::new(Vec2::new(1.0, 2.0), Vec2::new(4.0, 4.0));
        body.velocity = Vec2::new(3.0, -5.0);
        assert_eq!(body.get("vy"), Some(-5.0));
        assert_eq!(body.get("health"), None);

        assert!(body.set("x", 30.0));
        assert_eq!(body.hitbox.x(), 30.0);
        assert!(body.set("vx", 0.0));
        assert_eq!(body.velocity.x, 0.0);
        assert!(!body.set("z", 1.0));
    }

    #[test]
    fn entity_tween_moves_body_and_hitbox() {
        let (mut scene, id) = scene_with_body();
        let mut tweens = EntityTweens::new();
        let fired = Rc::new(Cell::new(0));
        let flag = Rc::clone(&fired);
        let handle = tweens
            .add(&mut scene, id, &["x", "vy"], &[50.0, 0.0], 1.0, move || flag.set(flag.get() + 1))
            .unwrap();

        tweens.update(&mut scene, 0.5);
        let body = &scene.get(id).unwrap().body;
        assert!((body.position.x - 30.0).abs() < 1e-4);
        assert_eq!(body.hitbox.x(), body.position.x);
        assert_eq!(fired.get(), 0);

        tweens.update(&mut scene, 0.75);
        let body = &scene.get(id).unwrap().body;
        assert_eq!(body.position.x, 50.0);
        assert_eq!(body.hitbox.x(), 50.0);
        assert_eq!(fired.get(), 1);
        assert!(handle.is_done());
        assert!(tweens.is_empty());
    }

    #[test]
    fn entity_tween_rejects_missing_entity() {
        let (mut scene, _) = scene_with_body();
        let mut tweens = EntityTweens::new();
        let err = tweens
            .add(&mut scene, EntityId(99), &["x"], &[1.0], 1.0, || {})
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownEntity(EntityId(99))));

        let (mut scene, id) = scene_with_body();
        let err = tweens.add(&mut scene, id, &["alpha"], &[1.0], 1.0, || {}).unwrap_err();
        assert!(matches!(err, EngineError::UnknownProperty(_)));
        assert!(tweens.is_empty());
    }

    #[test]
    fn despawned_entity_drops_its_tween_silently() {
        let (mut scene, id) = scene_with_body();
        let mut tweens = EntityTweens::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let handle = tweens.add(&mut scene, id, &["y"], &[0.0], 1.0, move || flag.set(true)).unwrap();

        scene.despawn(id);
        tweens.update(&mut scene, 2.0);
        assert!(!fired.get());
        assert!(handle.is_done());
        assert!(tweens.is_empty());
    }

    #[test]
    fn cleared_entity_tween_skips_callback() {
        let (mut scene, id) = scene_with_body();
        let mut tweens = EntityTweens::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let handle = tweens.add(&mut scene, id, &["x"], &[0.0], 1.0, move || flag.set(true)).unwrap();

        tweens.update(&mut scene, 0.5);
        handle.clear();
        tweens.update(&mut scene, 1.0);
        assert!(!fired.get());
        assert!((scene.get(id).unwrap().body.position.x - 5.0).abs() < 1e-4);
    }
}
