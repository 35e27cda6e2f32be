//! Frame-index animations.
//!
//! An animation is an ordered list of frame indices stepped by the
//! scheduler's periodic [`TaskClock`]; the renderer reads the current index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::timer::TaskClock;

/// Static frame table for one animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDef {
    /// Frame indices in playback order.
    pub frames: Vec<u32>,
    /// Seconds per frame.
    pub interval: f32,
    /// Number of full cycles before stopping on the last frame. `None` loops forever.
    #[serde(default)]
    pub repeat: Option<u32>,
}

impl AnimationDef {
    pub fn new(frames: Vec<u32>, interval: f32) -> Self {
        Self {
            frames,
            interval,
            repeat: None,
        }
    }

    /// Consecutive frames `start..start + count` at `fps`.
    pub fn strip(start: u32, count: u32, fps: f32) -> Self {
        Self::new((start..start + count).collect(), 1.0 / fps)
    }

    pub fn repeat(mut self, cycles: u32) -> Self {
        self.repeat = Some(cycles);
        self
    }

    pub fn once(self) -> Self {
        self.repeat(1)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn cycle_duration(&self) -> f32 {
        self.interval * self.frames.len() as f32
    }
}

/// Playback state of one [`AnimationDef`].
#[derive(Debug, Clone)]
pub struct Animation {
    def: AnimationDef,
    clock: TaskClock,
    frame_index: usize,
    cycles: u32,
    done: bool,
}

impl Animation {
    pub fn new(def: AnimationDef) -> Self {
        let clock = TaskClock::new(def.interval, 0.0);
        Self {
            def,
            clock,
            frame_index: 0,
            cycles: 0,
            done: false,
        }
    }

    pub fn def(&self) -> &AnimationDef {
        &self.def
    }

    /// Current frame index for the renderer (0 for an empty table).
    pub fn current_frame(&self) -> u32 {
        self.def.frames.get(self.frame_index).copied().unwrap_or(0)
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// All requested cycles have played. Looping animations never finish.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn reset(&mut self) {
        self.clock.reset();
        self.frame_index = 0;
        self.cycles = 0;
        self.done = false;
    }

    /// Advance by `dt`. Returns true if the displayed frame changed.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.done || self.def.frames.is_empty() {
            return false;
        }

        if self.clock.advance(dt).fire.is_none() {
            return false;
        }

        let previous = self.frame_index;
        self.frame_index += 1;
        if self.frame_index >= self.def.frames.len() {
            self.cycles += 1;
            match self.def.repeat {
                Some(limit) if self.cycles >= limit => {
                    self.frame_index = self.def.frames.len() - 1;
                    self.done = true;
                }
                _ => self.frame_index = 0,
            }
        }
        previous != self.frame_index
    }
}

/// Named animations for an entity, with one of them playing.
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    defs: HashMap<String, AnimationDef>,
    current: Option<(String, Animation)>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, def: AnimationDef) -> Self {
        self.add(name, def);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, def: AnimationDef) {
        self.defs.insert(name.into(), def);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Play a named animation from its first frame. Returns false if unknown.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(def) = self.defs.get(name) else {
            log::warn!("no animation named {:?}", name);
            return false;
        };
        self.current = Some((name.to_string(), Animation::new(def.clone())));
        true
    }

    /// Play only if a different animation is showing.
    pub fn play_if_different(&mut self, name: &str) -> bool {
        if self.current_name() == Some(name) {
            return true;
        }
        self.play(name)
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn current(&self) -> Option<&Animation> {
        self.current.as_ref().map(|(_, anim)| anim)
    }

    pub fn current_frame(&self) -> u32 {
        self.current().map(Animation::current_frame).unwrap_or(0)
    }

    /// True when nothing is playing or the current animation finished.
    pub fn is_done(&self) -> bool {
        self.current().map(Animation::is_done).unwrap_or(true)
    }

    pub fn update(&mut self, dt: f32) -> bool {
        match &mut self.current {
            Some((_, anim)) => anim.update(dt),
            None => false,
        }
    }
}
