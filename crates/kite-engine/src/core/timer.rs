//! Task scheduler: one-shot delays, repeating intervals and tweens on one primitive.
//!
//! Usage:
//!   let mut timer = Timer::new();
//!   let handle = timer.wait(0.5, || log::info!("half a second later"));
//!   timer.every(0.1, |dt| { /* blink */ });
//!   timer.update(dt);   // once per tick
//!   handle.clear();     // cancel early; safe even after completion

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Interval and duration bookkeeping shared by tasks and animations.
///
/// `interval == 0` is continuous mode (fires every tick with the running total),
/// `interval > 0` is periodic mode (fires with `dt` once the accumulator reaches
/// the interval, then the accumulator resets to zero; overflow is dropped).
/// `duration == 0` never finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskClock {
    pub interval: f32,
    pub interval_timer: f32,
    pub total_time: f32,
    pub duration: f32,
}

/// Outcome of advancing a [`TaskClock`] by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockStep {
    /// Argument for the action if it fires this tick: total time in
    /// continuous mode, `dt` in periodic mode.
    pub fire: Option<f32>,
    /// The duration has been reached.
    pub finished: bool,
}

impl TaskClock {
    pub fn new(interval: f32, duration: f32) -> Self {
        Self {
            interval,
            duration,
            ..Default::default()
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.interval <= 0.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.duration <= 0.0
    }

    pub fn advance(&mut self, dt: f32) -> ClockStep {
        self.total_time += dt;
        self.interval_timer += dt;

        let fire = if self.is_continuous() {
            Some(self.total_time)
        } else if self.interval_timer >= self.interval {
            self.interval_timer = 0.0;
            Some(dt)
        } else {
            None
        };

        ClockStep {
            fire,
            finished: !self.is_unbounded() && self.total_time >= self.duration,
        }
    }

    pub fn reset(&mut self) {
        self.interval_timer = 0.0;
        self.total_time = 0.0;
    }
}

/// Cancellation handle for a scheduled task.
///
/// Cloning is cheap; all clones observe the same task. Clearing a task
/// that already finished (and was evicted) does nothing.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    done: Rc<Cell<bool>>,
}

impl TaskHandle {
    /// A handle for work that completed synchronously.
    pub(crate) fn completed() -> Self {
        Self {
            done: Rc::new(Cell::new(true)),
        }
    }

    pub(crate) fn pending() -> Self {
        Self {
            done: Rc::new(Cell::new(false)),
        }
    }

    /// Flag the task done. Its callback will not fire; the next
    /// scheduler update evicts it.
    pub fn clear(&self) {
        self.done.set(true);
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }
}

/// A time-driven unit of work.
pub struct Task {
    clock: TaskClock,
    action: Box<dyn FnMut(f32)>,
    callback: Option<Box<dyn FnOnce()>>,
    done: Rc<Cell<bool>>,
    settled: Option<Rc<Cell<bool>>>,
}

impl Task {
    /// A continuous, unbounded task running `action(total_time)` every tick.
    pub fn new(action: impl FnMut(f32) + 'static) -> Self {
        Self {
            clock: TaskClock::default(),
            action: Box::new(action),
            callback: None,
            done: Rc::new(Cell::new(false)),
            settled: None,
        }
    }

    // -- Builder methods --

    /// Run the action every `interval` seconds with `dt` instead of every tick.
    pub fn every(mut self, interval: f32) -> Self {
        self.clock.interval = interval;
        self
    }

    /// Finish after `duration` seconds of accumulated time.
    pub fn lasting(mut self, duration: f32) -> Self {
        self.clock.duration = duration;
        self
    }

    /// Run `callback` once when the duration is reached.
    pub fn then(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Keep running past the duration until the action sets `flag`.
    /// The callback waits with it.
    pub fn hold_until(mut self, flag: Rc<Cell<bool>>) -> Self {
        self.settled = Some(flag);
        self
    }

    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            done: Rc::clone(&self.done),
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    /// Cancel without firing the callback.
    pub fn clear(&self) {
        self.done.set(true);
    }

    pub fn clock(&self) -> &TaskClock {
        &self.clock
    }

    pub fn total_time(&self) -> f32 {
        self.clock.total_time
    }

    /// Advance by `dt`: accumulate time, run the action if due, then
    /// complete (callback first, exactly once) when the duration is reached.
    pub fn update(&mut self, dt: f32) {
        if self.done.get() {
            return;
        }

        let step = self.clock.advance(dt);
        if let Some(arg) = step.fire {
            (self.action)(arg);
        }

        // The action may have cancelled its own task through a handle.
        let settled = self.settled.as_ref().map(|flag| flag.get()).unwrap_or(true);
        if step.finished && settled && !self.done.get() {
            self.done.set(true);
            log::trace!("task finished after {:.3}s", self.clock.total_time);
            if let Some(callback) = self.callback.take() {
                callback();
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("clock", &self.clock)
            .field("has_callback", &self.callback.is_some())
            .field("done", &self.done.get())
            .finish()
    }
}

type Incoming = Rc<RefCell<Vec<Task>>>;

/// Schedules tasks from inside other tasks' actions and callbacks.
///
/// Tasks added through a spawner while the timer is updating are picked up
/// by the *next* update.
#[derive(Clone)]
pub struct TaskSpawner {
    incoming: Incoming,
}

impl TaskSpawner {
    pub fn add(&self, task: Task) -> TaskHandle {
        let handle = task.handle();
        self.incoming.borrow_mut().push(task);
        handle
    }

    pub fn wait(&self, duration: f32, callback: impl FnOnce() + 'static) -> TaskHandle {
        self.add(Task::new(|_| {}).lasting(duration).then(callback))
    }
}

/// Holds the tasks of one owning context (usually a play session).
pub struct Timer {
    tasks: Vec<Task>,
    incoming: Incoming,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            tasks: Vec::with_capacity(32),
            incoming: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Schedule a task. Returns a handle for early cancellation.
    pub fn add(&mut self, task: Task) -> TaskHandle {
        let handle = task.handle();
        self.incoming.borrow_mut().push(task);
        handle
    }

    /// `interval == 0` runs `action(total_time)` every tick, otherwise
    /// `action(dt)` every `interval` seconds. `duration == 0` never ends.
    pub fn add_task(
        &mut self,
        action: impl FnMut(f32) + 'static,
        interval: f32,
        duration: f32,
    ) -> TaskHandle {
        self.add(Task::new(action).every(interval).lasting(duration))
    }

    /// Fire `callback` once after `duration` seconds.
    pub fn wait(&mut self, duration: f32, callback: impl FnOnce() + 'static) -> TaskHandle {
        self.add(Task::new(|_| {}).lasting(duration).then(callback))
    }

    /// Run `action(dt)` every `interval` seconds until cancelled.
    pub fn every(&mut self, interval: f32, action: impl FnMut(f32) + 'static) -> TaskHandle {
        self.add(Task::new(action).every(interval))
    }

    /// A cloneable handle that can schedule from within actions.
    pub fn spawner(&self) -> TaskSpawner {
        TaskSpawner {
            incoming: Rc::clone(&self.incoming),
        }
    }

    /// Advance every task scheduled before this call, then evict finished
    /// and cancelled ones.
    pub fn update(&mut self, dt: f32) {
        self.tasks.append(&mut self.incoming.borrow_mut());

        for task in self.tasks.iter_mut() {
            task.update(dt);
        }

        self.tasks.retain(|task| !task.is_done());
    }

    /// Drop every task. No callbacks fire.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.incoming.borrow_mut().clear();
    }

    /// Number of held tasks, including ones waiting for the next update.
    pub fn len(&self) -> usize {
        self.tasks.len() + self.incoming.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("tasks", &self.tasks.len())
            .field("incoming", &self.incoming.borrow().len())
            .finish()
    }
}
