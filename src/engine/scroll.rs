use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollEvent {
    Start,
    End,
}

pub trait ScrollListener {
    fn on_scroll_start(&mut self);
    fn on_scroll_end(&mut self);
}

impl<F: FnMut(ScrollEvent)> ScrollListener for F {
    fn on_scroll_start(&mut self) {
        self(ScrollEvent::Start)
    }

    fn on_scroll_end(&mut self) {
        self(ScrollEvent::End)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollState {
    Idle,
    Active,
}

/// A recheck waiting on the event loop. It carries no snapshot of the
/// activity it was scheduled for; the monitor's current timestamp decides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledRecheck {
    pub due: Duration,
}

/// Turns a stream of "position changed" notifications into one start event
/// per burst and one end event after the stream has been quiet for a full
/// interval.
pub struct ScrollActivityMonitor<C: Clock = MonotonicClock> {
    clock: C,
    interval: Duration,
    state: ScrollState,
    last_update: Option<Duration>,
    pending: Option<ScheduledRecheck>,
    listener: Option<Box<dyn ScrollListener>>,
}

impl<C: Clock> ScrollActivityMonitor<C> {
    pub fn new(clock: C) -> Self {
        Self::with_interval(clock, DEFAULT_RECHECK_INTERVAL)
    }

    pub fn with_interval(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            state: ScrollState::Idle,
            last_update: None,
            pending: None,
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: impl ScrollListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_update(&self) -> Option<Duration> {
        self.last_update
    }

    pub fn pending_recheck(&self) -> Option<ScheduledRecheck> {
        self.pending
    }

    pub fn on_position_changed(&mut self) {
        let now = self.clock.now();
        if self.state == ScrollState::Idle {
            self.state = ScrollState::Active;
            tracing::debug!(at_ms = now.as_millis() as u64, "scroll started");
            if let Some(listener) = self.listener.as_mut() {
                listener.on_scroll_start();
            }
            self.schedule(now);
        }
        self.last_update = Some(now);
    }

    /// Fire the pending recheck if it is due. Called from the event loop tick.
    pub fn poll(&mut self) -> bool {
        match self.pending {
            Some(task) if self.clock.now() >= task.due => {
                self.recheck();
                true
            }
            _ => false,
        }
    }

    pub fn recheck(&mut self) {
        self.pending = None;
        if self.state != ScrollState::Active {
            return;
        }

        let now = self.clock.now();
        let quiet_for = self
            .last_update
            .map_or(self.interval, |last| now.saturating_sub(last));

        if quiet_for >= self.interval {
            self.state = ScrollState::Idle;
            self.last_update = None;
            tracing::debug!(at_ms = now.as_millis() as u64, "scroll ended");
            if let Some(listener) = self.listener.as_mut() {
                listener.on_scroll_end();
            }
        } else {
            self.schedule(now);
        }
    }

    /// Cancel any pending recheck and drop the listener without emitting an
    /// end event.
    pub fn detach(&mut self) {
        self.pending = None;
        self.clear_listener();
        self.state = ScrollState::Idle;
        self.last_update = None;
    }

    fn schedule(&mut self, now: Duration) {
        self.pending = Some(ScheduledRecheck {
            due: now + self.interval,
        });
    }
}
