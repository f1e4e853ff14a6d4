//! Leading and trailing edge throttling for redraws.
//!
//! Time is passed in explicitly so the event loop (and tests) own the clock. A limiter fires
//! immediately when idle, coalesces calls while its window is open, and delivers one trailing
//! call when the window closes if anything was coalesced.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    deadline: Option<Instant>,
    pending: bool,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register a call. Returns `true` when it should run right now.
    pub fn call(&mut self, now: Instant) -> bool {
        if let Some(deadline) = self.deadline
            && now >= deadline
        {
            // The window closed without anyone polling; settle it first.
            if self.pending {
                self.pending = false;
                self.deadline = Some(now + self.interval);
                return true;
            }
            self.deadline = None;
        }

        if self.deadline.is_none() {
            self.deadline = Some(now + self.interval);
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Advance the timer. Returns `true` when a coalesced call is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                if self.pending {
                    self.pending = false;
                    self.deadline = Some(now + self.interval);
                    true
                } else {
                    self.deadline = None;
                    false
                }
            }
            _ => false,
        }
    }

    /// When the next [`poll`](Self::poll) may have work, if ever.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_idle(&self) -> bool {
        self.deadline.is_none()
    }
}

/// A zero-argument callback guarded by a [`RateLimiter`].
pub struct Throttled<F> {
    limiter: RateLimiter,
    callback: F,
}

impl<F: FnMut()> Throttled<F> {
    pub fn new(interval: Duration, callback: F) -> Self {
        Self {
            limiter: RateLimiter::new(interval),
            callback,
        }
    }

    pub fn call(&mut self, now: Instant) {
        if self.limiter.call(now) {
            (self.callback)();
        }
    }

    pub fn poll(&mut self, now: Instant) {
        if self.limiter.poll(now) {
            (self.callback)();
        }
    }
}

/// Why a redraw was requested. Each reason is throttled on its own interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedrawReason {
    /// Chunk and module trees refreshing from loader progress.
    Tree,
    Chooser,
    /// Live search results.
    Search,
    Cycle,
    /// User input; never throttled.
    Input,
}

/// Redraw scheduler owned by the navigation engine.
#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    tree: RateLimiter,
    chooser: RateLimiter,
    search: RateLimiter,
    cycle: RateLimiter,
    forced: bool,
}

impl RedrawScheduler {
    pub fn new(tree: Duration, chooser: Duration, search: Duration, cycle: Duration) -> Self {
        Self {
            tree: RateLimiter::new(tree),
            chooser: RateLimiter::new(chooser),
            search: RateLimiter::new(search),
            cycle: RateLimiter::new(cycle),
            forced: false,
        }
    }

    /// Ask for a redraw. Returns `true` if the host should draw immediately.
    pub fn request(&mut self, reason: RedrawReason, now: Instant) -> bool {
        let fire = match reason {
            RedrawReason::Tree => self.tree.call(now),
            RedrawReason::Chooser => self.chooser.call(now),
            RedrawReason::Search => self.search.call(now),
            RedrawReason::Cycle => self.cycle.call(now),
            RedrawReason::Input => true,
        };
        self.forced |= fire;
        fire
    }

    /// Collects immediate requests and due trailing calls. Returns `true` if a redraw is owed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut due = std::mem::take(&mut self.forced);
        for limiter in [
            &mut self.tree,
            &mut self.chooser,
            &mut self.search,
            &mut self.cycle,
        ] {
            due |= limiter.poll(now);
        }
        due
    }
}
