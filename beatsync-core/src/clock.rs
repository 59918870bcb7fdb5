//! Sample clock abstraction
//!
//! The scheduler never owns audio playback. It reads a [`ClockSource`]:
//! a monotonic sample position plus a play-state flag, and learns about
//! playback starts through explicit [`PlaybackEvents`] subscriptions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A monotonic, sample-domain clock exposed by the playback subsystem
pub trait ClockSource: Send + Sync {
    /// Current position in sample frames (continuous while playing)
    fn current_sample_frame(&self) -> f64;

    /// Whether playback is running
    fn is_active(&self) -> bool;

    /// Frames per second
    fn sample_rate(&self) -> f64;

    /// Subscribers notified once per playback start
    fn playback_events(&self) -> &PlaybackEvents;
}

/// Identifies one playback-start subscription
pub type SubscriptionId = u64;

/// Callback receiving the sample frame at which playback starts
pub type PlaybackStartFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Explicit subscriber list for playback-start events
#[derive(Default)]
pub struct PlaybackEvents {
    subscribers: Mutex<Vec<(SubscriptionId, PlaybackStartFn)>>,
    next_id: AtomicU64,
}

impl PlaybackEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback; returns the id needed to remove it again
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().retain(|(sub_id, _)| *sub_id != id);
    }

    /// Notify every subscriber, in subscription order, that playback starts
    /// at `sync_sample_frame`
    pub fn emit(&self, sync_sample_frame: f64) {
        // Call outside the lock so callbacks may (un)subscribe
        let snapshot: Vec<PlaybackStartFn> =
            self.lock().iter().map(|(_, cb)| cb.clone()).collect();
        log::debug!(
            "Playback start at frame {} ({} subscribers)",
            sync_sample_frame,
            snapshot.len()
        );
        for callback in snapshot {
            callback(sync_sample_frame);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, PlaybackStartFn)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A clock advanced by hand
///
/// For hosts that already track their own sample position (a game loop,
/// an offline renderer) and for tests.
pub struct ManualClock {
    /// Position stored as f64 bits for atomic access
    position: AtomicU64,
    active: AtomicBool,
    sample_rate: f64,
    events: PlaybackEvents,
}

impl ManualClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            position: AtomicU64::new(0f64.to_bits()),
            active: AtomicBool::new(false),
            sample_rate,
            events: PlaybackEvents::new(),
        }
    }

    /// Start playback at `frame`: jumps there, becomes active and notifies subscribers
    pub fn play_from(&self, frame: f64) {
        self.set_position(frame);
        self.active.store(true, Ordering::Relaxed);
        self.events.emit(frame);
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Become active again without a playback-start event, like unpausing
    pub fn unpause(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn set_position(&self, frame: f64) {
        self.position.store(frame.to_bits(), Ordering::Relaxed);
    }

    /// Move forward by `frames`, returning the new position
    pub fn advance(&self, frames: f64) -> f64 {
        let next = self.current_sample_frame() + frames;
        self.set_position(next);
        next
    }
}

impl ClockSource for ManualClock {
    fn current_sample_frame(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Relaxed))
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn playback_events(&self) -> &PlaybackEvents {
        &self.events
    }
}
