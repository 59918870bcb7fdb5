//! Beat synchronizer: one clock, one scheduler, one poll loop
//!
//! Hosts construct one synchronizer per synchronized audio stream and pass
//! it (or its registry) to whatever needs beat/bar notifications.

use crate::sync::poll_loop::{PollCommand, PollLoop};
use anyhow::Result;
use beatsync_core::clock::{ClockSource, SubscriptionId};
use beatsync_core::observer::{
    NotificationDispatcher, ObserverHandle, ObserverRegistry, SyncHook,
};
use beatsync_core::timing::{SamplePeriod, SyncScheduler};
use beatsync_core::types::sync_config::validate_loop_time;
use beatsync_core::types::SyncConfig;
use crossbeam_channel::TrySendError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Poll loop silence after which [`BeatSynchronizer::watchdog`] restarts it
pub const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Drives beat and bar notifications for one audio clock
pub struct BeatSynchronizer {
    config: SyncConfig,
    clock: Arc<dyn ClockSource>,
    dispatcher: Arc<NotificationDispatcher>,
    beat_period: SamplePeriod,
    bar_period: SamplePeriod,
    subscription: Option<SubscriptionId>,
    /// Set by a playback start, cleared by `stop`/`detach`. The watchdog
    /// only restarts polling while this is set.
    following: Arc<AtomicBool>,
    /// Whether the current stall has already been logged
    stall_reported: AtomicBool,
    poll_loop: PollLoop,
}

impl BeatSynchronizer {
    /// Validate `config` against the clock's sample rate, spawn the poll
    /// loop and subscribe to the clock's playback starts
    pub fn new(config: SyncConfig, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let scheduler = SyncScheduler::new(&config, clock.sample_rate())?;
        let beat_period = scheduler.beat_period();
        let bar_period = scheduler.bar_period();

        let registry = Arc::new(ObserverRegistry::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(registry));
        let poll_loop = PollLoop::spawn(
            scheduler,
            clock.clone(),
            dispatcher.clone(),
            loop_time(config.loop_time_ms),
        );

        let following = Arc::new(AtomicBool::new(false));
        let command_tx = poll_loop.sender();
        let started = following.clone();
        // Runs on the clock's thread, which must never wait on the poll loop
        let subscription = clock.playback_events().subscribe(move |frame| {
            started.store(true, Ordering::Release);
            if let Err(TrySendError::Full(_)) = command_tx.try_send(PollCommand::Start(frame)) {
                log::warn!("Poll command queue full, playback start at {} dropped", frame);
            }
        });

        log::info!(
            "Beat synchronizer ready: {} BPM, beat {} ({} samples), bar {} ({} samples), \
             poll {} ms",
            config.tempo_bpm,
            config.beat.value,
            beat_period.period_samples,
            config.bar.value,
            bar_period.period_samples,
            config.loop_time_ms
        );

        Ok(Self {
            config,
            clock,
            dispatcher,
            beat_period,
            bar_period,
            subscription: Some(subscription),
            following,
            stall_reported: AtomicBool::new(false),
            poll_loop,
        })
    }

    /// Add a listener; delivery follows registration order. It stays
    /// registered only while the caller keeps `handle` alive.
    pub fn register(&self, handle: ObserverHandle) {
        self.dispatcher.registry().register(handle);
    }

    /// Remove a listener; it receives nothing after the current dispatch
    pub fn unregister(&self, handle: &ObserverHandle) {
        self.dispatcher.registry().unregister(handle);
    }

    pub fn registry(&self) -> &Arc<ObserverRegistry> {
        self.dispatcher.registry()
    }

    /// Install the hook run right before every beat and bar dispatch
    pub fn set_sync_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let hook: SyncHook = Arc::new(hook);
        self.dispatcher.set_sync_hook(Some(hook));
    }

    pub fn clear_sync_hook(&self) {
        self.dispatcher.set_sync_hook(None);
    }

    /// Anchor to `start_sample_frame` directly, for clocks that do not emit
    /// playback-start events
    pub fn start_at(&self, start_sample_frame: f64) {
        self.following.store(true, Ordering::Release);
        self.poll_loop.start(start_sample_frame);
    }

    /// Stop checking; future ticks stop, an in-flight dispatch completes.
    /// Only a new playback start or [`start_at`](Self::start_at) restarts it.
    pub fn stop(&self) {
        self.following.store(false, Ordering::Release);
        self.poll_loop.stop();
    }

    /// Change the poll interval (milliseconds, zero = continuous)
    pub fn set_loop_time_ms(&mut self, loop_time_ms: f64) -> Result<()> {
        validate_loop_time(loop_time_ms)?;
        self.config.loop_time_ms = loop_time_ms;
        self.poll_loop.set_interval(loop_time(loop_time_ms));
        Ok(())
    }

    /// Restart a stalled poll loop.
    ///
    /// Call periodically (e.g. once per frame); never blocks. If the clock
    /// is playing but the loop is idle or has not ticked within
    /// [`STALL_TIMEOUT`], polling resumes from the current thresholds.
    /// Does nothing before the first playback start or after
    /// [`stop`](Self::stop) / [`detach`](Self::detach). Returns true if the
    /// loop was found stalled.
    pub fn watchdog(&self) -> bool {
        if !self.following.load(Ordering::Acquire) || !self.clock.is_active() {
            self.stall_reported.store(false, Ordering::Relaxed);
            return false;
        }
        let limit = STALL_TIMEOUT.max(self.poll_loop.interval() * 2);
        let stalled = !self.poll_loop.is_running()
            || self
                .poll_loop
                .last_tick_age()
                .is_some_and(|age| age > limit);
        if !stalled {
            self.stall_reported.store(false, Ordering::Relaxed);
            return false;
        }
        if !self.stall_reported.swap(true, Ordering::Relaxed) {
            log::warn!("Poll loop stalled while the clock is playing, resuming");
        }
        self.poll_loop.resume();
        true
    }

    /// Whether the poll loop is currently ticking
    pub fn is_polling(&self) -> bool {
        self.poll_loop.is_running()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn beat_period(&self) -> SamplePeriod {
        self.beat_period
    }

    pub fn bar_period(&self) -> SamplePeriod {
        self.bar_period
    }

    /// Stop following the clock's playback starts
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.clock.playback_events().unsubscribe(id);
        }
        self.stop();
    }
}

impl Drop for BeatSynchronizer {
    fn drop(&mut self) {
        self.detach();
        // The poll loop shuts its thread down when dropped
    }
}

fn loop_time(loop_time_ms: f64) -> Duration {
    Duration::from_secs_f64(loop_time_ms.max(0.0) / 1000.0)
}
