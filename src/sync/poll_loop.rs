//! Poll loop for a sync scheduler
//!
//! Runs the scheduler on its own thread, waking it every `loop_time` while
//! the clock is active. Smaller intervals track boundaries more tightly at
//! the cost of CPU; an interval of zero polls continuously.
//!
//! The thread owns the [`SyncScheduler`], so ticks never overlap and a
//! listener cannot start a nested tick.

use beatsync_core::clock::ClockSource;
use beatsync_core::observer::NotificationDispatcher;
use beatsync_core::timing::{SchedulerState, SyncScheduler};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Commands that can be sent to the poll thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollCommand {
    /// Playback started at this sample frame: re-anchor and start polling
    Start(f64),
    /// Start polling again from the current thresholds
    Resume,
    /// Stop polling; the scheduler goes idle
    Stop,
    /// Change the wait between ticks
    SetInterval(Duration),
    Shutdown,
}

/// Handle to a running poll thread
pub struct PollLoop {
    /// Command sender to control the poll thread
    command_tx: Sender<PollCommand>,
    /// Whether the thread is currently ticking
    running: Arc<AtomicBool>,
    /// Interval stored as nanoseconds for atomic access
    interval_nanos: Arc<AtomicU64>,
    /// Set while a `Resume` sits unhandled in the queue
    resume_pending: Arc<AtomicBool>,
    last_tick: Arc<Mutex<Option<Instant>>>,
    thread: Option<JoinHandle<()>>,
}

impl PollLoop {
    /// Spawn the poll thread. It waits idle until a `Start` or `Resume`.
    pub fn spawn(
        scheduler: SyncScheduler,
        clock: Arc<dyn ClockSource>,
        dispatcher: Arc<NotificationDispatcher>,
        interval: Duration,
    ) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::bounded(64);
        let running = Arc::new(AtomicBool::new(false));
        let interval_nanos = Arc::new(AtomicU64::new(duration_nanos(interval)));
        let resume_pending = Arc::new(AtomicBool::new(false));
        let last_tick = Arc::new(Mutex::new(None));

        let mut poll_thread = PollThread {
            scheduler,
            clock,
            dispatcher,
            command_rx,
            running: running.clone(),
            interval_nanos: interval_nanos.clone(),
            resume_pending: resume_pending.clone(),
            last_tick: last_tick.clone(),
        };
        let thread = thread::spawn(move || poll_thread.run());

        PollLoop {
            command_tx,
            running,
            interval_nanos,
            resume_pending,
            last_tick,
            thread: Some(thread),
        }
    }

    /// A sender for wiring external events (e.g. playback start) to this loop
    pub fn sender(&self) -> Sender<PollCommand> {
        self.command_tx.clone()
    }

    /// Re-anchor at `start_sample_frame` and start polling
    pub fn start(&self, start_sample_frame: f64) {
        let _ = self.command_tx.send(PollCommand::Start(start_sample_frame));
    }

    /// Ask the thread to continue from its current thresholds.
    ///
    /// Never blocks: at most one `Resume` is queued at a time, so a caller
    /// polling this every frame cannot fill the command queue while a
    /// listener holds up a tick. Returns true if a new request was queued.
    pub fn resume(&self) -> bool {
        if self.resume_pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        match self.command_tx.try_send(PollCommand::Resume) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Poll command queue full, resume dropped");
                self.resume_pending.store(false, Ordering::Release);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.resume_pending.store(false, Ordering::Release);
                false
            }
        }
    }

    pub fn stop(&self) {
        let _ = self.command_tx.send(PollCommand::Stop);
    }

    pub fn set_interval(&self, interval: Duration) {
        self.interval_nanos
            .store(duration_nanos(interval), Ordering::Relaxed);
        let _ = self.command_tx.send(PollCommand::SetInterval(interval));
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Relaxed))
    }

    /// Check if the thread is currently ticking
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Time since the last tick, `None` before the first one
    pub fn last_tick_age(&self) -> Option<Duration> {
        self.last_tick
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .map(|at| at.elapsed())
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        let _ = self.command_tx.send(PollCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn duration_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// State owned by the poll thread
struct PollThread {
    scheduler: SyncScheduler,
    clock: Arc<dyn ClockSource>,
    dispatcher: Arc<NotificationDispatcher>,
    command_rx: Receiver<PollCommand>,
    running: Arc<AtomicBool>,
    interval_nanos: Arc<AtomicU64>,
    resume_pending: Arc<AtomicBool>,
    last_tick: Arc<Mutex<Option<Instant>>>,
}

impl PollThread {
    fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Relaxed))
    }

    fn run(&mut self) {
        let mut next_tick = Instant::now();

        loop {
            if self.running.load(Ordering::Relaxed) {
                // Commands wake us early; otherwise tick at the deadline
                match self.command_rx.recv_deadline(next_tick) {
                    Ok(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                        if matches!(cmd, PollCommand::Start(_) | PollCommand::Resume) {
                            next_tick = Instant::now();
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        self.tick();
                        let interval = self.interval();
                        if interval.is_zero() {
                            thread::yield_now();
                        }
                        next_tick = Instant::now() + interval;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                // Blocking wait for commands when idle
                match self.command_rx.recv() {
                    Ok(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                        // First tick right away after (re)starting
                        next_tick = Instant::now();
                    }
                    Err(_) => break, // Channel closed
                }
            }
        }

        self.running.store(false, Ordering::Relaxed);
    }

    /// Returns true when the thread should exit
    fn handle_command(&mut self, cmd: PollCommand) -> bool {
        match cmd {
            PollCommand::Start(frame) => {
                self.scheduler.on_playback_start(frame);
                self.running.store(true, Ordering::Relaxed);
            }
            PollCommand::Resume => {
                self.resume_pending.store(false, Ordering::Release);
                if self.scheduler.resume() {
                    self.running.store(true, Ordering::Relaxed);
                } else {
                    log::debug!("Resume ignored: no playback start has been observed yet");
                }
            }
            PollCommand::Stop => {
                self.scheduler.stop();
                self.running.store(false, Ordering::Relaxed);
            }
            PollCommand::SetInterval(interval) => {
                self.interval_nanos
                    .store(duration_nanos(interval), Ordering::Relaxed);
            }
            PollCommand::Shutdown => {
                self.scheduler.stop();
                return true;
            }
        }
        false
    }

    fn tick(&mut self) {
        let report = self
            .scheduler
            .on_poll_tick(self.clock.as_ref(), &self.dispatcher);
        *self
            .last_tick
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());

        if report.stopped || self.scheduler.state() == SchedulerState::Idle {
            log::debug!("Clock inactive, poll loop going idle");
            self.running.store(false, Ordering::Relaxed);
        }
    }
}
