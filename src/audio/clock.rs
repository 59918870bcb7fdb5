//! Hardware sample clock on a cpal output stream
//!
//! The output callback counts every frame the device consumes, which gives a
//! monotonic sample position driven by the audio hardware itself. The
//! stream renders silence; it exists to be timed against.

use anyhow::{anyhow, Result};
use beatsync_core::clock::{ClockSource, PlaybackEvents};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Frame counter shared between the audio callback and the scheduler
pub struct CpalClock {
    frames: AtomicU64,
    playing: AtomicBool,
    sample_rate: f64,
    events: PlaybackEvents,
}

impl CpalClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            frames: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            sample_rate,
            events: PlaybackEvents::new(),
        }
    }

    /// Called from the audio callback for every rendered buffer
    fn advance_frames(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
    }

    /// Mark playback as started at `start_frame` and notify subscribers
    fn begin(&self, start_frame: f64) {
        self.playing.store(true, Ordering::Relaxed);
        self.events.emit(start_frame);
    }

    fn end(&self) {
        self.playing.store(false, Ordering::Relaxed);
    }

    /// Frame at which playback would start after `delay`
    fn scheduled_frame(&self, delay: Duration) -> f64 {
        self.current_sample_frame() + delay.as_secs_f64() * self.sample_rate
    }
}

impl ClockSource for CpalClock {
    fn current_sample_frame(&self) -> f64 {
        self.frames.load(Ordering::Relaxed) as f64
    }

    fn is_active(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn playback_events(&self) -> &PlaybackEvents {
        &self.events
    }
}

/// Owns the output stream that drives a [`CpalClock`]
///
/// Kept separate from the clock because cpal streams are not `Send`; the
/// clock itself can be shared with the poll thread.
pub struct AudioClockStream {
    stream: Stream,
    clock: Arc<CpalClock>,
}

impl AudioClockStream {
    /// Open the default output device
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;
        let config = device.default_output_config()?;

        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let clock = Arc::new(CpalClock::new(config.sample_rate.0 as f64));

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, clock.clone())?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, clock.clone())?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, clock.clone())?,
            _ => return Err(anyhow!("Unsupported sample format: {:?}", sample_format)),
        };
        log::info!(
            "Audio clock on '{}': {} Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate.0,
            config.channels
        );

        Ok(AudioClockStream { stream, clock })
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        clock: Arc<CpalClock>,
    ) -> Result<Stream>
    where
        T: Sample + SizedSample + Send + 'static,
    {
        let channels = config.channels.max(1) as usize;
        let err_fn = |err| log::error!("an error occurred on the output audio stream: {:?}", err);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    data.fill(T::EQUILIBRIUM);
                    clock.advance_frames((data.len() / channels) as u64);
                },
                err_fn,
                None,
            )
            .map_err(|e| anyhow!("Failed to build output stream: {}", e))?;

        Ok(stream)
    }

    /// Shared handle to the clock, for synchronizers
    pub fn clock(&self) -> Arc<CpalClock> {
        self.clock.clone()
    }

    /// Start the stream and schedule playback `delay` from now.
    ///
    /// Subscribers receive the scheduled start frame, so thresholds line up
    /// with that frame rather than with whenever the first poll happens.
    pub fn play_scheduled(&self, delay: Duration) -> Result<f64> {
        self.stream
            .play()
            .map_err(|e| anyhow!("Failed to play stream: {}", e))?;
        let start_frame = self.clock.scheduled_frame(delay);
        self.clock.begin(start_frame);
        Ok(start_frame)
    }

    pub fn stop(&self) -> Result<()> {
        self.clock.end();
        self.stream
            .pause()
            .map_err(|e| anyhow!("Failed to pause stream: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_creation() {
        // This test may fail on systems without audio devices
        match AudioClockStream::open_default() {
            Ok(stream) => {
                assert!(stream.clock().sample_rate() > 0.0);
                assert!(!stream.clock().is_active());
            }
            Err(_) => {
                // This is expected on systems without audio devices (like CI)
                println!("AudioClockStream creation failed - likely no audio device available");
            }
        }
    }

    #[test]
    fn test_frame_counting() {
        let clock = CpalClock::new(48000.0);
        clock.advance_frames(512);
        clock.advance_frames(512);
        assert_eq!(clock.current_sample_frame(), 1024.0);
    }

    #[test]
    fn test_scheduled_start_emits_future_frame() {
        let clock = CpalClock::new(48000.0);
        clock.advance_frames(4800);

        let seen = Arc::new(AtomicU64::new(0));
        let s = seen.clone();
        clock
            .playback_events()
            .subscribe(move |frame| s.store(frame as u64, Ordering::Relaxed));

        let start = clock.scheduled_frame(Duration::from_millis(100));
        assert_eq!(start, 9600.0);
        clock.begin(start);
        assert!(clock.is_active());
        assert_eq!(seen.load(Ordering::Relaxed), 9600);

        clock.end();
        assert!(!clock.is_active());
    }
}
