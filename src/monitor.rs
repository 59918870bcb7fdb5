//! Terminal beat monitor
//!
//! Plays silence on the default output device and prints every beat and bar
//! the synchronizer reports, so offsets and poll intervals can be checked by
//! eye against the audio clock.

use crate::audio::AudioClockStream;
use crate::sync::BeatSynchronizer;
use anyhow::{anyhow, Result};
use beatsync_core::clock::ClockSource;
use beatsync_core::types::note_value::parse_optional;
use beatsync_core::{BeatObserver, BeatType, BoundarySpec, NoteValue, SyncConfig};
use colored::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Delay between scheduling playback and its first frame
const START_DELAY: Duration = Duration::from_millis(200);

const USAGE: &str = "usage: beatsync [BPM] [LOOP_MS] [BEAT] [BAR] [BEAT_OFFSET] [SECONDS]\n\
                     e.g.  beatsync 120 30 1/8 1/1 -1/16 10";

/// Settings parsed from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorArgs {
    pub config: SyncConfig,
    pub seconds: f64,
}

impl MonitorArgs {
    /// Parse positional arguments. Missing trailing arguments keep defaults;
    /// a beat offset prefixed with `-` shifts behind the beat.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        if args.iter().any(|a| a == "-h" || a == "--help") {
            return Err(anyhow!(USAGE));
        }

        let mut config = SyncConfig::default();
        let mut seconds = 16.0;

        if let Some(bpm) = args.first() {
            config.tempo_bpm = bpm
                .parse()
                .map_err(|_| anyhow!("Invalid BPM '{}'\n{}", bpm, USAGE))?;
        }
        if let Some(ms) = args.get(1) {
            config.loop_time_ms = ms
                .parse()
                .map_err(|_| anyhow!("Invalid loop time '{}'\n{}", ms, USAGE))?;
        }
        if let Some(beat) = args.get(2) {
            config.beat = BoundarySpec::new(beat.parse::<NoteValue>()?);
        }
        if let Some(bar) = args.get(3) {
            config.bar = BoundarySpec::new(bar.parse::<NoteValue>()?);
        }
        if let Some(offset) = args.get(4) {
            let (negative, value) = match offset.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, offset.as_str()),
            };
            if let Some(value) = parse_optional(value)? {
                config.beat = if negative {
                    config.beat.with_negative_offset(value)
                } else {
                    config.beat.with_offset(value)
                };
            }
        }
        if let Some(secs) = args.get(5) {
            seconds = secs
                .parse()
                .map_err(|_| anyhow!("Invalid duration '{}'\n{}", secs, USAGE))?;
        }

        config.validate()?;
        Ok(Self { config, seconds })
    }
}

/// Prints each boundary with the clock position it was observed at
struct Printer {
    clock: Arc<dyn ClockSource>,
    beats: AtomicU64,
    bars: AtomicU64,
}

impl BeatObserver for Printer {
    fn on_beat(&self, beat_type: BeatType) -> anyhow::Result<()> {
        let n = self.beats.fetch_add(1, Ordering::Relaxed) + 1;
        println!(
            "{} {:>4} {} @ {:.0}",
            "beat".bright_cyan(),
            n,
            beat_type.name().dimmed(),
            self.clock.current_sample_frame()
        );
        Ok(())
    }

    fn on_bar(&self, beat_type: BeatType) -> anyhow::Result<()> {
        let n = self.bars.fetch_add(1, Ordering::Relaxed) + 1;
        println!(
            "{} {:>4} {} @ {:.0}",
            "BAR ".bright_yellow().bold(),
            n,
            beat_type.name().dimmed(),
            self.clock.current_sample_frame()
        );
        Ok(())
    }
}

/// Open the default device and print beats for `args.seconds`
pub fn run(args: MonitorArgs) -> Result<()> {
    let stream = AudioClockStream::open_default()?;
    let clock = stream.clock();
    let sync = BeatSynchronizer::new(args.config.clone(), clock.clone())?;

    let printer = Arc::new(Printer {
        clock: clock.clone(),
        beats: AtomicU64::new(0),
        bars: AtomicU64::new(0),
    });
    sync.register(printer.clone());

    println!(
        "{} {} BPM, beat {} ({:.1} samples), bar {} ({:.1} samples), poll {} ms",
        "♩".bright_green(),
        args.config.tempo_bpm,
        args.config.beat.value,
        sync.beat_period().period_samples,
        args.config.bar.value,
        sync.bar_period().period_samples,
        args.config.loop_time_ms
    );

    let start_frame = stream.play_scheduled(START_DELAY)?;
    log::debug!("Playback scheduled at frame {}", start_frame);

    let deadline = Instant::now() + START_DELAY + Duration::from_secs_f64(args.seconds.max(0.0));
    while Instant::now() < deadline {
        thread::sleep(Duration::from_millis(100));
        sync.watchdog();
    }

    stream.stop()?;
    println!(
        "{} {} beats, {} bars",
        "Done:".bright_green(),
        printer.beats.load(Ordering::Relaxed),
        printer.bars.load(Ordering::Relaxed)
    );
    Ok(())
}
