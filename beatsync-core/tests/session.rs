#[cfg(test)]
mod tests {
    use beatsync_core::clock::ManualClock;
    use beatsync_core::observer::{
        BeatObserver, NotificationDispatcher, ObserverHandle, ObserverRegistry,
    };
    use beatsync_core::types::{BeatType, BoundarySpec, NoteValue, SyncConfig};
    use beatsync_core::{ClockSource, SamplePeriod, SyncScheduler};
    use std::sync::{Arc, Mutex, Weak};

    /// Records "<name>:beat@<frame>" style entries
    struct Tagged {
        name: &'static str,
        clock: Arc<ManualClock>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl BeatObserver for Tagged {
        fn on_beat(&self, _beat_type: BeatType) -> anyhow::Result<()> {
            let frame = self.clock.current_sample_frame();
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:beat@{}", self.name, frame));
            Ok(())
        }

        fn on_bar(&self, _beat_type: BeatType) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("{}:bar", self.name));
            Ok(())
        }
    }

    fn session(
        config: &SyncConfig,
    ) -> (
        SyncScheduler,
        Arc<ManualClock>,
        NotificationDispatcher,
        Arc<Mutex<Vec<String>>>,
    ) {
        let clock = Arc::new(ManualClock::new(44100.0));
        let scheduler = SyncScheduler::new(config, 44100.0).unwrap();
        let dispatcher = NotificationDispatcher::new(Arc::new(ObserverRegistry::new()));
        (scheduler, clock, dispatcher, Arc::new(Mutex::new(Vec::new())))
    }

    #[test]
    fn test_unregister_mid_session() {
        let config = SyncConfig::new(120.0);
        let (mut scheduler, clock, dispatcher, log) = session(&config);

        let handles: Vec<ObserverHandle> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                Arc::new(Tagged {
                    name,
                    clock: clock.clone(),
                    log: log.clone(),
                }) as ObserverHandle
            })
            .collect();
        for handle in &handles {
            dispatcher.registry().register(handle.clone());
        }

        clock.play_from(0.0);
        scheduler.on_playback_start(0.0);
        clock.set_position(1.0);
        scheduler.on_poll_tick(clock.as_ref(), &dispatcher);

        dispatcher.registry().unregister(&handles[1]);
        log.lock().unwrap().clear();

        clock.set_position(22050.0);
        scheduler.on_poll_tick(clock.as_ref(), &dispatcher);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:beat@22050", "c:beat@22050"]
        );
    }

    /// Unregisters itself the first time it hears a beat
    struct OneShot {
        registry: Arc<ObserverRegistry>,
        me: Mutex<Weak<OneShot>>,
        heard: Mutex<u32>,
    }

    impl BeatObserver for OneShot {
        fn on_beat(&self, _beat_type: BeatType) -> anyhow::Result<()> {
            *self.heard.lock().unwrap() += 1;
            if let Some(me) = self.me.lock().unwrap().upgrade() {
                let handle: ObserverHandle = me;
                self.registry.unregister(&handle);
            }
            Ok(())
        }
    }

    #[test]
    fn test_listener_can_unregister_itself_during_dispatch() {
        let registry = Arc::new(ObserverRegistry::new());
        let dispatcher = NotificationDispatcher::new(registry.clone());
        let clock = ManualClock::new(44100.0);
        let mut scheduler = SyncScheduler::new(&SyncConfig::new(120.0), 44100.0).unwrap();

        let one_shot = Arc::new(OneShot {
            registry: registry.clone(),
            me: Mutex::new(Weak::new()),
            heard: Mutex::new(0),
        });
        *one_shot.me.lock().unwrap() = Arc::downgrade(&one_shot);
        registry.register(one_shot.clone());

        clock.play_from(0.0);
        scheduler.on_playback_start(0.0);
        // Three beats in one tick: the listener hears only the first
        clock.set_position(44100.0);
        let report = scheduler.on_poll_tick(&clock, &dispatcher);

        assert_eq!(report.beats, 3);
        assert_eq!(*one_shot.heard.lock().unwrap(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bars_land_on_beats() {
        let config = SyncConfig::new(90.0)
            .with_beat(BoundarySpec::new(NoteValue::Quarter))
            .with_bar(BoundarySpec::new(NoteValue::Whole));
        let (mut scheduler, clock, dispatcher, log) = session(&config);
        let tagged: ObserverHandle = Arc::new(Tagged {
            name: "x",
            clock: clock.clone(),
            log: log.clone(),
        });
        dispatcher.registry().register(tagged.clone());

        assert_eq!(
            scheduler.bar_period().period_samples,
            scheduler.beat_period().period_samples * 4.0
        );

        clock.play_from(0.0);
        scheduler.on_playback_start(0.0);
        let beat = scheduler.beat_period().period_samples;
        for n in 0..=8 {
            clock.set_position(beat * n as f64);
            scheduler.on_poll_tick(clock.as_ref(), &dispatcher);
        }

        let entries = log.lock().unwrap();
        let bars: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.ends_with(":bar"))
            .map(|(i, _)| i)
            .collect();
        // Every bar immediately follows a beat from the same tick
        assert_eq!(bars.len(), 3);
        for i in bars {
            assert!(entries[i - 1].starts_with("x:beat@"));
        }
    }

    #[test]
    fn test_bar_negative_offset_matches_beat_handling() {
        let beat = BoundarySpec::beat().with_negative_offset(NoteValue::Eighth);
        let bar = BoundarySpec::bar().with_negative_offset(NoteValue::Quarter);

        let beat_period = SamplePeriod::for_spec(&beat, 120.0, 44100.0).unwrap();
        let bar_period = SamplePeriod::for_spec(&bar, 120.0, 44100.0).unwrap();

        assert_eq!(beat_period.offset_samples, 11025.0);
        assert_eq!(bar_period.offset_samples, 88200.0 - 22050.0);
    }

    #[test]
    fn test_arming_twice_is_identical() {
        let config = SyncConfig::new(97.5)
            .with_beat(BoundarySpec::new(NoteValue::EighthDotted).with_offset(NoteValue::Sixteenth))
            .with_bar(BoundarySpec::new(NoteValue::Half).with_scalar(3));

        let first = SyncScheduler::new(&config, 48000.0).unwrap();
        let second = SyncScheduler::new(&config, 48000.0).unwrap();
        assert_eq!(first.beat_period(), second.beat_period());
        assert_eq!(first.bar_period(), second.bar_period());
    }
}
