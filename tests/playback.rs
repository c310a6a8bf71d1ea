//! Playback engine integration tests
//!
//! Drives the state machine through a thread-safe fake resource, the way
//! a UI timeline would: issue a command, deliver whatever events the
//! resource produced, observe the snapshot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use timbre_studio::playback::{
    EventSink, MediaEvent, MediaResource, Phase, PlayableItem, PlaybackEngine, ResourceFactory,
};
use timbre_studio::voices::Service;
use timbre_studio::Result;

/// Tracks every resource the factory has handed out
#[derive(Default)]
struct Rig {
    sinks: Mutex<Vec<EventSink>>,
    live: AtomicUsize,
    peak_live: AtomicUsize,
}

impl Rig {
    fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    fn emit(&self, index: usize, event: MediaEvent) {
        self.sinks.lock().unwrap()[index].emit(event);
    }
}

struct RigResource {
    rig: Arc<Rig>,
}

impl MediaResource for RigResource {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _seconds: f64) {}
    fn set_volume(&mut self, _volume: f64) {}
}

impl Drop for RigResource {
    fn drop(&mut self) {
        self.rig.live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct RigFactory {
    rig: Arc<Rig>,
}

impl ResourceFactory for RigFactory {
    fn open(&self, _url: &str, sink: EventSink) -> Result<Box<dyn MediaResource>> {
        self.rig.sinks.lock().unwrap().push(sink);
        let live = self.rig.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.rig.peak_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(RigResource {
            rig: Arc::clone(&self.rig),
        }))
    }
}

fn setup() -> (PlaybackEngine, Arc<Rig>) {
    let rig = Arc::new(Rig::default());
    let engine = PlaybackEngine::new(Box::new(RigFactory {
        rig: Arc::clone(&rig),
    }));
    (engine, rig)
}

fn item(id: &str) -> PlayableItem {
    PlayableItem {
        id: id.to_string(),
        url: format!("https://cdn.example.com/{id}.mp3"),
        title: format!("clip {id}"),
        voice: "Andreas".to_string(),
        service: Service::StyleTts2,
        duration: None,
    }
}

#[test]
fn no_two_resources_are_ever_live_at_once() {
    let (mut engine, rig) = setup();

    // A busy session: rapid switches, toggles, stops, replays
    engine.play(item("a")).unwrap();
    engine.play(item("b")).unwrap();
    rig.emit(1, MediaEvent::CanPlay);
    engine.pump();
    engine.play(item("b")).unwrap(); // toggle to paused
    engine.play(item("c")).unwrap();
    engine.stop();
    engine.play(item("c")).unwrap();
    rig.emit(3, MediaEvent::MetadataReady(8.0));
    engine.pump();
    engine.seek(4.0);
    engine.play(item("a")).unwrap();
    engine.clear();

    assert_eq!(rig.peak(), 1);
    assert_eq!(rig.live(), 0);
}

#[test]
fn full_listen_through_lifecycle() {
    let (mut engine, rig) = setup();

    engine.play(item("a")).unwrap();
    assert_eq!(engine.state().phase, Phase::Loading);

    rig.emit(0, MediaEvent::MetadataReady(12.0));
    rig.emit(0, MediaEvent::CanPlay);
    engine.pump();
    assert_eq!(engine.state().phase, Phase::Playing);

    rig.emit(0, MediaEvent::TimeUpdate(6.0));
    engine.pump();
    assert!((engine.state().position - 6.0).abs() < f64::EPSILON);

    engine.pause();
    assert_eq!(engine.state().phase, Phase::Paused);
    engine.resume();
    assert_eq!(engine.state().phase, Phase::Playing);

    rig.emit(0, MediaEvent::Ended);
    engine.pump();
    assert_eq!(engine.state().phase, Phase::Stopped);
    assert!(engine.state().position.abs() < f64::EPSILON);
    assert_eq!(
        engine.state().current_item.as_ref().map(|i| i.id.as_str()),
        Some("a")
    );
}

#[test]
fn volume_always_lands_in_unit_range() {
    let (mut engine, _rig) = setup();

    for (input, expected) in [
        (-1.0, 0.0),
        (0.0, 0.0),
        (0.3, 0.3),
        (1.0, 1.0),
        (2.5, 1.0),
        (f64::INFINITY, 1.0),
    ] {
        engine.set_volume(input);
        assert!(
            (engine.state().volume - expected).abs() < f64::EPSILON,
            "volume {input} should clamp to {expected}"
        );
    }
}

#[test]
fn seek_respects_known_duration() {
    let (mut engine, rig) = setup();

    engine.play(item("a")).unwrap();
    rig.emit(0, MediaEvent::MetadataReady(30.0));
    engine.pump();

    engine.seek(45.0);
    assert!((engine.state().position - 30.0).abs() < f64::EPSILON);
    engine.seek(-3.0);
    assert!(engine.state().position.abs() < f64::EPSILON);
    engine.seek(15.0);
    assert!((engine.state().position - 15.0).abs() < f64::EPSILON);
}

#[test]
fn double_play_while_playing_pauses_instead_of_reloading() {
    let (mut engine, rig) = setup();

    engine.play(item("a")).unwrap();
    rig.emit(0, MediaEvent::CanPlay);
    engine.pump();
    assert_eq!(engine.state().phase, Phase::Playing);

    engine.play(item("a")).unwrap();
    assert_eq!(engine.state().phase, Phase::Paused);
    // No second acquisition happened
    assert_eq!(rig.sinks.lock().unwrap().len(), 1);
}

#[test]
fn superseded_load_events_do_not_leak_into_the_new_item() {
    let (mut engine, rig) = setup();

    engine.play(item("a")).unwrap();
    engine.play(item("b")).unwrap();

    // Item a's load finishes late and reports a bogus duration
    rig.emit(0, MediaEvent::MetadataReady(99.0));
    rig.emit(0, MediaEvent::CanPlay);
    engine.pump();

    assert_eq!(engine.state().phase, Phase::Loading);
    assert!(engine.state().duration.abs() < f64::EPSILON);
}

#[test]
fn error_mid_playback_is_recoverable_with_a_new_play() {
    let (mut engine, rig) = setup();

    engine.play(item("a")).unwrap();
    rig.emit(0, MediaEvent::CanPlay);
    engine.pump();

    rig.emit(0, MediaEvent::Failed("stream underrun".to_string()));
    engine.pump();
    assert_eq!(engine.state().phase, Phase::Errored);
    assert_eq!(rig.live(), 0);

    engine.play(item("a")).unwrap();
    rig.emit(1, MediaEvent::CanPlay);
    engine.pump();
    assert_eq!(engine.state().phase, Phase::Playing);
}
