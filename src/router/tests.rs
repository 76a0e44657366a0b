//! Tests for Router module

use super::*;
use crate::config::BindingConfig;
use crate::host::{MemoryHost, ParameterCallback};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

const CH1: Channel = Channel::Channel1;
const CH2: Channel = Channel::Channel2;

/// Transport that records every message
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<[u8; 3]>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<[u8; 3]> {
        self.sent.lock().clone()
    }

    fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl MidiTransport for RecordingTransport {
    fn send(&self, status: u8, data1: u8, data2: u8) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Transport("port closed".to_string()));
        }
        self.sent.lock().push([status, data1, data2]);
        Ok(())
    }
}

/// Clock advanced by hand
#[derive(Default)]
struct ManualClock(AtomicU64);

impl ManualClock {
    fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Host that forwards to a MemoryHost but can be told to fail selected calls
struct FlakyHost {
    inner: Arc<MemoryHost>,
    /// Successful `connect` calls left before the next one fails
    connects_left: AtomicUsize,
    fail_play_writes: AtomicBool,
}

impl FlakyHost {
    fn new(inner: Arc<MemoryHost>) -> Self {
        Self {
            inner,
            connects_left: AtomicUsize::new(usize::MAX),
            fail_play_writes: AtomicBool::new(false),
        }
    }
}

impl ParameterHost for FlakyHost {
    fn get(&self, channel: Channel, param: Parameter) -> Result<f64> {
        self.inner.get(channel, param)
    }

    fn set(&self, channel: Channel, param: Parameter, value: f64) -> Result<()> {
        if param == Parameter::Play && self.fail_play_writes.load(Ordering::SeqCst) {
            return Err(Error::HostUnavailable);
        }
        self.inner.set(channel, param, value)
    }

    fn arm_soft_takeover(&self, channel: Channel, param: Parameter) -> Result<()> {
        self.inner.arm_soft_takeover(channel, param)
    }

    fn connect(
        &self,
        channel: Channel,
        param: Parameter,
        callback: ParameterCallback,
    ) -> Result<ConnectionId> {
        let left = self.connects_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(Error::HostUnavailable);
        }
        self.connects_left.store(left.saturating_sub(1), Ordering::SeqCst);
        self.inner.connect(channel, param, callback)
    }

    fn disconnect(&self, id: ConnectionId) {
        self.inner.disconnect(id)
    }
}

/// Router wired to a FlakyHost, initialized and with the transport cleared
fn make_flaky_router(
    flaky: Arc<FlakyHost>,
    transport: Arc<RecordingTransport>,
    clock: Arc<ManualClock>,
) -> Router {
    let scratch = flaky.inner.clone();
    let mut router = Router::new(&AppConfig::default(), flaky, scratch, transport.clone())
        .with_clock(clock);
    router.init().unwrap();
    transport.clear();
    router
}

struct Fixture {
    router: Router,
    host: Arc<MemoryHost>,
    transport: Arc<RecordingTransport>,
    clock: Arc<ManualClock>,
}

fn make_fixture_with(config: AppConfig) -> Fixture {
    let host = Arc::new(MemoryHost::new());
    let transport = Arc::new(RecordingTransport::default());
    let clock = Arc::new(ManualClock::default());
    clock.set(10_000);

    let mut router = Router::new(&config, host.clone(), host.clone(), transport.clone())
        .with_clock(clock.clone());
    router.init().unwrap();
    transport.clear();

    Fixture {
        router,
        host,
        transport,
        clock,
    }
}

fn make_fixture() -> Fixture {
    make_fixture_with(AppConfig::default())
}

fn event(channel: Channel, control: Control, value: u8) -> ControlEvent {
    ControlEvent {
        id: ControlId::new(channel, control),
        value,
        status: 0xB0,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ===== Toggle buttons =====

#[test]
fn test_toggle_ignores_release() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Pfl, 0));
    assert_eq!(f.host.get(CH1, Parameter::Pfl).unwrap(), 0.0);
    assert_eq!(f.host.write_count(), 0);
}

#[test]
fn test_toggle_press_flips_parameter() {
    let mut f = make_fixture();

    f.router.dispatch(event(CH1, Control::Pfl, 127));
    assert_eq!(f.host.get(CH1, Parameter::Pfl).unwrap(), 1.0);

    // Second press without an intervening release flips back
    f.router.dispatch(event(CH1, Control::Pfl, 127));
    assert_eq!(f.host.get(CH1, Parameter::Pfl).unwrap(), 0.0);

    // Other deck untouched
    assert_eq!(f.host.get(CH2, Parameter::Pfl).unwrap(), 0.0);
}

#[test]
fn test_keylock_toggle() {
    let mut f = make_fixture();
    f.host.set(CH2, Parameter::Keylock, 1.0).unwrap();

    f.router.dispatch(event(CH2, Control::Keylock, 127));
    assert_eq!(f.host.get(CH2, Parameter::Keylock).unwrap(), 0.0);
}

#[test]
fn test_beatsync_off_resets_rate() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Beatsync, 1.0).unwrap();
    f.host.set(CH1, Parameter::Rate, 0.4).unwrap();

    f.router.dispatch(event(CH1, Control::Beatsync, 127));
    assert_eq!(f.host.get(CH1, Parameter::Beatsync).unwrap(), 0.0);
    assert_eq!(f.host.get(CH1, Parameter::Rate).unwrap(), 0.0);
}

#[test]
fn test_beatsync_on_leaves_rate() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Rate, 0.4).unwrap();

    f.router.dispatch(event(CH1, Control::Beatsync, 127));
    assert_eq!(f.host.get(CH1, Parameter::Beatsync).unwrap(), 1.0);
    assert_eq!(f.host.get(CH1, Parameter::Rate).unwrap(), 0.4);
}

// ===== Play / scratch =====

#[test]
fn test_play_from_stopped_starts_playback() {
    let mut f = make_fixture();
    assert_eq!(f.router.deck_state(CH1).unwrap(), DeckState::Stopped);

    f.router.dispatch(event(CH1, Control::Play, 127));

    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 1.0);
    assert!(!f.host.is_scratching(1));
    assert_eq!(f.router.deck_state(CH1).unwrap(), DeckState::Playing);
}

#[test]
fn test_play_while_playing_pauses_into_scratch() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Play, 1.0).unwrap();

    f.router.dispatch(event(CH1, Control::Play, 127));

    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 0.0);
    let params = f.host.scratch_params(1).expect("scratch enabled");
    assert_eq!(params.intervals_per_rev, 128);
    assert_eq!(params.rpm, 33.3333);
    assert_eq!(params.alpha, 0.125);
    assert_eq!(params.beta, 1.0 / 256.0);
    assert!(params.ramp);
    assert_eq!(f.router.deck_state(CH1).unwrap(), DeckState::Scratching);
}

#[test]
fn test_play_from_scratching_disables_scratch() {
    let mut f = make_fixture();
    f.host.set(CH2, Parameter::Play, 1.0).unwrap();

    f.router.dispatch(event(CH2, Control::Play, 127));
    assert!(f.host.is_scratching(2));

    f.clock.set(10_200);
    f.router.dispatch(event(CH2, Control::Play, 127));
    assert!(!f.host.is_scratching(2));
    assert_eq!(f.host.get(CH2, Parameter::Play).unwrap(), 1.0);
}

#[test]
fn test_play_release_ignored() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Play, 0));
    assert_eq!(f.host.write_count(), 0);
    assert_eq!(
        f.router.debounce.as_ref().unwrap().last_pressed(CH1, Control::Play),
        None
    );
}

#[test]
fn test_suppressed_press_writes_nothing() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Play, 127));
    let writes = f.host.write_count();

    f.clock.set(10_100);
    f.router.dispatch(event(CH1, Control::Play, 127));

    assert_eq!(f.host.write_count(), writes);
    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 1.0);
}

#[test]
fn test_debounce_is_per_deck() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Play, 127));
    f.clock.set(10_010);
    f.router.dispatch(event(CH2, Control::Play, 127));

    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 1.0);
    assert_eq!(f.host.get(CH2, Parameter::Play).unwrap(), 1.0);
}

#[test]
fn test_play_twice_within_window_end_to_end() {
    let mut f = make_fixture();
    let play_led = f.router.feedback().led_index(CH1, Control::Play).unwrap();

    // Press, release, press again 100ms later
    f.router.on_midi(&[0xB0, 8, 127]);
    f.clock.set(10_050);
    f.router.on_midi(&[0xB0, 8, 0]);
    f.clock.set(10_100);
    f.router.on_midi(&[0xB0, 8, 127]);

    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 1.0);
    assert_eq!(f.transport.sent(), vec![[0xB1, play_led, 0x7F]]);

    // Third press 200ms after the first accepted one
    f.clock.set(10_200);
    f.router.on_midi(&[0xB0, 8, 127]);

    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 0.0);
    assert!(f.host.is_scratching(1));
    assert_eq!(
        f.transport.sent(),
        vec![[0xB1, play_led, 0x7F], [0xB1, play_led, 0x00]]
    );
}

// ===== Jog wheel =====

#[test]
fn test_jog_pitch_bends_while_playing() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Play, 1.0).unwrap();

    f.router.dispatch(event(CH1, Control::Jog, 63));
    assert_eq!(f.host.get(CH1, Parameter::Jog).unwrap(), 63.0);

    f.router.dispatch(event(CH1, Control::Jog, 64));
    assert_eq!(f.host.get(CH1, Parameter::Jog).unwrap(), -64.0);

    f.router.dispatch(event(CH1, Control::Jog, 127));
    assert_eq!(f.host.get(CH1, Parameter::Jog).unwrap(), -1.0);
    assert!(f.host.ticks().is_empty());
}

#[test]
fn test_jog_scratches_while_paused() {
    let mut f = make_fixture();
    f.host.set(CH2, Parameter::Play, 1.0).unwrap();
    f.router.dispatch(event(CH2, Control::Play, 127));

    f.router.dispatch(event(CH2, Control::Jog, 0));
    f.router.dispatch(event(CH2, Control::Jog, 5));
    f.router.dispatch(event(CH2, Control::Jog, 127));

    assert_eq!(f.host.ticks(), vec![(2, 0), (2, 5), (2, -1)]);
    assert_eq!(f.host.get(CH2, Parameter::Jog).unwrap(), 0.0);
}

#[test]
fn test_jog_never_toggles_scratch_mode() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Jog, 10));
    assert!(!f.host.is_scratching(1));
    assert_eq!(f.host.write_count(), 0);
}

// ===== Tempo fader =====

#[test]
fn test_fader_sets_rate_with_soft_takeover() {
    let mut f = make_fixture();

    f.router.dispatch(event(CH1, Control::Rate, 127));
    assert!(approx(f.host.get(CH1, Parameter::Rate).unwrap(), 1.0));
    assert!(f.host.is_soft_takeover_armed(CH1, Parameter::Rate));

    f.router.dispatch(event(CH1, Control::Rate, 0));
    assert_eq!(f.host.get(CH1, Parameter::Rate).unwrap(), -1.0);

    f.router.dispatch(event(CH1, Control::Rate, 64));
    assert_eq!(f.host.get(CH1, Parameter::Rate).unwrap(), 0.0);
}

#[test]
fn test_fader_clears_autobeat_led_only() {
    let mut f = make_fixture();
    f.host.set(CH2, Parameter::Beatsync, 1.0).unwrap();
    assert_eq!(f.router.feedback().led_state(CH2, Control::Beatsync), LedState::On);
    f.transport.clear();

    f.router.dispatch(event(CH2, Control::Rate, 100));

    assert_eq!(f.transport.sent(), vec![[0xB1, 4, 0x00]]);
    assert_eq!(f.router.feedback().led_state(CH2, Control::Beatsync), LedState::Off);
    // Sync itself stays on
    assert_eq!(f.host.get(CH2, Parameter::Beatsync).unwrap(), 1.0);
}

#[test]
fn test_fader_survives_led_failure() {
    let mut f = make_fixture();
    f.transport.fail.store(true, Ordering::SeqCst);

    f.router.dispatch(event(CH1, Control::Rate, 0));
    assert_eq!(f.host.get(CH1, Parameter::Rate).unwrap(), -1.0);
}

// ===== Volume =====

#[test]
fn test_volume_steps() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Volume, 0.5).unwrap();

    f.router.dispatch(event(CH1, Control::Volume, 127));
    assert!(approx(f.host.get(CH1, Parameter::Volume).unwrap(), 0.47));

    f.host.set(CH1, Parameter::Volume, 0.5).unwrap();
    f.router.dispatch(event(CH1, Control::Volume, 1));
    assert!(approx(f.host.get(CH1, Parameter::Volume).unwrap(), 0.53));
}

#[test]
fn test_volume_clamps() {
    let mut f = make_fixture();
    f.host.set(CH2, Parameter::Volume, 0.05).unwrap();
    for _ in 0..5 {
        f.router.dispatch(event(CH2, Control::Volume, 127));
    }
    assert_eq!(f.host.get(CH2, Parameter::Volume).unwrap(), 0.0);

    f.host.set(CH2, Parameter::Volume, 0.95).unwrap();
    for _ in 0..5 {
        f.router.dispatch(event(CH2, Control::Volume, 1));
    }
    assert_eq!(f.host.get(CH2, Parameter::Volume).unwrap(), 1.0);
}

#[test]
fn test_volume_ignores_other_values() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Volume, 0.5).unwrap();
    let writes = f.host.write_count();

    for value in [0, 2, 64, 126] {
        f.router.dispatch(event(CH1, Control::Volume, value));
    }
    assert_eq!(f.host.write_count(), writes);
    assert_eq!(f.host.get(CH1, Parameter::Volume).unwrap(), 0.5);
}

// ===== Cue =====

#[test]
fn test_cue_is_momentary() {
    let mut f = make_fixture();

    f.router.dispatch(event(CH1, Control::CueDefault, 127));
    assert_eq!(f.host.get(CH1, Parameter::CueDefault).unwrap(), 1.0);
    assert_eq!(f.transport.sent(), vec![[0xB1, 9, 0x7F]]);

    f.router.dispatch(event(CH1, Control::CueDefault, 0));
    assert_eq!(f.host.get(CH1, Parameter::CueDefault).unwrap(), 0.0);
}

// ===== LED feedback =====

#[test]
fn test_external_change_drives_led() {
    let f = make_fixture();

    f.host.set(CH1, Parameter::Play, 1.0).unwrap();

    assert_eq!(f.transport.sent(), vec![[0xB1, 8, 0x7F]]);
    assert_eq!(f.router.feedback().led_state(CH1, Control::Play), LedState::On);
}

#[test]
fn test_led_uses_channel_table() {
    let f = make_fixture();

    f.host.set(CH2, Parameter::Pfl, 1.0).unwrap();
    f.host.set(CH2, Parameter::Pfl, 0.0).unwrap();
    f.host.set(CH1, Parameter::Keylock, 1.0).unwrap();

    assert_eq!(
        f.transport.sent(),
        vec![[0xB1, 25, 0x7F], [0xB1, 25, 0x00], [0xB1, 22, 0x7F]]
    );
}

#[test]
fn test_unbound_parameters_do_not_drive_leds() {
    let f = make_fixture();
    f.host.set(CH1, Parameter::Volume, 0.3).unwrap();
    f.host.set(CH1, Parameter::Rate, 0.3).unwrap();
    assert!(f.transport.sent().is_empty());
}

#[test]
fn test_missing_led_index_is_skipped() {
    let mut config = AppConfig::default();
    config.decks.channel1.leds.remove(&Control::Play);
    let f = make_fixture_with(config);

    f.host.set(CH1, Parameter::Play, 1.0).unwrap();
    assert!(f.transport.sent().is_empty());
}

#[test]
fn test_custom_led_status() {
    let mut config = AppConfig::default();
    config.midi.led_status = 0x90;
    let f = make_fixture_with(config);

    f.host.set(CH2, Parameter::Play, 1.0).unwrap();
    assert_eq!(f.transport.sent(), vec![[0x90, 2, 0x7F]]);
}

// ===== Lifecycle =====

#[test]
fn test_init_syncs_leds_with_host() {
    let host = Arc::new(MemoryHost::new());
    let transport = Arc::new(RecordingTransport::default());
    host.set(CH2, Parameter::Pfl, 1.0).unwrap();

    let mut router = Router::new(
        &AppConfig::default(),
        host.clone(),
        host.clone(),
        transport.clone(),
    );
    router.init().unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 10);
    assert!(sent.contains(&[0xB1, 25, 0x7F]));
    assert!(sent.contains(&[0xB1, 8, 0x00]));
    assert_eq!(router.feedback().led_state(CH2, Control::Pfl), LedState::On);
    assert_eq!(host.connection_count(), 10);
}

#[test]
fn test_init_twice_is_noop() {
    let mut f = make_fixture();
    f.router.init().unwrap();

    assert_eq!(f.host.connection_count(), 10);
    assert!(f.transport.sent().is_empty());

    f.host.set(CH1, Parameter::Play, 1.0).unwrap();
    assert_eq!(f.transport.sent().len(), 1);
}

#[test]
fn test_init_fails_when_host_unreachable() {
    let host = Arc::new(MemoryHost::new());
    host.set_available(false);
    let transport = Arc::new(RecordingTransport::default());

    let mut router = Router::new(&AppConfig::default(), host.clone(), host.clone(), transport);
    assert!(matches!(router.init(), Err(Error::HostUnavailable)));
    assert!(!router.is_initialized());
}

#[test]
fn test_failed_init_releases_partial_subscriptions() {
    let host = Arc::new(MemoryHost::new());
    let flaky = Arc::new(FlakyHost::new(host.clone()));
    flaky.connects_left.store(3, Ordering::SeqCst);
    let transport = Arc::new(RecordingTransport::default());

    let mut router =
        Router::new(&AppConfig::default(), flaky.clone(), host.clone(), transport.clone());
    assert!(matches!(router.init(), Err(Error::HostUnavailable)));
    assert!(!router.is_initialized());
    assert_eq!(host.connection_count(), 0);

    flaky.connects_left.store(usize::MAX, Ordering::SeqCst);
    router.init().unwrap();
    assert_eq!(host.connection_count(), 10);

    // One host change, one LED message
    transport.clear();
    host.set(CH1, Parameter::Play, 1.0).unwrap();
    assert_eq!(transport.sent(), vec![[0xB1, 8, 0x7F]]);
}

#[test]
fn test_shutdown_releases_and_blanks() {
    let mut f = make_fixture();
    f.host.set(CH1, Parameter::Play, 1.0).unwrap();
    f.transport.clear();

    f.router.shutdown();

    assert!(!f.router.is_initialized());
    assert_eq!(f.host.connection_count(), 0);
    // 7 LEDs per deck in the stock table
    let sent = f.transport.sent();
    assert_eq!(sent.len(), 14);
    assert!(sent.iter().all(|m| m[2] == 0x00));
    assert_eq!(f.router.feedback().led_state(CH1, Control::Play), LedState::Off);

    // Host changes no longer reach the LEDs
    f.transport.clear();
    f.host.set(CH1, Parameter::Play, 0.0).unwrap();
    assert!(f.transport.sent().is_empty());
}

#[test]
fn test_events_after_shutdown_are_dropped() {
    let mut f = make_fixture();
    f.router.shutdown();

    f.router.dispatch(event(CH1, Control::Pfl, 127));
    f.router.dispatch(event(CH1, Control::Play, 127));
    assert_eq!(f.host.write_count(), 0);
}

#[test]
fn test_reinit_starts_fresh_debounce_session() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Play, 127));

    f.router.shutdown();
    f.router.init().unwrap();

    // Same timestamp, but the old record was discarded
    f.router.dispatch(event(CH1, Control::Play, 127));
    assert_eq!(f.host.get(CH1, Parameter::Play).unwrap(), 0.0);
    assert!(f.host.is_scratching(1));
}

// ===== Routing and error handling =====

#[test]
fn test_unknown_midi_is_dropped() {
    let mut f = make_fixture();
    f.router.on_midi(&[0xB0, 99, 127]);
    f.router.on_midi(&[0xE0, 0, 64]);
    f.router.on_midi(&[0xB0]);
    assert_eq!(f.host.write_count(), 0);
    assert!(f.transport.sent().is_empty());
}

#[test]
fn test_led_only_controls_have_no_handler() {
    let mut f = make_fixture();
    f.router.dispatch(event(CH1, Control::Loop, 127));
    f.router.dispatch(event(CH2, Control::FxCue, 127));
    assert_eq!(f.host.write_count(), 0);
}

#[test]
fn test_every_handled_control_has_one_handler() {
    for control in Control::ALL {
        let expected = !matches!(control, Control::Loop | Control::FxCue);
        assert_eq!(Handler::for_control(control).is_some(), expected, "{}", control);
    }
}

#[test]
fn test_unreachable_host_drops_event_and_continues() {
    let mut f = make_fixture();

    f.host.set_available(false);
    f.router.dispatch(event(CH1, Control::Pfl, 127));
    f.router.dispatch(event(CH1, Control::Volume, 1));
    f.router.dispatch(event(CH1, Control::Jog, 3));

    f.host.set_available(true);
    assert_eq!(f.host.get(CH1, Parameter::Pfl).unwrap(), 0.0);

    f.router.dispatch(event(CH1, Control::Pfl, 127));
    assert_eq!(f.host.get(CH1, Parameter::Pfl).unwrap(), 1.0);
}

#[test]
fn test_failed_pause_leaves_scratch_off() {
    let host = Arc::new(MemoryHost::new());
    let flaky = Arc::new(FlakyHost::new(host.clone()));
    let transport = Arc::new(RecordingTransport::default());
    let clock = Arc::new(ManualClock::default());
    clock.set(10_000);
    let mut router = make_flaky_router(flaky.clone(), transport, clock.clone());

    host.set(CH1, Parameter::Play, 1.0).unwrap();
    flaky.fail_play_writes.store(true, Ordering::SeqCst);
    router.dispatch(event(CH1, Control::Play, 127));

    assert_eq!(host.get(CH1, Parameter::Play).unwrap(), 1.0);
    assert!(!host.is_scratching(1));
    assert_eq!(router.deck_state(CH1).unwrap(), DeckState::Playing);

    // Once the host recovers the next press pauses into scratch as usual
    flaky.fail_play_writes.store(false, Ordering::SeqCst);
    clock.set(10_200);
    router.dispatch(event(CH1, Control::Play, 127));
    assert_eq!(host.get(CH1, Parameter::Play).unwrap(), 0.0);
    assert!(host.is_scratching(1));
}

#[test]
fn test_failed_resume_keeps_scratching() {
    let host = Arc::new(MemoryHost::new());
    let flaky = Arc::new(FlakyHost::new(host.clone()));
    let transport = Arc::new(RecordingTransport::default());
    let clock = Arc::new(ManualClock::default());
    clock.set(10_000);
    let mut router = make_flaky_router(flaky.clone(), transport, clock.clone());

    host.set(CH2, Parameter::Play, 1.0).unwrap();
    router.dispatch(event(CH2, Control::Play, 127));
    assert_eq!(router.deck_state(CH2).unwrap(), DeckState::Scratching);

    flaky.fail_play_writes.store(true, Ordering::SeqCst);
    clock.set(10_200);
    router.dispatch(event(CH2, Control::Play, 127));

    assert_eq!(host.get(CH2, Parameter::Play).unwrap(), 0.0);
    assert_eq!(router.deck_state(CH2).unwrap(), DeckState::Scratching);
}

#[test]
fn test_note_bindings() {
    let mut config = AppConfig::default();
    config.decks.channel2.bindings = vec![BindingConfig {
        control: Control::CueDefault,
        midi_type: MidiType::Note,
        channel: 3,
        number: 40,
    }];
    let mut f = make_fixture_with(config);

    f.router.on_midi(&[0x92, 40, 127]);
    assert_eq!(f.host.get(CH2, Parameter::CueDefault).unwrap(), 1.0);

    // Note On with velocity 0 releases
    f.router.on_midi(&[0x92, 40, 0]);
    assert_eq!(f.host.get(CH2, Parameter::CueDefault).unwrap(), 0.0);

    // Same note on another MIDI channel is not bound
    f.router.on_midi(&[0x90, 40, 127]);
    assert_eq!(f.host.get(CH2, Parameter::CueDefault).unwrap(), 0.0);
}

#[test]
fn test_binding_key_from_message() {
    let key = BindingKey::from_message(&MidiMessage::NoteOff {
        channel: 0,
        note: 5,
        velocity: 0,
    });
    assert_eq!(
        key,
        BindingKey {
            midi_type: MidiType::Note,
            channel: 1,
            number: 5,
        }
    );
}
