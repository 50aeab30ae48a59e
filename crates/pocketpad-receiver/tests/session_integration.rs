//! Integration tests for input translation and device sessions.
//!
//! # Purpose
//!
//! These tests drive the `EventTranslator` and `HandleRelayUseCase` through
//! their public API with the in-memory `MockGamepadBackend`, and inspect the
//! reports each virtual controller would have received.  They verify:
//!
//! - Single-axis updates are merged into the full stick vector.
//! - Repeating a release or an identical axis value changes nothing.
//! - A reset neutralises the controller but keeps the same device.
//! - A failed device creation is retried on the player's next event.
//! - Players never see each other's input.
//! - Unknown symbols leave the controller untouched.
//!
//! # Data flow under test
//!
//! ```text
//! RelayEvent ─▶ HandleRelayUseCase ─▶ EventTranslator ─▶ DeviceSessionRegistry
//!                                          │                      │
//!                                   status lines          MockGamepadBackend
//! ```

use std::sync::{Arc, Mutex};

use pocketpad_core::{
    Axis, InputEvent, InputKind, PlayerId, RelayMessage, StatusLine, TriggerSide, Unrecognized,
    XusbButton,
};
use pocketpad_receiver::application::{
    device_registry::DeviceSessionRegistry,
    handle_relay::{HandleRelayUseCase, RelayEvent},
    translate_event::{Applied, EventTranslator, StatusReporter, TranslateError},
};
use pocketpad_receiver::infrastructure::gamepad::mock::MockGamepadBackend;

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordedLines(Mutex<Vec<StatusLine>>);

impl RecordedLines {
    fn lines(&self) -> Vec<StatusLine> {
        self.0.lock().unwrap().clone()
    }
}

impl StatusReporter for RecordedLines {
    fn report(&self, line: StatusLine) {
        self.0.lock().unwrap().push(line);
    }
}

struct Harness {
    translator: EventTranslator,
    backend: MockGamepadBackend,
    lines: Arc<RecordedLines>,
}

fn harness() -> Harness {
    let backend = MockGamepadBackend::new();
    let lines = Arc::new(RecordedLines::default());
    let translator = EventTranslator::new(
        DeviceSessionRegistry::new(Box::new(backend.clone())),
        Arc::clone(&lines) as Arc<dyn StatusReporter>,
        4,
    );
    Harness {
        translator,
        backend,
        lines,
    }
}

fn axis(player: u32, axis: Axis, value: f32) -> InputEvent {
    InputEvent {
        player: PlayerId::new(player),
        kind: InputKind::Axis { axis, value },
    }
}

fn button(player: u32, button: XusbButton, pressed: bool) -> InputEvent {
    InputEvent {
        player: PlayerId::new(player),
        kind: InputKind::Button { button, pressed },
    }
}

// ── Stick merging ─────────────────────────────────────────────────────────────

/// LX 0.5 followed by LY -0.3 must leave the left stick at (0.5, -0.3): the
/// second update may not reset the first component.
#[test]
fn test_left_stick_components_are_merged() {
    let mut h = harness();
    let p1 = PlayerId::new(1);

    h.translator.apply(&axis(1, Axis::LeftX, 0.5)).unwrap();
    h.translator.apply(&axis(1, Axis::LeftY, -0.3)).unwrap();

    let reports = h.backend.commits_for(p1);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].left_stick, (0.5, 0.0));
    assert_eq!(reports[1].left_stick, (0.5, -0.3));
    assert_eq!(reports[1].right_stick, (0.0, 0.0));
}

/// Sending the same axis value twice yields the same controller report.
#[test]
fn test_identical_axis_update_is_idempotent() {
    let mut h = harness();
    let p1 = PlayerId::new(1);

    h.translator.apply(&axis(1, Axis::RightY, 0.75)).unwrap();
    let first = h.backend.last_report(p1).unwrap();
    h.translator.apply(&axis(1, Axis::RightY, 0.75)).unwrap();
    let second = h.backend.last_report(p1).unwrap();

    assert_eq!(first, second);
}

// ── Buttons and triggers ──────────────────────────────────────────────────────

#[test]
fn test_release_of_unpressed_button_changes_nothing() {
    let mut h = harness();
    let p1 = PlayerId::new(1);

    h.translator.apply(&button(1, XusbButton::X, false)).unwrap();
    h.translator.apply(&button(1, XusbButton::X, false)).unwrap();

    let reports = h.backend.commits_for(p1);
    assert!(reports.iter().all(|r| r.buttons.is_empty()));
}

#[test]
fn test_trigger_magnitude_reaches_device() {
    let mut h = harness();
    let p1 = PlayerId::new(1);

    h.translator
        .apply(&InputEvent {
            player: p1,
            kind: InputKind::Trigger {
                side: TriggerSide::Right,
                magnitude: 1.0,
            },
        })
        .unwrap();

    let report = h.backend.last_report(p1).unwrap();
    assert_eq!(report.right_trigger, 1.0);
    assert_eq!(report.left_trigger, 0.0);
}

/// Player 2 pressing and releasing A only ever touches player 2's controller.
#[test]
fn test_players_are_isolated() {
    let mut h = harness();
    let p1 = PlayerId::new(1);
    let p2 = PlayerId::new(2);
    h.translator.apply(&axis(1, Axis::LeftX, -1.0)).unwrap();

    h.translator.apply(&button(2, XusbButton::A, true)).unwrap();
    let pressed = h.backend.last_report(p2).unwrap();
    h.translator.apply(&button(2, XusbButton::A, false)).unwrap();
    let released = h.backend.last_report(p2).unwrap();

    assert!(pressed.buttons.contains(XusbButton::A));
    assert!(released.buttons.is_empty());
    assert_eq!(h.backend.commits_for(p1).len(), 1);
    assert_eq!(h.backend.last_report(p1).unwrap().left_stick, (-1.0, 0.0));
    assert_eq!(h.backend.created(), vec![p1, p2]);
}

#[test]
fn test_unknown_button_leaves_controller_unchanged() {
    let mut h = harness();
    let p1 = PlayerId::new(1);
    h.translator.apply(&button(1, XusbButton::B, true)).unwrap();
    let before = h.backend.commits();

    let applied = h
        .translator
        .apply(&InputEvent {
            player: p1,
            kind: InputKind::Unrecognized(Unrecognized::Button("UNKNOWN_BTN".to_string())),
        })
        .unwrap();

    assert_eq!(applied, Applied::Ignored);
    assert_eq!(h.backend.commits(), before);
    let state = *h.translator.registry().get(p1).unwrap().state();
    assert!(state.buttons.contains(XusbButton::B));
}

// ── Reset ─────────────────────────────────────────────────────────────────────

#[test]
fn test_reset_zeroes_controller_and_keeps_device() {
    let mut h = harness();
    let p1 = PlayerId::new(1);
    h.translator.apply(&axis(1, Axis::LeftX, 0.9)).unwrap();
    h.translator.apply(&button(1, XusbButton::Start, true)).unwrap();
    let handle = h.translator.registry().handle(p1).unwrap();

    h.translator.reset_player(p1).unwrap();

    let report = h.backend.last_report(p1).unwrap();
    assert_eq!(report.left_stick, (0.0, 0.0));
    assert!(report.buttons.is_empty());
    assert_eq!(h.translator.registry().handle(p1), Some(handle));
    assert_eq!(h.backend.created(), vec![p1]);
    assert!(h.translator.registry().get(p1).unwrap().state().is_neutral());
}

// ── Device creation failures ──────────────────────────────────────────────────

#[test]
fn test_failed_creation_is_retried_on_next_event() {
    let mut h = harness();
    let p3 = PlayerId::new(3);
    h.backend.fail_next_creates(1);

    let first = h.translator.apply(&axis(3, Axis::LeftX, 0.2));
    assert!(matches!(first, Err(TranslateError::DeviceCreation { .. })));
    assert!(h.translator.registry().get(p3).is_none());
    assert!(h.lines.lines().is_empty());

    h.translator.apply(&axis(3, Axis::LeftX, 0.4)).unwrap();

    assert_eq!(h.backend.created(), vec![p3]);
    assert_eq!(h.backend.last_report(p3).unwrap().left_stick, (0.4, 0.0));
    assert_eq!(h.lines.lines(), vec![StatusLine::PlayerConnected(p3)]);
}

// ── Relay dispatch ────────────────────────────────────────────────────────────

/// A full session as the relay would deliver it: connect, input, player
/// leaves, relay drops, relay returns, player comes back.
#[test]
fn test_relay_session_lifecycle_status_lines() {
    let h = harness();
    let backend = h.backend.clone();
    let lines = Arc::clone(&h.lines);
    let mut uc = HandleRelayUseCase::new(h.translator);
    let p1 = PlayerId::new(1);

    uc.handle(RelayEvent::Connected {
        url: "ws://localhost:3000/socket.io/?EIO=4&transport=websocket".to_string(),
    });
    uc.handle(RelayEvent::Message(RelayMessage::ControllerInput(axis(
        1,
        Axis::LeftX,
        0.5,
    ))));
    uc.handle(RelayEvent::Message(RelayMessage::PlayerPing {
        player: p1,
        latency_ms: 18,
    }));
    uc.handle(RelayEvent::Message(RelayMessage::PlayerDisconnected(p1)));
    uc.handle(RelayEvent::Disconnected {
        reason: "relay restarted".to_string(),
    });
    uc.handle(RelayEvent::Connected {
        url: "ws://localhost:3000/socket.io/?EIO=4&transport=websocket".to_string(),
    });
    uc.handle(RelayEvent::Message(RelayMessage::ControllerInput(button(
        1,
        XusbButton::Y,
        true,
    ))));

    assert_eq!(
        lines.lines(),
        vec![
            StatusLine::PlayerConnected(p1),
            StatusLine::PlayerPing {
                player: p1,
                latency_ms: 18
            },
            StatusLine::PlayerDisconnected(p1),
            StatusLine::PlayerConnected(p1),
        ]
    );
    assert_eq!(backend.created(), vec![p1]);
    assert_eq!(uc.stats().connections, 2);
    assert_eq!(uc.stats().applied, 2);
}
