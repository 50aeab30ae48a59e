//! Integration tests for the pocketpad-core relay protocol.
//!
//! These tests push complete WebSocket text frames, exactly as the relay
//! sends them, through the public API: Engine.IO packet decoding, Socket.IO
//! event extraction, and `controller-input` payload decoding.

use pocketpad_core::{
    decode_packet,
    protocol::{
        engineio::{encode_connect, encode_pong, SocketPacket},
        messages::PLAYER_PING_EVENT,
    },
    Axis, DecodeError, EnginePacket, InputKind, PlayerId, RelayMessage, StatusLine, TriggerSide,
    Unrecognized, XusbButton,
};

/// Decodes a frame all the way to a [`RelayMessage`], panicking on anything
/// that is not a Socket.IO event.
fn relay_message(frame: &str) -> Result<RelayMessage, DecodeError> {
    match decode_packet(frame).expect("frame must be a valid engine.io packet") {
        EnginePacket::Message(SocketPacket::Event { name, args, .. }) => {
            RelayMessage::from_event(&name, &args)
        }
        other => panic!("expected an event packet, got {other:?}"),
    }
}

#[test]
fn test_browser_axis_frame_decodes_to_axis_input() {
    let msg = relay_message(
        r#"42["controller-input",{"player":1,"type":"AXIS","axis":"LX","value":0.5}]"#,
    )
    .unwrap();

    let RelayMessage::ControllerInput(event) = msg else {
        panic!("expected controller input");
    };
    assert_eq!(event.player, PlayerId::new(1));
    assert_eq!(
        event.kind,
        InputKind::Axis {
            axis: Axis::LeftX,
            value: 0.5
        }
    );
}

#[test]
fn test_browser_button_frame_decodes_to_button_input() {
    let msg = relay_message(
        r#"42["controller-input",{"player":2,"type":"BUTTON","button":"RB","value":1}]"#,
    )
    .unwrap();

    let RelayMessage::ControllerInput(event) = msg else {
        panic!("expected controller input");
    };
    assert_eq!(event.player, PlayerId::new(2));
    assert_eq!(
        event.kind,
        InputKind::Button {
            button: XusbButton::RightShoulder,
            pressed: true
        }
    );
}

#[test]
fn test_browser_trigger_frame_decodes_to_trigger_input() {
    let msg = relay_message(
        r#"42["controller-input",{"player":4,"type":"BUTTON","button":"XUSB_GAMEPAD_LEFT_TRIGGER","value":1}]"#,
    )
    .unwrap();

    let RelayMessage::ControllerInput(event) = msg else {
        panic!("expected controller input");
    };
    assert_eq!(
        event.kind,
        InputKind::Trigger {
            side: TriggerSide::Left,
            magnitude: 1.0
        }
    );
}

#[test]
fn test_legacy_test_client_frame_is_unrecognized() {
    // Older test senders emitted `BUTTON_PRESS` without a player.
    let msg = relay_message(r#"42["controller-input",{"type":"BUTTON_PRESS","button":"A"}]"#)
        .unwrap();

    let RelayMessage::ControllerInput(event) = msg else {
        panic!("expected controller input");
    };
    assert_eq!(event.player, PlayerId::DEFAULT);
    assert_eq!(
        event.kind,
        InputKind::Unrecognized(Unrecognized::Kind("BUTTON_PRESS".to_string()))
    );
}

#[test]
fn test_malformed_payload_is_reported_not_panicking() {
    let result = relay_message(r#"42["controller-input",{"player":1,"type":"AXIS"}]"#);
    assert_eq!(result, Err(DecodeError::MissingField("axis")));
}

#[test]
fn test_relay_broadcast_ping_event_is_ignored() {
    // The relay broadcasts its own `ping` to every socket for browser latency.
    let msg = relay_message(r#"42["ping",{"t":1700000000000}]"#).unwrap();
    assert_eq!(msg, RelayMessage::Other("ping".to_string()));
}

#[test]
fn test_player_ping_event_maps_to_status_line() {
    let frame = format!(r#"42["{PLAYER_PING_EVENT}",{{"player":2,"latency":"37"}}]"#);

    let msg = relay_message(&frame).unwrap();

    let RelayMessage::PlayerPing { player, latency_ms } = msg else {
        panic!("expected ping");
    };
    let line = StatusLine::PlayerPing { player, latency_ms };
    assert_eq!(line.to_string(), "PLAYER_PING: 2 37ms");
}

#[test]
fn test_client_handshake_frames() {
    assert_eq!(encode_connect(), "40");
    assert_eq!(encode_pong(""), "3");
}
