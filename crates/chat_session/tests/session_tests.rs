//! Behavioral tests for the session controller

use chat_core::{ClientConfig, Identity};
use chat_session::{
    ChannelEvent, InboundMessage, MemoryConnector, MemoryHandle, SessionController, SessionError,
    SessionPhase,
};
use serde_json::json;

type Setup = fn() -> (SessionController<MemoryConnector>, MemoryHandle);

fn new_session() -> (SessionController<MemoryConnector>, MemoryHandle) {
    let (connector, handle) = MemoryConnector::new();
    (SessionController::new(ClientConfig::default(), connector), handle)
}

fn waiting_session() -> (SessionController<MemoryConnector>, MemoryHandle) {
    let (mut session, handle) = new_session();
    session.join().unwrap();
    session.handle_channel_event(ChannelEvent::Opened);
    (session, handle)
}

fn matched_session() -> (SessionController<MemoryConnector>, MemoryHandle) {
    let (mut session, handle) = waiting_session();
    session.handle_channel_event(frame(json!({"type": "match"})));
    (session, handle)
}

fn frame(value: serde_json::Value) -> ChannelEvent {
    ChannelEvent::Frame(value.to_string())
}

fn peer_message(content: &str) -> ChannelEvent {
    frame(json!({"type": "message", "user": "peer", "content": content}))
}

#[test]
fn test_full_conversation_scenario() {
    let (mut session, handle) = new_session();

    let own = session.join().unwrap();
    session.handle_channel_event(ChannelEvent::Opened);
    assert_eq!(session.phase(), SessionPhase::Waiting);

    session.handle_channel_event(frame(json!({"type": "match"})));
    assert_eq!(session.phase(), SessionPhase::Matched);

    session.send_message("hi").unwrap();
    let transcript: Vec<_> = session
        .transcript()
        .iter()
        .map(|m| (m.sender.clone(), m.content.clone()))
        .collect();
    assert_eq!(transcript, vec![(own.clone(), "hi".to_string())]);
    assert_eq!(
        handle.sent_json().last().unwrap(),
        &json!({"type": "message", "content": "hi"})
    );

    session.handle_channel_event(peer_message("yo"));
    let transcript: Vec<_> = session
        .transcript()
        .iter()
        .map(|m| (m.sender.clone(), m.content.clone()))
        .collect();
    assert_eq!(
        transcript,
        vec![
            (own, "hi".to_string()),
            (Identity::from("peer"), "yo".to_string()),
        ]
    );
    assert!(!session.peer_typing());
}

#[test]
fn test_transcript_counts_every_message_in_arrival_order() {
    let (mut session, _handle) = matched_session();

    session.handle_channel_event(peer_message("1"));
    session.send_message("2").unwrap();
    session.handle_channel_event(peer_message("3"));
    session.handle_channel_event(peer_message("3"));
    session.send_message("4").unwrap();

    let contents: Vec<_> = session.transcript().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["1", "2", "3", "3", "4"]);
}

#[test]
fn test_blank_messages_never_sent_in_any_phase() {
    let (mut idle, idle_handle) = new_session();
    let (mut waiting, waiting_handle) = waiting_session();
    let (mut matched, matched_handle) = matched_session();

    for text in ["", "   ", "\t\n"] {
        assert!(idle.send_message(text).is_ok());
        assert!(waiting.send_message(text).is_ok());
        assert!(matched.send_message(text).is_ok());
    }

    assert!(idle.transcript().is_empty());
    assert!(waiting.transcript().is_empty());
    assert!(matched.transcript().is_empty());
    assert!(idle_handle.sent_frames().is_empty());
    assert_eq!(waiting_handle.sent_frames().len(), 1);
    assert_eq!(matched_handle.sent_frames().len(), 1);
    assert_eq!(waiting.notice(), None);
}

#[test]
fn test_send_before_match_surfaces_notice() {
    let (mut session, handle) = waiting_session();

    let result = session.send_message("hello?");

    assert!(matches!(result, Err(SessionError::NotMatched)));
    assert!(session.transcript().is_empty());
    assert_eq!(handle.sent_frames().len(), 1, "only the join frame");
    assert_eq!(
        session.notice(),
        Some("Waiting for a match. You cannot send messages yet.")
    );
    assert_eq!(session.phase(), SessionPhase::Waiting);
}

#[test]
fn test_send_while_idle_is_rejected() {
    let (mut session, handle) = new_session();
    assert!(matches!(session.send_message("hi"), Err(SessionError::NotMatched)));
    assert!(handle.sent_frames().is_empty());
}

#[test]
fn test_second_match_is_noop() {
    let (mut session, _handle) = matched_session();
    let transitions = session.history().len();

    session.handle_channel_event(frame(json!({"type": "match"})));

    assert_eq!(session.phase(), SessionPhase::Matched);
    let changed = session.history().iter().filter(|t| t.changed).count();
    assert_eq!(changed, 3);
    assert_eq!(session.history().len(), transitions + 1);
}

#[test]
fn test_peer_close_ends_and_blocks_sends() {
    let (mut session, handle) = matched_session();

    session.handle_channel_event(frame(json!({"type": "close"})));

    assert_eq!(session.phase(), SessionPhase::Ended);
    assert_eq!(handle.close_calls(), 1);
    assert!(matches!(session.send_message("still there?"), Err(SessionError::SessionEnded)));
    assert!(session.transcript().is_empty());
}

#[test]
fn test_end_chat_blocks_sends() {
    let (mut session, handle) = matched_session();
    session.send_message("bye").unwrap();

    session.end_chat().unwrap();
    let sent = handle.sent_frames().len();

    assert!(session.send_message("one more").is_err());
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(handle.sent_frames().len(), sent);
}

#[test]
fn test_typing_toggles_without_transcript_changes() {
    let (mut session, _handle) = matched_session();

    session.handle_channel_event(frame(json!({"type": "typing"})));
    assert!(session.peer_typing());
    assert!(session.transcript().is_empty());

    session.handle_channel_event(frame(json!({"type": "stopped_typing"})));
    assert!(!session.peer_typing());
    assert!(session.transcript().is_empty());
}

#[test]
fn test_incoming_message_clears_typing() {
    let (mut session, _handle) = matched_session();
    session.handle_channel_event(frame(json!({"type": "typing"})));
    session.handle_channel_event(peer_message("done typing"));
    assert!(!session.peer_typing());
}

#[test]
fn test_teardown_closes_and_ignores_late_events() {
    let setups: [Setup; 3] = [new_session, waiting_session, matched_session];
    for phase_setup in setups {
        let (mut session, handle) = phase_setup();
        let before = session.snapshot();

        session.teardown();
        assert!(!session.has_connection());
        assert!(!handle.is_open());

        session.handle_channel_event(peer_message("late"));
        session.handle_channel_event(frame(json!({"type": "typing"})));
        session.handle_channel_event(frame(json!({"type": "match"})));
        session.handle_channel_event(ChannelEvent::Closed { reason: None });

        let after = session.snapshot();
        assert_eq!(after.transcript, before.transcript);
        assert_eq!(after.phase, before.phase);
        assert!(!after.peer_typing);
        assert!(after.torn_down);
    }
}

#[test]
fn test_teardown_rejects_further_operations() {
    let (mut session, handle) = matched_session();
    session.teardown();

    assert!(matches!(session.send_message("hi"), Err(SessionError::TornDown)));
    assert!(matches!(session.end_chat(), Err(SessionError::TornDown)));
    assert!(matches!(session.join(), Err(SessionError::TornDown)));
    session.notify_typing("ignored");

    assert_eq!(handle.sent_frames().len(), 1);
    assert_eq!(handle.close_calls(), 1);
}

#[test]
fn test_join_is_not_reentrant() {
    let setups: [Setup; 2] = [waiting_session, matched_session];
    for phase_setup in setups {
        let (mut session, handle) = phase_setup();
        let identity = session.identity().cloned();

        let result = session.join();

        assert!(matches!(result, Err(SessionError::InvalidPhase { action: "join", .. })));
        assert_eq!(handle.open_count(), 1);
        assert_eq!(session.identity().cloned(), identity);
    }
}

#[test]
fn test_join_while_joining_is_rejected() {
    let (mut session, handle) = new_session();
    session.join().unwrap();
    assert!(session.join().is_err());
    assert_eq!(handle.open_count(), 1);
    assert_eq!(session.phase(), SessionPhase::Joining);
}

#[test]
fn test_no_rejoin_after_end() {
    let (mut session, handle) = matched_session();
    session.end_chat().unwrap();

    assert!(matches!(
        session.join(),
        Err(SessionError::InvalidPhase { phase: SessionPhase::Ended, .. })
    ));
    assert_eq!(handle.open_count(), 1);
}

#[test]
fn test_unexpected_disconnect_ends_session() {
    let (mut session, handle) = matched_session();

    session.handle_channel_event(ChannelEvent::Closed {
        reason: Some("connection reset".to_string()),
    });

    assert_eq!(session.phase(), SessionPhase::Ended);
    assert_eq!(session.banner(), "Your chat has been ended.");
    assert!(!session.has_connection());
    assert_eq!(handle.close_calls(), 1);
}

#[test]
fn test_disconnect_while_waiting_ends_session() {
    let (mut session, _handle) = waiting_session();
    session.handle_channel_event(ChannelEvent::Closed { reason: None });
    assert_eq!(session.phase(), SessionPhase::Ended);
}

#[test]
fn test_malformed_frames_do_not_end_session() {
    let (mut session, _handle) = matched_session();

    session.handle_channel_event(ChannelEvent::Frame("{{{".to_string()));
    session.handle_channel_event(frame(json!({"type": "message", "content": "no user"})));
    session.handle_channel_event(frame(json!({"type": "gift", "item": "rose"})));

    assert_eq!(session.phase(), SessionPhase::Matched);
    assert!(session.transcript().is_empty());

    session.send_message("still works").unwrap();
    assert_eq!(session.transcript().len(), 1);
}

#[test]
fn test_match_before_open_is_tolerated() {
    let (mut session, _handle) = new_session();
    session.join().unwrap();
    session.handle_inbound(InboundMessage::Match);
    assert_eq!(session.phase(), SessionPhase::Matched);
}

#[test]
fn test_snapshot_rows_label_stranger_runs() {
    let (mut session, _handle) = matched_session();
    session.handle_channel_event(peer_message("hey"));
    session.handle_channel_event(peer_message("anyone?"));
    session.send_message("hi").unwrap();
    session.handle_channel_event(peer_message("oh hi"));

    let snapshot = session.snapshot();
    let own = snapshot.identity.clone().unwrap();
    let labels: Vec<_> = snapshot
        .transcript
        .rows(&own)
        .iter()
        .map(|row| row.show_stranger_label)
        .collect();
    assert_eq!(labels, vec![true, false, false, true]);
    assert!(snapshot.can_send());
}
