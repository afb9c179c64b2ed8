//! Signaling driver tests: pairing lifecycle and scoped relay.

use std::time::Instant;

use switchboard_core::{Action, DriverEvent, Environment, SignalingDriver, SignalingError};
use switchboard_proto::{ClientCommand, PeerId, ServerMessage};

#[derive(Clone)]
struct TestEnv;

impl Environment for TestEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(0xA5);
    }
}

fn connect(driver: &mut SignalingDriver, id: u64) -> PeerId {
    let peer = PeerId(id);
    driver.process_event(DriverEvent::Connected { peer }, &TestEnv).unwrap();
    peer
}

fn disconnect(driver: &mut SignalingDriver, peer: PeerId) -> Vec<(PeerId, ServerMessage)> {
    deliveries(driver.process_event(DriverEvent::Disconnected { peer }, &TestEnv).unwrap())
}

fn command(
    driver: &mut SignalingDriver,
    peer: PeerId,
    command: ClientCommand,
) -> Vec<(PeerId, ServerMessage)> {
    deliveries(driver.process_event(DriverEvent::Command { peer, command }, &TestEnv).unwrap())
}

fn deliveries(actions: Vec<Action>) -> Vec<(PeerId, ServerMessage)> {
    actions.into_iter().map(|Action::Deliver { to, message }| (to, message)).collect()
}

fn set_keyword(driver: &mut SignalingDriver, peer: PeerId, keyword: &str) {
    let out = command(driver, peer, ClientCommand::SetKeyword { keyword: keyword.into() });
    assert!(out.is_empty());
}

/// Pair `caller` with `callee` via keyword, start, and accept.
fn establish_pair(driver: &mut SignalingDriver, caller: PeerId, callee: PeerId, keyword: &str) {
    set_keyword(driver, callee, keyword);
    command(driver, caller, ClientCommand::StartVideoCall { keyword: keyword.into() });
    command(driver, callee, ClientCommand::AcceptVideoCall { caller });
}

#[test]
fn duplicate_registration_is_fatal() {
    let mut driver = SignalingDriver::new();
    let peer = connect(&mut driver, 1);

    let result = driver.process_event(DriverEvent::Connected { peer }, &TestEnv);
    assert!(matches!(result, Err(SignalingError::PeerAlreadyRegistered(_))));
}

#[test]
fn disconnect_is_idempotent() {
    let mut driver = SignalingDriver::new();
    let peer = connect(&mut driver, 1);

    assert!(disconnect(&mut driver, peer).is_empty());
    assert!(disconnect(&mut driver, peer).is_empty());
    assert!(disconnect(&mut driver, PeerId(99)).is_empty());
}

#[test]
fn search_with_no_match_returns_empty_and_stays_idle() {
    let mut driver = SignalingDriver::new();
    let searcher = connect(&mut driver, 1);

    let out = command(&mut driver, searcher, ClientCommand::SearchUsers { keyword: "foo".into() });
    assert_eq!(out, vec![(searcher, ServerMessage::SearchResult { peers: vec![] })]);
    assert_eq!(driver.pairing().pending_calls().count(), 0);
}

#[test]
fn search_round_trip_finds_the_other_registrant() {
    let mut driver = SignalingDriver::new();
    let x = connect(&mut driver, 1);
    let y = connect(&mut driver, 2);
    set_keyword(&mut driver, x, "foo");
    set_keyword(&mut driver, y, "foo");

    let out = command(&mut driver, y, ClientCommand::SearchUsers { keyword: "foo".into() });
    assert_eq!(out, vec![(y, ServerMessage::SearchResult { peers: vec![x] })]);
}

#[test]
fn search_is_informational_only() {
    let mut driver = SignalingDriver::new();
    let x = connect(&mut driver, 1);
    let y = connect(&mut driver, 2);
    set_keyword(&mut driver, x, "foo");

    command(&mut driver, y, ClientCommand::SearchUsers { keyword: "foo".into() });
    assert_eq!(driver.pairing().pending_calls().count(), 0);
    assert!(driver.pairing().room_of(y).is_none());
}

#[test]
fn start_call_notifies_callee_and_reports_the_match() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);
    let callee = connect(&mut driver, 2);
    set_keyword(&mut driver, callee, "foo");

    let out = command(&mut driver, caller, ClientCommand::StartVideoCall { keyword: "foo".into() });
    assert_eq!(
        out,
        vec![
            (callee, ServerMessage::IncomingCall { from: caller }),
            (caller, ServerMessage::SearchResult { peers: vec![callee] }),
        ]
    );

    let pending = driver.pairing().pending_from(caller).unwrap();
    assert_eq!(pending.callee, callee);
}

#[test]
fn start_call_with_no_match_is_a_normal_outcome() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);

    let out = command(&mut driver, caller, ClientCommand::StartVideoCall { keyword: "foo".into() });
    assert_eq!(out, vec![(caller, ServerMessage::SearchResult { peers: vec![] })]);
    assert!(driver.pairing().pending_from(caller).is_none());
}

#[test]
fn keyword_collision_picks_the_earliest_registrant() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);
    let first = connect(&mut driver, 2);
    let second = connect(&mut driver, 3);
    set_keyword(&mut driver, second, "foo");
    set_keyword(&mut driver, first, "foo");

    let out = command(&mut driver, caller, ClientCommand::StartVideoCall { keyword: "foo".into() });
    // Registration order decides, not keyword-declaration order.
    assert!(out.contains(&(first, ServerMessage::IncomingCall { from: caller })));
    assert_eq!(driver.pairing().pending_from(caller).unwrap().callee, first);
}

#[test]
fn reinitiating_supersedes_the_prior_pending_call() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    let c = connect(&mut driver, 3);
    set_keyword(&mut driver, b, "kb");
    set_keyword(&mut driver, c, "kc");

    command(&mut driver, a, ClientCommand::StartVideoCall { keyword: "kb".into() });
    let out = command(&mut driver, a, ClientCommand::StartVideoCall { keyword: "kc".into() });

    assert!(out.contains(&(b, ServerMessage::CallCanceled)));
    assert!(out.contains(&(c, ServerMessage::IncomingCall { from: a })));

    let pending: Vec<_> = driver.pairing().pending_calls().collect();
    assert_eq!(pending, vec![(a, c)]);
}

#[test]
fn accept_promotes_to_a_room_and_notifies_the_caller() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);
    let callee = connect(&mut driver, 2);
    set_keyword(&mut driver, callee, "foo");
    command(&mut driver, caller, ClientCommand::StartVideoCall { keyword: "foo".into() });

    let out = command(&mut driver, callee, ClientCommand::AcceptVideoCall { caller });
    assert_eq!(out, vec![(caller, ServerMessage::CallAccepted { peer: callee })]);

    assert_eq!(driver.pairing().counterpart_of(caller), Some(callee));
    assert_eq!(driver.pairing().counterpart_of(callee), Some(caller));
    assert_eq!(driver.pairing().pending_calls().count(), 0);
}

#[test]
fn stale_accept_is_a_silent_noop() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);

    let out = command(&mut driver, b, ClientCommand::AcceptVideoCall { caller: a });
    assert!(out.is_empty());
    assert!(driver.pairing().room_of(b).is_none());
}

#[test]
fn accept_from_the_wrong_callee_is_stale() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    let c = connect(&mut driver, 3);
    set_keyword(&mut driver, b, "foo");
    command(&mut driver, a, ClientCommand::StartVideoCall { keyword: "foo".into() });

    let out = command(&mut driver, c, ClientCommand::AcceptVideoCall { caller: a });
    assert!(out.is_empty());
    assert!(driver.pairing().room_of(c).is_none());
    // The genuine pending call survives.
    assert_eq!(driver.pairing().pending_from(a).unwrap().callee, b);
}

#[test]
fn duplicate_accept_is_ignored() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);
    let callee = connect(&mut driver, 2);
    establish_pair(&mut driver, caller, callee, "foo");

    let out = command(&mut driver, callee, ClientCommand::AcceptVideoCall { caller });
    assert!(out.is_empty());
    assert_eq!(driver.pairing().counterpart_of(caller), Some(callee));
}

#[test]
fn chat_relays_to_the_counterpart_exactly_once() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    let bystander = connect(&mut driver, 3);
    establish_pair(&mut driver, a, b, "foo");

    let out = command(&mut driver, a, ClientCommand::ChatMessage { text: "hi".into() });
    assert_eq!(out, vec![(b, ServerMessage::ChatMessage { text: "hi".into(), from: a })]);
    assert!(out.iter().all(|(to, _)| *to != bystander));
}

#[test]
fn negotiation_payloads_are_forwarded_opaque_and_tagged() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    establish_pair(&mut driver, a, b, "foo");

    let sdp = serde_json::json!({ "kind": "offer", "sdp": "v=0..." });
    let out = command(&mut driver, a, ClientCommand::Offer { sdp: sdp.clone() });
    assert_eq!(out, vec![(b, ServerMessage::Offer { payload: sdp, from: a })]);

    let candidate = serde_json::json!({ "candidate": "candidate:0 1 UDP ..." });
    let out = command(&mut driver, b, ClientCommand::Candidate { candidate: candidate.clone() });
    assert_eq!(out, vec![(a, ServerMessage::Candidate { payload: candidate, from: b })]);
}

#[test]
fn relay_without_a_room_is_dropped() {
    let mut driver = SignalingDriver::new();
    let loner = connect(&mut driver, 1);

    let out = command(
        &mut driver,
        loner,
        ClientCommand::Offer { sdp: serde_json::json!({ "sdp": "v=0" }) },
    );
    assert!(out.is_empty());
}

#[test]
fn disconnect_of_a_room_member_ends_the_session() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    establish_pair(&mut driver, a, b, "foo");

    let out = disconnect(&mut driver, a);
    assert_eq!(out, vec![(b, ServerMessage::CallEnded)]);
    assert!(driver.pairing().room_of(b).is_none());

    // The survivor's relay attempts now fall on the floor.
    let out = command(&mut driver, b, ClientCommand::ChatMessage { text: "hello?".into() });
    assert!(out.is_empty());
}

#[test]
fn disconnect_of_the_callee_cancels_the_pending_call() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);
    let callee = connect(&mut driver, 2);
    set_keyword(&mut driver, callee, "foo");
    command(&mut driver, caller, ClientCommand::StartVideoCall { keyword: "foo".into() });

    let out = disconnect(&mut driver, callee);
    assert_eq!(out, vec![(caller, ServerMessage::CallCanceled)]);
    assert_eq!(driver.pairing().pending_calls().count(), 0);
}

#[test]
fn disconnect_of_the_caller_cancels_the_pending_call() {
    let mut driver = SignalingDriver::new();
    let caller = connect(&mut driver, 1);
    let callee = connect(&mut driver, 2);
    set_keyword(&mut driver, callee, "foo");
    command(&mut driver, caller, ClientCommand::StartVideoCall { keyword: "foo".into() });

    let out = disconnect(&mut driver, caller);
    assert_eq!(out, vec![(callee, ServerMessage::CallCanceled)]);
    assert_eq!(driver.pairing().pending_calls().count(), 0);
}

#[test]
fn paired_caller_reinitiating_ends_the_old_session() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    let c = connect(&mut driver, 3);
    establish_pair(&mut driver, a, b, "foo");
    set_keyword(&mut driver, c, "bar");

    let out = command(&mut driver, a, ClientCommand::StartVideoCall { keyword: "bar".into() });
    assert!(out.contains(&(b, ServerMessage::CallEnded)));
    assert!(out.contains(&(c, ServerMessage::IncomingCall { from: a })));

    assert!(driver.pairing().room_of(a).is_none());
    assert!(driver.pairing().room_of(b).is_none());
    assert_eq!(driver.pairing().pending_from(a).unwrap().callee, c);
}

#[test]
fn accept_while_paired_supersedes_the_old_room() {
    let mut driver = SignalingDriver::new();
    let a = connect(&mut driver, 1);
    let b = connect(&mut driver, 2);
    let c = connect(&mut driver, 3);
    establish_pair(&mut driver, a, b, "foo");

    // c calls b while b is still paired with a; b takes the new call.
    command(&mut driver, c, ClientCommand::StartVideoCall { keyword: "foo".into() });
    let out = command(&mut driver, b, ClientCommand::AcceptVideoCall { caller: c });

    assert!(out.contains(&(a, ServerMessage::CallEnded)));
    assert!(out.contains(&(c, ServerMessage::CallAccepted { peer: b })));

    assert!(driver.pairing().room_of(a).is_none());
    assert_eq!(driver.pairing().counterpart_of(b), Some(c));
}

#[test]
fn keyword_is_cleared_on_disconnect() {
    let mut driver = SignalingDriver::new();
    let x = connect(&mut driver, 1);
    let y = connect(&mut driver, 2);
    set_keyword(&mut driver, x, "foo");
    disconnect(&mut driver, x);

    let out = command(&mut driver, y, ClientCommand::SearchUsers { keyword: "foo".into() });
    assert_eq!(out, vec![(y, ServerMessage::SearchResult { peers: vec![] })]);
}

#[test]
fn empty_keyword_is_ignored() {
    let mut driver = SignalingDriver::new();
    let peer = connect(&mut driver, 1);

    let out = command(&mut driver, peer, ClientCommand::SetKeyword { keyword: String::new() });
    assert!(out.is_empty());
    assert_eq!(driver.directory().keyword_of(peer), None);
}

#[test]
fn commands_from_unregistered_peers_are_dropped() {
    let mut driver = SignalingDriver::new();

    let out = command(&mut driver, PeerId(42), ClientCommand::SearchUsers { keyword: "x".into() });
    assert!(out.is_empty());
}
