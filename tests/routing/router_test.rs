//! Tests for call-state classification and notification routing.

use callbell::directory::Directory;
use callbell::event::Event;
use callbell::router::{classify, CallState, Notification, Router, RoutingOptions, Target};

fn directory() -> Directory {
    [("1001", "alice"), ("1002", "bob"), ("1003", "carol")]
        .into_iter()
        .collect()
}

fn router(notify_caller: bool, panel: Option<Target>) -> Router {
    Router::new(
        directory(),
        RoutingOptions {
            notify_caller,
            panel,
        },
    )
}

fn event(pairs: &[(&str, &str)]) -> Event {
    pairs.iter().copied().collect()
}

fn inbound(name: &str) -> Event {
    event(&[
        ("Event-Name", name),
        ("Call-Direction", "inbound"),
        ("Caller-Username", "1001"),
        ("Caller-Caller-ID-Number", "1001"),
        ("Caller-Destination-Number", "1002"),
    ])
}

fn users(notifications: &[Notification]) -> Vec<Target> {
    notifications.iter().map(|n| n.target.clone()).collect()
}

fn user(name: &str) -> Target {
    Target::User(name.to_owned())
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn classify_inbound_create() {
    assert_eq!(classify(&inbound("CHANNEL_CREATE")), Some(CallState::Created));
}

#[test]
fn classify_outbound_create_is_ignored() {
    let mut e = inbound("CHANNEL_CREATE");
    e.insert("Call-Direction", "outbound");
    assert_eq!(classify(&e), None);
}

#[test]
fn classify_answer_variants() {
    assert_eq!(classify(&inbound("CHANNEL_ANSWER")), Some(CallState::Answered));

    let mut rejected = inbound("CHANNEL_ANSWER");
    rejected.insert("variable_originate_disposition", "CALL_REJECTED");
    assert_eq!(classify(&rejected), Some(CallState::Rejected));

    let mut no_pickup = inbound("CHANNEL_ANSWER");
    no_pickup.insert("variable_originate_disposition", "NO_PICKUP");
    assert_eq!(classify(&no_pickup), None);

    let mut no_answer = inbound("CHANNEL_ANSWER");
    no_answer.insert("variable_last_bridge_hangup_cause", "NO_ANSWER");
    assert_eq!(classify(&no_answer), None);
}

#[test]
fn classify_hangup_flags() {
    let mut normal = inbound("CHANNEL_HANGUP_COMPLETE");
    normal.insert("Hangup-Cause", "NORMAL_CLEARING");
    assert_eq!(
        classify(&normal),
        Some(CallState::HungUp {
            notify_callee: true,
            missed: false
        })
    );

    let mut cancelled = inbound("CHANNEL_HANGUP_COMPLETE");
    cancelled.insert("Hangup-Cause", "ORIGINATOR_CANCEL");
    assert_eq!(
        classify(&cancelled),
        Some(CallState::HungUp {
            notify_callee: true,
            missed: true
        })
    );

    let mut to_voicemail = inbound("CHANNEL_HANGUP_COMPLETE");
    to_voicemail.insert("Hangup-Cause", "NO_ANSWER");
    to_voicemail.insert("variable_last_app", "voicemail");
    to_voicemail.insert("Other-Leg-Destination-Number", "voicemail");
    assert_eq!(
        classify(&to_voicemail),
        Some(CallState::HungUp {
            notify_callee: false,
            missed: false
        })
    );
}

#[test]
fn classify_hangup_with_voicemail_leg_is_ignored() {
    let mut e = inbound("CHANNEL_HANGUP_COMPLETE");
    e.insert("Other-Leg-Channel-Name", "loopback/voicemail-a");
    assert_eq!(classify(&e), None);
}

#[test]
fn classify_outbound_hangup_only_when_missed() {
    let mut e = inbound("CHANNEL_HANGUP_COMPLETE");
    e.insert("Call-Direction", "outbound");
    e.insert("Hangup-Cause", "NORMAL_CLEARING");
    assert_eq!(classify(&e), None);

    e.insert("Hangup-Cause", "NO_PICKUP");
    assert_eq!(classify(&e), Some(CallState::Missed));
}

#[test]
fn classify_voicemail_custom_event() {
    let e = event(&[
        ("Event-Name", "CUSTOM"),
        ("Event-Subclass", "vm::maintenance"),
        ("VM-Action", "leave-message"),
    ]);
    assert_eq!(classify(&e), Some(CallState::VoicemailLeft));

    let other = event(&[("Event-Name", "CUSTOM"), ("VM-Action", "mwi-update")]);
    assert_eq!(classify(&other), None);
}

#[test]
fn classify_unnamed_event() {
    assert_eq!(classify(&Event::new()), None);
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[test]
fn inbound_create_notifies_caller_and_callee() {
    let out = router(true, None).route(&inbound("CHANNEL_CREATE"));

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].target, user("alice"));
    assert!(out[0].text.starts_with(":arrow_right: ***New Call***"));
    assert_eq!(out[1].target, user("bob"));
    assert!(out[1].text.starts_with(":arrow_left: ***Incoming Call***"));
}

#[test]
fn caller_is_skipped_when_caller_notices_disabled() {
    let out = router(false, None).route(&inbound("CHANNEL_CREATE"));
    assert_eq!(users(&out), vec![user("bob")]);
}

#[test]
fn unmapped_callee_suppresses_only_that_notification() {
    let mut e = inbound("CHANNEL_ANSWER");
    e.insert("Caller-Destination-Number", "5555");
    let out = router(true, None).route(&e);

    assert_eq!(users(&out), vec![user("alice")]);
}

#[test]
fn callee_falls_back_to_dialed_user() {
    let mut e = inbound("CHANNEL_CREATE");
    e.insert("Caller-Destination-Number", "600");
    e.insert("variable_dialed_user", "1003");
    let out = router(false, None).route(&e);

    assert_eq!(users(&out), vec![user("carol")]);
}

#[test]
fn rejected_answer_uses_rejected_template() {
    let mut e = inbound("CHANNEL_ANSWER");
    e.insert("variable_originate_disposition", "CALL_REJECTED");
    let out = router(true, None).route(&e);

    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|n| n.text.starts_with(":x: ***Call Rejected***")));
}

#[test]
fn missed_inbound_hangup_adds_missed_call_for_callee() {
    let mut e = inbound("CHANNEL_HANGUP_COMPLETE");
    e.insert("Hangup-Cause", "NO_ANSWER");
    let out = router(true, None).route(&e);

    assert_eq!(users(&out), vec![user("alice"), user("bob"), user("bob")]);
    assert!(out[0].text.starts_with(":telephone: ***Call Hang Up***"));
    assert!(out[1].text.starts_with(":telephone: ***Call Hang Up***"));
    assert!(out[2].text.starts_with(":exclamation:  ***Missed Call***"));
}

#[test]
fn hangup_to_voicemail_skips_callee() {
    let mut e = inbound("CHANNEL_HANGUP_COMPLETE");
    e.insert("Hangup-Cause", "NORMAL_CLEARING");
    e.insert("Other-Leg-Destination-Number", "voicemail");
    let out = router(true, None).route(&e);

    assert_eq!(users(&out), vec![user("alice")]);
}

#[test]
fn outbound_missed_notifies_callee_only() {
    let mut e = inbound("CHANNEL_HANGUP_COMPLETE");
    e.insert("Call-Direction", "outbound");
    e.insert("Hangup-Cause", "ORIGINATOR_CANCEL");
    let out = router(true, Some(Target::Default)).route(&e);

    assert_eq!(users(&out), vec![user("bob")]);
    assert!(out[0].text.contains("1001 called you on"));
}

#[test]
fn voicemail_goes_to_mailbox_owner() {
    let e = event(&[
        ("Event-Name", "CUSTOM"),
        ("VM-Action", "leave-message"),
        ("VM-User", "1003"),
        ("VM-Caller-ID-Name", "Dave"),
    ]);
    let out = router(false, Some(Target::Default)).route(&e);

    assert_eq!(users(&out), vec![user("carol")]);
    assert!(out[0].text.contains("*From:* Dave"));
}

#[test]
fn voicemail_for_unknown_mailbox_is_dropped() {
    let e = event(&[
        ("Event-Name", "CUSTOM"),
        ("VM-Action", "leave-message"),
        ("VM-User", "9999"),
    ]);
    assert!(router(true, None).route(&e).is_empty());
}

#[test]
fn panel_receives_panel_styled_copy() {
    let panel = Target::Channel("calls".to_owned());
    let out = router(false, Some(panel.clone())).route(&inbound("CHANNEL_CREATE"));

    assert_eq!(users(&out), vec![user("bob"), panel]);
    assert_eq!(
        out[1].text,
        ":telephone_receiver: ***New Call***\n\t\t1001 is calling 1002"
    );
}

#[test]
fn panel_is_notified_even_when_parties_are_unknown() {
    let e = event(&[
        ("Event-Name", "CHANNEL_ANSWER"),
        ("Call-Direction", "inbound"),
        ("Caller-Caller-ID-Number", "7777"),
        ("Caller-Destination-Number", "8888"),
    ]);
    let out = router(true, Some(Target::Default)).route(&e);

    assert_eq!(users(&out), vec![Target::Default]);
}

#[test]
fn ignored_events_route_nowhere() {
    let e = event(&[("Event-Name", "HEARTBEAT")]);
    assert!(router(true, Some(Target::Default)).route(&e).is_empty());
}
