//! Tests for notification templates.

use callbell::event::Event;
use callbell::message::{
    call_rejected, channel_answer, channel_create, hangup_complete, missed_call, voicemail_left,
    MessageContext,
};

fn call_event() -> Event {
    [
        ("Caller-Username", "alice"),
        ("Caller-Caller-ID-Number", "1001"),
        ("Caller-Destination-Number", "1002"),
        ("Hangup-Cause", "NORMAL_CLEARING"),
        ("variable_duration", "42"),
        ("Event-Date-Local", "2024-03-01 09:15:00"),
    ]
    .into_iter()
    .collect()
}

// ---------------------------------------------------------------------------
// Channel create
// ---------------------------------------------------------------------------

#[test]
fn create_incoming_shows_caller() {
    let text = channel_create(&call_event(), MessageContext::Incoming);
    assert!(text.starts_with(":arrow_left: ***Incoming Call***"));
    assert!(text.contains("*From:*  alice"));
    assert!(text.contains("*CallerID:* 1001"));
}

#[test]
fn create_outgoing_shows_destination() {
    let text = channel_create(&call_event(), MessageContext::Outgoing);
    assert_eq!(text, ":arrow_right: ***New Call***\n\t\tCalling to 1002");
}

#[test]
fn create_outgoing_to_voicemail_is_redirect() {
    let mut event = call_event();
    event.insert("Caller-Destination-Number", "voicemail");
    let text = channel_create(&event, MessageContext::Outgoing);
    assert_eq!(
        text,
        ":arrow_right_hook: ***Redirected Call***\n\t\tCalling to voicemail"
    );
}

#[test]
fn create_panel_names_both_parties() {
    let text = channel_create(&call_event(), MessageContext::Panel);
    assert_eq!(
        text,
        ":telephone_receiver: ***New Call***\n\t\talice is calling 1002"
    );
}

// ---------------------------------------------------------------------------
// Answer / reject
// ---------------------------------------------------------------------------

#[test]
fn answer_texts_per_context() {
    let event = call_event();
    assert_eq!(
        channel_answer(&event, MessageContext::Outgoing),
        ":white_check_mark: ***Call Answered***\n\t\t1002 answered"
    );
    assert_eq!(
        channel_answer(&event, MessageContext::Incoming),
        ":white_check_mark: ***Call Answered***\n\t\tCall from 1001 answered"
    );
    assert_eq!(
        channel_answer(&event, MessageContext::Panel),
        ":white_check_mark: ***Call Answered***\n\t\t1002 answered alice"
    );
}

#[test]
fn rejected_texts_per_context() {
    let event = call_event();
    assert_eq!(
        call_rejected(&event, MessageContext::Outgoing),
        ":x: ***Call Rejected***\n\t\t1002 rejected the call"
    );
    assert_eq!(
        call_rejected(&event, MessageContext::Incoming),
        ":x: ***Call Rejected***\n\t\tCall from 1001 rejected"
    );
    assert!(call_rejected(&event, MessageContext::Panel).contains("1002 rejected alice"));
}

// ---------------------------------------------------------------------------
// Hangup
// ---------------------------------------------------------------------------

#[test]
fn hangup_includes_cause_and_duration() {
    let text = hangup_complete(&call_event(), MessageContext::Outgoing);
    assert_eq!(
        text,
        ":telephone: ***Call Hang Up***\n\t\tFinished call with: 1002\n\t\t*Cause:* NORMAL_CLEARING\n\t\t*Duration:* 42 seconds"
    );
}

#[test]
fn hangup_incoming_names_caller_id() {
    let text = hangup_complete(&call_event(), MessageContext::Incoming);
    assert!(text.contains("Finished call with: 1001"));
    assert!(text.contains("*Duration:* 42 seconds"));
}

#[test]
fn hangup_panel_names_both_parties() {
    let text = hangup_complete(&call_event(), MessageContext::Panel);
    assert!(text.starts_with(":telephone: ***Call Hang Up***"));
    assert!(text.contains("1002 and alice finished their call"));
    assert!(text.contains("*Cause:* NORMAL_CLEARING"));
}

// ---------------------------------------------------------------------------
// Missed / voicemail
// ---------------------------------------------------------------------------

#[test]
fn missed_call_has_caller_and_date() {
    let text = missed_call(&call_event());
    assert_eq!(
        text,
        ":exclamation:  ***Missed Call*** \n\t\talice called you on 2024-03-01 09:15:00 \n"
    );
}

#[test]
fn voicemail_includes_message_details() {
    let event: Event = [
        ("VM-Caller-ID-Name", "Bob Smith"),
        ("VM-Caller-ID-Number", "+15551234567"),
        ("Event-Date-Local", "2024-03-01 10:00:00"),
        ("VM-Message-Len", "17"),
    ]
    .into_iter()
    .collect();

    let text = voicemail_left(&event);
    assert!(text.starts_with(":mailbox_with_mail:   ***New Voicemail***"));
    assert!(text.contains("*From:* Bob Smith"));
    assert!(text.contains("*CallerID:* +15551234567"));
    assert!(text.contains("*On:* 2024-03-01 10:00:00"));
    assert!(text.contains("*Duration:* 17 seconds"));
}

#[test]
fn missing_fields_render_empty() {
    let event = Event::new();
    assert_eq!(
        channel_create(&event, MessageContext::Outgoing),
        ":arrow_right: ***New Call***\n\t\tCalling to "
    );
    assert_eq!(
        missed_call(&event),
        ":exclamation:  ***Missed Call*** \n\t\t called you on  \n"
    );
}
