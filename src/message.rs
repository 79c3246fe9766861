//! Notification templates.
//!
//! Every function here is pure: it reads event fields and returns the
//! message text. Missing fields render as empty text. Markup is
//! Mattermost markdown with emoji shortcodes.

use crate::event::{
    Event, CALLER_ID_NUMBER, CALLER_USERNAME, DESTINATION_NUMBER, DURATION, EVENT_DATE_LOCAL,
    HANGUP_CAUSE,
};

/// Destination used when a call is redirected straight to voicemail.
pub const VOICEMAIL: &str = "voicemail";

/// Whose point of view a message is written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageContext {
    /// The calling party (outbound leg from their point of view).
    Outgoing,
    /// The called party.
    Incoming,
    /// A shared panel channel watching all calls.
    Panel,
}

/// Message for a newly created call.
pub fn channel_create(event: &Event, context: MessageContext) -> String {
    let dest = event.field(DESTINATION_NUMBER);
    match context {
        MessageContext::Incoming => format!(
            ":arrow_left: ***Incoming Call***\n\t\t*From:*  {from}\n\t\t*CallerID:* {cid}",
            from = event.field(CALLER_USERNAME),
            cid = event.field(CALLER_ID_NUMBER),
        ),
        MessageContext::Panel => format!(
            ":telephone_receiver: ***New Call***\n\t\t{from} is calling {dest}",
            from = event.field(CALLER_USERNAME),
        ),
        MessageContext::Outgoing if dest == VOICEMAIL => {
            format!(":arrow_right_hook: ***Redirected Call***\n\t\tCalling to {dest}")
        }
        MessageContext::Outgoing => format!(":arrow_right: ***New Call***\n\t\tCalling to {dest}"),
    }
}

/// Message for an answered call.
pub fn channel_answer(event: &Event, context: MessageContext) -> String {
    let body = match context {
        MessageContext::Outgoing => format!("{} answered", event.field(DESTINATION_NUMBER)),
        MessageContext::Incoming => {
            format!("Call from {} answered", event.field(CALLER_ID_NUMBER))
        }
        MessageContext::Panel => format!(
            "{dest} answered {from}",
            dest = event.field(DESTINATION_NUMBER),
            from = event.field(CALLER_USERNAME),
        ),
    };
    format!(":white_check_mark: ***Call Answered***\n\t\t{body}")
}

/// Message for a call the callee rejected.
pub fn call_rejected(event: &Event, context: MessageContext) -> String {
    let body = match context {
        MessageContext::Outgoing => {
            format!("{} rejected the call", event.field(DESTINATION_NUMBER))
        }
        MessageContext::Incoming => {
            format!("Call from {} rejected", event.field(CALLER_ID_NUMBER))
        }
        MessageContext::Panel => format!(
            "{dest} rejected {from}",
            dest = event.field(DESTINATION_NUMBER),
            from = event.field(CALLER_USERNAME),
        ),
    };
    format!(":x: ***Call Rejected***\n\t\t{body}")
}

/// Message for a finished call, with cause and duration.
pub fn hangup_complete(event: &Event, context: MessageContext) -> String {
    let summary = match context {
        MessageContext::Outgoing => {
            format!("Finished call with: {}", event.field(DESTINATION_NUMBER))
        }
        MessageContext::Incoming => {
            format!("Finished call with: {}", event.field(CALLER_ID_NUMBER))
        }
        MessageContext::Panel => format!(
            "{dest} and {from} finished their call",
            dest = event.field(DESTINATION_NUMBER),
            from = event.field(CALLER_USERNAME),
        ),
    };
    format!(
        ":telephone: ***Call Hang Up***\n\t\t{summary}\n\t\t*Cause:* {cause}\n\t\t*Duration:* {duration} seconds",
        cause = event.field(HANGUP_CAUSE),
        duration = event.field(DURATION),
    )
}

/// Message telling the callee they missed a call.
pub fn missed_call(event: &Event) -> String {
    format!(
        ":exclamation:  ***Missed Call*** \n\t\t{from} called you on {date} \n",
        from = event.field(CALLER_USERNAME),
        date = event.field(EVENT_DATE_LOCAL),
    )
}

/// Message announcing a new voicemail.
pub fn voicemail_left(event: &Event) -> String {
    format!(
        ":mailbox_with_mail:   ***New Voicemail***\n\t\t*From:* {name}\n\t\t*CallerID:* {number}\n\t\t*On:* {date}\n\t\t*Duration:* {len} seconds\n",
        name = event.field("VM-Caller-ID-Name"),
        number = event.field("VM-Caller-ID-Number"),
        date = event.field(EVENT_DATE_LOCAL),
        len = event.field("VM-Message-Len"),
    )
}
