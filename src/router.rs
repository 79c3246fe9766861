//! Call-state classification and per-party routing.
//!
//! [`classify`] reduces an event to a [`CallState`]; [`Router::route`]
//! turns that state into the ordered list of notifications to deliver.
//! Directory lookups only happen for events that classify.

use tracing::debug;

use crate::directory::Directory;
use crate::event::{
    Event, CALLER_ID_NUMBER, CALL_DIRECTION, DESTINATION_NUMBER, DIALED_USER, HANGUP_CAUSE,
};
use crate::message::{self, MessageContext, VOICEMAIL};

/// Hangup causes that count as a missed call.
pub const MISSED_CAUSES: &[&str] = &["NO_PICKUP", "ORIGINATOR_CANCEL", "NO_ANSWER"];

const INBOUND: &str = "inbound";
const OUTBOUND: &str = "outbound";

/// Call-state transitions that produce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// An inbound leg was created.
    Created,
    /// The callee picked up.
    Answered,
    /// The callee declined.
    Rejected,
    /// An inbound call finished.
    HungUp {
        /// Whether the callee gets a hang-up notice (not when the other leg
        /// was voicemail).
        notify_callee: bool,
        /// Whether the callee also gets a missed-call notice.
        missed: bool,
    },
    /// An outbound leg ended without being picked up.
    Missed,
    /// A caller left a voicemail.
    VoicemailLeft,
}

/// Where a notification goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A direct message to a chat user.
    User(String),
    /// A named channel.
    Channel(String),
    /// Whatever channel the webhook is bound to.
    Default,
}

/// One rendered message and its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Delivery target.
    pub target: Target,
    /// Message text.
    pub text: String,
}

impl Notification {
    fn to_user(user: &str, text: String) -> Self {
        Self {
            target: Target::User(user.to_owned()),
            text,
        }
    }
}

/// Who, besides the parties themselves, gets told about calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingOptions {
    /// Also notify the calling party.
    pub notify_caller: bool,
    /// Panel destination; `None` disables panel notifications.
    pub panel: Option<Target>,
}

/// Classify an event into a notification-worthy call state.
///
/// Returns `None` for events that produce no notification.
pub fn classify(event: &Event) -> Option<CallState> {
    let direction = event.field(CALL_DIRECTION);

    match event.name()? {
        "CHANNEL_CREATE" if direction == INBOUND => Some(CallState::Created),
        "CHANNEL_ANSWER" if direction == INBOUND => {
            let disposition = event.field("variable_originate_disposition");
            if event.is("variable_last_bridge_hangup_cause", "NO_ANSWER")
                || disposition == "NO_PICKUP"
            {
                return None;
            }
            if disposition == "CALL_REJECTED" {
                Some(CallState::Rejected)
            } else {
                Some(CallState::Answered)
            }
        }
        "CHANNEL_HANGUP_COMPLETE" => {
            let missed_cause = MISSED_CAUSES.contains(&event.field(HANGUP_CAUSE));
            if direction == INBOUND {
                if event.field("Other-Leg-Channel-Name").contains(VOICEMAIL) {
                    return None;
                }
                Some(CallState::HungUp {
                    notify_callee: !event.is("Other-Leg-Destination-Number", VOICEMAIL),
                    missed: missed_cause && !event.is("variable_last_app", VOICEMAIL),
                })
            } else if direction == OUTBOUND && missed_cause {
                Some(CallState::Missed)
            } else {
                None
            }
        }
        "CUSTOM" if event.is("VM-Action", "leave-message") => Some(CallState::VoicemailLeft),
        _ => None,
    }
}

/// Applies the routing table against a fixed directory.
#[derive(Debug, Clone)]
pub struct Router {
    directory: Directory,
    options: RoutingOptions,
}

impl Router {
    /// Create a router.
    pub fn new(directory: Directory, options: RoutingOptions) -> Self {
        Self { directory, options }
    }

    /// The directory used for party resolution.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Compute the notifications for one event, in delivery order.
    ///
    /// Unmapped parties are skipped with a logged notice; the remaining
    /// notifications are still produced.
    pub fn route(&self, event: &Event) -> Vec<Notification> {
        let Some(state) = classify(event) else {
            debug!(event = ?event.name(), "event produces no notification");
            return Vec::new();
        };
        debug!(state = ?state, "event classified");

        if state == CallState::VoicemailLeft {
            return self
                .directory
                .resolve(event.field("VM-User"))
                .map(|user| vec![Notification::to_user(user, message::voicemail_left(event))])
                .unwrap_or_default();
        }

        let callee = self.callee(event);
        let mut out = Vec::new();

        let render: fn(&Event, MessageContext) -> String = match state {
            CallState::Created => message::channel_create,
            CallState::Answered => message::channel_answer,
            CallState::Rejected => message::call_rejected,
            CallState::HungUp { .. } => message::hangup_complete,
            CallState::Missed => {
                if let Some(user) = callee {
                    out.push(Notification::to_user(user, message::missed_call(event)));
                }
                return out;
            }
            CallState::VoicemailLeft => return out,
        };

        if let Some(user) = self.caller(event) {
            out.push(Notification::to_user(
                user,
                render(event, MessageContext::Outgoing),
            ));
        }

        match state {
            CallState::HungUp {
                notify_callee,
                missed,
            } => {
                if let Some(user) = callee {
                    if notify_callee {
                        out.push(Notification::to_user(
                            user,
                            render(event, MessageContext::Incoming),
                        ));
                    }
                    if missed {
                        out.push(Notification::to_user(user, message::missed_call(event)));
                    }
                }
            }
            _ => {
                if let Some(user) = callee {
                    out.push(Notification::to_user(
                        user,
                        render(event, MessageContext::Incoming),
                    ));
                }
            }
        }

        if let Some(panel) = &self.options.panel {
            out.push(Notification {
                target: panel.clone(),
                text: render(event, MessageContext::Panel),
            });
        }

        out
    }

    /// Chat user for the calling party, when caller notices are enabled.
    fn caller(&self, event: &Event) -> Option<&str> {
        if !self.options.notify_caller {
            return None;
        }
        self.directory.resolve(event.field(CALLER_ID_NUMBER))
    }

    /// Chat user for the called party.
    ///
    /// Falls back to the dialed user when the destination number itself
    /// is not in the directory (e.g. a ring group or short code).
    fn callee(&self, event: &Event) -> Option<&str> {
        let dest = event.field(DESTINATION_NUMBER);
        if let Some(user) = self.directory.lookup(dest) {
            return Some(user);
        }
        match event.get(DIALED_USER).filter(|u| !u.is_empty()) {
            Some(dialed) => self.directory.resolve(dialed),
            None => self.directory.resolve(dest),
        }
    }
}
