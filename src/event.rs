//! Call-state event records as delivered by the switch.
//!
//! An [`Event`] is a flat string-to-string map. Two wire encodings are
//! understood: `text/event-plain` (header lines with URL-encoded values)
//! and `text/event-json` (a flat JSON object).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header holding the event name (`CHANNEL_CREATE`, `CUSTOM`, ...).
pub const EVENT_NAME: &str = "Event-Name";
/// Header holding the call direction (`inbound` / `outbound`).
pub const CALL_DIRECTION: &str = "Call-Direction";
/// Header holding the calling party's extension.
pub const CALLER_ID_NUMBER: &str = "Caller-Caller-ID-Number";
/// Header holding the dialed destination.
pub const DESTINATION_NUMBER: &str = "Caller-Destination-Number";
/// Header holding the caller's username.
pub const CALLER_USERNAME: &str = "Caller-Username";
/// Channel variable holding the user that was actually dialed.
pub const DIALED_USER: &str = "variable_dialed_user";
/// Header holding the hangup cause.
pub const HANGUP_CAUSE: &str = "Hangup-Cause";
/// Channel variable holding the call duration in seconds.
pub const DURATION: &str = "variable_duration";
/// Header holding the local event timestamp.
pub const EVENT_DATE_LOCAL: &str = "Event-Date-Local";

/// A single call-state event.
///
/// Missing keys read as the empty string through [`Event::field`], so
/// templates never fail on incomplete events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    headers: BTreeMap<String, String>,
}

impl Event {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `text/event-plain` body.
    ///
    /// Each line is `Name: value` with a URL-encoded value. Parsing stops at
    /// the first blank line; anything after it is the event body and is
    /// stored under `_body`. Lines without a colon are skipped.
    pub fn parse_plain(raw: &str) -> Self {
        let mut headers = BTreeMap::new();
        let mut lines = raw.split('\n');

        for line in lines.by_ref() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim_start();
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_owned());
            headers.insert(key.trim().to_owned(), decoded);
        }

        let body = lines.collect::<Vec<_>>().join("\n");
        if !body.trim().is_empty() {
            headers.insert("_body".to_owned(), body);
        }

        Self { headers }
    }

    /// Parse a `text/event-json` body.
    ///
    /// Non-string values are stored in their JSON text form.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON object.
    pub fn parse_json(raw: &str) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let headers = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        Ok(Self { headers })
    }

    /// Look up a header, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Look up a header, reading a missing key as the empty string.
    pub fn field(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Whether the header is present with exactly this value.
    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    /// Set a header, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// The `Event-Name` header.
    pub fn name(&self) -> Option<&str> {
        self.get(EVENT_NAME)
    }

    /// Number of headers carried by the event.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the event carries no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Event
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            headers: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
