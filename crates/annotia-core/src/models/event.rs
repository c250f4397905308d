//! Audit-trail events
//!
//! Every record carries an append-only list of events stored as JSONB.
//! Session events additionally contribute their duration to the record's
//! running millisecond counter; plain action events do not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A discrete action taken against the record.
    Action {
        name: String,
        user: Option<String>,
        created_at: DateTime<Utc>,
    },
    /// A timed annotation session; `milliseconds` is the elapsed time.
    Session {
        user: Option<String>,
        created_at: DateTime<Utc>,
        milliseconds: i64,
    },
}

impl Event {
    pub fn action(name: impl Into<String>, user: Option<String>) -> Self {
        Event::Action {
            name: name.into(),
            user,
            created_at: Utc::now(),
        }
    }

    pub fn session(milliseconds: i64, user: Option<String>) -> Self {
        Event::Session {
            user,
            created_at: Utc::now(),
            milliseconds,
        }
    }

    /// Contribution of this event to the record's millisecond counter.
    pub fn session_milliseconds(&self) -> i64 {
        match self {
            Event::Session { milliseconds, .. } => *milliseconds,
            Event::Action { .. } => 0,
        }
    }
}

/// Parse an events JSONB column; entries that fail to deserialize are
/// skipped so a historical schema drift never poisons the whole record.
pub fn events_from_json(v: &JsonValue) -> Vec<Event> {
    match v {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_milliseconds_only_for_sessions() {
        let session = Event::session(1500, Some("ana".into()));
        assert_eq!(session.session_milliseconds(), 1500);

        let action = Event::action("image.flagged", None);
        assert_eq!(action.session_milliseconds(), 0);
    }

    #[test]
    fn events_json_round_trip() {
        let events = vec![
            Event::action("image.created", Some("ana".into())),
            Event::session(250, Some("ana".into())),
        ];
        let json = serde_json::to_value(&events).unwrap();
        assert_eq!(events_from_json(&json), events);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let json = json!([
            {"kind": "session", "user": null, "created_at": "2024-03-01T10:00:00Z", "milliseconds": 90},
            {"kind": "unknown_thing"},
            42
        ]);
        let events = events_from_json(&json);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_milliseconds(), 90);
    }
}
