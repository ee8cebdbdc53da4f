use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A participant's event list, as returned by `GET /events?name=...`.
///
/// Events are kept as raw JSON and passed through untouched; use
/// [`ParticipantEvents::slots`] for a typed view when they have the usual
/// day/event/time shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ParticipantEvents {
    pub name: String,
    #[serde(default)]
    pub events: Vec<Value>,
}

impl ParticipantEvents {
    /// Empty record for `name`, delivered while the real fetch is in flight.
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: Vec::new(),
        }
    }

    /// Events that parse as an [`EventSlot`]; anything else is skipped.
    pub fn slots(&self) -> Vec<EventSlot> {
        self.events
            .iter()
            .filter_map(|e| serde_json::from_value(e.clone()).ok())
            .collect()
    }

    /// Slots grouped by day, weekdays in calendar order (Monday first) and
    /// unrecognized day names after them in first-seen order. Slots keep
    /// their server order within a day.
    pub fn by_day(&self) -> Vec<(String, Vec<EventSlot>)> {
        let mut groups: Vec<(String, Vec<EventSlot>)> = Vec::new();
        for slot in self.slots() {
            match groups.iter_mut().find(|(day, _)| *day == slot.day) {
                Some((_, slots)) => slots.push(slot),
                None => groups.push((slot.day.clone(), vec![slot])),
            }
        }
        // sort_by_key is stable, so unknown days stay in first-seen order
        groups.sort_by_key(|(day, _)| day_rank(day));
        groups
    }
}

/// One scheduled slot for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct EventSlot {
    pub day: String,
    pub event: Option<String>,
    pub time: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl EventSlot {
    pub fn display_event(&self) -> &str {
        self.event.as_deref().unwrap_or("(untitled)")
    }

    pub fn display_time(&self) -> &str {
        self.time.as_deref().unwrap_or("--")
    }
}

fn day_rank(day: &str) -> u32 {
    Weekday::from_str(day.trim())
        .map(|d| d.num_days_from_monday())
        .unwrap_or(7)
}
