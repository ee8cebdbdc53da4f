//! Plain-text rendering for the command-line front end.

use std::fmt::Write;

use eventcache_core::cache::CacheAges;
use eventcache_core::utils::truncate_string;
use eventcache_core::{EventSlot, ParticipantEvents, Signature};

/// Widest time column before the event name
const TIME_COLUMN_WIDTH: usize = 10;

/// Signatures are opaque and can get long with many sources
const SIGNATURE_DISPLAY_WIDTH: usize = 60;

/// Render a schedule grouped by day. Events that don't have the usual
/// day/event/time shape are listed as raw JSON at the end.
pub fn schedule(events: &ParticipantEvents) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schedule for {}", events.name);

    if events.events.is_empty() {
        let _ = writeln!(out, "  (no events)");
        return out;
    }

    let groups = events.by_day();
    for (day, slots) in &groups {
        let _ = writeln!(out, "\n{}", day);
        for slot in slots {
            let _ = write!(
                out,
                "  {:<width$} {}",
                slot.display_time(),
                slot.display_event(),
                width = TIME_COLUMN_WIDTH
            );
            if let Some(ref category) = slot.category {
                let _ = write!(out, " [{}]", category);
            }
            out.push('\n');
        }
    }

    let typed: usize = groups.iter().map(|(_, slots)| slots.len()).sum();
    if typed < events.events.len() {
        let _ = writeln!(out, "\nOther");
        let untyped = events
            .events
            .iter()
            .filter(|e| serde_json::from_value::<EventSlot>((*e).clone()).is_err());
        for raw in untyped {
            let _ = writeln!(out, "  {}", raw);
        }
    }

    out
}

/// Render the participant list, one name per line, with a count footer.
pub fn participants(names: &[&str], total: usize) -> String {
    let mut out = String::new();
    for name in names {
        let _ = writeln!(out, "{}", name);
    }
    if names.len() == total {
        let _ = writeln!(out, "{} participants", total);
    } else {
        let _ = writeln!(out, "{} of {} participants", names.len(), total);
    }
    out
}

pub fn status(signature: &Signature, ages: &CacheAges, cached_events_for: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Server version:  {}",
        truncate_string(signature.as_str(), SIGNATURE_DISPLAY_WIDTH)
    );
    let _ = writeln!(out, "Last checked:    {}", ages.last_checked());
    let _ = writeln!(out, "Participants:    {}", ages.participants_age());
    match cached_events_for {
        Some(name) => {
            let _ = writeln!(out, "Schedule:        {} ({})", name, ages.events_age());
        }
        None => {
            let _ = writeln!(out, "Schedule:        none cached");
        }
    }
    out
}
