//! Outbound messages: display commands, the detection event and the shared
//! sensor snapshot.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Wakes the display from idle.
pub const WAKE_COMMAND: &str = "idle off";

/// Where the controller sends its output. Calls are best effort: the
/// implementation logs its own failures and nothing is reported back.
pub trait Dispatcher {
    /// Sends a single command line to the display.
    fn dispatch_text_line(&mut self, line: &str);

    /// Publishes a payload under the device's state topic.
    fn publish_state_subtopic(&mut self, subtopic: &str, payload: &str);
}

/// Published on every qualifying detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProximityEvent {
    pub proximity: u16,
    pub lux: u16,
}

impl ProximityEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `backlight={'state':1,'brightness':N}`
pub fn backlight_command(brightness: u8) -> String {
    format!("backlight={{'state':1,'brightness':{}}}", brightness)
}

/// Something that adds its fields to the periodic sensor document.
/// Must not touch the bus: only cached values are reported.
pub trait SnapshotContributor {
    fn contribute(&self, doc: &mut Map<String, Value>);
}

/// Builds the `sensors` state document, e.g.
/// `{"time":"2023-04-28T21:23:10","uptimeSec":2700,"uptime":"0T00:45:00","lux":5}`.
pub fn sensor_snapshot(time: NaiveDateTime, uptime: Duration, contributors: &[&dyn SnapshotContributor]) -> Value {
    let mut doc = Map::new();
    doc.insert("time".into(), Value::from(time.format("%Y-%m-%dT%H:%M:%S").to_string()));
    doc.insert("uptimeSec".into(), Value::from(uptime.as_secs()));
    doc.insert("uptime".into(), Value::from(format_uptime(uptime)));

    for contributor in contributors {
        contributor.contribute(&mut doc);
    }

    Value::Object(doc)
}

/// Wall clock time at a fixed offset from UTC, as shown on the plate.
/// Offsets outside +/-24 h fall back to UTC.
pub fn local_time(utc: DateTime<Utc>, offset_hours: i32) -> NaiveDateTime {
    match FixedOffset::east_opt(offset_hours * 3600) {
        Some(offset) => utc.with_timezone(&offset).naive_local(),
        None => utc.naive_utc(),
    }
}

/// Days, then `T`, then `HH:MM:SS`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{}T{:02}:{:02}:{:02}",
        secs / 86_400,
        secs % 86_400 / 3600,
        secs % 3600 / 60,
        secs % 60
    )
}
