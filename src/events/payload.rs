//! Normalised outbound record for host events
//!
//! Converts a raw `(event name, opaque data)` pair into an [`EventRecord`] with a
//! fixed wire shape:
//!
//! ```json
//! {"eventType": "...", "timestamp": "...", "data": "...", "reportType": "..."}
//! ```

use crate::core::{ForwarderError, ForwarderResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::json;
use std::fmt::{self, Write};
use tracing::warn;

/// Text sent when an event carries no data
pub const NO_DATA: &str = "No Data";

/// Text sent when event data fails to render
pub const UNRENDERABLE_DATA: &str = "Unrenderable Data";

/// Classification tag used by the ingestion side for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportType {
    ProgramStatistics,
    TimeSpent,
    DiskSpace,
    Flags,
    Productivity,
    Activity,
    /// Catch-all bucket, including `SnapshotSaved` and any unknown event name
    Snapshot,
}

impl ReportType {
    pub fn from_event_name(event_name: &str) -> Self {
        match event_name {
            "ProgramStatistics" => ReportType::ProgramStatistics,
            "TimeSpentComputing" => ReportType::TimeSpent,
            "DiskSpaceUsage" => ReportType::DiskSpace,
            "FlagSaved" => ReportType::Flags,
            "ProductivityGrades" => ReportType::Productivity,
            "ActivityCloud" => ReportType::Activity,
            _ => ReportType::Snapshot,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::ProgramStatistics => "program_statistics",
            ReportType::TimeSpent => "time_spent",
            ReportType::DiskSpace => "disk_space",
            ReportType::Flags => "flags",
            ReportType::Productivity => "productivity",
            ReportType::Activity => "activity",
            ReportType::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque event payload as handed over by the host
///
/// The forwarder never looks inside the value; it only needs its textual form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventData {
    #[default]
    Absent,
    Text(String),
    Json(serde_json::Value),
}

impl EventData {
    /// Capture any displayable value by rendering it now
    ///
    /// A `Display` impl that reports an error yields [`UNRENDERABLE_DATA`] instead of
    /// panicking the way `to_string` would.
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Self::try_display(value).unwrap_or_else(|e| {
            warn!("{}, substituting fallback text", e);
            EventData::Text(UNRENDERABLE_DATA.to_string())
        })
    }

    /// Render a displayable value, reporting a failing `Display` impl
    pub fn try_display<T: fmt::Display + ?Sized>(value: &T) -> ForwarderResult<Self> {
        let mut rendered = String::new();
        write!(rendered, "{}", value).map_err(|_| {
            ForwarderError::serialization("event data could not be rendered to text")
        })?;
        Ok(EventData::Text(rendered))
    }

    /// Text sent as the `data` field
    pub fn render(&self) -> String {
        let text = match self {
            EventData::Absent => return NO_DATA.to_string(),
            EventData::Text(text) => text.clone(),
            EventData::Json(serde_json::Value::Null) => return NO_DATA.to_string(),
            EventData::Json(serde_json::Value::String(s)) => s.clone(),
            EventData::Json(value) => value.to_string(),
        };

        if text.is_empty() {
            NO_DATA.to_string()
        } else {
            text
        }
    }
}

impl From<&str> for EventData {
    fn from(value: &str) -> Self {
        EventData::Text(value.to_string())
    }
}

impl From<String> for EventData {
    fn from(value: String) -> Self {
        EventData::Text(value)
    }
}

impl From<serde_json::Value> for EventData {
    fn from(value: serde_json::Value) -> Self {
        EventData::Json(value)
    }
}

impl<T: Into<EventData>> From<Option<T>> for EventData {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(EventData::Absent)
    }
}

/// One normalised event, owned by its delivery task
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: String,
}

impl EventRecord {
    /// Classification tag, recomputed from the event name on every call
    pub fn report_type(&self) -> ReportType {
        ReportType::from_event_name(&self.event_type)
    }

    /// ISO-8601 UTC timestamp with a `Z` designator
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// JSON wire body
    pub fn to_json(&self) -> ForwarderResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON wire body; if encoding fails the `data` field is replaced with
    /// [`UNRENDERABLE_DATA`]
    pub fn encode(&self) -> String {
        self.to_json().unwrap_or_else(|e| {
            warn!(event_type = %self.event_type, "{}, substituting fallback data", e);
            json!({
                "eventType": self.event_type,
                "timestamp": self.timestamp_rfc3339(),
                "data": UNRENDERABLE_DATA,
                "reportType": self.report_type().as_str(),
            })
            .to_string()
        })
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EventRecord", 4)?;
        state.serialize_field("eventType", &self.event_type)?;
        state.serialize_field("timestamp", &self.timestamp_rfc3339())?;
        state.serialize_field("data", &self.data)?;
        state.serialize_field("reportType", self.report_type().as_str())?;
        state.end()
    }
}

/// Build the outbound record for one event
pub fn build_record(event_name: &str, data: &EventData, timestamp: DateTime<Utc>) -> EventRecord {
    EventRecord {
        event_type: event_name.to_string(),
        timestamp,
        data: data.render(),
    }
}
