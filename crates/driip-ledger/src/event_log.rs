//! Append-only event log.

use chrono::{DateTime, Utc};
use driip_types::{EngineEvent, EventSink};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct LoggedEvent {
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: EngineEvent,
}

/// Collects every emitted [`EngineEvent`] in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LoggedEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[LoggedEvent] {
        &self.entries
    }

    /// Events without their envelope.
    pub fn events(&self) -> impl Iterator<Item = &EngineEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    /// Number of events with the given [`EngineEvent::name`].
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events().filter(|e| e.name() == name).count()
    }

    #[must_use]
    pub fn last(&self) -> Option<&EngineEvent> {
        self.entries.last().map(|e| &e.event)
    }

    /// The log as JSON lines.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: EngineEvent) {
        let sequence = self.entries.len() as u64;
        info!(sequence, event = event.name(), "engine event");
        self.entries.push(LoggedEvent {
            sequence,
            recorded_at: Utc::now(),
            event,
        });
    }
}
