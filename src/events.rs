use crate::config::TimeUnit;
use crate::customer::CustomerRecord;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub type ClerkId = usize;

// Customer state transitions reported to the event sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "clerk")]
pub enum EventKind {
    Arrived,
    Waiting,
    BeingServed(ClerkId),
    Finished(ClerkId),
    Left,
}

impl EventKind {
    pub fn message(&self) -> &'static str {
        match self {
            EventKind::Arrived => "arrived",
            EventKind::Waiting => "waiting in queue",
            EventKind::BeingServed(_) => "being served",
            EventKind::Finished(_) => "finished being served",
            EventKind::Left => "left",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerEvent {
    pub customer: CustomerRecord,
    pub kind: EventKind,
    // Since the start of the run.
    pub at: Duration,
}

// Receives every customer transition. Called from the customer tasks, so
// implementations must not block on protocol state.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &CustomerEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: &CustomerEvent) {
        (**self).record(event)
    }
}

// Discards every event. Used when the periodic monitor does the logging.
pub struct Silent;

impl EventSink for Silent {
    fn record(&self, _event: &CustomerEvent) {}
}

// Logs every transition as it happens: `[1.50s]: 3:1,2,4 being served`.
pub struct RealTimeLog {
    unit: TimeUnit,
}

impl RealTimeLog {
    pub fn new(unit: TimeUnit) -> Self {
        RealTimeLog { unit }
    }

    pub fn line(&self, event: &CustomerEvent) -> String {
        let mut line = format!(
            "[{}]: {} {}",
            self.unit.format(event.at),
            event.customer,
            event.kind.message()
        );
        if let EventKind::BeingServed(clerk) = event.kind {
            line.push_str(&format!(" by clerk {}", clerk));
        }
        line
    }
}

impl EventSink for RealTimeLog {
    fn record(&self, event: &CustomerEvent) {
        log::info!("{}", self.line(event));
    }
}
