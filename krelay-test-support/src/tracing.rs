//! Event recorder for asserting on structured diagnostics in tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Layer that keeps every event it sees, in emission order.
///
/// # Examples
/// ```
/// use krelay_test_support::tracing::EventRecorder;
/// use tracing_subscriber::layer::SubscriberExt;
///
/// let recorder = EventRecorder::default();
/// let subscriber = tracing_subscriber::registry().with(recorder.clone());
/// tracing::subscriber::with_default(subscriber, || tracing::info!(answer = 42, "ready"));
/// let event = recorder.find("ready").expect("event must be recorded");
/// assert_eq!(event.fields.get("answer").map(String::as_str), Some("42"));
/// ```
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First recorded event whose message equals `message`.
    #[must_use]
    pub fn find(&self, message: &str) -> Option<RecordedEvent> {
        self.events()
            .into_iter()
            .find(|event| event.message.as_deref() == Some(message))
    }
}

/// A single recorded event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedEvent {
    /// Level the event was emitted at.
    pub level: Level,
    /// The event's `message` field, if it had one.
    pub message: Option<String>,
    /// Every other field, rendered with `Display` or `Debug`.
    pub fields: HashMap<String, String>,
}

impl<S: Subscriber> Layer<S> for EventRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        let recorded = RecordedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        };
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: HashMap<String, String>,
}

impl FieldCollector {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_owned());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.store(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.store(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.store(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.store(field, value.to_string());
    }
}
