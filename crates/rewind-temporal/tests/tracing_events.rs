#![forbid(unsafe_code)]

//! Structured logging emitted by the temporal middleware.
//!
//! Captures events and spans with a `tracing_subscriber` layer and checks
//! targets, messages and fields for the recording decisions and history
//! operations.
//!
//! Run:
//!   cargo test -p rewind-temporal --test tracing_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rewind_store::{Store, Update, create_store};
use rewind_temporal::{TemporalExt, TemporalOptions, TemporalStore, temporal};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

#[derive(Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            message,
            fields,
            parent_span_name,
        });
    }
}

struct Captured {
    events: Vec<CapturedEvent>,
    spans: Vec<CapturedSpan>,
}

impl Captured {
    fn temporal_messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.target == "rewind.temporal")
            .map(|e| e.message.as_str())
            .collect()
    }

    fn first(&self, message: &str) -> &CapturedEvent {
        self.events
            .iter()
            .find(|e| e.message == message)
            .unwrap_or_else(|| panic!("no event {message:?} in {:?}", self.temporal_messages()))
    }
}

fn capture(run: impl FnOnce()) -> Captured {
    let layer = Capture::default();
    let events = Arc::clone(&layer.events);
    let spans = Arc::clone(&layer.spans);
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, run);
    let events = events.lock().unwrap().clone();
    let spans = spans.lock().unwrap().clone();
    Captured { events, spans }
}

fn counter(options: TemporalOptions<i32>) -> (Store<i32>, TemporalStore<i32, i32>) {
    let store = create_store(temporal(|_set, _get, _store| 0, options));
    let history = store.temporal::<i32>().unwrap();
    (store, history)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn setup_is_logged() {
    let captured = capture(|| {
        let _ = counter(TemporalOptions::new().with_limit(4));
    });
    let event = captured.first("temporal middleware installed");
    assert_eq!(event.target, "rewind.temporal");
    assert_eq!(event.fields.get("limit").map(String::as_str), Some("Some(4)"));
    assert_eq!(event.fields.get("tracking").map(String::as_str), Some("true"));
}

#[test]
fn recorded_entry_reports_depth_and_evictions() {
    let (store, _history) = counter(TemporalOptions::new().with_limit(1));
    let captured = capture(|| {
        store.set_state(Update::replace(1));
        store.set_state(Update::replace(2));
    });

    let recorded: Vec<_> = captured
        .events
        .iter()
        .filter(|e| e.message == "entry recorded")
        .collect();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].fields["evicted"], "0");
    assert_eq!(recorded[1].fields["evicted"], "1");
    assert_eq!(recorded[1].fields["past_depth"], "1");
}

#[test]
fn skipped_entry_carries_reason() {
    let (store, _history) = counter(
        TemporalOptions::new()
            .with_equality(|a: &i32, b: &i32| a == b)
            .with_diff(|_: &i32, _: &i32| None::<()>),
    );
    let captured = capture(|| {
        store.set_state(Update::replace(0));
        store.set_state(Update::replace(5));
    });

    let reasons: Vec<_> = captured
        .events
        .iter()
        .filter(|e| e.message == "entry skipped")
        .map(|e| e.fields["reason"].clone())
        .collect();
    assert_eq!(reasons, vec!["equal", "unchanged"]);
}

#[test]
fn paused_writes_are_traced_not_recorded() {
    let (store, history) = counter(TemporalOptions::new());
    history.pause();
    let captured = capture(|| store.set_state(Update::replace(3)));

    let messages = captured.temporal_messages();
    assert!(messages.contains(&"paused; write passed through"));
    assert!(!messages.contains(&"entry recorded"));
}

#[test]
fn history_operations_are_logged() {
    let (store, history) = counter(TemporalOptions::new());
    for v in 1..=3 {
        store.set_state(Update::replace(v));
    }
    let captured = capture(|| {
        history.undo_steps(2);
        history.redo();
        history.pause();
        history.resume();
        history.clear();
    });

    assert_eq!(
        captured.temporal_messages(),
        vec!["undo", "redo", "tracking paused", "tracking resumed", "history cleared"]
    );
    let undo = captured.first("undo");
    assert_eq!(undo.fields["steps"], "2");
    assert_eq!(undo.fields["past_depth"], "1");
    assert_eq!(undo.fields["future_depth"], "2");
}

#[test]
fn lowering_limit_logs_evictions() {
    let (store, history) = counter(TemporalOptions::new());
    for v in 1..=4 {
        store.set_state(Update::replace(v));
    }
    let captured = capture(|| history.set_limit(Some(1)));
    assert_eq!(captured.first("limit lowered; entries evicted").fields["evicted"], "3");
}

#[test]
fn listeners_run_inside_notify_span() {
    let (store, history) = counter(TemporalOptions::new());
    let _sub = history.subscribe(|_, _| tracing::info!(target: "rewind.test", "history listener"));

    let captured = capture(|| store.set_state(Update::replace(1)));

    let span = captured
        .spans
        .iter()
        .find(|s| s.name == "store.notify")
        .expect("notify span");
    assert_eq!(span.fields["listeners"], "1");
    assert_eq!(
        captured.first("history listener").parent_span_name.as_deref(),
        Some("store.notify")
    );
}
