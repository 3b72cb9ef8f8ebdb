#![forbid(unsafe_code)]

//! Tracing output of the dispatch path.
//!
//! 1. Every dispatch opens a `component.dispatch` span named after the
//!    component and records how many updates were applied.
//! 2. Applied updates emit `driver.update_applied`.
//! 3. Rejected writes emit `driver.write_failed`.
//! 4. An exhausted update budget emits `driver.budget_exhausted`.
//! 5. A `foreach` update whose element vanished emits
//!    `cotransform.index_out_of_range` and `driver.update_dropped`.

use std::cell::{Cell, RefCell};
use std::future::{Future, ready};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use futures::executor::block_on;
use kiln_core::{CoTransformer, Dispatch, Spec};
use kiln_runtime::{
    ComponentConfig, DispatchOutcome, DriverConfig, Host, HostError, StateHost,
    create_component_spec_with,
};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

// ── Host ──────────────────────────────────────────────────────────────────

struct TestHost<S> {
    state: RefCell<Option<S>>,
    reject: Cell<bool>,
}

impl<S> TestHost<S> {
    fn new(state: S) -> Self {
        Self {
            state: RefCell::new(Some(state)),
            reject: Cell::new(false),
        }
    }
}

impl<S: Clone> StateHost<S> for TestHost<S> {
    fn read_state(&self) -> Option<S> {
        self.state.borrow().clone()
    }

    fn write_state(&self, state: S) -> impl Future<Output = kiln_runtime::Result<S>> {
        if self.reject.get() {
            return ready(Err(HostError::rejected("frozen")));
        }
        *self.state.borrow_mut() = Some(state.clone());
        ready(Ok(state))
    }
}

impl<S: Clone, A: 'static> Host<S, (), A> for TestHost<S> {
    fn props(&self) {}

    fn dispatcher(&self) -> Dispatch<A> {
        Dispatch::noop()
    }
}

fn adder() -> Spec<u32, (), u32, String> {
    Spec::from_perform_action(|n, _, _| {
        CoTransformer::sequence((0..n).map(|_| CoTransformer::modify(|s: u32| s + 1)))
    })
}

// ── Capture layer ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Captured {
    spans: Vec<String>,
    components: Vec<String>,
    applied_records: Vec<u64>,
    events: Vec<String>,
}

struct CaptureLayer {
    state: Arc<Mutex<Captured>>,
}

struct FieldGrab {
    name: &'static str,
    text: Option<String>,
    number: Option<u64>,
}

impl FieldGrab {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            text: None,
            number: None,
        }
    }
}

impl tracing::field::Visit for FieldGrab {
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        if field.name() == self.name {
            self.number = Some(value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == self.name {
            self.text = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == self.name {
            self.text = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        let mut grab = FieldGrab::new("component");
        attrs.record(&mut grab);
        let mut state = self.state.lock().expect("capture lock");
        state.spans.push(attrs.metadata().name().to_string());
        if let Some(component) = grab.text {
            state.components.push(component);
        }
    }

    fn on_record(
        &self,
        _id: &tracing::Id,
        values: &tracing::span::Record<'_>,
        _ctx: Context<'_, S>,
    ) {
        let mut grab = FieldGrab::new("applied");
        values.record(&mut grab);
        if let Some(applied) = grab.number {
            self.state
                .lock()
                .expect("capture lock")
                .applied_records
                .push(applied);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut grab = FieldGrab::new("message");
        event.record(&mut grab);
        if let Some(message) = grab.text {
            self.state.lock().expect("capture lock").events.push(message);
        }
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Arc<Mutex<Captured>>) {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        state: Arc::clone(&state),
    });
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, state)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[test]
fn dispatch_span_names_component_and_records_applied() {
    let component = create_component_spec_with(adder(), 0, ComponentConfig::new("Adder"));
    let host = TestHost::new(0);

    let (outcome, captured) = capture(|| block_on(component.dispatch(&host, 3)));

    assert_eq!(outcome.report().map(|r| r.applied), Some(3));
    let captured = captured.lock().expect("capture lock");
    assert!(captured.spans.iter().any(|s| s == "component.dispatch"));
    assert_eq!(captured.components, vec!["Adder".to_string()]);
    assert_eq!(captured.applied_records, vec![3]);
    assert_eq!(
        captured
            .events
            .iter()
            .filter(|e| *e == "driver.update_applied")
            .count(),
        3
    );
}

#[test]
fn rejected_write_is_logged() {
    let component = create_component_spec_with(adder(), 0, ComponentConfig::new("Adder"));
    let host = TestHost::new(0);
    host.reject.set(true);

    let (outcome, captured) = capture(|| block_on(component.dispatch(&host, 1)));

    assert_eq!(outcome.report().map(|r| r.dropped), Some(1));
    let captured = captured.lock().expect("capture lock");
    assert!(captured.events.iter().any(|e| e == "driver.write_failed"));
}

#[test]
fn budget_exhaustion_is_logged() {
    let config =
        ComponentConfig::new("Adder").with_driver(DriverConfig::new().with_max_updates(2));
    let component = create_component_spec_with(adder(), 0, config);
    let host = TestHost::new(0);

    let (outcome, captured) = capture(|| block_on(component.dispatch(&host, 5)));

    let report = outcome.report().expect("handler ran");
    assert!(report.budget_exhausted);
    assert_eq!(host.read_state(), Some(2));
    let captured = captured.lock().expect("capture lock");
    assert!(captured.events.iter().any(|e| e == "driver.budget_exhausted"));
}

#[test]
fn unmounted_dispatch_never_runs_handler() {
    let component = create_component_spec_with(adder(), 0, ComponentConfig::new("Adder"));
    let host = TestHost::new(0);
    *host.state.borrow_mut() = None;

    let (outcome, captured) = capture(|| block_on(component.dispatch(&host, 2)));

    assert_eq!(outcome, DispatchOutcome::Unmounted);
    let captured = captured.lock().expect("capture lock");
    assert!(
        captured
            .events
            .iter()
            .any(|e| e == "component.dispatch_skipped")
    );
}

#[test]
fn vanished_element_update_is_logged_and_not_written() {
    let host = Rc::new(TestHost::new(vec![1u32, 2, 3]));
    let shrink = Rc::clone(&host);
    let item: Spec<u32, (), (), String> = Spec::from_perform_action(move |(), _, _| {
        let host = Rc::clone(&shrink);
        CoTransformer::effect(async move {
            *host.state.borrow_mut() = Some(vec![9]);
            CoTransformer::modify(|n: u32| n + 1)
        })
    });
    let list = Spec::foreach(move |_| item.clone());
    let component = create_component_spec_with(list, Vec::new(), ComponentConfig::new("List"));

    let (outcome, captured) = capture(|| block_on(component.dispatch(&*host, (2, ()))));

    let report = outcome.report().expect("handler ran");
    assert_eq!(report.applied, 0);
    assert_eq!(report.dropped, 1);
    assert_eq!(host.read_state(), Some(vec![9]));
    let captured = captured.lock().expect("capture lock");
    assert!(
        captured
            .events
            .iter()
            .any(|e| e == "cotransform.index_out_of_range")
    );
    assert!(captured.events.iter().any(|e| e == "driver.update_dropped"));
    assert!(!captured.events.iter().any(|e| e == "driver.update_applied"));
}
