#![forbid(unsafe_code)]

//! Component entry points for host adapters.
//!
//! [`create_component_spec`] pairs a [`Spec`] with its initial state. The
//! resulting [`ComponentSpec`] exposes exactly what a host adapter wires
//! into its lifecycle hooks: [`ComponentSpec::render`] for the render hook
//! and [`ComponentSpec::dispatch`] for event handlers.

use std::fmt;

use kiln_core::Spec;
use tracing::{Instrument, debug, debug_span};

use crate::driver::{DriveReport, DriverConfig, drive};
use crate::host::Host;

/// Per-component settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentConfig {
    /// Name the host shows for this component class.
    pub display_name: String,
    /// Driver settings for every dispatch.
    pub driver: DriverConfig,
}

impl ComponentConfig {
    /// Settings with the given display name and an unlimited driver.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            driver: DriverConfig::default(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the driver settings.
    #[must_use]
    pub fn with_driver(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self::new("Component")
    }
}

/// Result of [`ComponentSpec::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran to completion (or to its update budget).
    Completed(DriveReport),
    /// The host had no live state; the handler never ran.
    Unmounted,
}

impl DispatchOutcome {
    /// The drive report, if the handler ran.
    #[must_use]
    pub fn report(&self) -> Option<DriveReport> {
        match self {
            Self::Completed(report) => Some(*report),
            Self::Unmounted => None,
        }
    }
}

/// A spec bound to its initial state, ready for a host adapter.
pub struct ComponentSpec<S, P, A, N> {
    spec: Spec<S, P, A, N>,
    initial_state: S,
    config: ComponentConfig,
}

impl<S: Clone, P, A, N> Clone for ComponentSpec<S, P, A, N> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            initial_state: self.initial_state.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: fmt::Debug, P, A, N> fmt::Debug for ComponentSpec<S, P, A, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSpec")
            .field("initial_state", &self.initial_state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Bind `spec` to `initial_state` with default settings.
pub fn create_component_spec<S, P, A, N>(
    spec: Spec<S, P, A, N>,
    initial_state: S,
) -> ComponentSpec<S, P, A, N> {
    create_component_spec_with(spec, initial_state, ComponentConfig::default())
}

/// Bind `spec` to `initial_state` with explicit settings.
pub fn create_component_spec_with<S, P, A, N>(
    spec: Spec<S, P, A, N>,
    initial_state: S,
    config: ComponentConfig,
) -> ComponentSpec<S, P, A, N> {
    ComponentSpec {
        spec,
        initial_state,
        config,
    }
}

impl<S, P, A, N> ComponentSpec<S, P, A, N>
where
    S: 'static,
    P: 'static,
    A: 'static,
    N: 'static,
{
    /// The wrapped spec.
    #[must_use]
    pub fn spec(&self) -> &Spec<S, P, A, N> {
        &self.spec
    }

    /// Component settings.
    #[must_use]
    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Name the host shows for this component class.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.config.display_name
    }

    /// State a freshly mounted instance starts with.
    #[must_use]
    pub fn initial_state(&self) -> S
    where
        S: Clone,
    {
        self.initial_state.clone()
    }

    /// Render hook: render the instance's live state.
    ///
    /// An instance with no live state renders nothing.
    pub fn render<H>(&self, host: &H, children: &[N]) -> Vec<N>
    where
        H: Host<S, P, A>,
    {
        let Some(state) = host.read_state() else {
            debug!(
                message = "component.render_skipped",
                component = %self.config.display_name,
                reason = "unmounted"
            );
            return Vec::new();
        };
        let props = host.props();
        self.spec.render(&host.dispatcher(), &props, &state, children)
    }

    /// Render hook for hosts that need a single root node.
    pub fn render_wrapped<H>(&self, host: &H, children: &[N], wrap: impl FnOnce(Vec<N>) -> N) -> N
    where
        H: Host<S, P, A>,
    {
        wrap(self.render(host, children))
    }

    /// Event hook: run the action handler for `action` and drive its
    /// updates against the live state.
    ///
    /// The returned future suspends between updates, so a host may start
    /// other dispatches before this one finishes.
    pub async fn dispatch<H>(&self, host: &H, action: A) -> DispatchOutcome
    where
        H: Host<S, P, A>,
    {
        let span = debug_span!(
            "component.dispatch",
            component = %self.config.display_name,
            applied = tracing::field::Empty,
            dropped = tracing::field::Empty
        );
        let run = async {
            let Some(state) = host.read_state() else {
                debug!(message = "component.dispatch_skipped", reason = "unmounted");
                return DispatchOutcome::Unmounted;
            };
            let props = host.props();
            let co = self.spec.perform_action(action, &props, &state);
            let report = drive(host, co, &self.config.driver).await;
            let current = tracing::Span::current();
            current.record("applied", report.applied);
            current.record("dropped", report.dropped);
            DispatchOutcome::Completed(report)
        };
        run.instrument(span).await
    }
}
