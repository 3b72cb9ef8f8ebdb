#![forbid(unsafe_code)]

//! The update-protocol driver.
//!
//! [`drive`] walks a [`CoTransformer`] to completion against a live
//! [`StateHost`]. For each update step it:
//!
//! 1. reads the current live state (never a snapshot taken earlier),
//! 2. applies the update,
//! 3. writes the result back and waits for the host's acknowledgement,
//! 4. resumes the continuation with the written state.
//!
//! If the host has been torn down, rejects the write, or the update no
//! longer applies (a `split` variant changed or a `foreach` index went out
//! of range), nothing is written and the continuation is resumed with
//! `None` instead. Effect steps are awaited in place.
//!
//! # Invariants
//!
//! 1. Within one `drive` call, updates are applied strictly one after
//!    another, in emission order.
//! 2. Each update is applied at most once.
//! 3. `drive` suspends between steps. Other dispatches against the same host
//!    may run in those gaps; there is no lock across steps.
//!
//! # Failure Modes
//!
//! - **Unmounted mid-sequence**: later updates see `None` and are counted
//!   in [`DriveReport::dropped`].
//! - **Stale zoom**: an update whose target part is gone is never written
//!   and is counted in [`DriveReport::dropped`].
//! - **Runaway handler**: with [`DriverConfig::max_updates`] set, the
//!   pending continuation is resumed with `None` once the budget is spent
//!   and whatever it returns is discarded.

use kiln_core::{CoTransformer, Step, Update};
use tracing::{debug, warn};

use crate::host::StateHost;

/// Driver settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Maximum update steps (applied or dropped) per drive. `None` means
    /// unlimited.
    pub max_updates: Option<usize>,
}

impl DriverConfig {
    /// Unlimited updates.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_updates: None }
    }

    /// Cap the number of update steps per drive.
    #[must_use]
    pub const fn with_max_updates(mut self, max_updates: usize) -> Self {
        self.max_updates = Some(max_updates);
        self
    }
}

/// What happened during one [`drive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveReport {
    /// Updates written and acknowledged.
    pub applied: usize,
    /// Updates not applied (host torn down, write rejected, or target gone).
    pub dropped: usize,
    /// Effect steps awaited.
    pub awaited: usize,
    /// Whether the update budget cut the drive short.
    pub budget_exhausted: bool,
}

impl DriveReport {
    /// Update steps seen, applied or not.
    #[must_use]
    pub const fn updates(&self) -> usize {
        self.applied + self.dropped
    }
}

/// Run `co` to completion against `host`.
pub async fn drive<S, H>(host: &H, co: CoTransformer<S>, config: &DriverConfig) -> DriveReport
where
    S: 'static,
    H: StateHost<S>,
{
    let mut report = DriveReport::default();
    let mut co = co;
    loop {
        match co.into_step() {
            Step::Done => break,
            Step::Await(pending) => {
                report.awaited += 1;
                co = pending.await;
            }
            Step::Update { update, resume } => {
                if let Some(max) = config.max_updates
                    && report.updates() >= max
                {
                    warn!(message = "driver.budget_exhausted", max_updates = max);
                    report.budget_exhausted = true;
                    drop(resume(None));
                    break;
                }
                let written = apply(host, update).await;
                if written.is_some() {
                    report.applied += 1;
                } else {
                    report.dropped += 1;
                }
                co = resume(written);
            }
        }
    }
    report
}

async fn apply<S, H>(host: &H, update: Update<S>) -> Option<S>
where
    H: StateHost<S>,
{
    let Some(current) = host.read_state() else {
        debug!(message = "driver.update_dropped", reason = "unmounted");
        return None;
    };
    let Some(next) = update(current) else {
        debug!(message = "driver.update_dropped", reason = "target_gone");
        return None;
    };
    match host.write_state(next).await {
        Ok(written) => {
            debug!(message = "driver.update_applied");
            Some(written)
        }
        Err(err) => {
            warn!(message = "driver.write_failed", error = %err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HostError, Result};
    use futures::executor::block_on;
    use kiln_core::cotransform::IndexZoom;
    use std::cell::{Cell, RefCell};
    use std::future::{Future, ready};
    use std::rc::Rc;

    struct CellHost<S> {
        state: RefCell<Option<S>>,
        reject: Cell<bool>,
        writes: Cell<usize>,
    }

    impl<S> CellHost<S> {
        fn new(state: S) -> Self {
            Self {
                state: RefCell::new(Some(state)),
                reject: Cell::new(false),
                writes: Cell::new(0),
            }
        }
    }

    impl<S: Clone> StateHost<S> for CellHost<S> {
        fn read_state(&self) -> Option<S> {
            self.state.borrow().clone()
        }

        fn write_state(&self, state: S) -> impl Future<Output = Result<S>> {
            let outcome = if self.reject.get() {
                Err(HostError::rejected("test"))
            } else if self.state.borrow().is_none() {
                Err(HostError::Unmounted)
            } else {
                self.writes.set(self.writes.get() + 1);
                *self.state.borrow_mut() = Some(state.clone());
                Ok(state)
            };
            ready(outcome)
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<Option<i32>>>>, impl Fn(Option<i32>) + Clone) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v| sink.borrow_mut().push(v))
    }

    #[test]
    fn applies_single_update() {
        let host = CellHost::new(0);
        let report = block_on(drive(&host, CoTransformer::modify(|n: i32| n + 1), &DriverConfig::new()));
        assert_eq!(host.read_state(), Some(1));
        assert_eq!(report.applied, 1);
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn continuation_sees_written_state() {
        let host = CellHost::new(10);
        let (seen, record) = recorder();
        let co = CoTransformer::modify_then(
            |n: i32| n * 2,
            move |written| {
                record(written);
                CoTransformer::modify(|n| n + 1)
            },
        );
        let report = block_on(drive(&host, co, &DriverConfig::new()));
        assert_eq!(*seen.borrow(), vec![Some(20)]);
        assert_eq!(host.read_state(), Some(21));
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn update_reads_live_state_not_snapshot() {
        let host = CellHost::new(1);
        let co = CoTransformer::modify(|n: i32| n + 1);
        // Someone else writes between building the handler and driving it.
        *host.state.borrow_mut() = Some(100);
        block_on(drive(&host, co, &DriverConfig::new()));
        assert_eq!(host.read_state(), Some(101));
    }

    #[test]
    fn rejected_write_resumes_with_none() {
        let host = CellHost::new(5);
        host.reject.set(true);
        let (seen, record) = recorder();
        let co = CoTransformer::modify_then(
            |n: i32| n + 1,
            move |written| {
                record(written);
                CoTransformer::done()
            },
        );
        let report = block_on(drive(&host, co, &DriverConfig::new()));
        assert_eq!(*seen.borrow(), vec![None]);
        assert_eq!(host.read_state(), Some(5));
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn unmounted_host_resumes_with_none() {
        let host = CellHost::new(5);
        *host.state.borrow_mut() = None;
        let (seen, record) = recorder();
        let co = CoTransformer::modify_then(
            |n: i32| n + 1,
            move |written| {
                record(written);
                CoTransformer::done()
            },
        );
        let report = block_on(drive(&host, co, &DriverConfig::new()));
        assert_eq!(*seen.borrow(), vec![None]);
        assert_eq!(host.writes.get(), 0);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn handler_can_stop_after_failed_write() {
        fn countdown(left: u32) -> CoTransformer<i32> {
            if left == 0 {
                return CoTransformer::done();
            }
            CoTransformer::modify_then(
                |n| n + 1,
                move |written| match written {
                    Some(_) => countdown(left - 1),
                    None => CoTransformer::done(),
                },
            )
        }
        let host = CellHost::new(0);
        host.reject.set(true);
        let report = block_on(drive(&host, countdown(5), &DriverConfig::new()));
        assert_eq!(report.dropped, 1);
        assert_eq!(report.applied, 0);
    }

    #[test]
    fn effects_are_awaited_between_updates() {
        let host = CellHost::new(1);
        let co = CoTransformer::modify(|n: i32| n + 1).chain(CoTransformer::effect(async {
            CoTransformer::modify(|n: i32| n * 3)
        }));
        let report = block_on(drive(&host, co, &DriverConfig::new()));
        assert_eq!(host.read_state(), Some(6));
        assert_eq!(report.awaited, 1);
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn budget_cuts_off_runaway_handler() {
        fn forever() -> CoTransformer<i32> {
            CoTransformer::modify_then(|n| n + 1, |_| forever())
        }
        let host = CellHost::new(0);
        let config = DriverConfig::new().with_max_updates(3);
        let report = block_on(drive(&host, forever(), &config));
        assert!(report.budget_exhausted);
        assert_eq!(report.applied, 3);
        assert_eq!(host.read_state(), Some(3));
    }

    #[test]
    fn budget_cut_off_resumes_pending_continuation_with_none() {
        let (seen, record) = recorder();
        let first = record.clone();
        let co = CoTransformer::modify_then(
            |n: i32| n + 1,
            move |written| {
                first(written);
                CoTransformer::modify_then(
                    |n| n + 1,
                    move |written| {
                        record(written);
                        CoTransformer::done()
                    },
                )
            },
        );
        let host = CellHost::new(0);
        let report = block_on(drive(&host, co, &DriverConfig::new().with_max_updates(1)));
        assert!(report.budget_exhausted);
        assert_eq!(*seen.borrow(), vec![Some(1), None]);
        assert_eq!(host.read_state(), Some(1));
    }

    #[test]
    fn stale_update_is_not_written() {
        let host = CellHost::new(vec![1, 2, 3]);
        let (seen, record) = recorder();
        let co = CoTransformer::modify_then(
            |n: i32| n + 1,
            move |written| {
                record(written);
                CoTransformer::done()
            },
        )
        .zoom(IndexZoom::new(2));
        *host.state.borrow_mut() = Some(vec![7]);
        let report = block_on(drive(&host, co, &DriverConfig::new()));
        assert_eq!(*seen.borrow(), vec![None]);
        assert_eq!(report.applied, 0);
        assert_eq!(report.dropped, 1);
        assert_eq!(host.writes.get(), 0);
        assert_eq!(host.read_state(), Some(vec![7]));
    }

    #[test]
    fn done_drives_nothing() {
        let host = CellHost::new(0);
        let report = block_on(drive(&host, CoTransformer::<i32>::done(), &DriverConfig::new()));
        assert_eq!(report, DriveReport::default());
        assert_eq!(host.writes.get(), 0);
    }
}
