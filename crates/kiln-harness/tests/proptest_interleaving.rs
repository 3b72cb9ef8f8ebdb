//! Property-based tests for overlapping dispatches.
//!
//! 1. Any number of concurrent additive dispatches, under any ack delay,
//!    apply every update exactly once.
//! 2. The committed history is strictly increasing for positive steps,
//!    so no update ever observes a stale state.
//! 3. Unmounting at an arbitrary point in a handler drops every later
//!    update and applies none of them.

use std::cell::RefCell;
use std::rc::Rc;

use kiln_core::{CoTransformer, Spec};
use kiln_harness::{AckMode, Harness, MemoryHost, Node};
use kiln_runtime::create_component_spec;
use proptest::prelude::*;

/// Action `(steps, amount)` adds `amount` once per step.
fn accumulator() -> Spec<u64, (), (u8, u8), Node> {
    Spec::from_perform_action(|(steps, amount), _, _| {
        CoTransformer::sequence(
            (0..steps).map(move |_| CoTransformer::modify(move |n: u64| n + u64::from(amount))),
        )
    })
}

fn actions() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..5, 1u8..10), 1..6)
}

proptest! {
    #[test]
    fn concurrent_dispatches_lose_no_updates(batch in actions(), yields in 0usize..4) {
        let mut harness = Harness::mount(create_component_spec(accumulator(), 0), ());
        harness.host().set_ack_mode(AckMode::Yield(yields));

        for action in &batch {
            harness.spawn_dispatch(*action).expect("spawn");
        }
        let outcomes = harness.run_until_stalled();

        let expected: u64 = batch
            .iter()
            .map(|(steps, amount)| u64::from(*steps) * u64::from(*amount))
            .sum();
        let updates: usize = batch.iter().map(|(steps, _)| usize::from(*steps)).sum();
        prop_assert_eq!(outcomes.len(), batch.len());
        prop_assert_eq!(harness.state(), Some(expected));
        prop_assert_eq!(harness.host().history().len(), updates);
    }

    #[test]
    fn history_is_strictly_increasing(batch in actions(), yields in 0usize..4) {
        let mut harness = Harness::mount(create_component_spec(accumulator(), 0), ());
        harness.host().set_ack_mode(AckMode::Yield(yields));

        for action in &batch {
            harness.spawn_dispatch(*action).expect("spawn");
        }
        harness.run_until_stalled();

        let history = harness.host().history();
        prop_assert!(history.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn no_writes_after_unmount(steps in 1u8..8, cut in 0u8..8, yields in 0usize..3) {
        let host_slot: Rc<RefCell<Option<MemoryHost<u64, (), u8>>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&host_slot);
        let spec: Spec<u64, (), u8, Node> = Spec::from_perform_action(move |steps, _, _| {
            let slot = Rc::clone(&slot);
            let teardown = CoTransformer::effect(async move {
                if let Some(host) = slot.borrow().as_ref() {
                    host.unmount();
                }
                CoTransformer::done()
            });
            let add = |_| CoTransformer::modify(|n: u64| n + 1);
            CoTransformer::sequence(
                (0..cut.min(steps))
                    .map(add)
                    .chain(std::iter::once(teardown))
                    .chain((cut.min(steps)..steps).map(add)),
            )
        });
        let mut harness = Harness::mount(create_component_spec(spec, 0), ());
        harness.host().set_ack_mode(AckMode::Yield(yields));
        *host_slot.borrow_mut() = Some(harness.host().clone());

        harness.spawn_dispatch(steps).expect("spawn");
        let outcomes = harness.run_until_stalled();

        let report = outcomes[0].report().expect("handler ran");
        let kept = usize::from(cut.min(steps));
        prop_assert_eq!(report.applied, kept);
        prop_assert_eq!(report.dropped, usize::from(steps) - kept);
        prop_assert_eq!(harness.host().history().len(), kept);
        prop_assert_eq!(harness.state(), None);
    }
}
