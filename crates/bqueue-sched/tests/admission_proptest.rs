//! Property-based tests for greedy admission.

use bqueue_sched::select_admissible;
use proptest::prelude::*;

/// Slot costs as they appear in practice: mostly small, occasionally zero or
/// larger than the whole budget.
fn arb_costs() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(prop_oneof![8 => 1_u64..=8, 1 => Just(0_u64), 1 => 9_u64..=64], 0..=30)
}

proptest! {
    #[test]
    fn admitted_costs_fit_the_budget(costs in arb_costs(), budget in 0_u64..=40) {
        let admitted = select_admissible(&costs, budget);
        prop_assert_eq!(admitted.len(), costs.len());

        let used: u64 = costs
            .iter()
            .zip(&admitted)
            .filter(|(_, admit)| **admit)
            .map(|(cost, _)| *cost)
            .sum();
        prop_assert!(used <= budget);
    }

    #[test]
    fn rejected_jobs_did_not_fit(costs in arb_costs(), budget in 0_u64..=40) {
        let admitted = select_admissible(&costs, budget);

        // walk the scan by hand: every rejection either overflowed the
        // running total or came after the budget was spent
        let mut used = 0_u64;
        let mut spent = false;
        for (cost, admit) in costs.iter().zip(&admitted) {
            if *admit {
                prop_assert!(!spent);
                used += cost;
                spent = used >= budget;
            } else {
                prop_assert!(spent || used + cost > budget);
            }
        }
    }

    #[test]
    fn budget_is_filled_greedily_in_order(costs in arb_costs(), budget in 0_u64..=40) {
        let admitted = select_admissible(&costs, budget);

        // the first job that fits an empty budget is always admitted
        if let Some(first) = costs.iter().position(|cost| *cost <= budget) {
            prop_assert!(admitted[first]);
            prop_assert!(admitted[..first].iter().all(|admit| !admit));
        }
    }

    #[test]
    fn unlimited_budget_admits_everything(costs in arb_costs()) {
        let admitted = select_admissible(&costs, u64::MAX);
        prop_assert!(admitted.iter().all(|admit| *admit));
    }
}
