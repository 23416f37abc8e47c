//! Admission control.

/// Decide which waiting jobs to submit this tick.
///
/// `costs` are the slot counts of the unsubmitted jobs in queue order and
/// `budget` is the number of slots still free. Jobs are taken greedily in
/// order: a job is admitted if it fits next to the ones admitted before it,
/// and the scan stops as soon as the budget is used up. A job larger than
/// the whole budget is simply never admitted.
pub fn select_admissible(costs: &[u64], budget: u64) -> Vec<bool> {
    let mut admitted = vec![false; costs.len()];
    let mut used: u64 = 0;

    for (slot, &cost) in admitted.iter_mut().zip(costs) {
        let putative = used.saturating_add(cost);
        if putative <= budget {
            *slot = true;
            used = putative;
            if used >= budget {
                break;
            }
        }
    }

    admitted
}
