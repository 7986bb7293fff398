//! Fair-share computation and greedy transfer matching.
//!
//! # Algorithm
//!
//! 1. `average = sum / m`, `remainder = sum % m`
//! 2. Order workers by descending pending count (ties: ascending id)
//! 3. Everyone targets `average`; the first `remainder` in that order
//!    target `average + 1`
//! 4. A leading cursor walks donors from the front while a trailing cursor
//!    walks receivers from the back; every instruction settles either the
//!    donor's surplus or the receiver's deficit
//!
//! The result is balanced to within one seed and needs at most `m - 1`
//! instructions.

use super::types::{BalancePlan, Transfer, WorkerId, WorkerLoad};
use crate::error::{Error, Result};

/// Sorted-order entry. Keeps the worker id next to its count so the two
/// cursors never have to translate between rank and id.
#[derive(Debug, Clone, Copy)]
struct Entry {
    worker_id: WorkerId,
    pending: u64,
    target: u64,
}

/// Pure load balancer over a gathered load vector.
pub struct LoadBalancer;

impl LoadBalancer {
    /// Sums a gathered load vector.
    ///
    /// Fails if the vector is empty, if slot `k` does not hold worker
    /// `k + 1`, or if the total overflows.
    pub fn total(loads: &[WorkerLoad]) -> Result<u64> {
        if loads.is_empty() {
            return Err(Error::NoWorkers);
        }
        let mut sum = 0u64;
        for (slot, load) in loads.iter().enumerate() {
            if load.worker_id != slot + 1 {
                return Err(Error::invariant(format!(
                    "gather slot {} holds worker {}",
                    slot + 1,
                    load.worker_id
                )));
            }
            sum = sum
                .checked_add(load.pending)
                .ok_or_else(|| Error::invariant("pending total overflows u64"))?;
        }
        Ok(sum)
    }

    /// Computes targets and the transfer plan for one round.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_distanneal::balance::{LoadBalancer, Transfer, WorkerLoad};
    ///
    /// let loads = [WorkerLoad::new(1, 5), WorkerLoad::new(2, 3), WorkerLoad::new(3, 2)];
    /// let plan = LoadBalancer::balance(&loads).unwrap();
    /// assert_eq!(plan.targets(), &[4, 3, 3]);
    /// assert_eq!(
    ///     plan.transfers(),
    ///     &[Transfer { source: 1, destination: 3, amount: 1 }]
    /// );
    /// ```
    pub fn balance(loads: &[WorkerLoad]) -> Result<BalancePlan> {
        let sum = Self::total(loads)?;
        let m = loads.len();
        let average = sum / m as u64;
        let remainder = (sum % m as u64) as usize;

        let mut order: Vec<Entry> = loads
            .iter()
            .map(|l| Entry {
                worker_id: l.worker_id,
                pending: l.pending,
                target: average,
            })
            .collect();
        order.sort_by(|a, b| {
            b.pending
                .cmp(&a.pending)
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });
        for entry in order.iter_mut().take(remainder) {
            entry.target += 1;
        }

        let mut transfers = Vec::new();
        let mut j = m - 1;
        for i in 0..m {
            while order[i].pending > order[i].target {
                // Receivers already at target would yield empty instructions.
                while j > i && order[j].pending >= order[j].target {
                    j -= 1;
                }
                if j <= i {
                    return Err(Error::invariant(format!(
                        "worker {} has surplus but no receiver is left",
                        order[i].worker_id
                    )));
                }

                let surplus = order[i].pending - order[i].target;
                let deficit = order[j].target - order[j].pending;
                let delta = surplus.min(deficit);
                transfers.push(Transfer {
                    source: order[i].worker_id,
                    destination: order[j].worker_id,
                    amount: delta,
                });
                order[i].pending -= delta;
                order[j].pending += delta;
            }
        }

        let mut targets = vec![0; m];
        for entry in &order {
            targets[entry.worker_id - 1] = entry.target;
        }

        Ok(BalancePlan { targets, transfers })
    }
}
