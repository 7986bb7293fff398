//! Seed load balancing.
//!
//! Given the pending seed count of every worker, [`LoadBalancer`] computes
//! a fair target for each worker (targets differ by at most one) and the
//! donor → receiver instructions that move the population onto those
//! targets. The computation is pure; delivering the instructions is the
//! job of a [`Collective`](crate::collective::Collective).

mod balancer;
mod types;

pub use balancer::LoadBalancer;
pub use types::{BalancePlan, Transfer, WorkerId, WorkerLoad};
