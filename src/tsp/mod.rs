//! Travelling salesman collaborators.
//!
//! [`TspInstance`] loads TSPLIB files; [`TspWorker`] anneals tours over an
//! instance and plugs into the coordinator as a [`Worker`](crate::worker::Worker).
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Reinelt (1991), "TSPLIB: A Traveling Salesman Problem Library"

mod instance;
mod worker;

pub use instance::TspInstance;
pub use worker::{TspWorker, TspWorkerConfig};
