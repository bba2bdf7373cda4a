//! Job-shop scheduler and KPI evaluation.
//!
//! `ShopScheduler` drives one validate → translate → solve → annotate pass
//! over a set of jobs. `ScheduleKpi` computes standard scheduling metrics:
//! makespan, tardiness, on-time rate, utilization and flow time.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod kpi;
mod shop;

pub use kpi::ScheduleKpi;
pub use shop::ShopScheduler;
