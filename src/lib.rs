//! Job-shop scheduling dashboard.
//!
//! Jobs are ordered sequences of tasks, each task bound to one machine for a
//! fixed duration. The crate translates jobs into a constraint model
//! (one interval per task, no overlap per machine, precedence along each job,
//! makespan minimization), solves it through a narrow solver interface and
//! presents the result as a table, a CSV file or a Gantt chart in the browser.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Job`, `Machine`, `Constraint`,
//!   `Schedule`, `Assignment`
//! - **`validation`**: Input checks before solving, schedule verification after
//! - **`cp`**: Model translation, the `CpSolver` interface and the Pumpkin
//!   solver backend
//! - **`scheduler`**: `ShopScheduler` (validate, solve, annotate) and KPIs
//! - **`report`**: Result rows, wall-clock timeline, CSV export
//! - **`problem`**: Dashboard problem definition and instance generator
//! - **`web`**: actix-web dashboard and JSON API
//! - **`config`**, **`logging`**, **`error`**: ambient plumbing
//!
//! # Example
//!
//! ```
//! use shop_scheduler::models::{Job, Task};
//! use shop_scheduler::scheduler::ShopScheduler;
//!
//! let jobs = vec![
//!     Job::new(0, vec![Task::new(0, "E-101", 2), Task::new(1, "T-301", 1)]),
//!     Job::new(1, vec![Task::new(0, "T-301", 3)]),
//! ];
//! let mut scheduler = ShopScheduler::new(jobs);
//! scheduler.fit()?;
//! for row in scheduler.results()? {
//!     println!("{} {} {}..{}", row.task, row.machine, row.start, row.end);
//! }
//! # Ok::<(), shop_scheduler::Error>(())
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"
//! - Brucker (2007), "Scheduling Algorithms"

pub mod config;
pub mod cp;
pub mod error;
pub mod logging;
pub mod models;
pub mod problem;
pub mod report;
pub mod scheduler;
pub mod validation;
pub mod web;

pub use error::{Error, Result};
