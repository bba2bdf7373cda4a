//! Job-shop domain models.
//!
//! Provides the data types for describing a job-shop problem and its
//! solution.
//!
//! # Domain Mappings
//!
//! | shop-scheduler | Manufacturing | CP model |
//! |----------------|---------------|----------|
//! | Job | Order / Product batch | chain of precedences |
//! | Task | Operation | interval variable |
//! | Machine | Machine / Station | no-overlap group |
//! | Schedule | Production Plan | solution |

mod constraint;
mod job;
mod machine;
mod schedule;
mod task;

pub use constraint::{Constraint, TaskRef};
pub use job::Job;
pub use machine::{machines_from_ids, Machine};
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
pub use task::Task;
