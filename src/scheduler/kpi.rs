//! Schedule quality metrics (KPIs).
//!
//! Computes standard scheduling performance indicators from a
//! completed schedule and its input jobs.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Total Tardiness | Sum of max(0, completion - deadline) |
//! | Maximum Tardiness | Largest single delay |
//! | On-Time Rate | Fraction meeting deadlines |
//! | Avg Utilization | Mean machine busyness |
//! | Avg Flow Time | Mean time from release to completion |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Job, Schedule};

/// Schedule performance indicators, in schedule time units.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    /// Latest completion time.
    pub makespan: i64,
    /// Sum of tardiness across all jobs.
    pub total_tardiness: i64,
    /// Maximum tardiness of any single job.
    pub max_tardiness: i64,
    /// Fraction of jobs completing on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Average machine utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-machine utilization over the makespan.
    pub utilization_by_machine: BTreeMap<String, f64>,
    /// Mean of (completion - release).
    pub avg_flow_time: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and the jobs it was computed for.
    ///
    /// Jobs are matched to assignments by position.
    pub fn calculate(schedule: &Schedule, jobs: &[Job]) -> Self {
        let makespan = schedule.makespan();
        let mut total_tardiness: i64 = 0;
        let mut max_tardiness: i64 = 0;
        let mut on_time_count: usize = 0;
        let mut total_flow_time: f64 = 0.0;
        let mut counted_jobs: usize = 0;

        for (j, job) in jobs.iter().enumerate() {
            let Some(completion) = schedule.job_completion_time(j) else {
                continue;
            };
            counted_jobs += 1;

            let release = job.release_time.unwrap_or(0);
            total_flow_time += (completion - release) as f64;

            match job.deadline {
                Some(deadline) if completion > deadline => {
                    let tardiness = completion - deadline;
                    total_tardiness += tardiness;
                    max_tardiness = max_tardiness.max(tardiness);
                }
                _ => on_time_count += 1,
            }
        }

        let utilization_by_machine: BTreeMap<String, f64> =
            schedule.all_utilizations().into_iter().collect();
        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.values().sum::<f64>() / utilization_by_machine.len() as f64
        };

        let on_time_rate = if counted_jobs == 0 {
            1.0
        } else {
            on_time_count as f64 / counted_jobs as f64
        };

        let avg_flow_time = if counted_jobs == 0 {
            0.0
        } else {
            total_flow_time / counted_jobs as f64
        };

        Self {
            makespan,
            total_tardiness,
            max_tardiness,
            on_time_rate,
            avg_utilization,
            utilization_by_machine,
            avg_flow_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Task};

    fn make_job(id: usize, duration: i64, deadline: Option<i64>, release: Option<i64>) -> Job {
        let mut job = Job::new(id, vec![Task::new(0, "M1", duration)]);
        job.deadline = deadline;
        job.release_time = release;
        job
    }

    #[test]
    fn test_kpi_basic() {
        let jobs = vec![
            make_job(0, 1, Some(5), Some(0)),
            make_job(1, 2, Some(5), Some(0)),
        ];
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new(0, 0, 0, "M1", 0, 1));
        schedule.add_assignment(Assignment::new(1, 0, 0, "M1", 1, 3));

        let kpi = ScheduleKpi::calculate(&schedule, &jobs);
        assert_eq!(kpi.makespan, 3);
        assert_eq!(kpi.total_tardiness, 0);
        assert_eq!(kpi.max_tardiness, 0);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert!((kpi.avg_flow_time - 2.0).abs() < 1e-10); // (1 + 3) / 2
    }

    #[test]
    fn test_kpi_tardiness() {
        let jobs = vec![
            make_job(0, 10, Some(5), None),  // completes at 10 → tardy 5
            make_job(1, 10, Some(50), None), // on time
        ];
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new(0, 0, 0, "M1", 0, 10));
        schedule.add_assignment(Assignment::new(1, 0, 0, "M1", 10, 20));

        let kpi = ScheduleKpi::calculate(&schedule, &jobs);
        assert_eq!(kpi.total_tardiness, 5);
        assert_eq!(kpi.max_tardiness, 5);
        assert!((kpi.on_time_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_utilization() {
        let jobs = vec![make_job(0, 2, None, None), make_job(1, 1, None, None)];
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new(0, 0, 0, "M1", 0, 2));
        schedule.add_assignment(Assignment::new(1, 0, 0, "M2", 0, 1));

        let kpi = ScheduleKpi::calculate(&schedule, &jobs);
        assert_eq!(kpi.makespan, 2);
        assert!((kpi.utilization_by_machine["M1"] - 1.0).abs() < 1e-10);
        assert!((kpi.utilization_by_machine["M2"] - 0.5).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_flow_time() {
        let jobs = vec![
            make_job(0, 1, None, Some(1)), // released at 1, completes at 3 → flow 2
            make_job(1, 1, None, Some(0)), // released at 0, completes at 1 → flow 1
        ];
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new(0, 0, 0, "M1", 2, 3));
        schedule.add_assignment(Assignment::new(1, 0, 0, "M1", 0, 1));

        let kpi = ScheduleKpi::calculate(&schedule, &jobs);
        assert!((kpi.avg_flow_time - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = ScheduleKpi::calculate(&Schedule::new(), &[]);
        assert_eq!(kpi.makespan, 0);
        assert_eq!(kpi.total_tardiness, 0);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.0).abs() < 1e-10);
    }
}
