//! Result tables, wall-clock timelines and CSV export.
//!
//! Scheduling works in abstract integer time units. This module turns a
//! solved job list into rows for display, maps them onto calendar time
//! for the Gantt chart, and serializes them for download.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::models::Job;
use crate::{Error, Result};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// Job position.
    pub job_id: usize,
    pub job_name: String,
    /// Task label, `job(<job position>, <task id>)`.
    pub task: String,
    pub task_name: String,
    pub machine: String,
    pub start: i64,
    pub end: i64,
}

/// Builds result rows from solved jobs, sorted by machine then start.
///
/// Tasks without an assignment are skipped.
pub fn result_rows(jobs: &[Job]) -> Vec<ResultRow> {
    let mut rows: Vec<ResultRow> = jobs
        .iter()
        .enumerate()
        .flat_map(|(j, job)| {
            job.tasks.iter().filter_map(move |task| {
                Some(ResultRow {
                    job_id: j,
                    job_name: job.display_name(),
                    task: format!("job({j}, {})", task.id),
                    task_name: task.display_name(),
                    machine: task.machine.clone(),
                    start: task.start?,
                    end: task.end?,
                })
            })
        })
        .collect();
    rows.sort_by(|a, b| a.machine.cmp(&b.machine).then(a.start.cmp(&b.start)));
    rows
}

/// Calendar length of one schedule time unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    #[default]
    Hours,
}

impl TimeUnit {
    /// Calendar duration of `amount` units, `None` when out of range.
    pub fn to_duration(self, amount: i64) -> Option<Duration> {
        let minutes = match self {
            Self::Minutes => amount,
            Self::Hours => amount.checked_mul(60)?,
        };
        Duration::try_minutes(minutes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
        }
    }
}

/// A task placed on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    /// "<job> - <task>", the Gantt bar label.
    pub process: String,
    pub job: String,
    pub machine: String,
    pub planned_start: NaiveDateTime,
    pub planned_end: NaiveDateTime,
}

/// Maps schedule time onto calendar time from a fixed origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    origin: NaiveDateTime,
    unit: TimeUnit,
}

impl Timeline {
    pub fn new(origin: NaiveDateTime, unit: TimeUnit) -> Self {
        Self { origin, unit }
    }

    /// Calendar time of schedule time `t`.
    ///
    /// # Errors
    /// [`Error::TimeOutOfRange`] when the result is not a representable date.
    pub fn at(&self, t: i64) -> Result<NaiveDateTime> {
        self.unit
            .to_duration(t)
            .and_then(|offset| self.origin.checked_add_signed(offset))
            .ok_or(Error::TimeOutOfRange(t))
    }

    /// Calendar entries for the given rows, in row order.
    pub fn entries(&self, rows: &[ResultRow]) -> Result<Vec<TimelineEntry>> {
        rows.iter()
            .map(|row| {
                Ok(TimelineEntry {
                    process: format!("{} - {}", row.job_name, row.task_name),
                    job: row.job_name.clone(),
                    machine: row.machine.clone(),
                    planned_start: self.at(row.start)?,
                    planned_end: self.at(row.end)?,
                })
            })
            .collect()
    }
}

/// Serializes rows as CSV, adding planned calendar columns when a
/// timeline is given.
pub fn to_csv(rows: &[ResultRow], timeline: Option<&Timeline>) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Job", "Task", "Process", "Machine", "Start", "End"];
    if timeline.is_some() {
        header.extend(["Planned Start", "Planned End"]);
    }
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.job_name.clone(),
            row.task.clone(),
            row.task_name.clone(),
            row.machine.clone(),
            row.start.to_string(),
            row.end.to_string(),
        ];
        if let Some(timeline) = timeline {
            record.push(timeline.at(row.start)?.format(DATETIME_FORMAT).to_string());
            record.push(timeline.at(row.end)?.format(DATETIME_FORMAT).to_string());
        }
        wtr.write_record(&record)?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

/// Renders rows as a fixed-width text table.
pub fn render_table(rows: &[ResultRow]) -> String {
    let header = ["Job", "Task", "Name", "Machine", "Start", "End"];
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.job_name.clone(),
                r.task.clone(),
                r.task_name.clone(),
                r.machine.clone(),
                r.start.to_string(),
                r.end.to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, values: &[&str]| {
        let padded: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(v, w)| format!("{v:<w$}"))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    line(&mut out, &header);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let rule: Vec<&str> = rule.iter().map(String::as_str).collect();
    line(&mut out, &rule);
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        line(&mut out, &values);
    }
    out
}
