use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::Config;
use crate::cp::SolveStatus;
use crate::problem::ProblemDefinition;
use crate::report::{self, ResultRow, TimeUnit, Timeline, TimelineEntry};
use crate::scheduler::{ScheduleKpi, ShopScheduler};
use crate::validation::validate_limits;
use crate::Error;

use super::{ApiError, AppState};

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

#[derive(Debug, Serialize)]
pub struct MachinesResponse {
    pub machines: Vec<String>,
    pub time_unit: TimeUnit,
    pub max_jobs: usize,
    pub max_duration: i64,
}

#[derive(Debug, Serialize)]
pub struct SolverStats {
    pub solutions: u64,
    pub wall_time_ms: f64,
}

/// Body of a successful `POST /api/schedule`.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub status: SolveStatus,
    pub makespan: i64,
    pub start: NaiveDateTime,
    pub time_unit: TimeUnit,
    pub rows: Vec<ResultRow>,
    pub timeline: Vec<TimelineEntry>,
    pub kpi: ScheduleKpi,
    pub stats: SolverStats,
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(DASHBOARD_HTML)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn machines(state: web::Data<AppState>) -> HttpResponse {
    let dashboard = &state.config.dashboard;
    HttpResponse::Ok().json(MachinesResponse {
        machines: dashboard.machines.clone(),
        time_unit: dashboard.time_unit,
        max_jobs: dashboard.max_jobs,
        max_duration: dashboard.max_duration,
    })
}

pub async fn schedule(
    state: web::Data<AppState>,
    body: web::Json<ProblemDefinition>,
) -> Result<HttpResponse, ApiError> {
    let response = solve_blocking(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn schedule_csv(
    state: web::Data<AppState>,
    body: web::Json<ProblemDefinition>,
) -> Result<HttpResponse, ApiError> {
    let response = solve_blocking(&state, body.into_inner()).await?;
    let timeline = Timeline::new(response.start, response.time_unit);
    let csv = report::to_csv(&response.rows, Some(&timeline))?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"results.csv\"",
        ))
        .body(csv))
}

async fn solve_blocking(
    state: &AppState,
    problem: ProblemDefinition,
) -> Result<ScheduleResponse, ApiError> {
    let config = state.config.clone();
    web::block(move || solve(problem, &config))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// Solves a dashboard problem against the configured machines and limits.
pub fn solve(problem: ProblemDefinition, config: &Config) -> crate::Result<ScheduleResponse> {
    let origin = problem.origin();
    let time_unit = config.dashboard.time_unit;
    let constraints = problem.constraints.clone();
    let jobs = problem.into_jobs()?;
    tracing::info!(jobs = jobs.len(), %origin, "Schedule requested");

    let dashboard = &config.dashboard;
    validate_limits(&jobs, dashboard.max_jobs, dashboard.max_duration)
        .map_err(Error::Validation)?;

    let mut scheduler = ShopScheduler::new(jobs)
        .with_constraints(constraints)
        .with_machines(config.dashboard.machine_list())
        .with_config(config.solver.solver_config());
    scheduler.fit()?;

    let rows = scheduler.results()?;
    let kpi = scheduler.kpi()?;
    let status = scheduler.status().unwrap_or(SolveStatus::Unknown);
    let stats = scheduler.stats().unwrap_or_default();

    Ok(ScheduleResponse {
        status,
        makespan: kpi.makespan,
        start: origin,
        time_unit,
        timeline: Timeline::new(origin, time_unit).entries(&rows)?,
        rows,
        kpi,
        stats: SolverStats {
            solutions: stats.solutions,
            wall_time_ms: stats.wall_time.as_secs_f64() * 1000.0,
        },
    })
}
