//! Browser dashboard and JSON API (actix-web).
//!
//! | Route | |
//! |---|---|
//! | `GET /` | dashboard page |
//! | `GET /health` | liveness |
//! | `GET /api/machines` | machines and form limits |
//! | `POST /api/schedule` | solve, JSON result |
//! | `POST /api/schedule.csv` | solve, CSV attachment |
//!
//! Solves run on the blocking thread pool; the only shared state is the
//! read-only configuration.

mod error;
mod handlers;

use actix_web::{middleware, web, App, HttpServer};

use crate::config::Config;

pub use error::{json_error_handler, ApiError};
pub use handlers::{solve, MachinesResponse, ScheduleResponse, SolverStats};

/// Shared, read-only application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Registers every route. The caller provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/machines", web::get().to(handlers::machines))
                .route("/schedule", web::post().to(handlers::schedule))
                .route("/schedule.csv", web::post().to(handlers::schedule_csv)),
        );
}

/// Serves the dashboard until shutdown.
pub async fn run(config: Config) -> std::io::Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let state = web::Data::new(AppState::new(config));

    tracing::info!("Dashboard listening on http://{host}:{port}");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
