use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shop_scheduler::config::Config;
use shop_scheduler::problem::{self, GenerateParams, ProblemDefinition};
use shop_scheduler::report::{self, Timeline};
use shop_scheduler::scheduler::ShopScheduler;
use shop_scheduler::{logging, web, Result};

/// Job-shop scheduling dashboard
#[derive(Parser, Debug)]
#[command(name = "shop-scheduler")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG    Log filter, e.g. RUST_LOG=shop_scheduler=trace")]
pub struct Cli {
    /// Configuration file (default: ./shop-scheduler.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the dashboard and JSON API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Solve a problem definition (JSON) and print the schedule
    Solve {
        /// Problem definition file
        input: PathBuf,

        /// Also write the results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Generate a random problem definition
    Generate {
        #[arg(long, default_value_t = 3)]
        jobs: usize,

        /// Tasks per job
        #[arg(long, default_value_t = 3)]
        tasks: usize,

        #[arg(long, default_value_t = 5)]
        max_duration: i64,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config)
        }
        Command::Solve { input, csv } => run_solve(&config, input, csv),
        Command::Generate {
            jobs,
            tasks,
            max_duration,
            seed,
            output,
        } => {
            let params = GenerateParams {
                jobs,
                tasks_per_job: tasks,
                max_duration,
                machines: config.dashboard.machines.clone(),
            };
            let instance = problem::generate(&params, seed);
            match output {
                Some(path) => {
                    instance.save(&path)?;
                    tracing::info!(path = %path.display(), "Instance written");
                }
                None => println!("{}", serde_json::to_string_pretty(&instance)?),
            }
            Ok(())
        }
    }
}

fn serve(config: Config) -> Result<()> {
    actix_web::rt::System::new().block_on(web::run(config))?;
    Ok(())
}

fn run_solve(config: &Config, input: PathBuf, csv: Option<PathBuf>) -> Result<()> {
    let definition = ProblemDefinition::load(&input)?;
    let origin = definition.origin();
    let constraints = definition.constraints.clone();
    let jobs = definition.into_jobs()?;

    let mut scheduler = ShopScheduler::new(jobs)
        .with_constraints(constraints)
        .with_config(config.solver.solver_config());
    scheduler.fit()?;

    let rows = scheduler.results()?;
    print!("{}", report::render_table(&rows));
    println!();
    println!("Makespan: {}", scheduler.schedule()?.makespan());
    if let (Some(status), Some(stats)) = (scheduler.status(), scheduler.stats()) {
        println!(
            "Status: {status}  solutions: {}  wall time: {:.3}s",
            stats.solutions,
            stats.wall_time.as_secs_f64()
        );
    }

    if let Some(path) = csv {
        let timeline = Timeline::new(origin, config.dashboard.time_unit);
        fs::write(&path, report::to_csv(&rows, Some(&timeline))?)?;
        tracing::info!(path = %path.display(), "Results written");
    }
    Ok(())
}
