use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use log::{error, info};
use std::process::ExitCode;
use weather_collector::{CollectorConfig, CollectorError, Dataset, DatasetRunStatus, MongoStore, WeatherCollector};

#[derive(Parser, Debug)]
#[command(name = "weather-collector", version, about = "Keeps city, grid and port weather fresh in MongoDB")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one collection cycle.
    Run {
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,
        /// Fetch even when the stored snapshot is still fresh.
        #[arg(long)]
        force: bool,
    },
    /// Print the freshness of every dataset.
    Status,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    City,
    Grid,
    Port,
    All,
}

impl Target {
    fn datasets(self) -> Vec<Dataset> {
        match self {
            Target::City => vec![Dataset::City],
            Target::Grid => vec![Dataset::Grid],
            Target::Port => vec![Dataset::Port],
            Target::All => Dataset::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<bool, CollectorError> {
    let config = CollectorConfig::from_env();
    let store = MongoStore::connect(&config.mongo_uri, &config.mongo_db).await?;
    store.ping().await?;
    info!("Connected to MongoDB at {} (database '{}')", config.mongo_uri, config.mongo_db);
    let collector = WeatherCollector::with_defaults(store, config)?;

    match command {
        Command::Run { target, force } => {
            let datasets = target.datasets();
            let report = collector
                .run_collection_cycle()
                .datasets(&datasets)
                .force(force)
                .call()
                .await;
            for (dataset, status) in &report.results {
                match status {
                    DatasetRunStatus::Success(summary) if summary.skipped_fresh => {
                        println!("{:<5} fresh, skipped", dataset)
                    }
                    DatasetRunStatus::Success(summary) => println!(
                        "{:<5} {} ok, {} failed, {} errors, {} written ({:.1}s)",
                        dataset,
                        summary.outcomes.success,
                        summary.outcomes.failed,
                        summary.outcomes.error,
                        summary.written,
                        summary.elapsed.as_secs_f64()
                    ),
                    DatasetRunStatus::Failed { error, attempts } => {
                        println!("{:<5} FAILED after {} attempt(s): {}", dataset, attempts, error)
                    }
                }
            }
            Ok(report.all_succeeded())
        }
        Command::Status => {
            for report in collector.status().await? {
                let age = report
                    .age_hours
                    .map(|age| format!("{:.2} h", age))
                    .unwrap_or_else(|| "never fetched".to_string());
                println!(
                    "{:<5} {:<6} age {} (limit {} h)",
                    report.dataset,
                    if report.is_fresh { "fresh" } else { "stale" },
                    age,
                    report.max_age_hours
                );
            }
            Ok(true)
        }
    }
}
