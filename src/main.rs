use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use timebank::accrual::BalanceEngine;
use timebank::clock::{Clock, SystemClock};
use timebank::config::AppConfig;
use timebank::scheduler::{run_accrual_scheduler, AccrualScheduler, RunOutcome};
use timebank::store::{
    EmployeeDirectory, InMemoryEmployeeDirectory, InMemoryTimeRecordStore, TimeRecordStore,
};

#[derive(Parser, Debug)]
#[command(name = "timebank", about = "Employee time-tracking accrual daemon")]
struct Cli {
    /// Run a single accrual pass for the previous day, then exit.
    #[arg(long)]
    once: bool,
    /// Start without the background accrual scheduler.
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    info!(
        "configuration loaded: org offset {} min, accrual enabled={}, run at {:02}:{:02}",
        config.org_utc_offset_minutes,
        config.accrual_enabled,
        config.accrual_run_hour,
        config.accrual_run_minute
    );

    let tz = config.org_time_zone();
    let records: Arc<dyn TimeRecordStore> = Arc::new(InMemoryTimeRecordStore::new());
    let directory: Arc<dyn EmployeeDirectory> = Arc::new(InMemoryEmployeeDirectory::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = Arc::new(BalanceEngine::new(records.clone(), directory.clone(), tz));
    let scheduler = Arc::new(AccrualScheduler::new(
        engine,
        directory.clone(),
        clock,
        tz,
        &config,
    ));

    if cli.once {
        match scheduler.run_daily_accrual().await {
            Ok(RunOutcome::Completed(summary)) => {
                info!(
                    "one-shot accrual for {} done: {} accrued, {} skipped, {} failed",
                    summary.day, summary.accrued, summary.skipped, summary.failed
                );
            }
            Ok(outcome) => info!("one-shot accrual not executed: {:?}", outcome),
            Err(e) => {
                error!("one-shot accrual aborted: {:#}", e);
                return Err(e.into());
            }
        }
        return Ok(());
    }

    if !cli.no_scheduler {
        let task_scheduler = scheduler.clone();
        tokio::spawn(async move {
            run_accrual_scheduler(task_scheduler).await;
        });
    } else {
        info!("background accrual scheduler disabled via --no-scheduler");
    }

    info!("timebank daemon running; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received; exiting");
    Ok(())
}
