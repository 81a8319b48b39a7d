use std::sync::Arc;

use tracing::{error, info, warn};

use courtwatch::config::{self, Config};
use courtwatch::cycle::{CycleOptions, CycleRunner};
use courtwatch::model::ScrapedDay;
use courtwatch::notify::NotifyHub;
use courtwatch::store::MemoryStore;

/// Runs one cycle for every configured facility against the scrape outputs
/// on disk, then prints one JSON alert per subscriber to stdout.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    courtwatch::observability::init(config.metrics_port);

    let facilities = config::load_facilities(&config.facilities_path)?;
    let store = Arc::new(MemoryStore::load_json(&config.state_path)?);
    let notify = Arc::new(NotifyHub::new());
    let runner = Arc::new(CycleRunner::new(
        store.clone(),
        notify.clone(),
        CycleOptions {
            persist_openings: config.persist_openings,
        },
    ));

    info!("courtwatch cycle starting");
    info!("  facilities: {}", facilities.len());
    info!("  state: {}", config.state_path.display());
    info!("  scrapes: {}", config.scrape_dir.display());

    let now = chrono::Local::now().naive_local();
    let mut tasks = Vec::new();

    for facility in facilities {
        let path = config.scrape_path(&facility.name);
        let scraped: Vec<ScrapedDay> = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(days) => days,
                Err(e) => {
                    warn!("skipping {}: bad scrape file {}: {e}", facility.name, path.display());
                    continue;
                }
            },
            Err(e) => {
                warn!("skipping {}: cannot read {}: {e}", facility.name, path.display());
                continue;
            }
        };

        let runner = runner.clone();
        tasks.push(tokio::spawn(async move {
            let result = runner.run(&facility, scraped, now).await;
            (facility.name, result)
        }));
    }

    for task in tasks {
        match task.await {
            Ok((_, Ok(report))) => {
                info!(
                    "{}: {} slots, {} new, {} subscribers notified",
                    report.facility,
                    report.slots,
                    report.new_slots,
                    report.alerts.len()
                );
                for alert in report.into_alerts() {
                    println!("{}", serde_json::to_string(&alert)?);
                }
            }
            Ok((name, Err(e))) => error!("{name}: cycle failed: {e}"),
            Err(e) => error!("cycle task panicked: {e}"),
        }
    }

    store.save_json(&config.state_path)?;
    info!("courtwatch cycle done");
    Ok(())
}
