//! # Sales Simulator
//!
//! Produces synthetic sales and feeds them to the dashboard.
//!
//! ## Live Mode
//! 1. Every interval (5 seconds by default) build one sale with a random region and product.
//!
//! 2. Amount is a random base in [100, 1000) plus the current hour and minute read as a decimal,
//!    so the dashboard visibly tracks the clock.
//!
//! 3. Insert the sale into `sales_data`. A failed insert is logged and the loop moves on.
//!
//! 4. POST the sale to the server's `/notify-new-sale` with a 2 second timeout so connected
//!    clients get a `new_sale` event. Failures are logged, never retried.
//!
//! 5. Ctrl+C or SIGTERM stops the loop and drops the store connection.
//!
//! ## Seed Mode
//! Backfills the last N days in one batch per day so trends and forecasts have history to work with.
//!
//! ## Notes
//! - The simulator shares nothing with the server but the store and the notify endpoint
//! - A client can see `new_sale` before the sale is queryable, or miss it entirely
use std::{future::Future, slice};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use ledger::{DocumentStore, StoreError, collections::insert_sales, models::SalesRecord};
use rand::{Rng, SeedableRng, rngs::StdRng};
use reqwest::Client;
use tokio::{
    signal::{
        ctrl_c,
        unix::{SignalKind, signal},
    },
    time::interval,
};
use tracing::{error, info, warn};

pub mod models;
pub mod utils;

use models::{Mode, NOTIFY_TIMEOUT, Settings};
use utils::{generate_record, spread_over_day};

pub async fn start(settings: Settings) -> anyhow::Result<()> {
    info!(db_name = %settings.db_name, "Connecting to document store");

    let store = ledger::connect(&settings.database_url, &settings.db_name)
        .await
        .context("Failed to connect to the document store, check DATABASE_URL")?;

    let mut rng = StdRng::from_entropy();

    match settings.mode {
        Mode::Live => {
            let client = Client::builder()
                .timeout(NOTIFY_TIMEOUT)
                .build()
                .context("Failed to build notification client")?;

            info!(
                notify_url = %settings.notify_url,
                interval_secs = settings.interval.as_secs(),
                "Starting simulation, press Ctrl+C to stop"
            );

            simulate(
                store.as_ref(),
                &client,
                &settings.notify_url,
                settings.interval,
                &mut rng,
                shutdown_signal(),
            )
            .await;
        }
        Mode::Seed { days, per_day } => {
            let inserted = seed_history(store.as_ref(), days, per_day, Utc::now(), &mut rng).await?;
            info!("Seeded {inserted} sales over {days} days");
        }
    }

    drop(store);
    info!("Store connection closed");

    Ok(())
}

/// Publishes one sale per tick until `shutdown` resolves.
pub async fn simulate<R: Rng + ?Sized>(
    store: &dyn DocumentStore,
    client: &Client,
    notify_url: &str,
    period: std::time::Duration,
    rng: &mut R,
    shutdown: impl Future<Output = ()>,
) {
    let mut ticker = interval(period);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let record = generate_record(rng, Utc::now());
                publish(store, client, notify_url, &record).await;
            }
            () = &mut shutdown => {
                info!("Simulation stopped");
                break;
            }
        }
    }
}

/// Store one sale then relay it to the server, logging instead of failing.
pub async fn publish(
    store: &dyn DocumentStore,
    client: &Client,
    notify_url: &str,
    record: &SalesRecord,
) {
    match insert_sales(store, slice::from_ref(record)).await {
        Ok(()) => info!(
            product = %record.product,
            region = %record.region,
            amount = record.sales_amount,
            "Inserted sale"
        ),
        Err(e) => warn!("Failed to insert sale: {e}"),
    }

    match notify(client, notify_url, record).await {
        Ok(()) => info!("Notified backend"),
        Err(e) => warn!("Could not notify backend: {e}"),
    }
}

async fn notify(client: &Client, notify_url: &str, record: &SalesRecord) -> Result<(), reqwest::Error> {
    client
        .post(notify_url)
        .json(record)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, stopping"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, stopping");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub async fn seed_history<R: Rng + ?Sized>(
    store: &dyn DocumentStore,
    days: u32,
    per_day: u32,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<usize, StoreError> {
    let pb = ProgressBar::new(u64::from(days));
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut inserted = 0;

    for offset in (1..=i64::from(days)).rev() {
        let date = (now - Duration::days(offset)).date_naive();
        pb.set_message(format!("Seeding {date}"));

        let records: Vec<SalesRecord> = spread_over_day(date, per_day)
            .into_iter()
            .map(|instant| generate_record(rng, instant))
            .collect();

        insert_sales(store, &records).await?;
        inserted += records.len();

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ledger::{
        MemoryStore,
        collections::{SALES_COLLECTION, all_sales},
    };

    use super::*;

    #[tokio::test]
    async fn test_failed_notification_still_stores_sale() {
        let store = MemoryStore::new();
        let client = Client::builder().timeout(NOTIFY_TIMEOUT).build().unwrap();
        let record = generate_record(&mut StdRng::seed_from_u64(1), Utc::now());

        publish(&store, &client, "http://127.0.0.1:9/notify-new-sale", &record).await;

        assert_eq!(all_sales(&store).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_simulation_stops_on_shutdown() {
        let store = MemoryStore::new();
        let client = Client::builder().timeout(NOTIFY_TIMEOUT).build().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let run = simulate(
            &store,
            &client,
            "http://127.0.0.1:9/notify-new-sale",
            std::time::Duration::from_millis(10),
            &mut rng,
            async move {
                let _ = stopped.await;
            },
        );
        let stopper = async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            stop.send(()).unwrap();
        };

        let finished = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            tokio::join!(run, stopper);
        })
        .await;

        assert!(finished.is_ok(), "simulation kept running after shutdown");
        assert!(!all_sales(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_history_covers_each_day() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 15, 30, 0).unwrap();

        let inserted = seed_history(&store, 3, 4, now, &mut StdRng::seed_from_u64(3))
            .await
            .unwrap();
        assert_eq!(inserted, 12);

        let records = all_sales(&store).await.unwrap();
        let mut dates: Vec<String> = records
            .iter()
            .filter_map(|record| record.date())
            .map(|date| date.to_string())
            .collect();
        dates.dedup();

        assert_eq!(dates, vec!["2025-04-07", "2025-04-08", "2025-04-09"]);
        assert_eq!(store.find_all(SALES_COLLECTION).await.unwrap().len(), 12);
    }
}
