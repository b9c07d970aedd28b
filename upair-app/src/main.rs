use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upair_catalog::{FareCalculator, SeatInventory, StatusEngine};
use upair_core::{ScheduleQuery, SystemClock};
use upair_order::{BookingManager, RetirementSweep};
use upair_shared::{ScheduleRetiredEvent, SeatsCommittedEvent};
use upair_store::{Config, InMemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UP Air core, seat capacity {}", config.seating.capacity());

    let store = Arc::new(InMemoryStore::new());
    store.seed(&config.fixtures).await.context("Failed to seed store")?;

    let clock = Arc::new(SystemClock);
    let engine = StatusEngine::new(config.lifecycle.clone());

    let (seat_tx, seat_rx) = broadcast::channel::<SeatsCommittedEvent>(100);
    let (retired_tx, retired_rx) = broadcast::channel::<ScheduleRetiredEvent>(100);
    tokio::spawn(log_events("seats.committed", seat_rx));
    tokio::spawn(log_events("schedule.retired", retired_rx));

    let inventory = SeatInventory::new(config.seating.clone(), store.clone(), store.clone()).with_events(seat_tx);
    let manager = BookingManager::new(store.clone(), store.clone(), store.clone(), inventory, clock.clone())
        .with_engine(engine.clone())
        .with_fares(FareCalculator::new(config.fares.clone()));

    let sweep = Arc::new(RetirementSweep::new(engine, store.clone(), store.clone(), clock).with_events(retired_tx));
    let every = Duration::from_secs(config.sweep.interval_seconds.max(1));
    let sweep_task = sweep.spawn(every);

    let mut board_ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = board_ticker.tick() => log_board(&manager).await,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down");
    sweep_task.abort();
    Ok(())
}

async fn log_board(manager: &BookingManager) {
    match manager.flight_board(&ScheduleQuery::default()).await {
        Ok(board) => {
            info!("Departures board: {} flight(s)", board.len());
            for entry in board {
                let s = &entry.schedule;
                info!(
                    "  {} {} {} -> {} {} {}  {}",
                    s.schedule_id, s.flight_code, s.origin, s.destination, s.departure_date, s.departure_time, entry.status
                );
            }
        }
        Err(e) => error!("Failed to build departures board: {}", e),
    }
}

async fn log_events<T: std::fmt::Debug + Clone>(topic: &'static str, mut rx: broadcast::Receiver<T>) {
    loop {
        match rx.recv().await {
            Ok(event) => info!("[{}] {:?}", topic, event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("[{}] listener lagged, {} event(s) skipped", topic, skipped)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
