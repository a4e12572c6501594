//! # plugschedd — plug scheduler daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the adapters (store, plugs, oracles) and the schedule engine
//! - Arm the initial set of triggers
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT), then stop the engine
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod oracles;

use std::sync::Arc;

use plugsched_adapter_http_axum::AppState;
use plugsched_adapter_storage_sqlite_sqlx::Config as StorageConfig;
use plugsched_adapter_virtual::VirtualPlugs;
use plugsched_app::actuator::DeviceActuator;
use plugsched_app::ports::SystemClock;
use plugsched_app::resolver::TimeOverrideResolver;
use plugsched_app::schedule_engine::ScheduleEngine;
use plugsched_app::services::device_service::DeviceService;
use plugsched_app::services::schedule_service::ScheduleService;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::oracles::{Occupancy, Solar};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = db.schedule_store();

    // Devices
    let plugs = VirtualPlugs::new(config.plugs.iter().cloned());
    let actuator = Arc::new(DeviceActuator::new(
        plugs,
        config.actuator.retry_policy(),
        config.actuator.discovery_window(),
    ));

    // Engine
    let resolver = TimeOverrideResolver::new(
        Solar::from_config(&config.oracles)?,
        Occupancy::from_config(&config.oracles)?,
        config.resolver_config()?,
    );
    let engine = ScheduleEngine::new(
        store.clone(),
        resolver,
        Arc::clone(&actuator),
        SystemClock,
        config.engine_config(),
    );
    match engine.rebuild().await {
        Ok(report) => tracing::info!(
            armed = report.armed,
            suppressed = report.suppressed,
            skipped = report.skipped,
            "initial triggers armed"
        ),
        Err(err) => tracing::error!(error = %err, "initial rebuild failed"),
    }

    // HTTP
    let state = AppState::new(
        ScheduleService::new(store.clone(), engine.clone()),
        DeviceService::new(actuator, store),
        engine.clone(),
    );
    let app = plugsched_adapter_http_axum::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "plugschedd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown();
    tracing::info!("plugschedd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown requested");
}
