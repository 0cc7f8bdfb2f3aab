use anyhow::{Context, Result};
use log::{error, info, warn};
use remindar_monitor::api::{ApiClient, DeviceClient, EmergencyStatusSource, StreamStatusSource};
use remindar_monitor::config;
use remindar_monitor::emergency::monitor::{LogDialer, TerminalBell};
use remindar_monitor::messaging::{AlertEvent, AlertEventType, EventBus, EventPublisher};
use remindar_monitor::error::classify;
use remindar_monitor::{FallAlertMonitor, FallAlertService, SessionStore, StreamStatusService};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;

async fn run_app() -> Result<()> {
    // Load configuration before logging so the configured level applies
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = config::load_config(config_path.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    info!("Starting RemindAR fall-alert monitor");

    let events = Arc::new(EventBus::default());

    // Restore the signed-in session, if any
    let session = Arc::new(SessionStore::open(&config.session.storage_path));
    let restored = session
        .restore()
        .await
        .context("Failed to read stored session")?;

    match ApiClient::from_config(&config, session.clone())? {
        Some(api) if restored.is_some() => match session.verify(&api).await {
            Ok(user) => {
                info!("Session verified for {}", user.id);
                events
                    .publish(AlertEventType::SessionRestored, Some(user.id.clone()), &user)
                    .await?;
            }
            Err(e) if classify(&e).map_or(false, |err| err.is_auth_failure()) => {
                warn!("Stored session was rejected; sign in again");
                events.send(AlertEvent::new_empty(AlertEventType::SessionExpired, None));
            }
            Err(e) => warn!("Could not verify session, keeping it: {:#}", e),
        },
        Some(_) => info!("Not signed in"),
        None => info!("API base URL not configured; resource screens disabled"),
    }

    // Log every alert event as it happens
    let mut subscriber = events.subscribe();
    let logger = tokio::spawn(async move {
        while let Ok(event) = subscriber.recv().await {
            info!("[{}] {}", event.routing_key(), event.payload);
        }
    });

    let device = DeviceClient::from_config(&config)?.map(Arc::new);
    if device.is_none() {
        warn!("Stream base URL not configured; fall alerts and live view disabled");
    }

    let monitor = FallAlertMonitor::from_config(
        &config.device,
        Arc::new(TerminalBell),
        Arc::new(LogDialer),
    );
    let mut fall_alerts = FallAlertService::new(
        monitor,
        events.clone(),
        Duration::from_secs(config.device.emergency_poll_secs),
    );
    fall_alerts.start(device.clone().map(|d| Arc::new(EmergencyStatusSource(d))));

    let mut stream_status = StreamStatusService::new(
        events.clone(),
        Duration::from_secs(config.device.stream_poll_secs),
    );
    stream_status.start(
        device.clone().map(|d| Arc::new(StreamStatusSource(d))),
        device.as_ref().map(|d| d.live_url()),
    );
    if let Some(url) = stream_status.live_url() {
        info!("Live view available at {}", url);
    }

    events
        .publish(
            AlertEventType::SystemStartup,
            None,
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        )
        .await?;

    // Wait for termination signals
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    fall_alerts.stop();
    stream_status.stop();

    if let Err(e) = events
        .publish(
            AlertEventType::SystemShutdown,
            None,
            serde_json::json!({"reason": "Normal shutdown"}),
        )
        .await
    {
        error!("Failed to publish shutdown event: {}", e);
    }

    // Let the logger drain the shutdown event
    tokio::time::sleep(Duration::from_millis(100)).await;
    logger.abort();

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
