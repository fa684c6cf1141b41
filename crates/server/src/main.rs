mod api;
mod background;
mod router;
mod state;

use std::sync::Arc;

use tracing::{info, warn};

use chores_notify::{Dispatcher, HomeAssistantNotifier, Notifier};
use chores_schedule::SchedulePolicy;
use chores_storage::JsonStore;

fn load_config() -> chores_core::Config {
    chores_core::config::load_dotenv();
    chores_core::Config::from_env()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = load_config();
    config.log_summary();

    let store = Arc::new(JsonStore::open(&config.storage.data_dir)?);
    info!(
        tasks = store.tasks().len(),
        devices = store.devices().len(),
        "Store opened"
    );

    if !config.home_assistant.is_configured() {
        warn!("HA_TOKEN not set — notifications will fail until configured");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(HomeAssistantNotifier::new(
        config.home_assistant.url.clone(),
        config.home_assistant.token.clone(),
    ));
    if notifier.check_connection().await {
        info!("Home Assistant reachable");
    } else {
        warn!("Home Assistant unreachable at startup, will retry on dispatch");
    }

    let tz: chrono_tz::Tz = config
        .schedule
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {e}", config.schedule.timezone))?;
    let policy = SchedulePolicy::new(
        tz,
        config.schedule.weekday_hour,
        config.schedule.weekend_hour,
    );

    let dispatcher = Arc::new(Dispatcher::new(notifier.clone()));

    let state = Arc::new(state::AppState {
        config,
        store,
        notifier,
        dispatcher,
        policy,
        started_at: std::time::Instant::now(),
    });

    let (poller_handle, poller_shutdown) = background::spawn_poller(&state);

    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = router::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, shutting down poller");
    let _ = poller_shutdown.send(true);
    let _ = poller_handle.await;

    Ok(())
}
