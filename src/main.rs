use dotenv::dotenv;
use microcollab::{seed, AppState, Settings};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> microcollab::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    // Initialize application state
    let state = AppState::new(config).await?;

    if state.config.seed.auto && seed::seed_if_empty(&state.storage, &state.config.seed).await {
        info!("Seeded the store with template data");
    }

    // Log marketplace events as the services emit them
    let mut market = state.events.subscribe().await;
    tokio::spawn(async move {
        while let Some(event) = market.receiver.recv().await {
            info!("market event: {}", event.kind());
        }
    });

    // Mirror the demo activity feed into the log
    let mut feed = state.demo.subscribe().await;
    tokio::spawn(async move {
        while let Some(event) = feed.receiver.recv().await {
            info!("demo: {}", event.message);
        }
    });

    state.demo.start().await;
    info!(
        "Demo simulation running with a {}s tick; press ctrl-c to exit",
        state.config.simulation.tick_seconds
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    state.shutdown().await?;

    Ok(())
}
