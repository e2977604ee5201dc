use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use duet_relay::brokers::memory::InMemoryBroker;
use duet_relay::core::{
    broker::MessageBroker, config::load_from_env, directory::UserDirectory,
    dispatcher::Dispatcher, registry::RoomRegistry,
};
use duet_relay::web::app::{AppState, router};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();

    info!("starting...");

    info!("loading configuration...");
    let cfg = load_from_env()?;

    info!("loading user table...");
    let directory = Arc::new(UserDirectory::from_config(&cfg)?);
    info!(users=%directory.len(), "user table loaded");

    let registry = Arc::new(RoomRegistry::new());

    // Broker channel: many producers (sessions, ingestion) -> one consumer (dispatcher)
    let broker = Arc::new(InMemoryBroker::new(cfg.broker_capacity));
    let broker_rx = broker.subscribe()?;

    // Start dispatcher
    let cancel_all = CancellationToken::new();
    let dispatcher = Dispatcher::new(registry.clone(), broker_rx);
    let dispatcher_task = tokio::spawn({
        let cancel = cancel_all.child_token();
        async move { dispatcher.run(cancel).await }
    });

    let state =
        AppState::new(directory, registry, broker as Arc<dyn MessageBroker>, cfg.outbound_capacity);
    let app = router(state);

    info!(bind=%cfg.bind, "listening...");
    let listener = TcpListener::bind(&cfg.bind).await?;

    // Graceful shutdown on Ctrl+C
    let shutdown = {
        let cancel = cancel_all.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl+C received; shutting down...");
            cancel.cancel();
        }
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    cancel_all.cancel();

    // Join dispatcher
    match dispatcher_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(?e, "dispatcher error"),
        Err(e) => warn!(?e, "dispatcher task panicked/aborted"),
    }

    info!("goodbye");
    Ok(())
}

fn init_tracing() {
    // Set a default log level for all crates (warn), then allow RUST_LOG to override
    //
    // Examples:
    //   RUST_LOG=duet_relay=debug           - Only duet_relay at debug, everything else at warn
    //   RUST_LOG=debug                      - Everything at debug
    //   RUST_LOG=duet_relay=debug,hyper=info - duet_relay at debug, hyper at info, rest at warn
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();

    fmt().with_env_filter(filter).init();
}
