//! Guide Ledger server binary.
//!
//! Loads configuration, connects to PostgreSQL, serves the webhook and credit
//! endpoints and, when enabled, runs the decay sweep in the background.

use std::sync::Arc;

use guide_ledger::adapters::http::{app_router, AppState};
use guide_ledger::adapters::postgres::{
    PostgresCreditLedger, PostgresDeliveryEventRepository, PostgresPurchaseRepository,
};
use guide_ledger::adapters::{DecaySweeper, DecaySweeperConfig};
use guide_ledger::application::ConsumeCreditsHandler;
use guide_ledger::config::AppConfig;
use guide_ledger::domain::webhook::{HmacWebhookVerifier, WebhookVerifier};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn verifier(
    source: &'static str,
    secret: &Option<SecretString>,
) -> Option<Arc<dyn WebhookVerifier>> {
    match secret {
        Some(secret) => Some(Arc::new(HmacWebhookVerifier::new(secret.clone()))),
        None => {
            tracing::warn!(
                source,
                "Webhook secret not configured; deliveries will be refused"
            );
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Received shutdown signal, draining connections");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let ledger = Arc::new(PostgresCreditLedger::new(pool.clone()));
    let state = AppState {
        ledger: ledger.clone(),
        purchases: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        delivery_events: Arc::new(PostgresDeliveryEventRepository::new(pool.clone())),
        payment_verifier: verifier("payment", &config.payment.webhook_secret),
        delivery_verifier: verifier("email", &config.email.webhook_secret),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_task = if config.decay.enabled {
        let sweeper = DecaySweeper::new(
            Arc::new(ConsumeCreditsHandler::new(ledger)),
            DecaySweeperConfig::default().with_sweep_interval(config.decay.sweep_interval()),
        );
        Some(tokio::spawn(async move { sweeper.run(shutdown_rx).await }))
    } else {
        tracing::info!("Decay sweep disabled");
        None
    };

    let router = app_router(state, config.server.request_timeout());
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Guide Ledger listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = sweeper_task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Decay sweeper task failed");
        }
    }
    pool.close().await;

    Ok(())
}
