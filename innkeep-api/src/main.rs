use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use innkeep_api::{app, AppState};
use innkeep_core::booking::BookingRules;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innkeep_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config =
        innkeep_store::app_config::Config::load().context("failed to load configuration")?;
    tracing::info!("Starting Innkeep API on port {}", config.server.port);

    let db = innkeep_store::DbClient::new(&config.database.url)
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;

    let state = AppState::new(
        Arc::new(innkeep_store::PgRoomRepository::new(db.pool.clone())),
        Arc::new(innkeep_store::PgBookingRepository::new(db.pool.clone())),
        Arc::new(innkeep_store::PgPaymentRepository::new(db.pool.clone())),
        Arc::new(innkeep_store::PgReviewRepository::new(db.pool.clone())),
        Arc::new(innkeep_store::PgUserRepository::new(db.pool.clone())),
        BookingRules {
            cancellation_cutoff_hours: config.business_rules.cancellation_cutoff_hours,
        },
        config.business_rules.default_report_days,
    );

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await?;
    Ok(())
}
