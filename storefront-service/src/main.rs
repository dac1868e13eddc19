mod api;
mod carts;
mod checkout;
mod tracking;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use shared::pg::{run_migrations, PgStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "storefront-service")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Skip the embedded migrations, e.g. when the schema is managed elsewhere.
    #[arg(long)]
    skip_migrations: bool,

    /// Minutes a cart may sit unused before it is dropped.
    #[arg(long, env = "CART_IDLE_MINUTES", default_value = "60")]
    cart_idle_minutes: u64,

    /// Carts held at once; the least recently used goes first.
    #[arg(long, env = "MAX_CARTS", default_value = "10000")]
    max_carts: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    if args.skip_migrations {
        info!("Skipping database migrations");
    } else {
        info!("Running database migrations...");
        run_migrations(&args.database_url)?;
        info!("Migrations completed successfully");
    }

    let store = PgStore::connect(&args.database_url).await?;

    let app_state = api::AppState {
        store: Arc::new(store),
        carts: carts::CartSessions::with_limits(
            Duration::from_secs(args.cart_idle_minutes.saturating_mul(60)),
            args.max_carts,
        ),
    };

    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    info!("Storefront service started on port {}", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
