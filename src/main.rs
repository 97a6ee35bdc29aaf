use dotenvy::dotenv;
use price_gateway::{
    api::{self, AppState},
    cache::PriceCache,
    config::Settings,
    upstream::{self, SheetClient},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), GenericError> {
    dotenv().ok();

    let settings = Settings::load()?;
    set_up_logging(&settings.log.level);

    let client = SheetClient::from_settings(&settings.upstream)?;
    let sheet = upstream::sheet_for(settings.upstream.schema, client);
    let state = AppState::new(sheet, PriceCache::new());

    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind((settings.server.host.as_str(), settings.server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        schema = ?settings.upstream.schema,
        timeout_ms = settings.upstream.timeout_ms,
        max_retries = settings.upstream.max_retries,
        "price gateway listening"
    );
    axum::serve(listener, router).await?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn set_up_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}
