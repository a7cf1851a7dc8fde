use anyhow::{Context, Result};
use climate_finance_api::{api, config::Config, dataset};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) configuration + logging ─────────────────────────────────
    let config = Config::from_env();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("").add_directive(config.log_level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) load the dataset once; failure means no service ──────────
    info!(path = %config.data_path.display(), filter_mode = ?config.filter_mode, "loading dataset");
    let table = dataset::load(&config.data_path)
        .with_context(|| format!("loading dataset {}", config.data_path.display()))?;
    info!(
        rows = table.len(),
        year_columns = table.year_columns().len(),
        "dataset ready"
    );

    // ─── 3) serve ────────────────────────────────────────────────────
    let state = Arc::new(api::AppState::new(table, &config).context("building app state")?);
    if !state.chat.is_configured() {
        info!("GROQ_API_KEY not set; /chat will answer 503");
    }
    let routes = api::routes(state);

    let addr = SocketAddr::new(config.host, config.port);
    info!("listening on http://{}", addr);
    info!("landing page: http://{}/", addr);
    warp::serve(routes).run(addr).await;

    Ok(())
}
