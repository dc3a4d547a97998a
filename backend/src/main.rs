use std::{net::SocketAddr, sync::Arc, time::Duration};

use backend::{
    create_router, database::Database, forecast::ForecastClient, geocode::GeocodeClient,
    osrm::OsrmClient, AppState,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
/// Nominatim refuses anonymous clients, so every upstream call carries this.
const USER_AGENT: &str = "HORI-App/1.0 (contact@example.com)";

/// HORI backend: driving routes, comfort scores and trip history.
#[derive(Debug, Parser)]
struct Args {
    /// Address the HTTP server listens on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// OSRM routing service.
    #[arg(long, env = "OSRM_BASE_URL", default_value = "http://osrm:5000")]
    osrm_url: String,

    /// Nominatim geocoding service.
    #[arg(
        long,
        env = "NOMINATIM_URL",
        default_value = "https://nominatim.openstreetmap.org"
    )]
    nominatim_url: String,

    /// Open-Meteo weather forecast service.
    #[arg(long, env = "FORECAST_URL", default_value = "https://api.open-meteo.com")]
    forecast_url: String,

    /// Open-Meteo air quality service.
    #[arg(
        long,
        env = "AIR_QUALITY_URL",
        default_value = "https://air-quality-api.open-meteo.com"
    )]
    air_quality_url: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(UPSTREAM_TIMEOUT)
        .build()
        .expect("build HTTP client");

    let db = Database::connect(&args.database_url)
        .await
        .expect("connect to PostgreSQL");
    db.migrate().await.expect("run database migrations");

    let state = AppState {
        db: Arc::new(db),
        osrm: OsrmClient::new(http.clone(), args.osrm_url),
        forecast: ForecastClient::new(http.clone(), args.forecast_url, args.air_quality_url),
        geocode: GeocodeClient::new(http, args.nominatim_url),
    };
    let app = create_router(state);

    tracing::info!("starting backend on http://{}", args.bind);
    axum::serve(
        tokio::net::TcpListener::bind(args.bind).await.unwrap(),
        app,
    )
    .await
    .unwrap();
}
