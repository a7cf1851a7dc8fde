// src/api/mod.rs

pub mod endpoints;
pub mod handlers;
pub mod rejection;

use chrono::{DateTime, Utc};
use std::{collections::HashMap, convert::Infallible, path::PathBuf, sync::Arc};
use warp::{Filter, Rejection, Reply};

use crate::chat::ChatClient;
use crate::config::Config;
use crate::dataset::Table;
use crate::error::Result;
use crate::portal::{self, PortalClient};
use crate::query::FilterMode;
use endpoints::Endpoint;

/// Everything a request handler may read. Built once at startup and shared
/// behind an `Arc`; nothing in it is mutated afterwards.
pub struct AppState {
    pub table: Table,
    pub filter_mode: FilterMode,
    pub static_dir: PathBuf,
    pub chat: ChatClient,
    pub portal: PortalClient,
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(table: Table, config: &Config) -> Result<Self> {
        Ok(Self {
            table,
            filter_mode: config.filter_mode,
            static_dir: config.static_dir.clone(),
            chat: ChatClient::new(config.chat.clone(), config.upstream_timeout)?,
            portal: PortalClient::new(portal::default_datasets(), config.upstream_timeout)?,
            loaded_at: Utc::now(),
        })
    }
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn aggregate(
    endpoint: &'static Endpoint,
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::get()
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(move |params, state| handlers::aggregate(endpoint, params, state))
}

/// The full HTTP surface: aggregation endpoints, chat, remote datasets,
/// landing page and static assets.
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = (impl Reply,)> + Clone {
    let landing = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::landing_page);

    let assets = warp::path("static")
        .and(warp::get())
        .and(warp::fs::dir(state.static_dir.clone()));

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::health);

    let sector = warp::path!("sector").and(aggregate(&endpoints::SECTOR, state.clone()));
    let grouped_sector = warp::path!("group" / "sector")
        .and(aggregate(&endpoints::GROUPED_SECTOR, state.clone()));
    let indicator =
        warp::path!("indicator").and(aggregate(&endpoints::INDICATOR, state.clone()));
    let grouped_indicator = warp::path!("group" / "indicator")
        .and(aggregate(&endpoints::GROUPED_INDICATOR, state.clone()));
    let country = warp::path!("country").and(aggregate(&endpoints::COUNTRY, state.clone()));

    let chat = warp::path!("chat")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(handlers::chat);

    let datasets = warp::path!("datasets")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_datasets);

    let fetch_dataset = warp::path!("datasets" / String)
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(handlers::fetch_dataset);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["accept", "authorization", "content-type"]);

    landing
        .or(assets)
        .or(health)
        .or(sector)
        .or(grouped_sector)
        .or(indicator)
        .or(grouped_indicator)
        .or(country)
        .or(chat)
        .or(datasets)
        .or(fetch_dataset)
        .recover(rejection::handle_rejection)
        .with(cors)
        .with(warp::trace::request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;
    use serde_json::Value;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tracing_subscriber::{fmt, EnvFilter};
    use warp::http::StatusCode;

    fn init_test_logging() {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,climate_finance_api=debug")),
            )
            .with_test_writer()
            .try_init();
    }

    const CSV: &str = "\
Country,ISO3,Sector,Indicator,Unit,2019,2020
Kenya,KEN,Energy,Adaptation,USD,1,2
Kenya,KEN,Energy,Mitigation,USD,3,4
Kenya,KEN,Energy,Mitigation,Percent,50,60
Peru,PER,Transport,Mitigation,USD,5,
";

    fn state(static_dir: &Path, extra: &[(&str, &str)]) -> Arc<AppState> {
        init_test_logging();
        let static_dir = static_dir.display().to_string();
        let mut vars: HashMap<String, String> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert("STATIC_DIR".into(), static_dir);
        let config = Config::from_lookup(|k| vars.get(k).cloned());
        let table = dataset::load_from_reader(CSV.as_bytes(), Path::new("test.csv")).unwrap();
        Arc::new(AppState::new(table, &config).unwrap())
    }

    async fn get(state: Arc<AppState>, path: &str) -> (StatusCode, Value) {
        let resp = warp::test::request()
            .method("GET")
            .path(path)
            .reply(&routes(state))
            .await;
        let body = serde_json::from_slice(resp.body()).unwrap_or(Value::Null);
        (resp.status(), body)
    }

    #[tokio::test]
    async fn test_sector_endpoint() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(state(dir.path(), &[]), "/sector?country=Kenya").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!([
                {
                    "Country": "Kenya", "Sector": "Energy", "Unit": "USD",
                    "years": [{"year": "2019", "value": 4.0}, {"year": "2020", "value": 6.0}]
                },
                {
                    "Country": "Kenya", "Sector": "Energy", "Unit": "Percent",
                    "years": [{"year": "2019", "value": 50.0}, {"year": "2020", "value": 60.0}]
                }
            ])
        );
    }

    #[tokio::test]
    async fn test_grouped_endpoints() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path(), &[]);

        let (status, body) = get(state.clone(), "/group/sector?sector=Transport").await;
        assert_eq!(status, StatusCode::OK);
        let keys: Vec<&String> = body[0].as_object().unwrap().keys().collect();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert!(keys.contains(&&"Indicator".to_string()));
        assert_eq!(body[0]["years"][1]["value"], 0.0);

        let (_, body) = get(state.clone(), "/group/indicator?indicator=Mitigation").await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (_, body) = get(state, "/indicator").await;
        assert_eq!(body.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_country_endpoint() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(state(dir.path(), &[]), "/country?country=Peru").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["ISO3"], "PER");
        assert_eq!(body[0]["Unit"], "USD");
        assert_eq!(body[0]["years"][0]["value"], 5.0);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_array() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(state(dir.path(), &[]), "/sector?country=Atlantis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_unknown_params() {
        let dir = TempDir::new().unwrap();
        let strict = state(dir.path(), &[("STRICT_FILTERS", "true")]);
        let (status, body) = get(strict, "/country?sector=Energy").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("sector"));

        let lenient = state(dir.path(), &[]);
        let (status, _) = get(lenient, "/country?sector=Energy").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_landing_page() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(state(dir.path(), &[]), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Landing page not found");

        fs::write(dir.path().join("index.html"), "<h1>Climate</h1>").unwrap();
        let resp = warp::test::request()
            .path("/")
            .reply(&routes(state(dir.path(), &[])))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"<h1>Climate</h1>");
    }

    #[tokio::test]
    async fn test_static_assets_and_unknown_routes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1);").unwrap();
        let state = state(dir.path(), &[]);

        let resp = warp::test::request()
            .path("/static/app.js")
            .reply(&routes(state.clone()))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let (status, body) = get(state, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Not Found");
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(state(dir.path(), &[]), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["rows"], 4);
        assert_eq!(body["year_columns"], 2);
    }

    #[tokio::test]
    async fn test_chat_errors() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path(), &[]);

        let (status, _) = get(state.clone(), "/chat").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(state, "/chat?query=warming").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["detail"],
            "GROQ_API_KEY is not configured in the environment"
        );
    }

    #[tokio::test]
    async fn test_datasets() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path(), &[]);

        let (status, body) = get(state.clone(), "/datasets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["key"], "ghg_emissions_quarterly");
        assert_eq!(body[0]["default_params"]["f"], "json");

        let (status, body) = get(state, "/datasets/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Dataset 'unknown' is not supported");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let dir = TempDir::new().unwrap();
        let resp = warp::test::request()
            .method("OPTIONS")
            .path("/sector")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .header("access-control-request-headers", "content-type")
            .reply(&routes(state(dir.path(), &[])))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }
}
