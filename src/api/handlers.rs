// src/api/handlers.rs

use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;
use warp::{Rejection, Reply};

use super::endpoints::Endpoint;
use super::rejection::reject;
use super::AppState;
use crate::error::Error;
use crate::portal::FetchParams;
use crate::{query, record};

pub async fn aggregate(
    endpoint: &'static Endpoint,
    params: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<impl Reply, Rejection> {
    let filters = endpoint
        .filters_from_params(&params, state.filter_mode)
        .map_err(reject)?;
    let rows = query::query(
        &state.table,
        endpoint.group_keys,
        &filters,
        state.filter_mode,
    )
    .map_err(reject)?;
    let records = record::transform_all(&rows, state.table.year_columns());

    debug!(
        endpoint = endpoint.name,
        ?filters,
        groups = records.len(),
        "aggregated"
    );
    Ok(warp::reply::json(&records))
}

pub async fn landing_page(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let index = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Ok(warp::reply::html(html)),
        Err(e) => {
            debug!(path = %index.display(), error = %e, "landing page unavailable");
            Err(reject(Error::Internal("Landing page not found".into())))
        }
    }
}

pub async fn health(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "rows": state.table.len(),
        "year_columns": state.table.year_columns().len(),
        "loaded_at": state.loaded_at,
    })))
}

pub async fn chat(
    params: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<impl Reply, Rejection> {
    let question = params
        .get("query")
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            reject(Error::InvalidRequest(
                "missing required query parameter 'query'".into(),
            ))
        })?;

    let response = state.chat.ask(question).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({ "response": response })))
}

pub async fn list_datasets(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&state.portal.list_datasets()))
}

pub async fn fetch_dataset(
    key: String,
    params: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<impl Reply, Rejection> {
    // fail on an unknown key before complaining about parameters
    state.portal.get_dataset(&key).map_err(reject)?;
    let fetch = fetch_params(params).map_err(reject)?;
    let payload = state
        .portal
        .fetch_dataset(&key, &fetch)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&payload))
}

fn fetch_params(mut params: HashMap<String, String>) -> Result<FetchParams, Error> {
    let number = |name: &str, raw: Option<String>| -> Result<Option<u32>, Error> {
        raw.filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<u32>().map_err(|_| {
                    Error::InvalidRequest(format!(
                        "query parameter '{}' must be a positive integer",
                        name
                    ))
                })
            })
            .transpose()
    };

    Ok(FetchParams {
        where_clause: params.remove("where"),
        out_fields: params.remove("outFields"),
        out_sr: number("outSR", params.remove("outSR"))?,
        limit: number("limit", params.remove("limit"))?,
        extra: params.into_iter().collect(),
    })
}
