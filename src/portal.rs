// src/portal.rs

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};

const ARCGIS_BASE: &str =
    "https://services9.arcgis.com/weJ1QsnbMYJlCHdG/arcgis/rest/services/";

/// A remote dataset the portal client knows how to query.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetConfig {
    pub key: String,
    pub name: String,
    pub description: String,
    pub source_url: Url,
    pub default_params: BTreeMap<String, String>,
}

/// Caller-supplied query options, mirroring the ArcGIS feature service API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchParams {
    pub where_clause: Option<String>,
    pub out_fields: Option<String>,
    pub out_sr: Option<u32>,
    pub limit: Option<u32>,
    pub extra: BTreeMap<String, String>,
}

/// The IMF climate data portal feature services.
pub fn default_datasets() -> Vec<DatasetConfig> {
    let params: BTreeMap<String, String> = [
        ("outSR", "4326"),
        ("f", "json"),
        ("where", "1=1"),
        ("outFields", "*"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let service = |path: &str| {
        Url::parse(ARCGIS_BASE)
            .and_then(|base| base.join(path))
            .expect("static ArcGIS service URL is valid")
    };

    vec![
        DatasetConfig {
            key: "ghg_emissions_quarterly".into(),
            name: "Quarterly Greenhouse Gas (GHG) Air Emissions Accounts".into(),
            description: "Quarterly GHG air emissions accounts sourced from the IMF climate \
                          data portal and hosted on ArcGIS feature services."
                .into(),
            source_url: service("Indicator_1_1_quarterly/FeatureServer/0/query"),
            default_params: params.clone(),
        },
        DatasetConfig {
            key: "ghg_emissions_annual".into(),
            name: "Annual Greenhouse Gas (GHG) Air Emissions Accounts".into(),
            description: "Annual GHG emissions accounts published on the IMF climate data portal."
                .into(),
            source_url: service("Indicator_1_1_annual/FeatureServer/0/query"),
            default_params: params,
        },
    ]
}

/// Fetch-and-relay client for the remote dataset portal.
pub struct PortalClient {
    http: Client,
    datasets: Vec<DatasetConfig>,
}

impl PortalClient {
    pub fn new(datasets: Vec<DatasetConfig>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("building portal HTTP client: {}", e)))?;
        Ok(Self { http, datasets })
    }

    pub fn list_datasets(&self) -> &[DatasetConfig] {
        &self.datasets
    }

    pub fn get_dataset(&self, key: &str) -> Result<&DatasetConfig> {
        self.datasets
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| Error::NotFound(format!("Dataset '{}' is not supported", key)))
    }

    /// Query `key` on the portal and hand back its JSON payload untouched.
    pub async fn fetch_dataset(&self, key: &str, params: &FetchParams) -> Result<Value> {
        let dataset = self.get_dataset(key)?;
        let query = build_params(dataset, params);

        info!(dataset = %key, url = %dataset.source_url, "fetching remote dataset");
        let resp = self
            .http
            .get(dataset.source_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::upstream(None, format!("dataset portal unreachable: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(dataset = %key, %status, "dataset portal returned an error status");
            return Err(Error::upstream(
                Some(status.as_u16()),
                format!("dataset portal returned {}", status),
            ));
        }

        let text = resp
            .text()
            .await
            .map_err(|_| Error::upstream(None, "Failed to parse dataset response"))?;
        parse_payload(&text)
    }
}

/// Defaults first, then the caller's options, then `extra` on top.
pub fn build_params(dataset: &DatasetConfig, params: &FetchParams) -> BTreeMap<String, String> {
    let defaults = &dataset.default_params;
    let mut query = defaults.clone();

    let pick = |given: &Option<String>, name: &str, fallback: &str| {
        given
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| defaults.get(name).map(String::as_str))
            .unwrap_or(fallback)
            .to_string()
    };

    query.insert("where".into(), pick(&params.where_clause, "where", "1=1"));
    query.insert("outFields".into(), pick(&params.out_fields, "outFields", "*"));
    query.insert("f".into(), pick(&None, "f", "json"));

    if let Some(sr) = params.out_sr.filter(|&sr| sr > 0) {
        query.insert("outSR".into(), sr.to_string());
    }
    if let Some(limit) = params.limit.filter(|&l| l > 0) {
        query.insert("resultRecordCount".into(), limit.to_string());
    }
    for (k, v) in &params.extra {
        query.insert(k.clone(), v.clone());
    }
    query
}

/// Parse the portal body; ArcGIS reports failures as `{"error": {...}}`
/// with a 200 status.
fn parse_payload(text: &str) -> Result<Value> {
    let payload: Value = serde_json::from_str(text)
        .map_err(|_| Error::upstream(None, "Failed to parse dataset response"))?;

    if let Some(err) = payload.get("error").filter(|e| !is_falsy(e)) {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error from dataset");
        let code = err
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok());
        let message = match code {
            Some(code) => format!("dataset portal error {}: {}", code, message),
            None => message.to_string(),
        };
        return Err(Error::upstream(code, message));
    }
    Ok(payload)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}
