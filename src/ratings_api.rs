use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::RatingsConfig;
use crate::http_client::http_client;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingsRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// What the service answered, once the body is known to be JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingsReply {
    Results(Vec<PlayerResult>),
    Error(String),
    /// Neither `results` nor `error`; holds a short description of what arrived.
    Unexpected(String),
}

pub trait RatingsService {
    fn fetch_ratings(&self, names: &[String]) -> Result<RatingsReply>;
}

impl<T: RatingsService + ?Sized> RatingsService for Box<T> {
    fn fetch_ratings(&self, names: &[String]) -> Result<RatingsReply> {
        (**self).fetch_ratings(names)
    }
}

pub struct HttpRatingsService {
    client: Client,
    url: String,
}

impl HttpRatingsService {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(cfg: &RatingsConfig) -> Result<Self> {
        let client = http_client(cfg.timeout)?;
        Ok(Self::new(client.clone(), cfg.ratings_url()))
    }
}

impl RatingsService for HttpRatingsService {
    fn fetch_ratings(&self, names: &[String]) -> Result<RatingsReply> {
        let payload = RatingsRequest {
            names: names.to_vec(),
        };
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .with_context(|| format!("request to {} failed", self.url))?;

        // Error bodies come back with 4xx codes, so the body decides the outcome.
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        parse_ratings_reply(&body).with_context(|| format!("http {status}"))
    }
}

pub fn parse_ratings_reply(body: &str) -> Result<RatingsReply> {
    let value: Value = serde_json::from_str(body).context("response was not valid JSON")?;
    classify_reply(value)
}

pub fn classify_reply(value: Value) -> Result<RatingsReply> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Ok(RatingsReply::Unexpected(format!(
                "top-level {}",
                json_kind(&other)
            )));
        }
    };

    // A key that is missing, null, false, zero or "" counts as absent.
    if let Some(results) = map.get("results").filter(|v| is_present(v)) {
        let results = serde_json::from_value::<Vec<PlayerResult>>(results.clone())
            .context("malformed results list")?;
        return Ok(RatingsReply::Results(results));
    }

    if let Some(error) = map.get("error").filter(|v| is_present(v)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(RatingsReply::Error(message));
    }

    Ok(RatingsReply::Unexpected(describe_keys(&map)))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => true,
    }
}

fn describe_keys(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        return "empty object".to_string();
    }
    let keys = map.keys().map(String::as_str).collect::<Vec<_>>();
    format!("object with keys [{}]", keys.join(", "))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
