use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

use crate::client::retry::{retry_async, RetryConfig};
use crate::client::{predict_path, Backend};
use crate::config::Configuration;
use crate::generation::GenerationRequest;
use crate::logging::{config_hash, debug, obj, v_num, v_str, Domain};
use crate::probas::Probabilities;
use crate::settings::Settings;
use crate::source::ConfigSource;

pub struct HttpBackend {
    client: Client,
    base: Url,
    retry: RetryConfig,
}

impl HttpBackend {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut base = settings.server.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).with_context(|| format!("invalid server url '{}'", settings.server))?;
        Ok(Self {
            client: Client::new(),
            base,
            retry: settings.retry.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| anyhow!("bad endpoint '{}': {}", path, e))
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path)?;
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

/// `/filenames` answers with a JSON array, sometimes itself wrapped in a
/// JSON string.
fn parse_filenames(body: &str) -> Result<Vec<String>> {
    match serde_json::from_str::<Value>(body)? {
        Value::String(inner) => Ok(serde_json::from_str(&inner)?),
        other => Ok(serde_json::from_value(other)?),
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn fetch_config_src(&self) -> Result<ConfigSource> {
        let body = retry_async(&self.retry, "config_src", || self.get_text("config_src")).await?;
        ConfigSource::parse(&body)
    }

    async fn predict(&self, config: &Configuration, max_pages: Option<u32>) -> Result<Probabilities> {
        let url = self.endpoint(&predict_path(max_pages))?;
        let body = config.to_json();
        debug(
            Domain::Predict,
            "http_predict",
            obj(&[
                ("url", v_str(url.as_str())),
                ("config_hash", v_str(&config_hash(&body.to_string()))),
            ]),
        );
        let resp = self.client.post(url).json(&body).send().await?.error_for_status()?;
        Ok(resp.json::<Probabilities>().await?)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint(&request.path())?;
        let mut builder = self.client.post(url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }

    async fn build_pdf(&self, payload: &Map<String, Value>) -> Result<Vec<u8>> {
        let url = self.endpoint("build_pdf")?;
        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        debug(Domain::Build, "http_build_pdf", obj(&[("bytes", v_num(bytes.len() as f64))]));
        Ok(bytes.to_vec())
    }

    async fn filenames(&self) -> Result<Vec<String>> {
        let body = retry_async(&self.retry, "filenames", || self.get_text("filenames")).await?;
        parse_filenames(&body)
    }
}
