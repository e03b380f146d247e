use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::Configuration;
use crate::generation::GenerationRequest;
use crate::probas::Probabilities;
use crate::source::ConfigSource;

mod http;
pub mod retry;

pub use http::HttpBackend;

/// Path of the prediction endpoint for an optional page limit.
pub fn predict_path(max_pages: Option<u32>) -> String {
    match max_pages {
        Some(n) => format!("predict/{}", n),
        None => "predict".to_string(),
    }
}

/// The vary server, as seen from the configurator.
///
/// Errors are transport or decoding failures; the session logs them and
/// keeps its last known state.
#[async_trait]
pub trait Backend {
    /// `GET /config_src`
    async fn fetch_config_src(&self) -> Result<ConfigSource>;

    /// `POST /predict[/{max_pages}]` with the configuration as body.
    async fn predict(&self, config: &Configuration, max_pages: Option<u32>) -> Result<Probabilities>;

    /// Batch generation; returns the CSV table of generated documents.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// `POST /build_pdf`; returns the PDF bytes.
    async fn build_pdf(&self, payload: &Map<String, Value>) -> Result<Vec<u8>>;

    /// `GET /filenames`
    async fn filenames(&self) -> Result<Vec<String>>;
}
