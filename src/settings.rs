use crate::client::predict_path;
use crate::client::retry::RetryConfig;
use crate::generation::GenerationRoute;

#[derive(Clone, Debug)]
pub struct Settings {
    /// Base URL of the vary server.
    pub server: String,
    /// Page limit passed to `/predict/{max_pages}`; `None` posts to
    /// `/predict`.
    pub max_pages: Option<u32>,
    pub generation_route: GenerationRoute,
    /// Applied to idempotent GET requests only.
    pub retry: RetryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:5000".to_string(),
            max_pages: Some(4),
            generation_route: GenerationRoute::GeneratePdfs,
            retry: RetryConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: std::env::var("VARY_SERVER").unwrap_or(defaults.server),
            max_pages: match std::env::var("VARY_MAX_PAGES").ok().and_then(|v| v.parse::<u32>().ok()) {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.max_pages,
            },
            generation_route: std::env::var("VARY_GENERATION_ROUTE")
                .ok()
                .and_then(|v| GenerationRoute::from_name(&v))
                .unwrap_or(defaults.generation_route),
            retry: RetryConfig {
                max_retries: std::env::var("VARY_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.retry.max_retries),
                base_delay_ms: std::env::var("VARY_RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.retry.base_delay_ms),
                ..defaults.retry
            },
        }
    }

    /// Path of the prediction endpoint.
    pub fn predict_path(&self) -> String {
        predict_path(self.max_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_path() {
        let mut s = Settings::default();
        assert_eq!(s.predict_path(), "predict/4");
        s.max_pages = None;
        assert_eq!(s.predict_path(), "predict");
    }
}
