use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher>,
}

impl AppContext {
    pub fn new() -> Result<Self> {
        let config = Config::load().map_err(|e| crate::app::CoracleError::Config(e.to_string()))?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.fetch.transport())?);
        Ok(Self { config, fetcher })
    }
}
