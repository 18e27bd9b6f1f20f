//! Application initialization.
//!
//! This module sets up process-wide resources:
//! - Logger (plain or JSON)
//! - Browser session factory for the configured WebDriver endpoint

mod logger;

use std::sync::Arc;

use crate::browser::{WebDriverFactory, WebDriverOptions};
use crate::config::Config;

pub use logger::init_logger_with;

/// Builds the WebDriver session factory described by `config`.
///
/// No session is opened here; each pipeline acquires its own session from the
/// factory when its batch starts.
pub fn init_session_factory(config: &Config) -> Result<Arc<WebDriverFactory>, reqwest::Error> {
    let options = WebDriverOptions {
        endpoint: config.webdriver_url.clone(),
        user_agent: config.user_agent.clone(),
        headless: config.headless,
    };
    Ok(Arc::new(WebDriverFactory::new(options)?))
}
