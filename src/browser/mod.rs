//! Browser automation boundary.
//!
//! The crawl pipeline only talks to [`BrowserSession`]; the concrete backend is
//! a W3C WebDriver endpoint ([`WebDriverSession`]). Sessions are acquired from a
//! [`SessionFactory`] and must be released by whoever acquired them.

mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error_handling::BrowserError;
use crate::extract::Locator;

pub use webdriver::{WebDriverFactory, WebDriverOptions, WebDriverSession};

/// Opaque reference to an element inside one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One live browser session.
///
/// Element lookups return `Ok(None)` when nothing matches; errors are reserved
/// for transport and protocol failures.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Serialized DOM of the current page.
    async fn current_markup(&mut self) -> Result<String, BrowserError>;

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BrowserError>;

    /// Clears the element and types `text` into it.
    async fn type_into(&mut self, element: &ElementHandle, text: &str)
        -> Result<(), BrowserError>;

    /// Presses Enter on the element.
    async fn submit(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    async fn execute_script(&mut self, script: &str, args: Vec<Value>)
        -> Result<Value, BrowserError>;

    async fn refresh(&mut self) -> Result<(), BrowserError>;

    /// Ends the session. Calling it twice is harmless.
    async fn release(&mut self) -> Result<(), BrowserError>;
}

/// Source of browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Opens a new session. Failure here aborts the batch that asked for it.
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// Polls every locator until one resolves or `timeout` elapses.
///
/// At least one full pass is made, so a zero timeout still checks the page
/// once. Returns `Ok(None)` when nothing rendered in time.
pub async fn wait_for_any(
    session: &mut dyn BrowserSession,
    locators: &[Locator],
    timeout: Duration,
    poll: Duration,
) -> Result<Option<ElementHandle>, BrowserError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        for locator in locators {
            if let Some(element) = session.find(locator).await? {
                log::trace!("Locator {} resolved", locator);
                return Ok(Some(element));
            }
        }
        if tokio::time::Instant::now() >= deadline {
            log::debug!("No locator resolved within {:?}", timeout);
            return Ok(None);
        }
        tokio::time::sleep(poll).await;
    }
}
