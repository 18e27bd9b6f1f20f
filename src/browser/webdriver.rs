//! W3C WebDriver client over `reqwest`.
//!
//! Talks to a running driver (chromedriver, Selenium) at a fixed endpoint.
//! Only the handful of commands the crawl needs are implemented.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tokio_retry::RetryIf;

use super::{BrowserSession, ElementHandle, SessionFactory};
use crate::config::WEBDRIVER_COMMAND_TIMEOUT;
use crate::error_handling::{get_session_retry_strategy, BrowserError};
use crate::extract::Locator;

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4ba2-fc8ef1f0ee2a";

/// WebDriver key code for Enter.
const ENTER_KEY: &str = "\u{E007}";

/// Where and how to open browser sessions.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    /// Driver base URL, e.g. `http://localhost:9515`
    pub endpoint: String,
    pub user_agent: String,
    pub headless: bool,
}

impl WebDriverOptions {
    /// Chrome capabilities: fixed user agent, Korean locale, automation flags off.
    fn capabilities(&self) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--window-size=1920,1080".to_string(),
            "--lang=ko_KR".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", self.user_agent),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": args,
                        "excludeSwitches": ["enable-automation"],
                        "useAutomationExtension": false
                    }
                }
            }
        })
    }
}

/// Unwraps the `value` member of a driver response, turning error payloads
/// into [`BrowserError::Protocol`].
fn unwrap_value(mut payload: Value) -> Result<Value, BrowserError> {
    let value = payload
        .get_mut("value")
        .map(Value::take)
        .ok_or_else(|| BrowserError::UnexpectedResponse(payload.to_string()))?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(BrowserError::Protocol {
            error: error.to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    Ok(value)
}

async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, BrowserError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let payload: Value = request.send().await?.json().await?;
    unwrap_value(payload)
}

/// Opens [`WebDriverSession`]s against one driver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    client: Client,
    options: WebDriverOptions,
}

impl WebDriverFactory {
    pub fn new(options: WebDriverOptions) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(WEBDRIVER_COMMAND_TIMEOUT)
            .build()?;
        Ok(Self { client, options })
    }

    async fn create_session(&self) -> Result<WebDriverSession, BrowserError> {
        let endpoint = self.options.endpoint.trim_end_matches('/');
        let url = format!("{}/session", endpoint);
        let value = send(
            &self.client,
            Method::POST,
            &url,
            Some(self.options.capabilities()),
        )
        .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::UnexpectedResponse(value.to_string()))?;
        log::info!("Opened browser session {}", session_id);
        Ok(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", endpoint, session_id),
            released: false,
        })
    }
}

/// Driver unreachable or slow; worth another try.
fn is_transient(error: &BrowserError) -> bool {
    matches!(error, BrowserError::Transport(e) if e.is_connect() || e.is_timeout())
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let session = RetryIf::spawn(
            get_session_retry_strategy(),
            || self.create_session(),
            |e: &BrowserError| {
                let retry = is_transient(e);
                if retry {
                    log::warn!("Browser session request failed, retrying: {e}");
                }
                retry
            },
        )
        .await
        .map_err(|e| match e {
            BrowserError::SessionCreation(_) => e,
            other => BrowserError::SessionCreation(other.to_string()),
        })?;
        Ok(Box::new(session))
    }
}

/// One WebDriver session.
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    base: String,
    released: bool,
}

impl WebDriverSession {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        if self.released {
            return Err(BrowserError::Released);
        }
        send(&self.client, method, &format!("{}{}", self.base, path), body).await
    }

    fn element_path(element: &ElementHandle, action: &str) -> String {
        format!("/element/{}/{}", element.id(), action)
    }
}

fn locator_body(locator: &Locator) -> Value {
    match locator {
        Locator::XPath(path) => json!({ "using": "xpath", "value": path }),
        other => json!({
            "using": "css selector",
            "value": other.to_css().unwrap_or_default()
        }),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        log::debug!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::UnexpectedResponse(value.to_string()))
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/source", None).await?;
        match value {
            Value::String(markup) => Ok(markup),
            other => Err(BrowserError::UnexpectedResponse(other.to_string())),
        }
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BrowserError> {
        match self
            .command(Method::POST, "/element", Some(locator_body(locator)))
            .await
        {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Some(ElementHandle::new(id)))
                .ok_or_else(|| BrowserError::UnexpectedResponse(value.to_string())),
            Err(BrowserError::Protocol { error, .. }) if error == "no such element" => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn type_into(&mut self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "clear"),
            Some(json!({})),
        )
        .await?;
        self.command(
            Method::POST,
            &Self::element_path(element, "value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn submit(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "value"),
            Some(json!({ "text": ENTER_KEY })),
        )
        .await?;
        Ok(())
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "click"),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn execute_script(
        &mut self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn refresh(&mut self) -> Result<(), BrowserError> {
        self.command(Method::POST, "/refresh", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn release(&mut self) -> Result<(), BrowserError> {
        if self.released {
            return Ok(());
        }
        let result = self.command(Method::DELETE, "", None).await;
        self.released = true;
        log::info!("Released browser session {}", self.base);
        result.map(|_| ())
    }
}
