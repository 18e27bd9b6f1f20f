//! Scripted in-process browser for unit tests.
//!
//! Pages are plain markup; CSS locators are resolved against the current page
//! with `scraper`. Each `submit` advances to the next scripted results page.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;

use super::{BrowserSession, ElementHandle};
use crate::error_handling::BrowserError;
use crate::extract::Locator;

#[derive(Debug, Default)]
pub(crate) struct FakeBrowser {
    current: String,
    current_url: String,
    pages: HashMap<String, String>,
    submissions: VecDeque<String>,
    pub typed: Vec<String>,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub refreshes: usize,
    find_calls: usize,
    pub released: bool,
}

impl FakeBrowser {
    pub fn new(markup: &str) -> Self {
        Self {
            current: markup.to_string(),
            current_url: "about:blank".to_string(),
            ..Default::default()
        }
    }

    /// Markup served when `url` is navigated to.
    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }

    /// Markup shown after the next `submit`, in call order.
    pub fn with_submission(mut self, markup: &str) -> Self {
        self.submissions.push_back(markup.to_string());
        self
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls
    }

    fn ensure_live(&self) -> Result<(), BrowserError> {
        if self.released {
            Err(BrowserError::Released)
        } else {
            Ok(())
        }
    }
}

fn locate(markup: &str, css: &str) -> bool {
    let Ok(selector) = Selector::parse(css) else {
        return false;
    };
    let document = Html::parse_document(markup);
    let found = document.select(&selector).next().is_some();
    found
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_live()?;
        self.navigations.push(url.to_string());
        self.current_url = url.to_string();
        if let Some(page) = self.pages.get(url) {
            self.current = page.clone();
        }
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.ensure_live()?;
        Ok(self.current_url.clone())
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.ensure_live()?;
        Ok(self.current.clone())
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BrowserError> {
        self.ensure_live()?;
        self.find_calls += 1;
        let Some(css) = locator.to_css() else {
            return Ok(None);
        };
        if locate(&self.current, &css) {
            Ok(Some(ElementHandle::new(format!("{}@0", css))))
        } else {
            Ok(None)
        }
    }

    async fn type_into(&mut self, _element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.ensure_live()?;
        self.typed.push(text.to_string());
        Ok(())
    }

    async fn submit(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
        self.ensure_live()?;
        if let Some(next) = self.submissions.pop_front() {
            self.current = next;
        }
        Ok(())
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.ensure_live()?;
        self.clicks.push(element.id().to_string());
        Ok(())
    }

    async fn execute_script(
        &mut self,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        self.ensure_live()?;
        Ok(Value::Null)
    }

    async fn refresh(&mut self) -> Result<(), BrowserError> {
        self.ensure_live()?;
        self.refreshes += 1;
        Ok(())
    }

    async fn release(&mut self) -> Result<(), BrowserError> {
        self.released = true;
        Ok(())
    }
}
