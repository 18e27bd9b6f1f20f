// Shared test helpers for database setup and scripted browser sessions.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use sqlx::SqlitePool;

use song_metrics::browser::{BrowserSession, ElementHandle, SessionFactory};
use song_metrics::error_handling::BrowserError;
use song_metrics::extract::Locator;
use song_metrics::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Creates a file-backed test database with migrations applied.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_pool_with_path(db_path: &Path) -> Arc<SqlitePool> {
    let pool = song_metrics::storage::init_db_pool_with_path(db_path)
        .await
        .expect("Failed to create database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Site behaviour shared by every session a [`ScriptedFactory`] hands out.
///
/// `pages` are served on navigation by exact URL; `results` are served after
/// a submit, keyed by the text last typed. A submit for an unknown query
/// shows `empty_results`.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct Site {
    pub pages: HashMap<String, String>,
    pub results: HashMap<String, String>,
    pub empty_results: String,
}

#[allow(dead_code)]
impl Site {
    pub fn page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }

    pub fn results(mut self, query: &str, markup: &str) -> Self {
        self.results.insert(query.to_string(), markup.to_string());
        self
    }

    pub fn empty_results(mut self, markup: &str) -> Self {
        self.empty_results = markup.to_string();
        self
    }
}

/// Session counters visible after the sessions themselves are dropped.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct SessionLog {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub submits: AtomicUsize,
}

/// In-process browser that resolves CSS locators against scripted markup.
pub struct ScriptedBrowser {
    site: Arc<Site>,
    log: Arc<SessionLog>,
    current: String,
    current_url: String,
    last_typed: String,
    released: bool,
}

impl ScriptedBrowser {
    fn live(&self) -> Result<(), BrowserError> {
        if self.released {
            Err(BrowserError::Released)
        } else {
            Ok(())
        }
    }
}

fn resolves(markup: &str, css: &str) -> bool {
    let Ok(selector) = Selector::parse(css) else {
        return false;
    };
    let document = Html::parse_document(markup);
    let found = document.select(&selector).next().is_some();
    found
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.live()?;
        self.current_url = url.to_string();
        self.current = self.site.pages.get(url).cloned().unwrap_or_default();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.live()?;
        Ok(self.current_url.clone())
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.live()?;
        Ok(self.current.clone())
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BrowserError> {
        self.live()?;
        let Some(css) = locator.to_css() else {
            return Ok(None);
        };
        Ok(resolves(&self.current, &css).then(|| ElementHandle::new(css)))
    }

    async fn type_into(&mut self, _element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.live()?;
        self.last_typed = text.to_string();
        Ok(())
    }

    async fn submit(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
        self.live()?;
        self.log.submits.fetch_add(1, Ordering::SeqCst);
        self.current = self
            .site
            .results
            .get(&self.last_typed)
            .cloned()
            .unwrap_or_else(|| self.site.empty_results.clone());
        Ok(())
    }

    async fn click(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
        self.live()
    }

    async fn execute_script(
        &mut self,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        self.live()?;
        Ok(Value::Null)
    }

    async fn refresh(&mut self) -> Result<(), BrowserError> {
        self.live()
    }

    async fn release(&mut self) -> Result<(), BrowserError> {
        if !self.released {
            self.released = true;
            self.log.released.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out [`ScriptedBrowser`]s over one shared [`Site`].
#[allow(dead_code)]
pub struct ScriptedFactory {
    pub site: Arc<Site>,
    pub log: Arc<SessionLog>,
    pub refuse: bool,
}

#[allow(dead_code)]
impl ScriptedFactory {
    pub fn new(site: Site) -> Self {
        Self {
            site: Arc::new(site),
            log: Arc::new(SessionLog::default()),
            refuse: false,
        }
    }

    /// A factory whose every acquisition fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(Site::default())
        }
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.refuse {
            return Err(BrowserError::SessionCreation(
                "connection refused".to_string(),
            ));
        }
        self.log.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedBrowser {
            site: Arc::clone(&self.site),
            log: Arc::clone(&self.log),
            current: String::new(),
            current_url: "about:blank".to_string(),
            last_typed: String::new(),
            released: false,
        }))
    }
}
