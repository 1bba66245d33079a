use anyhow::anyhow;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::poll::{poll_until, PollOutcome};

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One Chrome session with a single page. Acquired once per run and closed
/// on every exit path; `close` is idempotent.
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// Launch Chrome with the persisted profile directory so the host
    /// application's login survives across runs.
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut builder = BrowserConfig::builder().user_data_dir(&config.profile_dir);

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-default-apps")
            .arg("--disable-extensions");

        let browser_config = builder
            .build()
            .map_err(|e| AppError::Browser(format!("failed to build browser config: {e}")))?;

        // Bounded launch so a missing or wedged Chrome cannot hang the run.
        let (browser, mut handler) = timeout(LAUNCH_TIMEOUT, Browser::launch(browser_config))
            .await
            .map_err(|_| {
                AppError::Browser(format!(
                    "browser launch timed out after {}s",
                    LAUNCH_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| AppError::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                tracing::trace!("browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Browser(format!("failed to create page: {e}")))?;

        tracing::info!("browser launched with profile {}", config.profile_dir.display());

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::Browser("browser session is closed".to_string()))
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        page.goto(url)
            .await
            .map_err(|e| AppError::Browser(format!("failed to navigate to {url}: {e}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| AppError::Browser(format!("navigation to {url} did not settle: {e}")))?;
        Ok(())
    }

    /// Wait for a selector to match, sampling at a fixed interval.
    /// `ElementNotFound` once the budget elapses.
    pub async fn wait_for_element(&self, selector: &str, budget: Duration) -> Result<Element> {
        let page = self.page()?;

        let outcome = poll_until(
            move || async move { page.find_element(selector).await.ok() },
            ELEMENT_POLL_INTERVAL,
            budget,
        )
        .await;

        match outcome {
            PollOutcome::Settled(element) => Ok(element),
            PollOutcome::TimedOut => Err(AppError::ElementNotFound(format!(
                "'{selector}' absent after {}ms",
                budget.as_millis()
            ))),
        }
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|e| AppError::ElementNotFound(format!("'{selector}': {e}")))?;
        element
            .click()
            .await
            .map_err(|e| AppError::Browser(format!("failed to click '{selector}': {e}")))?;
        Ok(())
    }

    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|e| AppError::ElementNotFound(format!("'{selector}': {e}")))?;
        element
            .click()
            .await
            .map_err(|e| AppError::Browser(format!("failed to focus '{selector}': {e}")))?;
        element
            .type_str(text)
            .await
            .map_err(|e| AppError::Browser(format!("failed to type into '{selector}': {e}")))?;
        Ok(())
    }

    /// Press a key (e.g. "Enter") with the given element focused.
    pub async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|e| AppError::ElementNotFound(format!("'{selector}': {e}")))?;
        element
            .press_key(key)
            .await
            .map_err(|e| AppError::Browser(format!("failed to press '{key}': {e}")))?;
        Ok(())
    }

    /// Evaluate JavaScript in the page and return the JSON value it produced.
    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| AppError::Browser(format!("script evaluation failed: {e}")))?;

        result
            .into_value()
            .map_err(|e| AppError::Internal(anyhow!("failed to parse script result: {e}")))
    }

    /// Close page then browser. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Some(mut browser) = self.browser.take() {
            let _ = browser.close().await;
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        tracing::info!("browser closed");
    }
}
