use chrono::Utc;
use std::time::Instant;

use crate::browser::BrowserSession;
use crate::config::{CompletionPolicy, Config};
use crate::error::{AppError, Result};
use crate::models::{PromptOutcome, PromptResult};
use crate::poll::{poll_for_stability, poll_until, PollOutcome};

/// Sentinel written in place of a response when scraping throws. The batch
/// keeps going.
pub const SCRAPE_FAILURE_SENTINEL: &str = "Failed to capture responses";

// Host-UI selectors. Brittle by nature; expected to rot with UI releases.
const INPUT_SELECTOR: &str = ".ql-editor";
const RESPONSE_SELECTOR: &str = ".model-response-text";
const COMPLETED_MARKER_SELECTOR: &str =
    r#"div.avatar_primary_animation.is-gpi-avatar[data-test-lottie-animation-status="completed"]"#;
const MODE_MENU_BUTTON: &str = "button.bard-mode-menu-button";
const MODE_MENU_ITEMS: &str = ".mat-bottom-sheet-container button.mat-mdc-menu-item";
const MODE_TITLE: &str = ".current-mode-title span";

/// Drives one chat page: mode selection, prompt submission, completion
/// polling, and response scraping.
pub struct ChatPage<'a> {
    session: &'a BrowserSession,
    config: &'a Config,
}

impl<'a> ChatPage<'a> {
    pub fn new(session: &'a BrowserSession, config: &'a Config) -> Self {
        Self { session, config }
    }

    /// Navigate to the chat UI and, when configured, switch the host
    /// application into the requested mode.
    pub async fn open(&self) -> Result<()> {
        self.session.goto(&self.config.chat_url).await?;
        if let Some(label) = &self.config.mode_label {
            self.select_mode(label).await?;
        }
        Ok(())
    }

    /// Click through the host UI's mode menu until the current-mode label
    /// reflects `label`.
    async fn select_mode(&self, label: &str) -> Result<()> {
        let budget = self.config.element_wait();

        self.session.wait_for_element(MODE_MENU_BUTTON, budget).await?;
        self.session.click(MODE_MENU_BUTTON).await?;
        tokio::time::sleep(self.config.settle_delay()).await;

        self.session.wait_for_element(MODE_MENU_ITEMS, budget).await?;
        let clicked = self
            .session
            .evaluate(&build_mode_click_script(label))
            .await?
            .as_bool()
            .unwrap_or(false);
        if !clicked {
            return Err(AppError::ElementNotFound(format!(
                "mode menu entry matching '{label}'"
            )));
        }

        let session = self.session;
        let wanted = label.to_string();
        let outcome = poll_until(
            move || {
                let wanted = wanted.clone();
                async move {
                    let title = session.evaluate(&title_text_script()).await.ok()?;
                    title
                        .as_str()
                        .filter(|t| t.contains(wanted.as_str()))
                        .map(|_| ())
                }
            },
            self.config.poll_interval(),
            budget,
        )
        .await;

        match outcome {
            PollOutcome::Settled(()) => {
                tracing::info!("mode selected: {label}");
                Ok(())
            }
            PollOutcome::TimedOut => Err(AppError::Timeout(format!(
                "mode label never showed '{label}'"
            ))),
        }
    }

    /// Submit one prompt and wait for its completion signal. Never returns
    /// an error: every failure inside the prompt boundary is folded into the
    /// outcome so the caller's continuation decision is a single match.
    pub async fn submit_prompt(&self, prompt: &str, expected_markers: usize) -> PromptResult {
        tracing::info!("processing prompt: {prompt}");
        let submitted_at = Utc::now();
        let started = Instant::now();

        let outcome = match self.drive(prompt, expected_markers).await {
            Ok(PollOutcome::Settled(())) => PromptOutcome::Complete,
            Ok(PollOutcome::TimedOut) => {
                tracing::warn!(
                    "completion signal not observed within {}ms; moving on",
                    self.config.response_timeout_ms
                );
                PromptOutcome::TimedOut
            }
            Err(AppError::ElementNotFound(what)) => {
                tracing::warn!("input surface missing ({what}); prompt skipped");
                PromptOutcome::Skipped
            }
            Err(e) => {
                tracing::error!("error processing prompt: {e}");
                PromptOutcome::Failed(e.to_string())
            }
        };

        // TimedOut still proceeds with whatever text is on the page.
        let response_text = match outcome {
            PromptOutcome::Complete | PromptOutcome::TimedOut => {
                self.scrape_latest_response().await
            }
            _ => None,
        };

        PromptResult {
            prompt: prompt.to_string(),
            response_text,
            submitted_at,
            elapsed_ms: started.elapsed().as_millis() as u64,
            outcome,
        }
    }

    /// Idle → Typing → Submitted → Polling.
    async fn drive(&self, prompt: &str, expected_markers: usize) -> Result<PollOutcome<()>> {
        self.session
            .wait_for_element(INPUT_SELECTOR, self.config.element_wait())
            .await?;

        let injected = self
            .session
            .evaluate(&build_inject_script(prompt))
            .await?
            .as_bool()
            .unwrap_or(false);
        if !injected {
            return Err(AppError::ElementNotFound(format!(
                "input surface '{INPUT_SELECTOR}' vanished during injection"
            )));
        }

        tokio::time::sleep(self.config.settle_delay()).await;
        self.session.press_key(INPUT_SELECTOR, "Enter").await?;

        Ok(self.wait_for_completion(expected_markers).await)
    }

    async fn wait_for_completion(&self, expected_markers: usize) -> PollOutcome<()> {
        match self.config.completion {
            CompletionPolicy::MarkerCount => {
                let session = self.session;
                poll_until(
                    move || async move {
                        let count = completed_marker_count(session).await?;
                        (count >= expected_markers as u64).then_some(())
                    },
                    self.config.poll_interval(),
                    self.config.response_timeout(),
                )
                .await
            }
            CompletionPolicy::TextStability => {
                let session = self.session;
                let outcome = poll_for_stability(
                    move || async move { latest_response_text(session).await },
                    self.config.stability_samples,
                    self.config.poll_interval(),
                    self.config.response_timeout(),
                )
                .await;
                match outcome {
                    PollOutcome::Settled(_) => PollOutcome::Settled(()),
                    PollOutcome::TimedOut => PollOutcome::TimedOut,
                }
            }
        }
    }

    /// Most recently rendered response, if any. Soft-fails to None.
    pub async fn scrape_latest_response(&self) -> Option<String> {
        latest_response_text(self.session).await
    }

    /// All responses on the page as blank-line-separated paragraph blocks.
    /// Fails soft: any error yields the sentinel string instead of
    /// propagating, so one group's failure never aborts the batch.
    pub async fn capture_all_responses(&self) -> String {
        if self
            .session
            .wait_for_element(RESPONSE_SELECTOR, self.config.element_wait())
            .await
            .is_err()
        {
            tracing::error!("no response elements present; writing sentinel");
            return SCRAPE_FAILURE_SENTINEL.to_string();
        }

        match self.session.evaluate(capture_all_script()).await {
            Ok(value) => match value.as_str() {
                Some(text) => text.to_string(),
                None => {
                    tracing::error!("response scrape returned non-text payload");
                    SCRAPE_FAILURE_SENTINEL.to_string()
                }
            },
            Err(e) => {
                tracing::error!("error capturing responses: {e}");
                SCRAPE_FAILURE_SENTINEL.to_string()
            }
        }
    }
}

async fn completed_marker_count(session: &BrowserSession) -> Option<u64> {
    session
        .evaluate(&format!(
            "document.querySelectorAll('{COMPLETED_MARKER_SELECTOR}').length"
        ))
        .await
        .ok()?
        .as_u64()
}

async fn latest_response_text(session: &BrowserSession) -> Option<String> {
    let value = session.evaluate(latest_response_script()).await.ok()?;
    value.as_str().map(str::to_string)
}

/// Assigning the editor text and dispatching a synthetic `input` event is
/// what makes the host editor register the prompt as authored input.
fn build_inject_script(prompt: &str) -> String {
    let text = serde_json::to_string(prompt).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
            const editor = document.querySelector('{INPUT_SELECTOR}');
            if (!editor) return false;
            editor.focus();
            editor.textContent = {text};
            editor.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return true;
        }})()"#
    )
}

fn build_mode_click_script(label: &str) -> String {
    let wanted = serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
            const buttons = Array.from(document.querySelectorAll('{MODE_MENU_ITEMS}'));
            const target = buttons.find(b => (b.textContent || '').includes({wanted}));
            if (!target) return false;
            target.click();
            return true;
        }})()"#
    )
}

fn title_text_script() -> String {
    format!(r#"document.querySelector('{MODE_TITLE}')?.textContent || ''"#)
}

fn latest_response_script() -> &'static str {
    r#"(() => {
        const all = document.querySelectorAll('.model-response-text');
        if (all.length === 0) return '';
        const el = all[all.length - 1];
        const paragraphs = Array.from(el.querySelectorAll('p'))
            .map(p => p.textContent.trim())
            .filter(p => p.length > 0)
            .join('\n\n');
        return paragraphs || el.textContent;
    })()"#
}

fn capture_all_script() -> &'static str {
    r#"(() => {
        const blocks = Array.from(document.querySelectorAll('.model-response-text'))
            .map(el => {
                const paragraphs = Array.from(el.querySelectorAll('p'))
                    .map(p => p.textContent.trim())
                    .filter(p => p.length > 0)
                    .join('\n\n');
                return paragraphs || el.textContent;
            });
        return blocks.join('\n\n');
    })()"#
}
