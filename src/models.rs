use chrono::{DateTime, Utc};

/// Terminal state of one prompt's trip through the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Completion signal observed before the timeout budget elapsed.
    Complete,
    /// Timeout elapsed first. Non-fatal; whatever text was captured stands.
    TimedOut,
    /// The input surface never appeared, so nothing was submitted.
    Skipped,
    /// A step inside the prompt boundary failed.
    Failed(String),
}

impl PromptOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PromptOutcome::Complete => "complete",
            PromptOutcome::TimedOut => "timed-out",
            PromptOutcome::Skipped => "skipped",
            PromptOutcome::Failed(_) => "failed",
        }
    }

    /// Whether Enter was actually pressed for this prompt. Only submitted
    /// prompts can ever grow the page's completion-marker count, so only
    /// these advance the session-wide exchange counter. `Failed` means a
    /// step before submission broke; `Skipped` means the input surface never
    /// appeared.
    pub fn was_submitted(&self) -> bool {
        matches!(self, PromptOutcome::Complete | PromptOutcome::TimedOut)
    }
}

/// Record of one submitted prompt. Appended to the group accumulator and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PromptResult {
    pub prompt: String,
    pub response_text: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub outcome: PromptOutcome,
}
