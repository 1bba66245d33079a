use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// How the driver decides a response has finished rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Wait until the count of "completed" status markers equals the number
    /// of exchanges submitted so far.
    MarkerCount,
    /// Wait until the rendered response text is identical across several
    /// consecutive samples.
    TextStability,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// A prompt file, or a directory of prompt files.
    pub prompts_path: PathBuf,
    pub outputs_dir: PathBuf,
    pub chat_url: String,
    /// Chrome profile directory, reused across runs so logins persist.
    pub profile_dir: PathBuf,
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    /// Interleave prompt/timestamp/latency metadata into output files.
    pub verbose: bool,
    /// Menu entry to select in the host UI's mode picker before the first
    /// prompt. None skips mode selection entirely.
    pub mode_label: Option<String>,
    pub completion: CompletionPolicy,
    pub poll_interval_ms: u64,
    pub response_timeout_ms: u64,
    /// Budget for locating UI elements (input surface, menus).
    pub element_wait_ms: u64,
    /// Pause between injecting text and pressing Enter, giving the host
    /// editor time to register the input.
    pub settle_delay_ms: u64,
    /// Consecutive identical samples required by the stability policy.
    pub stability_samples: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let completion = match env::var("PROMPTFEED_COMPLETION").as_deref() {
            Ok("stability") => CompletionPolicy::TextStability,
            _ => CompletionPolicy::MarkerCount,
        };

        Self {
            prompts_path: env_path("PROMPTFEED_PROMPTS", "prompts"),
            outputs_dir: env_path("PROMPTFEED_OUTPUTS", "outputs"),
            chat_url: env::var("PROMPTFEED_URL")
                .unwrap_or_else(|_| "https://gemini.google.com/app".to_string()),
            profile_dir: env_path("PROMPTFEED_PROFILE", "chrome-profile"),
            chrome_executable: env::var("PROMPTFEED_CHROME").ok().map(PathBuf::from),
            headless: env_flag("PROMPTFEED_HEADLESS", false),
            verbose: false,
            mode_label: env::var("PROMPTFEED_MODE").ok().filter(|m| !m.is_empty()),
            completion,
            poll_interval_ms: env_u64("PROMPTFEED_POLL_INTERVAL_MS", 1000),
            response_timeout_ms: env_u64("PROMPTFEED_RESPONSE_TIMEOUT_MS", 120_000),
            element_wait_ms: env_u64("PROMPTFEED_ELEMENT_WAIT_MS", 30_000),
            settle_delay_ms: env_u64("PROMPTFEED_SETTLE_DELAY_MS", 1000),
            stability_samples: env_u64("PROMPTFEED_STABILITY_SAMPLES", 3) as usize,
        }
    }

    /// Apply process arguments on top of the env-derived config. The only
    /// recognized flag is the debug/verbose toggle.
    pub fn apply_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        for arg in args {
            if arg == "--debug" {
                self.verbose = true;
            }
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompts_path: PathBuf::from("prompts"),
            outputs_dir: PathBuf::from("outputs"),
            chat_url: "https://gemini.google.com/app".to_string(),
            profile_dir: PathBuf::from("chrome-profile"),
            chrome_executable: None,
            headless: false,
            verbose: false,
            mode_label: None,
            completion: CompletionPolicy::MarkerCount,
            poll_interval_ms: 1000,
            response_timeout_ms: 120_000,
            element_wait_ms: 30_000,
            settle_delay_ms: 1000,
            stability_samples: 3,
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key).as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
