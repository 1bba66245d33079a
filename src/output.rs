use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{PromptOutcome, PromptResult};

/// Writes one file per prompt group into the outputs directory. File names
/// carry the group's source name and a generation timestamp, so neither two
/// groups in one run nor two runs over the same inputs ever collide.
pub struct OutputWriter {
    dir: PathBuf,
    verbose: bool,
}

impl OutputWriter {
    /// Creates the outputs directory if it does not exist yet.
    pub fn new(dir: &Path, verbose: bool) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            verbose,
        })
    }

    /// Write a finished group. `transcript` is the page-level batch capture;
    /// in terse mode it is the whole file body.
    pub fn write_group(
        &self,
        source_name: &str,
        results: &[PromptResult],
        transcript: &str,
    ) -> Result<PathBuf> {
        let path = self.unique_path(source_name, Utc::now());
        let body = if self.verbose {
            render_verbose(results, transcript)
        } else {
            transcript.to_string()
        };
        fs::write(&path, body)?;
        tracing::info!("responses from {source_name} saved to {}", path.display());
        Ok(path)
    }

    fn unique_path(&self, source_name: &str, now: DateTime<Utc>) -> PathBuf {
        let base = format!("output-{source_name}-{}", file_timestamp(now));
        let mut path = self.dir.join(format!("{base}.txt"));
        // Millisecond timestamps collide only under test-speed rewrites, but
        // an existing file must never be overwritten.
        let mut n = 1;
        while path.exists() {
            n += 1;
            path = self.dir.join(format!("{base}-{n}.txt"));
        }
        path
    }
}

/// ISO-8601 UTC with `:` and `.` replaced, so the stamp is filename-safe.
fn file_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

fn render_verbose(results: &[PromptResult], transcript: &str) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&format!(
            "=== prompt: {}\n--- submitted: {} | elapsed: {}ms | outcome: {}\n",
            result.prompt,
            result.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            result.elapsed_ms,
            outcome_note(&result.outcome),
        ));
        if let Some(text) = &result.response_text {
            out.push_str(text);
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str("=== full transcript\n");
    out.push_str(transcript);
    out
}

fn outcome_note(outcome: &PromptOutcome) -> String {
    match outcome {
        PromptOutcome::Failed(reason) => format!("failed ({reason})"),
        other => other.label().to_string(),
    }
}
