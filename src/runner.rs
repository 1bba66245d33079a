use crate::browser::{BrowserSession, ChatPage};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use crate::prompts::{load_groups, PromptGroup};

/// Top-level run: read prompts, acquire the browser, drive every group, and
/// close the session on every exit path.
pub async fn run(config: &Config) -> Result<()> {
    // Path problems abort before any browser work.
    let groups = load_groups(&config.prompts_path)?;
    let writer = OutputWriter::new(&config.outputs_dir, config.verbose)?;

    let mut session = BrowserSession::launch(config).await?;
    let outcome = drive_groups(&session, config, &groups, &writer).await;
    session.close().await;
    outcome
}

/// Strictly sequential: the chat UI processes one exchange at a time, so
/// parallel submission would corrupt ordering.
async fn drive_groups(
    session: &BrowserSession,
    config: &Config,
    groups: &[PromptGroup],
    writer: &OutputWriter,
) -> Result<()> {
    let chat = ChatPage::new(session, config);
    chat.open().await?;

    // Completion markers accumulate page-wide for the whole session, not per
    // group, so the expected count carries across groups.
    let mut exchanges = 0usize;

    for group in groups {
        tracing::info!(
            "processing group '{}' ({} prompts)",
            group.source_name,
            group.prompts.len()
        );

        let mut results = Vec::with_capacity(group.prompts.len());
        for prompt in &group.prompts {
            let result = chat.submit_prompt(prompt, exchanges + 1).await;
            if result.outcome.was_submitted() {
                exchanges += 1;
            }
            tracing::info!(
                "prompt finished: {} ({}ms)",
                result.outcome.label(),
                result.elapsed_ms
            );
            results.push(result);
        }

        let transcript = chat.capture_all_responses().await;

        // One group's write failure must not abort the remaining groups.
        match writer.write_group(&group.source_name, &results, &transcript) {
            Ok(path) => tracing::info!("wrote {}", path.display()),
            Err(e) => tracing::error!("failed to write group '{}': {e}", group.source_name),
        }
    }

    Ok(())
}
