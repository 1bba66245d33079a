//! End-to-end tests for the prompt pipeline that don't need a browser:
//! prompt source through output writer, covering ordering, prefix
//! directives, and collision-free file naming.

use std::fs;

use chrono::Utc;
use promptfeed::models::{PromptOutcome, PromptResult};
use promptfeed::output::OutputWriter;
use promptfeed::prompts::{load_groups, read_prompt_dir};

fn result_for(prompt: &str) -> PromptResult {
    PromptResult {
        prompt: prompt.to_string(),
        response_text: Some(format!("response to {prompt}")),
        submitted_at: Utc::now(),
        elapsed_ms: 10,
        outcome: PromptOutcome::Complete,
    }
}

#[test]
fn result_count_matches_input_lines_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("batch.txt");
    fs::write(&file, "alpha\n\nbeta\ngamma\n\n").unwrap();

    let groups = load_groups(&file).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].prompts, vec!["alpha", "beta", "gamma"]);

    // One result per non-blank line, same order.
    let results: Vec<_> = groups[0].prompts.iter().map(|p| result_for(p)).collect();
    assert_eq!(results.len(), 3);
    let prompts: Vec<_> = results.iter().map(|r| r.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn directive_prefix_flows_through_to_results() {
    let dir = tempfile::tempdir().unwrap();
    let prompts_dir = dir.path().join("prompts");
    fs::create_dir(&prompts_dir).unwrap();
    fs::write(prompts_dir.join("ctx.txt"), "EXTRA:foo\na\nb\n").unwrap();

    let groups = read_prompt_dir(&prompts_dir).unwrap();
    assert_eq!(groups[0].prompts, vec!["foo a", "foo b"]);
}

#[test]
fn two_files_produce_two_distinctly_named_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let prompts_dir = dir.path().join("prompts");
    let outputs_dir = dir.path().join("outputs");
    fs::create_dir(&prompts_dir).unwrap();
    fs::write(prompts_dir.join("x.txt"), "one\n").unwrap();
    fs::write(prompts_dir.join("y.txt"), "two\n").unwrap();

    let groups = read_prompt_dir(&prompts_dir).unwrap();
    let writer = OutputWriter::new(&outputs_dir, false).unwrap();

    // Both groups written back-to-back, well within the same second.
    let mut paths = Vec::new();
    for group in &groups {
        let results: Vec<_> = group.prompts.iter().map(|p| result_for(p)).collect();
        paths.push(writer.write_group(&group.source_name, &results, "t").unwrap());
    }

    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert!(names[0].contains("-x-"));
    assert!(names[1].contains("-y-"));
}

#[test]
fn rerun_with_identical_inputs_keeps_prior_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let outputs_dir = dir.path().join("outputs");
    let writer = OutputWriter::new(&outputs_dir, false).unwrap();

    let first = writer.write_group("same", &[], "run one").unwrap();
    let second = writer.write_group("same", &[], "run two").unwrap();

    assert_ne!(first, second);
    assert_eq!(fs::read_to_string(&first).unwrap(), "run one");
    assert_eq!(fs::read_to_string(&second).unwrap(), "run two");
    assert_eq!(fs::read_dir(&outputs_dir).unwrap().count(), 2);
}

#[test]
fn missing_prompts_path_fails_before_any_output_exists() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = load_groups(&missing).unwrap_err();
    assert!(matches!(err, promptfeed::AppError::Configuration(_)));
    // Nothing was created as a side effect.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
