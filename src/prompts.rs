use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

/// Leading directive line whose content becomes a prefix for every other
/// prompt in the file.
pub const PREFIX_DIRECTIVE: &str = "EXTRA:";

/// Prompts read from one input file. Immutable once read; `prompts` already
/// carry the prefix.
#[derive(Debug, Clone)]
pub struct PromptGroup {
    /// File stem of the source file; becomes part of the output file name.
    pub source_name: String,
    pub prefix: Option<String>,
    pub prompts: Vec<String>,
}

/// Read prompt groups from `path`: one group for a flat file, one group per
/// file for a directory.
pub fn load_groups(path: &Path) -> Result<Vec<PromptGroup>> {
    if path.is_dir() {
        read_prompt_dir(path)
    } else {
        Ok(vec![read_prompt_file(path)?])
    }
}

/// Single-file mode: one prompt per non-blank line, no prefix directive.
pub fn read_prompt_file(path: &Path) -> Result<PromptGroup> {
    if !path.exists() {
        return Err(AppError::Configuration(format!(
            "prompt file not found: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    let prompts: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(PromptGroup {
        source_name: source_name(path),
        prefix: None,
        prompts,
    })
}

/// Directory mode: every file becomes a group, sorted by file name so the
/// group order is reproducible. OS metadata files (dotfiles such as
/// `.DS_Store`) are skipped.
pub fn read_prompt_dir(dir: &Path) -> Result<Vec<PromptGroup>> {
    if !dir.is_dir() {
        return Err(AppError::Configuration(format!(
            "prompts directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| !n.starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut groups = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path)?;
        groups.push(parse_group(source_name(&path), &content));
    }
    Ok(groups)
}

/// Parse one file's content, honoring a leading `EXTRA:` directive.
fn parse_group(source_name: String, content: &str) -> PromptGroup {
    let mut lines = content.lines();
    let mut prefix = None;
    let mut rest: Vec<&str> = Vec::new();

    if let Some(first) = lines.next() {
        let trimmed = first.trim();
        if let Some(directive) = trimmed.strip_prefix(PREFIX_DIRECTIVE) {
            prefix = Some(directive.trim().to_string());
        } else {
            rest.push(first);
        }
    }
    rest.extend(lines);

    let prompts = rest
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match &prefix {
            Some(p) if !p.is_empty() => format!("{p} {line}"),
            _ => line.to_string(),
        })
        .collect();

    PromptGroup {
        source_name,
        prefix,
        prompts,
    }
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("prompts")
        .to_string()
}
