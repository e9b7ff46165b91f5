//! Managed instruction blocks for AI assistants
//!
//! `reffy init` maintains a managed block in the repository's root
//! `AGENTS.md` (between the REFFY markers, preserving surrounding content)
//! and writes `.references/AGENTS.md` from a fixed template. The block
//! upsert is a pure function so the edge cases stay testable without
//! touching the filesystem.

use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const REFFY_START: &str = "<!-- REFFY:START -->";
pub const REFFY_END: &str = "<!-- REFFY:END -->";
const OPENSPEC_START: &str = "<!-- OPENSPEC:START -->";

const REFFY_BLOCK: &str = r#"<!-- REFFY:START -->
# Reffy Instructions

These instructions are for AI assistants working in this project.

Always open `@/.references/AGENTS.md` when the request:
- Mentions early-stage ideation, exploration, brainstorming, or raw notes
- Needs context before drafting specs or proposals
- Refers to "reffy", "references", "explore", or "context layer"

Use `@/.references/AGENTS.md` to learn:
- Reffy workflow and artifact conventions
- How Reffy and OpenSpec should be sequenced
- How to store and consume ideation context in `.references/`

Keep this managed block so `reffy init` can refresh the instructions.

<!-- REFFY:END -->"#;

const REFFY_AGENTS_CONTENT: &str = r#"# Reffy Instructions

These instructions are for AI assistants working in this project.

## TL;DR Checklist

- Decide whether Reffy ideation is needed for this request.
- If needed, read existing context in `.references/artifacts/`.
- Add/update exploratory artifacts and keep them concise.
- Run `reffy reindex` and `reffy validate` after artifact changes.
- After ideation approval, run `reffy summarize --output json` and pick only directly relevant artifacts for proposal citations.

## When To Use Reffy

Use Reffy first when the request:
- Mentions early-stage ideation, exploration, brainstorming, or raw notes
- Needs context gathering before drafting a concrete implementation plan
- Refers to "reffy", "references", "explore", "context layer", or research artifacts

## When To Skip Reffy

You can skip Reffy when the request is:
- A narrow bug fix that does not need exploratory context
- A small refactor with no requirement/design ambiguity
- A formatting, typing, or tooling-only update with clear scope

## Reffy Workflow

1. Read existing artifacts in `.references/artifacts/`.
2. Add or update artifacts to capture exploratory context.
3. Run `reffy reindex` to index newly added files into `.references/manifest.json`.
4. Run `reffy validate` to verify manifest contract compliance.

## Relationship To OpenSpec

- Reffy is the ideation/context layer.
- OpenSpec is the formal planning/spec layer.
- After ideation stabilizes, hand off to OpenSpec by following `@/openspec/AGENTS.md`.
- Do not duplicate full proposal/spec content in Reffy artifacts; summarize and link to OpenSpec outputs.

## OpenSpec Citation Rules

When an OpenSpec proposal is informed by Reffy artifacts:
- After ideation approval, run `reffy summarize --output json` to shortlist candidate artifacts.
- Cite only artifact filenames that directly informed the proposal's problem, scope, decisions, or constraints.
- If no Reffy artifacts informed the change, explicitly state "No Reffy references used."

## Artifact Conventions

- Treat `.references/` as a repository-local guidance and ideation context layer.
- Keep artifact names clear and stable.
- Prefer markdown notes for exploratory content.
- Keep manifests machine-readable and schema-compliant (version 1).
"#;

/// Paths written by `init_agents`
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub root_agents_path: PathBuf,
    pub reffy_agents_path: PathBuf,
}

/// Insert or refresh the managed REFFY block in an `AGENTS.md` document.
///
/// An existing block is replaced in place; otherwise the block is inserted
/// before an OpenSpec managed block when one exists, and prepended when not.
/// Content outside the block is preserved.
pub fn upsert_reffy_block(content: &str) -> String {
    if content.contains(REFFY_START) && content.contains(REFFY_END) {
        let prefix = content.split(REFFY_START).next().unwrap_or("");
        let suffix = content.splitn(2, REFFY_END).nth(1).unwrap_or("");
        let trimmed_suffix = suffix.trim_start();
        return if trimmed_suffix.is_empty() {
            format!("{}{}\n", prefix, REFFY_BLOCK)
        } else {
            format!("{}{}\n\n{}", prefix, REFFY_BLOCK, trimmed_suffix)
        };
    }

    if let Some((before, after)) = content.split_once(OPENSPEC_START) {
        return format!(
            "{}\n\n{}\n\n{}{}",
            before.trim_end(),
            REFFY_BLOCK,
            OPENSPEC_START,
            after
        );
    }

    if content.trim().is_empty() {
        format!("{}\n", REFFY_BLOCK)
    } else {
        format!("{}\n\n{}", REFFY_BLOCK, content.trim_start())
    }
}

/// Ensure the root `AGENTS.md` block and `.references/AGENTS.md` are up to
/// date.
pub async fn init_agents(repo_root: &Path) -> Result<InitReport> {
    let root_agents_path = repo_root.join("AGENTS.md");
    let reffy_agents_path = repo_root.join(".references").join("AGENTS.md");

    let content = tokio::fs::read_to_string(&root_agents_path)
        .await
        .unwrap_or_default();
    let updated = upsert_reffy_block(&content);

    if let Some(parent) = reffy_agents_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&root_agents_path, updated).await?;
    tokio::fs::write(&reffy_agents_path, REFFY_AGENTS_CONTENT).await?;

    tracing::info!(path = %root_agents_path.display(), "refreshed agent instructions");
    Ok(InitReport {
        root_agents_path,
        reffy_agents_path,
    })
}
