//! Heuristic summarization of artifact content
//!
//! Turns raw artifact text into low-precision, high-recall structured hints:
//! themes, open questions, and candidate changes, plus one suggested
//! reference per readable artifact. Extraction is deterministic (no LLM) and
//! never raises on malformed content; unreadable files are skipped.

pub mod rules;

use crate::error::Result;
use crate::references::store::ReferencesStore;
use crate::references::types::Artifact;
use async_trait::async_trait;
use rules::LineRules;
use serde::Serialize;
use std::path::PathBuf;

/// Aggregate cap per output list
const SUMMARY_CAP: usize = 8;

const REASON_FEATURE_IDEATION: &str = "feature ideation and rationale";
const REASON_OPEN_QUESTIONS: &str = "open questions and constraints";
const REASON_EXPLORATORY: &str = "exploratory context note";

/// One artifact suggested for citation, with the reason it was classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedReference {
    pub filename: String,
    pub reason: String,
}

/// Aggregate summarizer output
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactSummary {
    pub themes: Vec<String>,
    pub open_questions: Vec<String>,
    pub candidate_changes: Vec<String>,
    pub suggested_reffy_references: Vec<SuggestedReference>,
}

/// Read-only listing/path-resolution contract the summarizer consumes.
///
/// The summarizer never writes; it sees the store only through this seam.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn list_artifacts(&self) -> Result<Vec<Artifact>>;
    fn artifact_path(&self, artifact: &Artifact) -> PathBuf;
}

#[async_trait]
impl ArtifactSource for ReferencesStore {
    async fn list_artifacts(&self) -> Result<Vec<Artifact>> {
        self.list().await
    }

    fn artifact_path(&self, artifact: &Artifact) -> PathBuf {
        ReferencesStore::artifact_path(self, artifact)
    }
}

/// Rule-based artifact summarizer
pub struct Summarizer {
    rules: LineRules,
}

impl Summarizer {
    pub fn new() -> Self {
        Self {
            rules: LineRules::new(),
        }
    }

    /// Summarize all artifacts from a source, in listing order.
    ///
    /// Artifacts whose backing file cannot be read are skipped silently:
    /// they contribute nothing and do not appear among the suggested
    /// references.
    pub async fn summarize<S: ArtifactSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<ArtifactSummary> {
        let artifacts = source.list_artifacts().await?;

        let mut themes = Vec::new();
        let mut open_questions = Vec::new();
        let mut candidate_changes = Vec::new();
        let mut references = Vec::new();

        for artifact in &artifacts {
            let path = source.artifact_path(artifact);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!(
                        filename = %artifact.filename,
                        error = %e,
                        "skipping unreadable artifact"
                    );
                    continue;
                }
            };

            let reason = self.summarize_content(
                artifact,
                &content,
                &mut themes,
                &mut open_questions,
                &mut candidate_changes,
            );
            references.push(SuggestedReference {
                filename: artifact.filename.clone(),
                reason: reason.to_string(),
            });
        }

        themes.truncate(SUMMARY_CAP);
        open_questions.truncate(SUMMARY_CAP);
        candidate_changes.truncate(SUMMARY_CAP);

        Ok(ArtifactSummary {
            themes,
            open_questions,
            candidate_changes,
            suggested_reffy_references: references,
        })
    }

    /// Walk one artifact's content line by line, appending extracted facts,
    /// and return the artifact's classification reason.
    fn summarize_content(
        &self,
        artifact: &Artifact,
        content: &str,
        themes: &mut Vec<String>,
        questions: &mut Vec<String>,
        changes: &mut Vec<String>,
    ) -> &'static str {
        let rules = &self.rules;
        let mut current_section = String::new();
        let mut has_question = false;
        let mut extracted_theme = false;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(heading) = rules.heading_value(line) {
                current_section = heading.to_lowercase();
                if !rules.is_generic_heading(&current_section) {
                    let cleaned = rules.strip_feature_idea_prefix(&heading);
                    if push_unique(rules, themes, &cleaned) {
                        extracted_theme = true;
                    }
                }
                continue;
            }

            if rules.is_natural_language_question(line) {
                has_question = true;
                push_unique(rules, questions, &rules.question_text(line));
            }

            for command in rules.extract_commands(line) {
                push_unique(rules, changes, &format!("Introduce {}", command));
            }

            if let Some(bullet) = rules.proposed_feature_bullet(line, &current_section) {
                push_unique(rules, changes, &bullet);
            }
        }

        if !extracted_theme {
            push_unique(rules, themes, &artifact.name);
        }

        if content.to_lowercase().contains("feature idea") {
            REASON_FEATURE_IDEATION
        } else if has_question {
            REASON_OPEN_QUESTIONS
        } else {
            REASON_EXPLORATORY
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Append the normalized value unless it is empty or already present.
/// Returns whether the value was appended.
fn push_unique(rules: &LineRules, list: &mut Vec<String>, value: &str) -> bool {
    let next = rules.normalize(value);
    if next.is_empty() || list.contains(&next) {
        return false;
    }
    list.push(next);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::store::ReferencesStore;
    use crate::references::types::CreateArtifactRequest;
    use tempfile::TempDir;

    /// In-test source backed by a plain directory, mirroring the store's
    /// listing/path contract without the manifest machinery.
    struct DirSource {
        dir: PathBuf,
        artifacts: Vec<Artifact>,
    }

    #[async_trait]
    impl ArtifactSource for DirSource {
        async fn list_artifacts(&self) -> Result<Vec<Artifact>> {
            Ok(self.artifacts.clone())
        }

        fn artifact_path(&self, artifact: &Artifact) -> PathBuf {
            self.dir.join(&artifact.filename)
        }
    }

    fn artifact(name: &str, filename: &str) -> Artifact {
        Artifact {
            id: filename.to_string(),
            name: name.to_string(),
            filename: filename.to_string(),
            kind: "note".to_string(),
            mime_type: "text/markdown".to_string(),
            size_bytes: 0,
            tags: Vec::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    async fn dir_source(files: &[(&str, &str)]) -> (DirSource, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut artifacts = Vec::new();
        for (filename, content) in files {
            tokio::fs::write(dir.path().join(filename), content)
                .await
                .unwrap();
            artifacts.push(artifact(
                filename.trim_end_matches(".md"),
                filename,
            ));
        }
        (
            DirSource {
                dir: dir.path().to_path_buf(),
                artifacts,
            },
            dir,
        )
    }

    #[tokio::test]
    async fn test_summarizes_themes_questions_and_changes() {
        let content = [
            "# Feature Idea: Add Test Coverage",
            "",
            "## Proposed Feature",
            "- `reffy summarize --output json`",
            "",
            "## Open Questions",
            "- Should we enforce 80% globally?",
        ]
        .join("\n");
        let (source, _dir) = dir_source(&[("feature.md", &content)]).await;

        let result = Summarizer::new().summarize(&source).await.unwrap();

        assert!(result.themes.contains(&"Add Test Coverage".to_string()));
        assert!(result
            .open_questions
            .contains(&"Should we enforce 80% globally?".to_string()));
        assert_eq!(
            result.candidate_changes[0],
            "Introduce reffy summarize --output json"
        );
        assert_eq!(
            result.suggested_reffy_references[0],
            SuggestedReference {
                filename: "feature.md".to_string(),
                reason: "feature ideation and rationale".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_artifact_list_yields_empty_summary() {
        let (source, _dir) = dir_source(&[]).await;
        let result = Summarizer::new().summarize(&source).await.unwrap();

        assert!(result.themes.is_empty());
        assert!(result.open_questions.is_empty());
        assert!(result.candidate_changes.is_empty());
        assert!(result.suggested_reffy_references.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_artifact_is_skipped_silently() {
        let source = DirSource {
            dir: PathBuf::from("/does/not/exist"),
            artifacts: vec![artifact("missing", "missing.md")],
        };

        let result = Summarizer::new().summarize(&source).await.unwrap();
        assert!(result.suggested_reffy_references.is_empty());
        assert!(result.themes.is_empty());
    }

    #[tokio::test]
    async fn test_display_name_is_fallback_theme() {
        let (source, _dir) =
            dir_source(&[("notes.md", "just prose, no headings at all")]).await;

        let result = Summarizer::new().summarize(&source).await.unwrap();
        assert_eq!(result.themes, vec!["notes".to_string()]);
        assert_eq!(
            result.suggested_reffy_references[0].reason,
            "exploratory context note"
        );
    }

    #[tokio::test]
    async fn test_generic_headings_are_not_themes() {
        let content = "# Problem\n\nsomething\n\n## Scope\n\nmore\n";
        let (source, _dir) = dir_source(&[("ctx.md", content)]).await;

        let result = Summarizer::new().summarize(&source).await.unwrap();
        // Only the fallback name remains.
        assert_eq!(result.themes, vec!["ctx".to_string()]);
    }

    #[tokio::test]
    async fn test_code_lines_are_not_questions() {
        let content = [
            "# Config Notes",
            "{\"flag\": \"maybe?\"}",
            "values[?]",
            "\"mode\": \"fast?\"",
            "Is this the right default?",
        ]
        .join("\n");
        let (source, _dir) = dir_source(&[("config.md", &content)]).await;

        let result = Summarizer::new().summarize(&source).await.unwrap();
        assert_eq!(
            result.open_questions,
            vec!["Is this the right default?".to_string()]
        );
        assert_eq!(
            result.suggested_reffy_references[0].reason,
            "open questions and constraints"
        );
    }

    #[tokio::test]
    async fn test_outputs_are_deduplicated_and_capped() {
        // 10 distinct questions across two artifacts plus one duplicate.
        let first: String = (0..6)
            .map(|i| format!("- Question number {}?\n", i))
            .collect();
        let second: String = (4..10)
            .map(|i| format!("- Question number {}?\n", i))
            .collect();
        let (source, _dir) = dir_source(&[("a.md", &first), ("b.md", &second)]).await;

        let result = Summarizer::new().summarize(&source).await.unwrap();
        assert_eq!(result.open_questions.len(), SUMMARY_CAP);
        assert_eq!(result.open_questions[0], "Question number 0?");
        // First-seen order survives the merge.
        assert_eq!(result.open_questions[4], "Question number 4?");
    }

    #[tokio::test]
    async fn test_proposed_feature_bullets_become_candidate_changes() {
        let content = [
            "## Proposed Feature",
            "- Add a dry-run flag",
            "- `reffy validate`",
            "",
            "## Notes",
            "- This bullet is outside the section",
        ]
        .join("\n");
        let (source, _dir) = dir_source(&[("prop.md", &content)]).await;

        let result = Summarizer::new().summarize(&source).await.unwrap();
        assert_eq!(
            result.candidate_changes,
            vec![
                "Add a dry-run flag".to_string(),
                "Introduce reffy validate".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_summarize_through_references_store() {
        let dir = TempDir::new().unwrap();
        let store = ReferencesStore::new(dir.path()).await.unwrap();
        store
            .create(CreateArtifactRequest {
                name: "Ideas".to_string(),
                content: Some("# Feature Idea: Faster Sync\n\n- Why is sync slow?\n".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let result = Summarizer::new().summarize(&store).await.unwrap();
        assert_eq!(result.themes, vec!["Faster Sync".to_string()]);
        assert_eq!(result.open_questions, vec!["Why is sync slow?".to_string()]);
        assert_eq!(result.suggested_reffy_references.len(), 1);
        assert_eq!(
            result.suggested_reffy_references[0].reason,
            "feature ideation and rationale"
        );
    }
}
