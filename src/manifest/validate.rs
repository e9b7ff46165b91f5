//! Read-only structural and cross-referential manifest audit
//!
//! The validator decodes its own lenient view of the manifest (raw
//! `serde_json::Value`) instead of the store's typed decode, so a single
//! malformed field is itemized as one error instead of failing the whole
//! decode. Only a true read/parse failure is fatal. The validator never
//! mutates the manifest or the filesystem.

use crate::manifest::kind::{allowed_kind_extensions, file_extension, is_recognized_extension};
use crate::manifest::ArtifactKind;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Outcome of a manifest audit
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    /// Structural defects; any entry here makes the manifest invalid
    pub errors: Vec<String>,
    /// Advisory findings, e.g. a stale `size_bytes`
    pub warnings: Vec<String>,
    /// Number of manifest entries examined, regardless of validity
    pub artifact_count: usize,
}

impl ValidationReport {
    fn parse_failed(detail: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            errors: vec![format!("manifest read/parse failed: {}", detail)],
            warnings: Vec::new(),
            artifact_count: 0,
        }
    }
}

/// Validate a manifest file against an artifacts directory.
///
/// Each failed check appends one message and validation continues, so a
/// single pass reports as many problems as possible.
pub async fn validate_manifest(manifest_path: &Path, artifacts_dir: &Path) -> ValidationReport {
    let text = match tokio::fs::read_to_string(manifest_path).await {
        Ok(text) => text,
        Err(e) => return ValidationReport::parse_failed(e),
    };

    let raw: Value = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(e) => return ValidationReport::parse_failed(e),
    };

    // Legacy manifests were a bare artifact array.
    let entries: Vec<Value> = match raw {
        Value::Array(items) => items,
        Value::Object(ref obj) => match obj.get("artifacts") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return ValidationReport::parse_failed("artifacts is not an array"),
            None => Vec::new(),
        },
        _ => return ValidationReport::parse_failed("unexpected top-level shape"),
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            errors.push(format!("artifact entry {} is not an object", index));
            continue;
        };

        let str_field = |name: &str| entry.get(name).and_then(Value::as_str);

        match str_field("id") {
            Some(id) if !id.is_empty() => {
                if !seen_ids.insert(id.to_string()) {
                    errors.push(format!("duplicate artifact id: {}", id));
                }
            }
            _ => errors.push(format!("artifact entry {} has no id", index)),
        }

        let filename = str_field("filename");
        let safe_filename = match filename {
            Some(name) if is_safe_relative_filename(name) => Some(name),
            Some(name) => {
                errors.push(format!("filename must be a safe relative path: {}", name));
                None
            }
            None => {
                errors.push(format!("artifact entry {} has no filename", index));
                None
            }
        };

        match str_field("kind") {
            Some(kind) => match kind.parse::<ArtifactKind>() {
                Ok(kind) => {
                    if let Some(name) = filename {
                        check_extension(name, kind, &mut errors);
                    }
                }
                Err(_) => errors.push(format!("unknown artifact kind: {}", kind)),
            },
            None => errors.push(format!("artifact entry {} has no kind", index)),
        }

        for field in ["created_at", "updated_at"] {
            match str_field(field) {
                Some(value) if chrono::DateTime::parse_from_rfc3339(value).is_ok() => {}
                Some(value) => {
                    errors.push(format!("{} must be an ISO timestamp: {}", field, value))
                }
                None => errors.push(format!("artifact entry {} has no {}", index, field)),
            }
        }

        if let Some(name) = safe_filename {
            let path = artifacts_dir.join(name);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    if let Some(size) = entry.get("size_bytes").and_then(Value::as_u64) {
                        if size != meta.len() {
                            warnings.push(format!(
                                "size_bytes mismatch for {}: manifest={} actual={}",
                                name,
                                size,
                                meta.len()
                            ));
                        }
                    }
                }
                _ => errors.push(format!("file is missing: {}", name)),
            }
        }
    }

    ValidationReport {
        ok: errors.is_empty(),
        errors,
        warnings,
        artifact_count: entries.len(),
    }
}

/// A filename is safe when it is a single non-empty path segment: no
/// absolute paths, no parent-directory references, no separators.
fn is_safe_relative_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains(':')
}

fn check_extension(filename: &str, kind: ArtifactKind, errors: &mut Vec<String>) {
    let ext = file_extension(filename);
    if ext.is_empty() || !is_recognized_extension(&ext) {
        return;
    }
    let allowed = allowed_kind_extensions();
    let permitted = allowed
        .get(&kind)
        .map(|exts| exts.contains(&ext.as_str()))
        .unwrap_or(false);
    // The generic kind accepts anything.
    if !permitted && kind != ArtifactKind::File {
        errors.push(format!(
            "extension {} not allowed for kind {}",
            ext, kind
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct TestRepo {
        _dir: TempDir,
        manifest_path: PathBuf,
        artifacts_dir: PathBuf,
    }

    async fn make_repo() -> TestRepo {
        let dir = TempDir::new().unwrap();
        let refs_dir = dir.path().join(".references");
        let artifacts_dir = refs_dir.join("artifacts");
        let manifest_path = refs_dir.join("manifest.json");
        tokio::fs::create_dir_all(&artifacts_dir).await.unwrap();

        let now = Utc::now().to_rfc3339();
        let manifest = json!({
            "version": 1,
            "created_at": now,
            "updated_at": now,
            "artifacts": [],
        });
        tokio::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest).unwrap())
            .await
            .unwrap();

        TestRepo {
            _dir: dir,
            manifest_path,
            artifacts_dir,
        }
    }

    fn entry(id: &str, filename: &str, kind: &str, size: u64, created_at: &str) -> Value {
        json!({
            "id": id,
            "name": id,
            "filename": filename,
            "kind": kind,
            "mime_type": "text/markdown",
            "size_bytes": size,
            "tags": [],
            "created_at": created_at,
            "updated_at": Utc::now().to_rfc3339(),
        })
    }

    async fn write_manifest(repo: &TestRepo, artifacts: Vec<Value>) {
        let now = Utc::now().to_rfc3339();
        let manifest = json!({
            "version": 1,
            "created_at": now,
            "updated_at": now,
            "artifacts": artifacts,
        });
        tokio::fs::write(
            &repo.manifest_path,
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_validates_well_formed_manifest() {
        let repo = make_repo().await;
        tokio::fs::write(repo.artifacts_dir.join("idea.md"), "# Feature Idea\n\n- Test")
            .await
            .unwrap();
        let now = Utc::now().to_rfc3339();
        write_manifest(&repo, vec![entry("a1", "idea.md", "note", 22, &now)]).await;

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(result.ok, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
        assert_eq!(result.artifact_count, 1);
    }

    #[tokio::test]
    async fn test_fails_when_manifest_cannot_be_parsed() {
        let repo = make_repo().await;
        tokio::fs::write(&repo.manifest_path, "not-json").await.unwrap();

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(!result.ok);
        assert!(result.errors[0].contains("manifest read/parse failed"));
        assert_eq!(result.artifact_count, 0);
    }

    #[tokio::test]
    async fn test_missing_manifest_is_a_parse_failure() {
        let repo = make_repo().await;
        tokio::fs::remove_file(&repo.manifest_path).await.unwrap();

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(!result.ok);
        assert!(result.errors[0].contains("manifest read/parse failed"));
    }

    #[tokio::test]
    async fn test_reports_all_defects_in_one_pass() {
        let repo = make_repo().await;
        tokio::fs::write(repo.artifacts_dir.join("valid.md"), "hello")
            .await
            .unwrap();

        let now = Utc::now().to_rfc3339();
        write_manifest(
            &repo,
            vec![
                entry("dup", "valid.md", "note", 5, &now),
                entry("dup", "../escape.md", "bad-kind", 0, "bad-date"),
                entry("ok-id", "missing.pdf", "pdf", 1, &now),
            ],
        )
        .await;

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(!result.ok);
        assert_eq!(result.artifact_count, 3);
        let joined = result.errors.join("\n");
        assert!(joined.contains("duplicate artifact id: dup"));
        assert!(joined.contains("filename must be a safe relative path"));
        assert!(joined.contains("unknown artifact kind: bad-kind"));
        assert!(joined.contains("created_at must be an ISO timestamp"));
        assert!(joined.contains("file is missing: missing.pdf"));
    }

    #[tokio::test]
    async fn test_extension_must_match_declared_kind() {
        let repo = make_repo().await;
        tokio::fs::write(repo.artifacts_dir.join("photo.png"), [0u8; 4])
            .await
            .unwrap();
        let now = Utc::now().to_rfc3339();
        write_manifest(&repo, vec![entry("a1", "photo.png", "note", 4, &now)]).await;

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(!result.ok);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("extension .png not allowed for kind note")));
    }

    #[tokio::test]
    async fn test_unrecognized_extension_is_not_checked_against_kind() {
        let repo = make_repo().await;
        tokio::fs::write(repo.artifacts_dir.join("blob.xyz"), [0u8; 2])
            .await
            .unwrap();
        let now = Utc::now().to_rfc3339();
        write_manifest(&repo, vec![entry("a1", "blob.xyz", "note", 2, &now)]).await;

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(result.ok, "errors: {:?}", result.errors);
    }

    #[tokio::test]
    async fn test_size_mismatch_is_a_warning_not_an_error() {
        let repo = make_repo().await;
        tokio::fs::write(repo.artifacts_dir.join("size.md"), "12345")
            .await
            .unwrap();
        let now = Utc::now().to_rfc3339();
        write_manifest(&repo, vec![entry("a1", "size.md", "note", 15, &now)]).await;

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(result.ok);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("size_bytes"));
    }

    #[tokio::test]
    async fn test_legacy_array_manifest_is_examined() {
        let repo = make_repo().await;
        tokio::fs::write(repo.artifacts_dir.join("old.md"), "legacy")
            .await
            .unwrap();
        let now = Utc::now().to_rfc3339();
        let legacy = json!([entry("a1", "old.md", "note", 6, &now)]);
        tokio::fs::write(&repo.manifest_path, legacy.to_string())
            .await
            .unwrap();

        let result = validate_manifest(&repo.manifest_path, &repo.artifacts_dir).await;
        assert!(result.ok, "errors: {:?}", result.errors);
        assert_eq!(result.artifact_count, 1);
    }

    #[test]
    fn test_safe_relative_filename() {
        assert!(is_safe_relative_filename("note.md"));
        assert!(!is_safe_relative_filename("../escape.md"));
        assert!(!is_safe_relative_filename("/etc/passwd"));
        assert!(!is_safe_relative_filename("nested/note.md"));
        assert!(!is_safe_relative_filename("..\\escape.md"));
        assert!(!is_safe_relative_filename(""));
    }
}
