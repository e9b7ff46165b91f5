//! File-backed references store
//!
//! Directory layout:
//! ```text
//! <repo>/.references/
//! ├── manifest.json
//! └── artifacts/
//!     ├── some-note.md
//!     └── ...
//! ```
//!
//! The manifest is the source of truth for artifact metadata; the artifacts
//! directory is the source of truth for content. Mutations write both; the
//! `reconcile` pass repairs drift after out-of-band changes. Single logical
//! writer: there is no cross-process coordination around the manifest
//! read-modify-write cycle.

use crate::error::{Error, Result};
use crate::manifest::kind::infer_artifact_type;
use crate::manifest::{validate_manifest, ArtifactKind, ValidationReport};
use crate::references::types::{
    Artifact, CreateArtifactRequest, Manifest, ReindexReport, UpdateArtifactRequest,
    MANIFEST_VERSION,
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

/// Slug used when a name normalizes to nothing
const FALLBACK_SLUG: &str = "untitled";

/// Current time as an ISO-8601 string with millisecond precision
fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Durable CRUD for artifacts with manifest/filesystem co-consistency
pub struct ReferencesStore {
    pub repo_root: PathBuf,
    pub refs_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub manifest_path: PathBuf,
}

impl ReferencesStore {
    /// Open (or initialize) the store under `<repo_root>/.references/`.
    ///
    /// Creates the directory structure and an empty version-1 manifest when
    /// none exists. An existing manifest is left untouched, even when
    /// corrupt.
    pub async fn new(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let repo_root = repo_root.into();
        let refs_dir = repo_root.join(".references");
        let artifacts_dir = refs_dir.join("artifacts");
        let manifest_path = refs_dir.join("manifest.json");

        tokio::fs::create_dir_all(&artifacts_dir).await?;

        let store = Self {
            repo_root,
            refs_dir,
            artifacts_dir,
            manifest_path,
        };

        if tokio::fs::metadata(&store.manifest_path).await.is_err() {
            store.write_manifest(&store.empty_manifest()).await?;
        }

        Ok(store)
    }

    fn empty_manifest(&self) -> Manifest {
        let now = utc_now();
        Manifest {
            version: MANIFEST_VERSION,
            created_at: now.clone(),
            updated_at: now,
            artifacts: Vec::new(),
        }
    }

    /// Read and normalize the manifest.
    ///
    /// A missing file yields a fresh empty manifest. A present but
    /// unparsable file is [`Error::ManifestCorrupt`]: the caller decides how
    /// to recover, and the file is never overwritten with an empty manifest.
    /// A legacy top-level array is reinterpreted as `{version: 0, artifacts}`.
    pub async fn read_manifest(&self) -> Result<Manifest> {
        let text = match tokio::fs::read_to_string(&self.manifest_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(self.empty_manifest());
            }
            Err(e) => return Err(e.into()),
        };

        let raw: Value = serde_json::from_str(&text).map_err(|e| self.corrupt(e))?;

        match raw {
            Value::Array(items) => {
                let artifacts = serde_json::from_value(Value::Array(items))
                    .map_err(|e| self.corrupt(e))?;
                let now = utc_now();
                Ok(Manifest {
                    version: 0,
                    created_at: now.clone(),
                    updated_at: now,
                    artifacts,
                })
            }
            Value::Object(obj) => {
                let artifacts = match obj.get("artifacts") {
                    Some(value) => serde_json::from_value(value.clone())
                        .map_err(|e| self.corrupt(e))?,
                    None => Vec::new(),
                };
                let str_or_now = |key: &str| {
                    obj.get(key)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(utc_now)
                };
                Ok(Manifest {
                    version: obj
                        .get("version")
                        .and_then(Value::as_u64)
                        .map(|v| v as u32)
                        .unwrap_or(MANIFEST_VERSION),
                    created_at: str_or_now("created_at"),
                    updated_at: str_or_now("updated_at"),
                    artifacts,
                })
            }
            _ => Err(self.corrupt("unexpected top-level shape")),
        }
    }

    fn corrupt(&self, detail: impl std::fmt::Display) -> Error {
        Error::ManifestCorrupt {
            path: self.manifest_path.clone(),
            detail: detail.to_string(),
        }
    }

    async fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        tokio::fs::write(&self.manifest_path, json).await?;
        Ok(())
    }

    /// Absolute path of an artifact's backing file
    pub fn artifact_path(&self, artifact: &Artifact) -> PathBuf {
        self.artifacts_dir.join(&artifact.filename)
    }

    /// List artifacts in stored (insertion) order
    pub async fn list(&self) -> Result<Vec<Artifact>> {
        Ok(self.read_manifest().await?.artifacts)
    }

    /// Look up an artifact by id; an unknown id is `None`, not an error
    pub async fn get(&self, artifact_id: &str) -> Result<Option<Artifact>> {
        let manifest = self.read_manifest().await?;
        Ok(manifest
            .artifacts
            .into_iter()
            .find(|item| item.id == artifact_id))
    }

    /// Create a new artifact.
    ///
    /// The filename is a slugified, collision-avoided form of the name with
    /// a fixed `.md` extension; content, when given, is written verbatim and
    /// `size_bytes` is read back from the filesystem.
    pub async fn create(&self, input: CreateArtifactRequest) -> Result<Artifact> {
        // Read first so a corrupt manifest aborts before any file write.
        let mut manifest = self.read_manifest().await?;

        let filename = self
            .unique_filename(&slugify(&input.name), ".md")
            .await;
        let path = self.artifacts_dir.join(&filename);

        if let Some(content) = &input.content {
            tokio::fs::write(&path, content).await?;
        }
        let size_bytes = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        let now = utc_now();
        let artifact = Artifact {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            filename,
            kind: input
                .kind
                .unwrap_or_else(|| ArtifactKind::Note.to_string()),
            mime_type: input
                .mime_type
                .unwrap_or_else(|| "text/markdown".to_string()),
            size_bytes,
            tags: input.tags.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };

        manifest.updated_at = utc_now();
        manifest.artifacts.push(artifact.clone());
        self.write_manifest(&manifest).await?;

        tracing::debug!(id = %artifact.id, filename = %artifact.filename, "created artifact");
        Ok(artifact)
    }

    /// Apply the provided fields to an artifact; omitted fields are left
    /// unchanged. Content, when given, overwrites the file at the
    /// artifact's unchanged filename.
    pub async fn update(
        &self,
        artifact_id: &str,
        input: UpdateArtifactRequest,
    ) -> Result<Option<Artifact>> {
        let mut manifest = self.read_manifest().await?;
        let Some(item) = manifest
            .artifacts
            .iter_mut()
            .find(|item| item.id == artifact_id)
        else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            item.name = name;
        }
        if let Some(kind) = input.kind {
            item.kind = kind;
        }
        if let Some(mime_type) = input.mime_type {
            item.mime_type = mime_type;
        }
        if let Some(tags) = input.tags {
            item.tags = tags;
        }
        if let Some(content) = input.content {
            let path = self.artifacts_dir.join(&item.filename);
            tokio::fs::write(&path, content).await?;
            item.size_bytes = tokio::fs::metadata(&path).await?.len();
        }
        item.updated_at = utc_now();

        let updated = item.clone();
        manifest.updated_at = utc_now();
        self.write_manifest(&manifest).await?;
        Ok(Some(updated))
    }

    /// Remove an artifact and its backing file. Deleting a file that is
    /// already gone is tolerated. Returns `false` for an unknown id.
    pub async fn delete(&self, artifact_id: &str) -> Result<bool> {
        let mut manifest = self.read_manifest().await?;
        let Some(index) = manifest
            .artifacts
            .iter()
            .position(|item| item.id == artifact_id)
        else {
            return Ok(false);
        };

        let removed = manifest.artifacts.remove(index);
        let path = self.artifacts_dir.join(&removed.filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        manifest.updated_at = utc_now();
        self.write_manifest(&manifest).await?;

        tracing::debug!(id = %artifact_id, "deleted artifact");
        Ok(true)
    }

    /// Synchronize manifest entries with the files actually present.
    ///
    /// Entries whose file is gone are dropped; files with no entry get one
    /// synthesized with an inferred kind and a name derived from the
    /// filename. The manifest is persisted only when something changed, so
    /// the pass is idempotent.
    pub async fn reconcile(&self) -> Result<ReindexReport> {
        let mut manifest = self.read_manifest().await?;

        let mut files_on_disk: HashSet<String> = HashSet::new();
        let mut read_dir = tokio::fs::read_dir(&self.artifacts_dir).await?;
        let mut disk_order: Vec<String> = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Ok(name) = entry.file_name().into_string() {
                    files_on_disk.insert(name.clone());
                    disk_order.push(name);
                }
            }
        }

        let before = manifest.artifacts.len();
        manifest
            .artifacts
            .retain(|artifact| files_on_disk.contains(&artifact.filename));
        let removed = before - manifest.artifacts.len();

        let known: HashSet<String> = manifest
            .artifacts
            .iter()
            .map(|a| a.filename.clone())
            .collect();

        let mut added = 0;
        for filename in disk_order {
            if known.contains(&filename) {
                continue;
            }
            let path = self.artifacts_dir.join(&filename);
            let size_bytes = tokio::fs::metadata(&path).await?.len();
            let (kind, mime_type) = infer_artifact_type(&filename);
            let now = utc_now();
            manifest.artifacts.push(Artifact {
                id: uuid::Uuid::new_v4().to_string(),
                name: name_from_filename(&filename),
                filename,
                kind: kind.to_string(),
                mime_type: mime_type.to_string(),
                size_bytes,
                tags: Vec::new(),
                created_at: now.clone(),
                updated_at: now,
            });
            added += 1;
        }

        if added > 0 || removed > 0 {
            manifest.updated_at = utc_now();
            self.write_manifest(&manifest).await?;
            tracing::info!(added, removed, "reconciled artifacts directory");
        }

        Ok(ReindexReport {
            added,
            removed,
            total: manifest.artifacts.len(),
        })
    }

    /// Validate the manifest against the artifacts directory (read-only)
    pub async fn validate(&self) -> ValidationReport {
        validate_manifest(&self.manifest_path, &self.artifacts_dir).await
    }

    /// First free filename for `base`: `base.md`, then `base-2.md`, `base-3.md`, …
    async fn unique_filename(&self, base: &str, ext: &str) -> String {
        let mut candidate = format!("{}{}", base, ext);
        let mut counter = 2;
        while tokio::fs::metadata(self.artifacts_dir.join(&candidate))
            .await
            .is_ok()
        {
            candidate = format!("{}-{}{}", base, counter, ext);
            counter += 1;
        }
        candidate
    }
}

/// Normalize a display name into a filename slug: keep word characters,
/// hyphens and spaces, collapse whitespace to single hyphens, lowercase.
fn slugify(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == ' ')
        .collect();
    let slug = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Derive a display name from a filename: strip the extension, turn hyphens
/// into spaces.
fn name_from_filename(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    };
    let name = stem.replace('-', " ").trim().to_string();
    if name.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        name
    }
}
