//! Wire types for the references store
//!
//! All types serialize with snake_case field names; the manifest on disk and
//! the REST API share these shapes. `kind` and the timestamps are persisted
//! as plain strings so a hand-edited manifest with an unknown kind or a bad
//! timestamp still decodes: membership in the known kind set and timestamp
//! parsability are validator concerns, not decode-time constraints.

use serde::{Deserialize, Serialize};

/// Current manifest schema version
pub const MANIFEST_VERSION: u32 = 1;

/// One tracked unit of content: a file in the artifacts directory plus its
/// metadata record in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique identifier, generated at creation, never reused
    pub id: String,
    /// Human-readable display label; mutable
    pub name: String,
    /// Single path segment inside the artifacts directory; stable after
    /// creation (renaming the artifact does not rename its file)
    pub filename: String,
    /// Coarse content category (note, image, pdf, file)
    pub kind: String,
    /// Content type associated with the kind
    pub mime_type: String,
    /// Last-known content size; the file is authoritative
    #[serde(default)]
    pub size_bytes: u64,
    /// Ordered tag sequence; duplicates are not rejected by the store
    #[serde(default)]
    pub tags: Vec<String>,
    /// ISO-8601 creation timestamp
    pub created_at: String,
    /// ISO-8601 last-update timestamp
    pub updated_at: String,
}

/// The JSON index of all artifacts for a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Request body for creating an artifact
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArtifactRequest {
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Request body for updating an artifact; only provided fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArtifactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReindexReport {
    /// Entries synthesized for untracked files
    pub added: usize,
    /// Entries dropped because their file is gone
    pub removed: usize,
    /// Entries in the manifest after the pass
    pub total: usize,
}

/// Envelope for a filtered listing
#[derive(Debug, Serialize)]
pub struct ListReferencesResponse {
    pub items: Vec<Artifact>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "NOT_FOUND".to_string(),
                message: message.into(),
            },
        }
    }

    pub fn missing_file(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "MISSING_FILE".to_string(),
                message: message.into(),
            },
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: message.into(),
            },
        }
    }
}
