//! Artifact kind taxonomy and extension-based type inference
//!
//! The extension table is the single authority shared by the store (when
//! synthesizing entries during reconciliation) and the validator (when
//! checking that a declared kind agrees with a filename's extension).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse content category of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Markdown/text note
    Note,
    /// Image attachment
    Image,
    /// PDF document
    Pdf,
    /// Anything else
    File,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note => write!(f, "note"),
            Self::Image => write!(f, "image"),
            Self::Pdf => write!(f, "pdf"),
            Self::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            "file" => Ok(Self::File),
            other => Err(format!("unknown artifact kind: {}", other)),
        }
    }
}

/// Fixed extension table: `(extension, kind, mime_type)`
const EXTENSION_TABLE: &[(&str, ArtifactKind, &str)] = &[
    (".md", ArtifactKind::Note, "text/markdown"),
    (".markdown", ArtifactKind::Note, "text/markdown"),
    (".png", ArtifactKind::Image, "image/png"),
    (".jpg", ArtifactKind::Image, "image/jpeg"),
    (".jpeg", ArtifactKind::Image, "image/jpeg"),
    (".gif", ArtifactKind::Image, "image/gif"),
    (".svg", ArtifactKind::Image, "image/svg+xml"),
    (".webp", ArtifactKind::Image, "image/webp"),
    (".pdf", ArtifactKind::Pdf, "application/pdf"),
];

/// Mime type used for unrecognized extensions
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Extract the lowercase extension (including the dot) from a filename.
///
/// Returns an empty string for names without an extension; a leading dot
/// alone (`.env`) does not count as one.
pub fn file_extension(filename: &str) -> String {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Infer `(kind, mime_type)` from a filename's extension.
///
/// Unknown extensions map to the generic [`ArtifactKind::File`] with an
/// octet-stream mime type.
pub fn infer_artifact_type(filename: &str) -> (ArtifactKind, &'static str) {
    let ext = file_extension(filename);
    EXTENSION_TABLE
        .iter()
        .find(|(e, _, _)| *e == ext)
        .map(|(_, kind, mime)| (*kind, *mime))
        .unwrap_or((ArtifactKind::File, FALLBACK_MIME))
}

/// Allowed extensions per kind, as an owned copy.
///
/// Built fresh on every call: callers may mutate the returned map without
/// affecting the canonical table.
pub fn allowed_kind_extensions() -> HashMap<ArtifactKind, Vec<&'static str>> {
    let mut map: HashMap<ArtifactKind, Vec<&'static str>> = HashMap::new();
    for (ext, kind, _) in EXTENSION_TABLE {
        map.entry(*kind).or_default().push(ext);
    }
    // The generic kind accepts any extension; it has no row of its own.
    map.entry(ArtifactKind::File).or_default();
    map
}

/// Whether the extension appears anywhere in the table.
pub fn is_recognized_extension(ext: &str) -> bool {
    EXTENSION_TABLE.iter().any(|(e, _, _)| *e == ext)
}
