//! Manifest contract: kind taxonomy, type inference, and validation

pub mod kind;
pub mod validate;

pub use kind::{allowed_kind_extensions, infer_artifact_type, ArtifactKind};
pub use validate::{validate_manifest, ValidationReport};
