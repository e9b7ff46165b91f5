//! References store: artifact CRUD, reconciliation, and the REST surface

pub mod handler;
pub mod store;
pub mod types;

pub use handler::{references_router, RefsState};
pub use store::ReferencesStore;
pub use types::{
    Artifact, CreateArtifactRequest, Manifest, ReindexReport, UpdateArtifactRequest,
    MANIFEST_VERSION,
};
