//! Reffy - repository-local reference and ideation context layer
//!
//! Reffy keeps a file-backed knowledge base of "artifacts" (markdown notes
//! and binary attachments) under `<repo>/.references/`, tracked by a single
//! JSON manifest. The manifest is the source of truth for metadata; the
//! filesystem is the source of truth for content. The store keeps the two
//! consistent under independent mutation, and a heuristic summarizer turns
//! raw artifact text into themes, open questions, and candidate changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      reffy CLI / HTTP API                  │
//! │  init · bootstrap · reindex · validate · summarize · serve │
//! └───────────────┬──────────────────────────┬────────────────┘
//!                 │                          │
//! ┌───────────────▼───────────┐  ┌───────────▼───────────────┐
//! │      ReferencesStore      │  │        Summarizer          │
//! │  manifest.json + artifacts│  │  rule-based extraction of  │
//! │  CRUD + reconcile         │  │  themes/questions/changes  │
//! └───────────────┬───────────┘  └───────────┬───────────────┘
//!                 │                          │ reads only via
//! ┌───────────────▼───────────┐              │ ArtifactSource
//! │     Manifest Validator    │◄─────────────┘
//! │  structural audit: ids,   │   summarize refuses to run
//! │  paths, kinds, timestamps │   on an invalid manifest
//! └───────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`references`]: artifact store, wire types, and REST handlers
//! - [`manifest`]: kind taxonomy, type inference, and validation
//! - [`summarize`]: heuristic summarization pipeline
//! - [`agents`]: managed instruction-document templating
//! - [`watcher`]: debounced filesystem watcher triggering reconciliation
//! - [`server`]: HTTP service assembly
//! - [`config`]: configuration management

pub mod agents;
pub mod config;
pub mod error;
pub mod manifest;
pub mod references;
pub mod server;
pub mod summarize;
pub mod watcher;

pub use config::ReffyConfig;
pub use error::{Error, Result};
