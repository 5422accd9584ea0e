//! # Cadence Catalog
//!
//! Discovers job implementations from a source and normalizes them into a
//! name → spec mapping consumed by the reconciler.
//!
//! ## Features
//!
//! - `JobSource` trait with filesystem (`*.job.json` manifests) and
//!   in-memory sources
//! - `HandlerRegistry` binding manifest handler ids to implementations
//! - `JobCatalog` with bare-string and record manifest normalization

pub mod catalog;
pub mod error;
pub mod job;
pub mod registry;
pub mod source;

pub use catalog::JobCatalog;
pub use error::CatalogError;
pub use job::JobSpec;
pub use registry::HandlerRegistry;
pub use source::{FsJobSource, JobSource, MemoryJobSource, RawJobEntry};
