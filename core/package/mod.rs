//! # Packages
//!
//! Everything about one versioned artifact: its validated identity, where its environments live
//! on disk, the record written next to its data, and the [Dependency] that drives its lifecycle
//! against a [Repository].
//!
mod artifact_paths;
mod content_hasher;
mod dependency;
mod environment;
mod package_id;
mod package_info;
mod repository;
mod validators;

pub use artifact_paths::*;
pub use content_hasher::*;
pub use dependency::*;
pub use environment::*;
pub use package_id::*;
pub use package_info::*;
pub use repository::*;
pub use validators::*;
