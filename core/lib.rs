//! # Darty Core
//!
//! The flow begins by creating a `Config` and loading a `DependencyIndex` from a project file.
//! The index builds every `Repository` declared in the project, and binds each `Dependency` to
//! one of them. From there, a `Dependency` can be built, published, downloaded, and updated, and
//! it can resolve paths to its own content.
//!
//! Byte transfer to and from a remote repository is delegated to a `Driver`, which is picked by
//! name out of an open `DriverRegistry`. Everything else (staging, promotion between
//! environments, metadata, and path resolution) happens on the local disk.
//!

pub mod config;
pub mod drivers;
pub mod index;
pub mod output;
pub mod package;
pub(crate) mod util;

pub use config::*;
pub use index::*;
pub use output::*;
pub use package::*;

#[macro_use]
extern crate derive_builder;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
