//! LumenWall IO - Installation Files
//!
//! Loaders for the files an installation is described by:
//! - **Mapping**: the sheet assigning entity ranges to controller universes
//! - **Patch**: optional channel copy rules applied before transmission
//! - **Config**: router settings in TOML
//!
//! All loaders log what they read through `tracing` and fail with [`IoError`].

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod mapping;
pub mod patch;

pub use config::load_config;
pub use error::{IoError, Result};
pub use mapping::{bands_from_rows, load_mapping, MappingRow};
pub use patch::load_patch;
