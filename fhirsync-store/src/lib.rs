// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # fhirsync Store
//!
//! Local snapshot persistence for the fixture pipeline.
//!
//! - [`SnapshotStore`] - bundle files in one directory, named so the
//!   listing doubles as a manifest
//! - [`collect_resources`] - merges every snapshot file into a
//!   deduplicated, deterministically ordered resource set
//! - [`stage_assets`] - copies the prebuilt patient browser bundle and
//!   rewrites its asset roots

pub mod assets;
pub mod dedup;
pub mod error;
pub mod snapshot;

pub use assets::{stage_assets, DEFAULT_BASE_PATH};
pub use dedup::collect_resources;
pub use error::StoreError;
pub use snapshot::{SnapshotStore, SEARCH_PAGE_PREFIX};
