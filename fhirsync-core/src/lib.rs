// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # fhirsync Core
//!
//! Resource model and normalization rules shared by the fhirsync crates.
//!
//! FHIR payloads are kept as untyped [`serde_json::Value`] trees so that
//! snapshots round-trip byte-faithfully; this crate provides the thin
//! typed views and pure transformations layered on top:
//!
//! - [`Bundle`] - read-only view of a bundle's entries and paging links
//! - [`ResourceKey`] - `resourceType/id` identity of a resource
//! - [`normalize`] - rewrites a resource so the target server accepts it

pub mod model;
pub mod normalize;

pub use model::{Bundle, BundleEntry, BundleLink, ResourceKey};
pub use normalize::{normalize, MEDICATION_ADMINISTRATION_STATUSES};
