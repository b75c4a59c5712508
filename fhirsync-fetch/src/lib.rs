// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # fhirsync Fetch
//!
//! HTTP layer of the fixture pipeline: the gateway abstraction, paged
//! search walking, the target readiness probe, and the bounded upload
//! scheduler.
//!
//! Components never reach for a shared client; a [`FhirClient`] is built
//! once and injected wherever a [`FhirGateway`] is needed, which is also
//! the seam tests use to substitute fakes.
//!
//! - [`client`] - [`FhirGateway`] trait and the reqwest-backed client
//! - [`walker`] - follows `next` links with a loop guard and an id target
//! - [`probe`] - blocks until the target's `metadata` endpoint answers
//! - [`upload`] - normalize-then-PUT under a semaphore-bounded window

pub mod client;
pub mod error;
pub mod probe;
pub mod upload;
pub mod walker;

pub use client::{FhirClient, FhirGateway, FHIR_JSON};
pub use error::FetchError;
pub use probe::{wait_until_ready, DEFAULT_READY_TIMEOUT, PROBE_INTERVAL};
pub use upload::{upsert_all, DEFAULT_CONCURRENCY};
pub use walker::SearchWalker;
