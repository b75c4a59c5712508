//! CLI command implementations.

pub mod assets;
pub mod download;
pub mod load;
