//! Integration test modules for cueflow.

pub mod generators;
pub mod navigation;
pub mod routing;
pub mod triggers;
