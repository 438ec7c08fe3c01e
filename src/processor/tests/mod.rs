//! Integration tests for the processor module
//!
//! Tests the complete preparation pipeline against small survey archives
//! laid out in temporary directories.

pub mod batch_processing;
pub mod fixtures;
