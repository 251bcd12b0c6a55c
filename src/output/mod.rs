//! Output writers for aggregated data.
//!
//! This module handles reading and writing JSON on disk:
//! - Aggregated results wrapped in a versioned envelope
//! - Raw upstream payloads read for the commands

pub mod json;

// Re-export main functions
pub use json::{document_to_string, read_document, read_json_value, write_document};
