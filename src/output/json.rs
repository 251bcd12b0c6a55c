//! JSON document reader and writer.
//!
//! Writes aggregation results wrapped in an [`OutputDocument`] envelope and
//! reads raw upstream payloads for the commands.

use crate::parser::schema::{DocumentHeader, OutputDocument};
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write a document to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `document` - Envelope and aggregated data to write
/// * `output_path` - Path to output JSON file
///
/// # Returns
/// Ok if file written successfully
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let rows = join_series(&series);
/// write_document(&OutputDocument::new("join", rows), "rows.json")?;
/// ```
pub fn write_document<T: Serialize>(
    document: &OutputDocument<T>,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} output to: {}", document.kind, output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, document).map_err(OutputError::SerializationFailed)?;

    info!("Output written successfully ({} bytes)", calculate_file_size(output_path));

    Ok(())
}

/// Serialize a document to a pretty-printed string
///
/// **Public** - used for stdout output and tests
pub fn document_to_string<T: Serialize>(document: &OutputDocument<T>) -> Result<String, OutputError> {
    serde_json::to_string_pretty(document).map_err(OutputError::SerializationFailed)
}

/// Read any JSON file into a `Value`
///
/// **Public** - commands read upstream payloads this way and hand them to
/// the lenient parsers
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_json_value(input_path: impl AsRef<Path>) -> Result<Value, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading JSON from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let value: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    Ok(value)
}

/// Read a previously written document back
///
/// **Public** - used by `validate`
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error
/// * `OutputError::SerializationFailed` - Not JSON, or envelope fields missing
pub fn read_document(input_path: impl AsRef<Path>) -> Result<DocumentHeader, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading document from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let header: DocumentHeader =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!("Document loaded: version {}, kind {}", header.version, header.kind);

    Ok(header)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{JoinedRow, TimePoint};
    use tempfile::NamedTempFile;

    fn create_test_document() -> OutputDocument<Vec<JoinedRow>> {
        let mut row = JoinedRow::new(100);
        row.set("Fees", 1.5);
        OutputDocument::new("join", vec![row]).with_legend(vec!["Fees".to_string()])
    }

    #[test]
    fn test_write_and_read_document() {
        let document = create_test_document();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_document(&document, path).unwrap();
        let loaded = read_document(path).unwrap();

        assert_eq!(loaded.version, document.version);
        assert_eq!(loaded.kind, "join");
        assert_eq!(loaded.legend, Some(vec!["Fees".to_string()]));
        assert_eq!(loaded.record_count(), 1);
        assert_eq!(loaded.data[0]["date"], "100");
        assert_eq!(loaded.data[0]["Fees"], 1.5);
    }

    #[test]
    fn test_document_to_string_omits_missing_legend() {
        let document = OutputDocument::new("series", vec![TimePoint::new(1, 2.0)]);
        let text = document_to_string(&document).unwrap();

        assert!(text.contains("\"generatedAt\""));
        assert!(!text.contains("\"legend\""));
    }

    #[test]
    fn test_read_document_rejects_plain_payload() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"{"protocols": []}"#).unwrap();

        assert!(matches!(
            read_document(temp_file.path()),
            Err(OutputError::SerializationFailed(_))
        ));
        assert!(read_json_value(temp_file.path()).is_ok());
    }

    #[test]
    fn test_validate_output_path_empty() {
        let result = validate_output_path(Path::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = validate_output_path(temp_dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/rows.json");

        write_document(&create_test_document(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
