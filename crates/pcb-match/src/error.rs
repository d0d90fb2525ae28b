use thiserror::Error;

use crate::SourceId;

/// Structural problems in matcher inputs. These abort the run before any
/// component is matched; "no match found" is never an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error(
        "Invalid {field} '{value}' for IPN '{ipn}' in source '{source_id}': expected a non-negative integer"
    )]
    InvalidPriority {
        source_id: SourceId,
        ipn: String,
        field: String,
        value: String,
    },
    #[error("Missing required field '{field}' in row {row} of source '{source_id}'")]
    MissingField {
        source_id: SourceId,
        row: usize,
        field: String,
    },
    #[error("Duplicate IPN '{ipn}' in source '{source_id}'")]
    DuplicateIpn { source_id: SourceId, ipn: String },
    #[error("Invalid category '{value}'")]
    InvalidCategory { value: String },
    #[error("Invalid classification pattern '{pattern}': {message}")]
    InvalidRulePattern { pattern: String, message: String },
}
