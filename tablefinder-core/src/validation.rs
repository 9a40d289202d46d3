//! JSON Schema validation for the search report format.
//!
//! Every report is checked against an embedded JSON Schema before it is
//! written, so consumers can rely on the documented shape.
//!
//! # Security Guarantees
//! - Field names never suggest stored credentials
//! - Connection strings with embedded passwords are rejected
//! - Sample values and the search value are user data and exempt from the
//!   string checks
//!
//! # Example
//! ```rust
//! use tablefinder_core::validation::{initialize_schema_validator, validate_report_output};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_schema_validator()?;
//! let report = json!({
//!     "format_version": "1.0",
//!     "search_value": "ACME-00042",
//!     "timestamp": "2024-01-15T10:30:00Z",
//!     "total_matches": 0,
//!     "options": {
//!         "exact_match": false,
//!         "case_sensitive": false,
//!         "table_pattern": null,
//!         "start_from": null,
//!         "skip_tables": [],
//!         "stop_on_first": false,
//!         "wildcards": "escaped",
//!         "sample_limit": 5
//!     },
//!     "results": [],
//!     "summary": {
//!         "tables_selected": 0,
//!         "tables_scanned": 0,
//!         "columns_considered": 0,
//!         "columns_scanned": 0,
//!         "skipped_columns": 0,
//!         "unsearchable_columns": 0,
//!         "failed_columns": 0,
//!         "skipped_tables": 0,
//!         "stopped_early": false,
//!         "duration_ms": 3
//!     },
//!     "skipped": [],
//!     "skipped_tables": [],
//!     "warnings": [],
//!     "generator_version": "0.1.0"
//! });
//!
//! validate_report_output(&report)?;
//! # Ok(())
//! # }
//! ```

use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// JSON Schema validation errors with detailed field-level reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Schema validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// Security validation failed - potential credential exposure
    #[error("Security validation failed: {reason}")]
    SecurityViolation { reason: String },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Supported format versions for backward compatibility
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Fields holding database content rather than tool output.
const USER_DATA_FIELDS: &[&str] = &["search_value", "sample_values"];

/// Embedded JSON Schema for v1.0 format validation
const SCHEMA_V1_0: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "TableFinder Search Report v1.0",
  "type": "object",
  "required": [
    "format_version", "search_value", "timestamp", "total_matches",
    "options", "results", "summary", "skipped"
  ],
  "properties": {
    "format_version": { "type": "string", "pattern": "^1\\.0$" },
    "search_value": { "type": "string", "minLength": 1 },
    "timestamp": { "type": "string", "format": "date-time" },
    "database_type": { "type": "string" },
    "total_matches": { "type": "integer", "minimum": 0 },
    "options": {
      "type": "object",
      "required": ["exact_match", "case_sensitive", "skip_tables", "stop_on_first"],
      "properties": {
        "exact_match": { "type": "boolean" },
        "case_sensitive": { "type": "boolean" },
        "table_pattern": { "type": ["string", "null"] },
        "start_from": { "type": ["string", "null"] },
        "skip_tables": { "type": "array", "items": { "type": "string" } },
        "stop_on_first": { "type": "boolean" },
        "wildcards": { "enum": ["escaped", "raw"] },
        "sample_limit": { "type": "integer", "minimum": 1, "maximum": 5 }
      }
    },
    "results": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["table", "column", "data_type", "match_count", "sample_values"],
        "properties": {
          "table": { "type": "string", "minLength": 1 },
          "column": { "type": "string", "minLength": 1 },
          "data_type": { "type": "string" },
          "match_count": { "type": "integer", "minimum": 1 },
          "sample_values": {
            "type": "array",
            "maxItems": 5,
            "items": { "type": "string" }
          }
        }
      }
    },
    "summary": {
      "type": "object",
      "required": [
        "tables_scanned", "columns_scanned", "skipped_columns",
        "skipped_tables", "stopped_early", "duration_ms"
      ],
      "properties": {
        "tables_selected": { "type": "integer", "minimum": 0 },
        "tables_scanned": { "type": "integer", "minimum": 0 },
        "columns_considered": { "type": "integer", "minimum": 0 },
        "columns_scanned": { "type": "integer", "minimum": 0 },
        "skipped_columns": { "type": "integer", "minimum": 0 },
        "unsearchable_columns": { "type": "integer", "minimum": 0 },
        "failed_columns": { "type": "integer", "minimum": 0 },
        "skipped_tables": { "type": "integer", "minimum": 0 },
        "stopped_early": { "type": "boolean" },
        "duration_ms": { "type": "integer", "minimum": 0 }
      }
    },
    "skipped": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["table", "column", "data_type", "reason"],
        "properties": {
          "table": { "type": "string" },
          "column": { "type": "string" },
          "data_type": { "type": "string" },
          "reason": { "enum": ["unsearchable_type", "query_failed"] },
          "error_kind": {
            "enum": ["access_denied", "type_cast_unsupported", "connection_lost", "other"]
          },
          "message": { "type": "string" }
        }
      }
    },
    "skipped_tables": {
      "type": "array",
      "default": [],
      "items": {
        "type": "object",
        "required": ["table", "message"],
        "properties": {
          "table": { "type": "string" },
          "message": { "type": "string" }
        }
      }
    },
    "warnings": { "type": "array", "items": { "type": "string" }, "default": [] },
    "generator_version": { "type": "string", "minLength": 1 }
  }
}"##;

/// Compiled schema plus the connection string detector.
struct ReportValidator {
    schema: Validator,
    connection_string: Regex,
}

/// Compiled validator (initialized once)
static COMPILED_VALIDATOR: OnceLock<ReportValidator> = OnceLock::new();

/// Initialize and compile the JSON Schema for validation
///
/// This function compiles the embedded JSON Schema and caches it for reuse.
/// It should be called once during application startup; later calls are
/// no-ops.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_schema_validator() -> Result<(), ValidationError> {
    if COMPILED_VALIDATOR.get().is_some() {
        return Ok(());
    }

    let schema_json = get_schema_definition()?;
    let schema = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    let connection_string =
        Regex::new(r"(?i)\b(postgres|postgresql|mysql|mssql|sqlserver|sqlite)://[^\s/@]*:[^\s/@]*@")
            .map_err(|e| ValidationError::SchemaCompilation {
                message: format!("Connection string pattern error: {}", e),
            })?;

    // Another thread may have won the race; either instance is equivalent
    let _ = COMPILED_VALIDATOR.set(ReportValidator {
        schema,
        connection_string,
    });

    Ok(())
}

/// Validate a search report JSON value.
///
/// This function performs:
/// - Format version compatibility checking
/// - JSON Schema structure validation with every error collected
/// - Security validation (credential field names, connection strings)
///
/// # Errors
/// Returns detailed validation errors if the JSON doesn't conform to the schema
/// or contains security violations.
pub fn validate_report_output(json_value: &Value) -> Result<(), ValidationError> {
    let validator =
        COMPILED_VALIDATOR
            .get()
            .ok_or_else(|| ValidationError::SchemaCompilation {
                message:
                    "Schema validator not initialized. Call initialize_schema_validator() first."
                        .to_string(),
            })?;

    validate_format_version(json_value)?;

    let errors: Vec<String> = validator
        .schema
        .iter_errors(json_value)
        .map(|e| format!("{} at '{}'", e, e.instance_path()))
        .collect();
    if !errors.is_empty() {
        return Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }

    validate_security_constraints(json_value, "", &validator.connection_string)?;

    Ok(())
}

/// Validate format version compatibility
fn validate_format_version(json_value: &Value) -> Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(())
}

/// Recursively checks field names and tool-generated strings.
fn validate_security_constraints(
    value: &Value,
    path: &str,
    connection_string: &Regex,
) -> Result<(), ValidationError> {
    match value {
        Value::String(s) => {
            if connection_string.is_match(s) {
                return Err(ValidationError::SecurityViolation {
                    reason: format!("Connection string with credentials found at path '{}'", path),
                });
            }
        }
        Value::Object(obj) => {
            for (key, val) in obj {
                let lower_key = key.to_lowercase();
                if lower_key.contains("password")
                    || lower_key.contains("secret")
                    || lower_key.contains("credential")
                {
                    return Err(ValidationError::SecurityViolation {
                        reason: format!("Credential-related field name found: '{}'", key),
                    });
                }

                if USER_DATA_FIELDS.contains(&key.as_str()) {
                    continue;
                }

                let new_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                validate_security_constraints(val, &new_path, connection_string)?;
            }
        }
        Value::Array(arr) => {
            for (index, item) in arr.iter().enumerate() {
                let new_path = format!("{}[{}]", path, index);
                validate_security_constraints(item, &new_path, connection_string)?;
            }
        }
        _ => {}
    }

    Ok(())
}

/// Validate and load a [`SearchReport`](crate::report::SearchReport) from JSON.
///
/// # Errors
/// Returns validation errors for malformed JSON, schema violations, or security issues.
pub fn validate_and_parse_report(
    json_str: &str,
) -> Result<crate::report::SearchReport, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;
    validate_report_output(&json_value)?;
    Ok(serde_json::from_value(json_value)?)
}

/// Get the embedded JSON Schema as a parsed Value for external use
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is not valid JSON.
pub fn get_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(SCHEMA_V1_0).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}

#[cfg(test)]
mod tests;
