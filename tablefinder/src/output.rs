//! File output for search reports.
//!
//! Reports are validated against the report schema before anything is
//! written, then saved as pretty JSON or Zstandard-compressed JSON.

use std::path::Path;
use tablefinder_core::Result;
use tablefinder_core::error::TableFinderError;
use tablefinder_core::report::SearchReport;

/// Zstandard compression level for `--compress`.
#[cfg(feature = "compression")]
const COMPRESSION_LEVEL: i32 = 3;

/// Validates `report` and writes it to `output_path`.
///
/// # Errors
/// Returns error if validation fails, compression was requested but not
/// compiled in, or the file cannot be written.
pub async fn save_report(report: &SearchReport, output_path: &Path, compress: bool) -> Result<()> {
    let json_data = report.to_validated_json()?;
    tracing::debug!("Output validation passed");

    if compress {
        #[cfg(feature = "compression")]
        {
            save_compressed(&json_data, output_path).await
        }
        #[cfg(not(feature = "compression"))]
        {
            Err(TableFinderError::unsupported_feature(
                "Compressed output",
                "this build (compile with --features compression)",
            ))
        }
    } else {
        save_json(&json_data, output_path).await
    }
}

/// Saves JSON data to file.
pub async fn save_json(json_data: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| {
            TableFinderError::io(format!("Failed to write to {}", output_path.display()), e)
        })?;
    Ok(())
}

/// Saves compressed JSON data.
#[cfg(feature = "compression")]
async fn save_compressed(json_data: &str, output_path: &Path) -> Result<()> {
    let compressed_data = compress(json_data.as_bytes())?;

    tokio::fs::write(output_path, compressed_data)
        .await
        .map_err(|e| {
            TableFinderError::io(
                format!(
                    "Failed to write compressed file to {}",
                    output_path.display()
                ),
                e,
            )
        })?;

    Ok(())
}

#[cfg(feature = "compression")]
fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use std::io::Write;

    let mut encoder = zstd::Encoder::new(Vec::new(), COMPRESSION_LEVEL)
        .map_err(|e| TableFinderError::io("Failed to create compressor", e))?;
    encoder
        .write_all(data)
        .map_err(|e| TableFinderError::io("Compression failed", e))?;
    encoder
        .finish()
        .map_err(|e| TableFinderError::io("Compression finalization failed", e))
}
