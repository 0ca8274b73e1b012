//! services/api/src/bin/openapi.rs
//!
//! Writes the API's OpenAPI document to disk so clients can be generated
//! without a running server.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::{error::ApiError, web::ApiDoc};
use std::path::PathBuf;
use tracing::info;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt().with_target(false).init();

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let doc = ApiDoc::openapi();
    let json = doc
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("Failed to serialize OpenAPI document: {e}")))?;
    std::fs::write(&output, json)?;

    info!(
        paths = doc.paths.paths.len(),
        "OpenAPI document written to {}",
        output.display()
    );
    Ok(())
}
