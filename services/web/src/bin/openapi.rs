//! services/web/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3 document for the JSON API. The output path is the first
//! argument, `openapi.json` when omitted.

use nebulearn_web::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let doc = ApiDoc::openapi();
    std::fs::write(&path, doc.to_pretty_json()?)?;
    println!(
        "Wrote {} API paths to {}",
        doc.paths.paths.len(),
        path.display()
    );
    Ok(())
}
