use serde_json::Value;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

use crate::models::{Catalog, Scheme};

/// Errors that can occur while loading the scheme catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// Column names accepted for each scheme field, first match wins
const NAME_COLUMNS: [&str; 2] = ["schemename", "name"];

/// Load a catalog from a `.csv` or `.json` file
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatalogError::NotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let catalog = match extension.as_str() {
        "csv" => load_csv(File::open(path)?)?,
        "json" => load_json(File::open(path)?)?,
        other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
    };

    tracing::info!("Loaded {} schemes from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Parse CSV with a header row
///
/// Unknown columns are ignored and missing columns read as empty.
pub fn load_csv<R: std::io::Read>(reader: R) -> Result<Catalog, CatalogError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |names: &[&str]| names.iter().find_map(|n| headers.iter().position(|h| h == n));
    let name_col = column(&NAME_COLUMNS);
    let details_col = column(&["details"]);
    let eligibility_col = column(&["eligibility"]);
    let benefits_col = column(&["benefits"]);
    let tags_col = column(&["tags"]);

    let mut schemes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        schemes.push(Scheme {
            name: field(name_col),
            details: field(details_col),
            eligibility: field(eligibility_col),
            benefits: field(benefits_col),
            tags: field(tags_col),
        });
    }

    Ok(Catalog::new(schemes))
}

/// Parse a JSON array of scheme objects
///
/// Numbers and booleans are read as their text form; nulls, arrays and
/// objects read as missing.
pub fn load_json<R: std::io::Read>(reader: R) -> Result<Catalog, CatalogError> {
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_reader(reader)?;

    let catalog = rows
        .iter()
        .map(|row| Scheme {
            name: NAME_COLUMNS.iter().find_map(|key| text_field(row, key)),
            details: text_field(row, "details"),
            eligibility: text_field(row, "eligibility"),
            benefits: text_field(row, "benefits"),
            tags: text_field(row, "tags"),
        })
        .collect::<Catalog>();

    Ok(catalog)
}

fn text_field(row: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
