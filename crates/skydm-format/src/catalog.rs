//! Catalog reading.
//!
//! Catalogs are comma-separated text with a header row of column names, or
//! FITS files whose first table extension holds the catalog.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use skydm_types::FileKind;
use tracing::debug;

use crate::error::{FormatError, FormatResult};
use crate::fits::read_fits_file;
use crate::structure::CatalogStructure;

const FITS_EXTENSIONS: [&str; 3] = ["fits", "fit", "fts"];

/// Returns `true` if `path` names a FITS file by its extension.
pub fn is_fits_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FITS_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
}

/// Open a catalog on disk, choosing the reader from the file extension.
pub fn read_catalog_file(path: &Path) -> FormatResult<CatalogStructure> {
    if is_fits_path(path) {
        let fits = read_fits_file(path)?;
        let table = fits.first_table().ok_or_else(|| {
            FormatError::invalid(path, FileKind::Catalog, "FITS file has no table extension")
        })?;
        return Ok(CatalogStructure::new(
            table.columns.clone(),
            table.rows().unwrap_or(0) as usize,
        ));
    }
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    read_csv(BufReader::new(file), path)
}

/// Read the column names and row count of CSV text.
///
/// Blank lines and lines starting with `#` are skipped. Every data row must
/// have as many fields as the header.
pub fn read_csv<R: BufRead>(reader: R, path: &Path) -> FormatResult<CatalogStructure> {
    let invalid = |reason: String| FormatError::invalid(path, FileKind::Catalog, reason);

    let mut columns: Option<Vec<String>> = None;
    let mut rows = 0usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => invalid("file is not valid UTF-8 text".into()),
            _ => FormatError::io(path, e),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields = split_fields(trimmed).map_err(|reason| invalid(format!("line {}: {reason}", number + 1)))?;

        match &columns {
            None => {
                if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
                    return Err(invalid(format!("empty column name at position {}", pos + 1)));
                }
                columns = Some(fields);
            }
            Some(header) if header.len() != fields.len() => {
                return Err(invalid(format!(
                    "line {} has {} fields, expected {}",
                    number + 1,
                    fields.len(),
                    header.len()
                )));
            }
            Some(_) => rows += 1,
        }
    }

    let columns = columns.ok_or_else(|| invalid("missing header row".into()))?;
    debug!(path = %path.display(), columns = columns.len(), rows, "read catalog structure");
    Ok(CatalogStructure::new(columns, rows))
}

/// Split one CSV line. Fields may be double-quoted, with `""` as an
/// escaped quote.
fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            (',', false) => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    if quoted {
        return Err("unterminated quoted field".into());
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}
