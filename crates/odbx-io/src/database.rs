//! Opening the result database.
//!
//! The database is a JSON rendition of the result object model: the root
//! assembly's instances plus the ordered steps, frames and field outputs.
//! It is read once, in full, and never written back by the exporter.

use std::fs;
use std::path::Path;

use odbx_model::ResultDatabase;
use tracing::{debug, info};

use crate::error::{ExportError, Result};

/// Open a result database read-only.
pub fn open_database(path: impl AsRef<Path>) -> Result<ResultDatabase> {
    let path = path.as_ref();
    info!("Opening result database: {}", path.display());

    let bytes = fs::read(path).map_err(|source| ExportError::DatabaseIo {
        path: path.to_path_buf(),
        source,
    })?;
    let db: ResultDatabase =
        serde_json::from_slice(&bytes).map_err(|source| ExportError::DatabaseFormat {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        "database has {} instance(s) and {} step(s)",
        db.instances.len(),
        db.steps.len()
    );
    Ok(db)
}

/// Write a database document, e.g. to produce fixtures from another reader.
pub fn save_database(path: impl AsRef<Path>, db: &ResultDatabase) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ExportError::write(parent, source))?;
    }

    let bytes = serde_json::to_vec_pretty(db)?;
    fs::write(path, bytes).map_err(|source| ExportError::write(path, source))
}
