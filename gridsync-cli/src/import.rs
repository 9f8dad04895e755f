//! Import: files on disk -> records -> grids.

use std::path::{Path, PathBuf};

use gridsync::{Record, SourceTree, formats::FormatType};
use tracing::{error, info, warn};

use crate::api::{GridApi, STATUS_CREATED, STATUS_NOT_FOUND};
use crate::config::{FileMapping, GridConfig, ImportConfig, Settings};
use crate::urls::records_url;

/// A run of consecutive records bound for one grid.
#[derive(Debug, PartialEq, Eq)]
pub struct Batch<'a> {
    pub grid: &'a GridConfig,
    pub records: &'a [Record],
}

/// Whether `prefix` owns `id`: equal to it, or a leading run of whole segments.
fn owns(prefix: &str, id: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match id.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Picks the grid for a record id.
///
/// The most specific (longest) owning `path` among non-default grids wins,
/// ties broken by grid name, so the result does not depend on configuration
/// order. Ids nobody owns go to the default grid.
pub fn route<'a>(id: &str, grids: &'a [GridConfig]) -> Option<&'a GridConfig> {
    grids
        .iter()
        .filter(|grid| !grid.default)
        .filter_map(|grid| {
            grid.path
                .as_deref()
                .filter(|path| owns(path, id))
                .map(|path| (path.trim_matches('/').len(), grid))
        })
        .max_by(|(len_a, a), (len_b, b)| {
            len_a
                .cmp(len_b)
                .then_with(|| b.name.cmp(&a.name))
                .then_with(|| b.view_id.cmp(&a.view_id))
        })
        .map(|(_, grid)| grid)
        .or_else(|| grids.iter().find(|grid| grid.default))
}

/// Splits records into upload batches: consecutive records routed to the
/// same grid travel together, at most `chunk_size` at a time. Records no
/// grid accepts are dropped with a warning.
pub fn plan_batches<'a>(
    records: &'a [Record],
    grids: &'a [GridConfig],
    chunk_size: usize,
) -> Vec<Batch<'a>> {
    let chunk_size = chunk_size.max(1);
    let mut batches = Vec::new();
    let mut start = 0;
    let mut current: Option<&GridConfig> = None;

    for (index, record) in records.iter().enumerate() {
        let grid = route(&record.id, grids);
        if grid.is_none() {
            warn!("No grid accepts record {}; skipped.", record.id);
        }

        let same_grid = match (current, grid) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            _ => false,
        };
        if !same_grid || index - start >= chunk_size {
            if let Some(grid) = current {
                batches.push(Batch {
                    grid,
                    records: &records[start..index],
                });
            }
            start = index;
            current = grid;
        }
        if current.is_none() {
            start = index + 1;
        }
    }

    if let Some(grid) = current {
        if start < records.len() {
            batches.push(Batch {
                grid,
                records: &records[start..],
            });
        }
    }
    batches
}

/// Regular files in `dir` whose name matches a mapping, sorted by name.
pub fn files_to_import<'a>(
    dir: &Path,
    mappings: &'a [FileMapping],
) -> Result<Vec<(PathBuf, &'a FileMapping)>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Cannot read data directory {}: {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Cannot read data directory entry: {}", e))?;
        let path = entry.path();
        if !path.is_file() || FormatType::from_path(&path).is_err() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(mapping) = mappings.iter().find(|m| m.file_name == name) {
            files.push((path.clone(), mapping));
        }
    }
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

/// Posts one batch. `Ok(true)` when the grid created the records, `Ok(false)`
/// when the failure was logged and the import can go on.
fn post_batch<A: GridApi>(api: &A, settings: &Settings, batch: &Batch) -> Result<bool, String> {
    let url = records_url(&settings.base_url, &batch.grid.view_id);
    let body = serde_json::to_string(batch.records)
        .map_err(|e| format!("Cannot serialize records: {}", e))?;

    let response = match api.post_json(&url, &body) {
        Ok(response) => response,
        Err(e) => {
            error!("{}", e);
            return Ok(false);
        }
    };

    match response.status {
        STATUS_CREATED => {
            let created = serde_json::from_str::<Vec<serde_json::Value>>(&response.body)
                .map(|v| v.len())
                .unwrap_or(batch.records.len());
            info!("Successfully create {} record(s)", created);
            Ok(true)
        }
        STATUS_NOT_FOUND => Err(format!(
            "Failed create records for grid {}, return-code: {}, details: {}",
            batch.grid.name, response.status, response.body
        )),
        status => {
            error!(
                "Failed create records for grid {}, return-code: {}, details: {}",
                batch.grid.name, status, response.body
            );
            Ok(false)
        }
    }
}

/// Imports every mapped file of the data directory into the configured grids.
///
/// Returns the number of records the grids accepted.
pub fn run_import<A: GridApi>(
    api: &A,
    settings: &Settings,
    import: &ImportConfig,
) -> Result<usize, String> {
    let files = files_to_import(Path::new(&import.data_directory), &import.files.mappings)?;
    if files.is_empty() {
        warn!(
            "No mapped files found in {}; nothing to import.",
            import.data_directory
        );
    }

    let mut created = 0;
    for (path, mapping) in files {
        info!("Importing file {}...", path.display());

        let tree = SourceTree::read_file(&path)
            .map_err(|e| format!("Error reading {}: {}", path.display(), e))?;
        let records = tree.extract(&mapping.column_id);
        if records.is_empty() {
            warn!("No records extracted from {}.", path.display());
            continue;
        }

        for batch in plan_batches(&records, &import.grids, settings.import_chunk_size) {
            if post_batch(api, settings, &batch)? {
                created += batch.records.len();
            }
        }
    }
    Ok(created)
}
