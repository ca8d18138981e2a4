//! Per-file orchestration: open → extract → resolve → update → save → archive

use crate::config::RunConfig;
use crate::context::RunContext;
use crate::extract::extract_pairs;
use crate::routing::{resolve_pairs, RouteService};
use crate::sheet::SheetBook;
use crate::types::{EventEntryType, FileResult};
use crate::updater::update_sheet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Event id written for every successfully processed file
pub const EVENT_FILE_PROCESSED: u32 = 1001;

/// Options that change what a file run is allowed to touch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessOptions {
    /// Extract and resolve only; no save, no archive
    pub dry_run: bool,
}

/// List the workbooks waiting in the drop folder, sorted by file name.
///
/// Office lock files (`~$…`) are skipped.
pub fn discover_input_files(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        let is_lock = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("~$"))
            .unwrap_or(false);
        if is_xlsx && !is_lock {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process one input file.
///
/// Returns `None` when the file could not be opened or lacks the configured
/// worksheet; every other failure is recorded on the context and the pairs
/// found so far are still returned.
pub fn process_file(
    path: &Path,
    config: &RunConfig,
    router: &dyn RouteService,
    options: ProcessOptions,
    ctx: &mut RunContext,
) -> Option<FileResult> {
    info!(file = %path.display(), "processing file");

    let mut book = match SheetBook::open(path) {
        Ok(book) => book,
        Err(e) => {
            ctx.system_error(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ));
            return None;
        }
    };

    let sheet = match book.worksheet_mut(&config.worksheet_name) {
        Ok(sheet) => sheet,
        Err(e) => {
            ctx.system_error(format!("File '{}': {}", path.display(), e));
            return None;
        }
    };

    let mut pairs = match extract_pairs(sheet, &config.columns) {
        Ok(pairs) => pairs,
        Err(e) => {
            ctx.system_error(format!(
                "Failed to extract pairs from '{}': {}",
                path.display(),
                e
            ));
            return None;
        }
    };
    debug!(file = %path.display(), pairs = pairs.len(), "pairs extracted");

    resolve_pairs(&mut pairs, router);
    let updated = update_sheet(sheet, &mut pairs);

    let result = FileResult::new(path.to_path_buf(), pairs);
    info!(
        file = %path.display(),
        pairs = result.pairs.len(),
        updated,
        errors = result.error_count(),
        "file resolved"
    );

    if options.dry_run {
        return Some(result);
    }

    if let Err(e) = book.save() {
        ctx.system_error(format!("Failed to save file '{}': {}", path.display(), e));
        return Some(result);
    }
    drop(book);

    if let Some(archive) = &config.archive_folder {
        if let Err(e) = archive_file(path, archive) {
            ctx.system_error(format!(
                "Failed to move file '{}' to archive folder '{}': {}",
                path.display(),
                archive.display(),
                e
            ));
            return Some(result);
        }
    }

    ctx.event(
        EventEntryType::Information,
        EVENT_FILE_PROCESSED,
        format!(
            "File '{}' processed: {} pair(s), {} updated",
            result.name(),
            result.pairs.len(),
            updated
        ),
    );

    Some(result)
}

/// Move a processed file into the archive folder, replacing any file of the
/// same name. Falls back to copy + delete across file systems.
pub fn archive_file(path: &Path, archive_folder: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(archive_folder)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let target = archive_folder.join(file_name);

    if fs::rename(path, &target).is_err() {
        fs::copy(path, &target)?;
        fs::remove_file(path)?;
    }

    debug!(from = %path.display(), to = %target.display(), "file archived");
    Ok(target)
}
