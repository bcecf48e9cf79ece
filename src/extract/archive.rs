//! Extraction of a single archive.

use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::error::ExtractError;
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{StreamError, ZipExtractor};

use super::manifest::ExtractionResult;
use super::safety::resolve_member;

/// Extract every member of `archive_path` into `dest_dir`.
///
/// Never fails as a whole: whatever goes wrong ends up in
/// [`ExtractionResult::error`]. Unsafe member names are skipped and
/// counted. The first write or decode failure stops the archive, leaving
/// members extracted so far in place.
pub async fn extract_archive(archive_path: &Path, dest_dir: &Path) -> ExtractionResult {
    let name = archive_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.display().to_string());
    extract_named(archive_path, &name, dest_dir).await
}

/// As [`extract_archive`], with the name to record in the manifest.
pub(crate) async fn extract_named(
    archive_path: &Path,
    archive_name: &str,
    dest_dir: &Path,
) -> ExtractionResult {
    let mut result = ExtractionResult {
        archive: archive_path.to_path_buf(),
        archive_name: archive_name.to_string(),
        destination: dest_dir.to_path_buf(),
        extracted_count: 0,
        skipped_count: 0,
        extracted_bytes: 0,
        error: None,
        category: None,
    };

    let reader = match LocalFileReader::new(archive_path) {
        Ok(reader) => reader,
        Err(e) => {
            let err = ExtractError::ArchiveOpen {
                archive: archive_path.to_path_buf(),
                reason: format!("{e:#}"),
            };
            error!("{}", err);
            result.error = Some(err.to_string());
            return result;
        }
    };

    info!("Extracting {} -> {}", archive_path.display(), dest_dir.display());
    if let Err(err) = extract_from(Arc::new(reader), archive_path, dest_dir, &mut result).await {
        error!("{}", err);
        result.error = Some(err.to_string());
    }

    if result.skipped_count > 0 {
        warn!(
            "{}: skipped {} unsafe member(s)",
            archive_path.display(),
            result.skipped_count
        );
    }
    result
}

/// Extract from any [`ReadAt`] source, accumulating counts into `result`.
///
/// Counts are updated member by member, so on error `result` still
/// describes the partial extraction.
pub async fn extract_from<R: ReadAt + 'static>(
    reader: Arc<R>,
    archive_path: &Path,
    dest_dir: &Path,
    result: &mut ExtractionResult,
) -> Result<(), ExtractError> {
    let extractor = ZipExtractor::new(reader);
    let entries = extractor
        .list_files()
        .await
        .map_err(|e| ExtractError::ArchiveOpen {
            archive: archive_path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

    fs::create_dir_all(dest_dir)
        .await
        .map_err(|source| ExtractError::Destination {
            path: dest_dir.to_path_buf(),
            source,
        })?;

    for entry in &entries {
        let Some(target) = resolve_member(&entry.file_name, dest_dir) else {
            warn!(
                "Skipping unsafe member {:?} in {}",
                entry.file_name,
                archive_path.display()
            );
            result.skipped_count += 1;
            continue;
        };

        if entry.is_directory {
            fs::create_dir_all(&target)
                .await
                .map_err(|source| ExtractError::MemberWrite {
                    member: entry.file_name.clone(),
                    source,
                })?;
            result.extracted_count += 1;
            continue;
        }

        if entry.is_symlink() {
            debug!("{} is a symlink; writing its target as a regular file", entry.file_name);
        }

        let written = extractor
            .extract_to_file(entry, &target)
            .await
            .map_err(|e| match e {
                StreamError::Write(source) => ExtractError::MemberWrite {
                    member: entry.file_name.clone(),
                    source,
                },
                StreamError::Data(reason) => ExtractError::MemberData {
                    member: entry.file_name.clone(),
                    reason: format!("{reason:#}"),
                },
            })?;

        debug!("  extracted: {} ({} bytes)", entry.file_name, written);
        result.extracted_count += 1;
        result.extracted_bytes += written;
    }

    Ok(())
}
