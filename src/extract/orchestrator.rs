//! Parallel extraction of every archive in a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::{ExtractError, Result};

use super::archive::extract_named;
use super::discover::{DiscoveredArchive, Destinations, discover_archives, slash_path};
use super::manifest::{Category, ExtractionResult, Manifest};

/// File name of the HCAD GIS bundle, compared case-insensitively.
pub const GIS_BUNDLE: &str = "GIS_Public.zip";
/// Output subdirectory for the GIS bundle and the archives inside it.
pub const GIS_DIR: &str = "gis_data";
/// Output subdirectory for every other archive.
pub const PDATA_DIR: &str = "pdata";

/// How archives are arranged under the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// `outdir/<stem>` for every archive
    #[default]
    Flat,
    /// `outdir/gis_data/<stem>` for the GIS bundle and the archives found
    /// inside it, `outdir/pdata/<stem>` for everything else
    Hcad,
}

/// Inputs for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub indir: PathBuf,
    pub outdir: PathBuf,
    /// Glob applied to file names and relative paths; `None` keeps every
    /// `.zip` archive.
    pub pattern: Option<String>,
    /// Archives extracted at once. 0 is treated as 1.
    pub workers: usize,
    /// Manifest file, or a directory to create a timestamped one in.
    pub manifest: Option<PathBuf>,
    /// Remove each archive's destination before extracting into it.
    pub clean: bool,
    pub layout: Layout,
}

impl ExtractOptions {
    pub fn new(indir: impl Into<PathBuf>, outdir: impl Into<PathBuf>) -> Self {
        Self {
            indir: indir.into(),
            outdir: outdir.into(),
            pattern: None,
            workers: 1,
            manifest: None,
            clean: false,
            layout: Layout::Flat,
        }
    }
}

/// One archive to extract.
#[derive(Debug, Clone)]
struct Job {
    path: PathBuf,
    name: String,
    destination: PathBuf,
    category: Option<Category>,
}

impl Job {
    fn failed(&self, reason: String) -> ExtractionResult {
        ExtractionResult {
            archive: self.path.clone(),
            archive_name: self.name.clone(),
            destination: self.destination.clone(),
            extracted_count: 0,
            skipped_count: 0,
            extracted_bytes: 0,
            error: Some(reason),
            category: self.category,
        }
    }
}

/// Extract every archive under `opts.indir` into `opts.outdir`.
///
/// One task per archive, at most `opts.workers` running at a time. Each
/// archive's outcome is captured in its manifest entry; a failing archive
/// never stops the others. The manifest lists archives in discovery order
/// and is written, if requested, only after every task has finished.
///
/// With [`Layout::Hcad`], archives found in the GIS bundle's output are
/// extracted in a second pass into `gis_data/` and listed under
/// [`Manifest::nested`].
///
/// A manifest file that cannot be written does not fail the run: the
/// reason is kept in [`Manifest::write_error`].
///
/// # Errors
///
/// Only run-level problems are returned: a missing input directory, no
/// matching archives, or an output directory that cannot be created.
pub async fn extract_all(opts: &ExtractOptions) -> Result<Manifest> {
    if !opts.indir.is_dir() {
        return Err(ExtractError::InputDirMissing(opts.indir.clone()));
    }

    let archives = discover_archives(&opts.indir, opts.pattern.as_deref());
    if archives.is_empty() {
        return Err(ExtractError::NoArchivesFound {
            indir: opts.indir.clone(),
            pattern: opts.pattern.clone().unwrap_or_else(|| "*.zip".to_string()),
        });
    }

    let mut destinations = Destinations::new();
    let jobs: Vec<Job> = archives
        .iter()
        .map(|archive| plan(archive, opts, &mut destinations))
        .collect();

    let workers = opts.workers.max(1);
    info!(
        "Extracting {} archive(s) from {} with {} worker(s)",
        jobs.len(),
        opts.indir.display(),
        workers
    );

    tokio::fs::create_dir_all(&opts.outdir)
        .await
        .map_err(|source| ExtractError::Destination {
            path: opts.outdir.clone(),
            source,
        })?;

    let permits = Arc::new(Semaphore::new(workers));
    let results = run(&jobs, &permits, opts.clean).await;

    let mut nested = Vec::new();
    if opts.layout == Layout::Hcad {
        let inner = nested_jobs(&jobs, &opts.outdir, &mut destinations);
        if !inner.is_empty() {
            info!("Found {} nested GIS archive(s); extracting into {}", inner.len(), GIS_DIR);
            nested = run(&inner, &permits, opts.clean).await;
        }
    }

    let mut manifest = Manifest::new(&opts.indir, &opts.outdir, results).with_nested(nested);

    info!(
        "Processed {} archive(s) and {} nested: {} member(s) extracted, {} unsafe member(s) skipped, {} archive(s) failed",
        manifest.archives.len(),
        manifest.nested.len(),
        manifest.total_extracted(),
        manifest.total_skipped(),
        manifest.failed().count()
    );
    if manifest.total_skipped() > 0 {
        warn!(
            "{} member(s) were refused by the path validator; the archives may be crafted or malformed",
            manifest.total_skipped()
        );
    }

    if let Some(path) = &opts.manifest {
        match manifest.write(path) {
            Ok(written) => info!("Wrote manifest to {}", written.display()),
            Err(e) => {
                error!("{}", e);
                manifest.write_error = Some(e.to_string());
            }
        }
    }

    Ok(manifest)
}

fn plan(archive: &DiscoveredArchive, opts: &ExtractOptions, destinations: &mut Destinations) -> Job {
    let (root, category) = match opts.layout {
        Layout::Flat => (opts.outdir.clone(), None),
        Layout::Hcad if is_gis_bundle(archive) => (opts.outdir.join(GIS_DIR), Some(Category::Gis)),
        Layout::Hcad => (opts.outdir.join(PDATA_DIR), Some(Category::Pdata)),
    };
    Job {
        path: archive.path.clone(),
        name: archive.relative.clone(),
        destination: destinations.assign(archive, &root),
        category,
    }
}

fn is_gis_bundle(archive: &DiscoveredArchive) -> bool {
    archive
        .path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(GIS_BUNDLE))
}

/// Archives inside the extracted GIS bundle, one level deep.
///
/// Their manifest name is their path relative to `outdir`.
fn nested_jobs(jobs: &[Job], outdir: &Path, destinations: &mut Destinations) -> Vec<Job> {
    let gis_root = outdir.join(GIS_DIR);
    let mut nested = Vec::new();

    for bundle in jobs.iter().filter(|job| job.category == Some(Category::Gis)) {
        if !bundle.destination.is_dir() {
            warn!("Expected GIS bundle output not found at {}", bundle.destination.display());
            continue;
        }
        for inner in discover_archives(&bundle.destination, None) {
            let name = match inner.path.strip_prefix(outdir) {
                Ok(relative) => slash_path(relative),
                Err(_) => inner.relative.clone(),
            };
            nested.push(Job {
                destination: destinations.assign(&inner, &gis_root),
                path: inner.path,
                name,
                category: Some(Category::Gis),
            });
        }
    }

    nested
}

/// Run `jobs` on the shared pool and collect results in job order.
async fn run(jobs: &[Job], permits: &Arc<Semaphore>, clean: bool) -> Vec<ExtractionResult> {
    let mut handles = Vec::with_capacity(jobs.len());

    for job in jobs {
        let permits = Arc::clone(permits);
        let job = job.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return job.failed(format!("worker pool closed: {e}")),
            };
            if clean {
                remove_existing(&job.destination).await;
            }
            let mut result = extract_named(&job.path, &job.name, &job.destination).await;
            result.category = job.category;
            result
        }));
    }

    // Tasks run concurrently; joining in submission order only fixes the
    // order results are collected in
    let mut results = Vec::with_capacity(handles.len());
    for (job, handle) in jobs.iter().zip(handles) {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!("Extraction task for {} failed: {}", job.name, e);
                results.push(job.failed(format!("extraction task failed: {e}")));
            }
        }
    }
    results
}

async fn remove_existing(destination: &Path) {
    match tokio::fs::remove_dir_all(destination).await {
        Ok(()) => info!("Removed existing directory before extraction: {}", destination.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        // extraction will report anything that actually blocks it
        Err(e) => warn!("Failed removing existing directory {}: {}", destination.display(), e),
    }
}
