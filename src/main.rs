//! Main entry point for the hcad-extract CLI application.
//!
//! `extract` unpacks every archive of a download directory into its own
//! subdirectory and records a manifest; `list` inspects a single archive.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use hcad_extract::cli::{Command, ExtractArgs, ListArgs};
use hcad_extract::extract::{ExtractOptions, extract_all, is_safe_member};
use hcad_extract::{Cli, ExtractError, LocalFileReader, ZipExtractor, logging};

/// Every archive failed, or the manifest could not be written.
const EXIT_FAILED: u8 = 1;
/// The input directory does not exist.
const EXIT_NO_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level()) {
        eprintln!("Failed to initialise logging: {e:#}");
    }

    let outcome = match &cli.command {
        Command::Extract(args) => run_extract(args).await,
        Command::List(args) => run_list(args).await.map(|()| ExitCode::SUCCESS),
    };

    outcome.unwrap_or_else(|e| {
        tracing::error!("{e:#}");
        ExitCode::from(EXIT_FAILED)
    })
}

/// Run the orchestrator and map its outcome to an exit code.
async fn run_extract(args: &ExtractArgs) -> Result<ExitCode> {
    let opts = ExtractOptions::from(args);

    let manifest = match extract_all(&opts).await {
        Ok(manifest) => manifest,
        Err(ExtractError::InputDirMissing(dir)) => {
            tracing::error!("Input directory does not exist: {}", dir.display());
            return Ok(ExitCode::from(EXIT_NO_INPUT));
        }
        Err(e @ ExtractError::NoArchivesFound { .. }) => {
            tracing::warn!("{e}");
            println!("Processed 0 archive(s) into '{}'", opts.outdir.display());
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            tracing::error!("{e}");
            return Ok(ExitCode::from(EXIT_FAILED));
        }
    };

    for failed in manifest.failed() {
        eprintln!(
            "  failed: {} ({})",
            failed.archive,
            failed.error.as_deref().unwrap_or_default()
        );
    }
    let nested = if manifest.nested.is_empty() {
        String::new()
    } else {
        format!(" and {} nested", manifest.nested.len())
    };
    println!(
        "Processed {} archive(s){} into '{}': {} member(s) extracted, {} unsafe member(s) skipped, {} archive(s) failed",
        manifest.archives.len(),
        nested,
        opts.outdir.display(),
        manifest.total_extracted(),
        manifest.total_skipped(),
        manifest.failed().count()
    );

    if manifest.write_error.is_some() || manifest.all_failed() {
        return Ok(ExitCode::from(EXIT_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}

/// List members of one archive.
///
/// The long format shows a table with sizes, compression ratio and
/// timestamps, and flags names the extractor would refuse.
async fn run_list(args: &ListArgs) -> Result<()> {
    let reader = Arc::new(LocalFileReader::new(&args.file)?);
    let extractor = ZipExtractor::new(reader);
    let entries = extractor.list_files().await?;

    if !args.long {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    // The verdict does not depend on the root, only on the member name
    let root = Path::new("/");
    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;
    let mut unsafe_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let safe = is_safe_member(&entry.file_name, root);
        if !safe {
            unsafe_count += 1;
        }

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}{}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name,
            if safe { "" } else { "  [UNSAFE: will be skipped]" }
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );
    println!("Total uncompressed: {}", format_size(total_uncompressed));
    if unsafe_count > 0 {
        tracing::warn!(
            "{}: {} member(s) have unsafe paths",
            args.file.display(),
            unsafe_count
        );
    }

    Ok(())
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
