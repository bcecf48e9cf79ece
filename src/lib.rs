//! # hcad-extract
//!
//! Safe, parallel extraction of the Harris County Appraisal District (HCAD)
//! public data archives.
//!
//! The CAMA and GIS downloads arrive as a directory of ZIP archives. This
//! crate unpacks each one into its own subdirectory of an output tree,
//! refuses member names that would land outside that subdirectory
//! (zip-slip), and records a JSON manifest describing what happened to
//! every archive so downstream loaders can check counts.
//!
//! ## Features
//!
//! - In-crate ZIP reader: ZIP64, STORED and DEFLATE, CRC-32 verified
//! - Lexical path validation of every member before anything is written
//! - Bounded worker pool, one archive per task, with per-archive failure isolation
//! - Manifest in discovery order, written once after all workers finish
//! - Optional HCAD layout: `gis_data/` with the GIS bundle's inner archives unpacked, `pdata/` for the rest
//!
//! ## Example
//!
//! ```no_run
//! use hcad_extract::extract::{ExtractOptions, extract_all};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut opts = ExtractOptions::new("downloads/2025", "extracted");
//!     opts.workers = 4;
//!     opts.manifest = Some("extracted/manifest.json".into());
//!
//!     let manifest = extract_all(&opts).await?;
//!     for archive in &manifest.archives {
//!         println!("{}: {} extracted, {} skipped", archive.archive,
//!                  archive.extracted_count, archive.skipped_count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod extract;
pub mod glob;
pub mod io;
pub mod logging;
pub mod zip;

pub use cli::Cli;
pub use error::ExtractError;
pub use extract::{
    ExtractOptions, ExtractionResult, Layout, Manifest, extract_all, extract_archive, is_safe_member,
};
pub use io::{LocalFileReader, ReadAt, SliceReader};
pub use zip::{ZipExtractor, ZipFileEntry};
