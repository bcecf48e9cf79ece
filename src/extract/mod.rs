//! Safe extraction of archive directories.
//!
//! - [`safety`]: decides whether a member name may be written below a root
//! - [`archive`]: extracts one archive, consulting the validator per member
//! - [`discover`]: finds archives and assigns each its own directory
//! - [`orchestrator`]: extracts discovered archives on a bounded pool
//! - [`manifest`]: per-archive results and the JSON run manifest

pub mod archive;
pub mod discover;
pub mod manifest;
pub mod orchestrator;
pub mod safety;

pub use archive::{extract_archive, extract_from};
pub use discover::{Destinations, DiscoveredArchive, FALLBACK_DIR_NAME, assign_destinations, discover_archives};
pub use manifest::{Category, ExtractionResult, Manifest, ManifestEntry};
pub use orchestrator::{ExtractOptions, GIS_BUNDLE, GIS_DIR, Layout, PDATA_DIR, extract_all};
pub use safety::{is_safe_member, is_within, resolve_member};
