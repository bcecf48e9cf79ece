//! ZIP archive parsing and member streaming.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Streams member data out of an archive
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The Central Directory is authoritative: member names, sizes and order
//! all come from it, and local headers are only consulted to find where a
//! member's data starts.
//!
//! Nothing in this module touches destination paths. Member names are
//! reported verbatim; deciding whether a name is safe to write is the job
//! of [`crate::extract::safety`].
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods, CRC-32 verified
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::{StreamError, ZipExtractor};
pub use parser::ZipParser;
pub use structures::*;
