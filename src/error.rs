//! Error types for archive extraction.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Input directory does not exist: {}", .0.display())]
    InputDirMissing(PathBuf),

    #[error("No archives matching {pattern} found in {}", .indir.display())]
    NoArchivesFound { indir: PathBuf, pattern: String },

    #[error("Cannot open archive {}: {reason}", .archive.display())]
    ArchiveOpen { archive: PathBuf, reason: String },

    #[error("Cannot prepare destination {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write member {member}: {source}")]
    MemberWrite {
        member: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode member {member}: {reason}")]
    MemberData { member: String, reason: String },

    #[error("Failed to write manifest {}: {reason}", .path.display())]
    ManifestWrite { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
