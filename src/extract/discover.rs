//! Archive discovery and destination assignment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::glob::{glob_match, has_glob_chars};

use super::safety::is_safe_member;

/// File extensions recognised as archives, compared case-insensitively.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

/// Directory name for archives whose stem cannot name a directory, such as
/// `...zip` (stem `..`).
pub const FALLBACK_DIR_NAME: &str = "archive";

/// An archive found under the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArchive {
    pub path: PathBuf,
    /// Path relative to the input directory, always `/`-separated.
    pub relative: String,
}

impl DiscoveredArchive {
    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.relative.clone())
    }

    /// Name of the archive's extraction directory: the stem when it is a
    /// single plain path component, [`FALLBACK_DIR_NAME`] otherwise.
    pub fn dir_name(&self) -> String {
        let stem = self.stem();
        if is_plain_name(&stem) {
            stem
        } else {
            FALLBACK_DIR_NAME.to_string()
        }
    }
}

/// One normal path component: no separators, not `.` or `..`, no drive.
fn is_plain_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && is_safe_member(name, Path::new("/"))
}

/// Recursively find archives under `indir`, sorted by relative path.
///
/// With a `pattern`, an archive is kept when the pattern matches either its
/// file name or its relative path. A pattern without wildcards must match
/// one of them exactly.
pub fn discover_archives(indir: &Path, pattern: Option<&str>) -> Vec<DiscoveredArchive> {
    let mut found = Vec::new();

    for entry in WalkDir::new(indir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path under {}: {}", indir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_archive(entry.path()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(indir) else {
            continue;
        };
        let relative = slash_path(relative);
        let file_name = entry.file_name().to_string_lossy();

        if let Some(pattern) = pattern {
            if !matches_pattern(pattern, &file_name, &relative) {
                debug!("{} does not match {}", relative, pattern);
                continue;
            }
        }

        found.push(DiscoveredArchive {
            path: entry.into_path(),
            relative,
        });
    }

    found.sort_by(|a, b| a.relative.cmp(&b.relative));
    found
}

/// `path` with its components joined by `/` on every platform.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.as_str()))
}

fn matches_pattern(pattern: &str, file_name: &str, relative: &str) -> bool {
    if has_glob_chars(pattern) {
        glob_match(pattern, file_name) || glob_match(pattern, relative)
    } else {
        pattern == file_name || pattern == relative
    }
}

/// Hands out extraction directories so that no two archives share one.
///
/// Names are compared case-insensitively so the policy holds on
/// case-folding filesystems too. The first archive to ask for a name under
/// a given root keeps it; later ones get `-2`, `-3`, ... appended.
#[derive(Debug, Default)]
pub struct Destinations {
    /// Lower-cased destination path to the archive that holds it.
    taken: HashMap<String, String>,
}

impl Destinations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a subdirectory of `root` for `archive`.
    pub fn assign(&mut self, archive: &DiscoveredArchive, root: &Path) -> PathBuf {
        let base = archive.dir_name();
        if base != archive.stem() {
            warn!(
                "{} cannot name a directory; extracting it into {:?}",
                archive.relative, base
            );
        }

        let mut name = base.clone();
        let mut n = 1;
        while self.taken.contains_key(&key(root, &name)) {
            n += 1;
            name = format!("{base}-{n}");
        }
        if let Some(first) = self.taken.get(&key(root, &base)).filter(|_| n > 1) {
            warn!(
                "{} and {} share the name {:?}; extracting the former into {:?}",
                archive.relative, first, base, name
            );
        }

        self.taken.insert(key(root, &name), archive.relative.clone());
        root.join(name)
    }
}

fn key(root: &Path, name: &str) -> String {
    root.join(name).to_string_lossy().to_lowercase()
}

/// Give every archive its own subdirectory of `outdir`, named after its
/// stem, in the order given.
pub fn assign_destinations(archives: &[DiscoveredArchive], outdir: &Path) -> Vec<PathBuf> {
    let mut destinations = Destinations::new();
    archives
        .iter()
        .map(|archive| destinations.assign(archive, outdir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn names(found: &[DiscoveredArchive]) -> Vec<&str> {
        found.iter().map(|a| a.relative.as_str()).collect()
    }

    #[test]
    fn finds_archives_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Real_acct_owner.zip");
        touch(dir.path(), "GIS_Public.ZIP");
        touch(dir.path(), "2025/Hearing_files.zip");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "zip");

        let found = discover_archives(dir.path(), None);
        assert_eq!(
            names(&found),
            ["2025/Hearing_files.zip", "GIS_Public.ZIP", "Real_acct_owner.zip"]
        );
        assert_eq!(found[1].stem(), "GIS_Public");
    }

    #[test]
    fn pattern_matches_name_or_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Real_acct_owner.zip");
        touch(dir.path(), "Real_building_land.zip");
        touch(dir.path(), "2025/Hearing_files.zip");

        let owner = discover_archives(dir.path(), Some("*owner*.zip"));
        assert_eq!(names(&owner), ["Real_acct_owner.zip"]);

        let nested = discover_archives(dir.path(), Some("2025/*"));
        assert_eq!(names(&nested), ["2025/Hearing_files.zip"]);

        let exact = discover_archives(dir.path(), Some("Hearing_files.zip"));
        assert_eq!(names(&exact), ["2025/Hearing_files.zip"]);

        assert!(discover_archives(dir.path(), Some("*.7z")).is_empty());
    }

    #[test]
    fn colliding_stems_get_suffixes() {
        let archives: Vec<_> = ["a/data.zip", "b/DATA.zip", "c/data.zip", "data-2.zip"]
            .iter()
            .map(|rel| DiscoveredArchive {
                path: PathBuf::from("in").join(rel),
                relative: rel.to_string(),
            })
            .collect();

        let dest = assign_destinations(&archives, Path::new("out"));
        assert_eq!(
            dest,
            [
                PathBuf::from("out/data"),
                PathBuf::from("out/DATA-2"),
                PathBuf::from("out/data-3"),
                PathBuf::from("out/data-2-2"),
            ]
        );
    }

    fn archive(rel: &str) -> DiscoveredArchive {
        DiscoveredArchive {
            path: PathBuf::from("in").join(rel),
            relative: rel.to_string(),
        }
    }

    #[test]
    fn dot_stems_stay_inside_outdir() {
        assert_eq!(archive("...zip").stem(), "..");
        assert_eq!(archive("..zip").stem(), ".");

        let archives = [archive("...zip"), archive("..zip"), archive("archive.zip")];
        let dest = assign_destinations(&archives, Path::new("out"));
        assert_eq!(
            dest,
            [
                PathBuf::from("out/archive"),
                PathBuf::from("out/archive-2"),
                PathBuf::from("out/archive-3"),
            ]
        );
    }

    #[test]
    fn odd_but_plain_stems_are_kept() {
        assert_eq!(archive(".zip").dir_name(), ".zip");
        assert_eq!(archive("a b.zip").dir_name(), "a b");
        assert_eq!(archive("back\\slash.zip").dir_name(), FALLBACK_DIR_NAME);
        assert_eq!(archive("C:.zip").dir_name(), FALLBACK_DIR_NAME);
    }

    #[test]
    fn roots_are_separate_namespaces() {
        let mut destinations = Destinations::new();
        let gis = Path::new("out/gis_data");
        let pdata = Path::new("out/pdata");
        assert_eq!(destinations.assign(&archive("a/x.zip"), gis), gis.join("x"));
        assert_eq!(destinations.assign(&archive("b/x.zip"), pdata), pdata.join("x"));
        assert_eq!(destinations.assign(&archive("c/X.zip"), gis), gis.join("X-2"));
    }
}
