//! Extraction results and the run manifest.
//!
//! The manifest is the contract with downstream loaders: one entry per
//! discovered archive, in discovery order, written once at the end of a
//! run as `manifest.json` (or `manifest_<timestamp>.json` inside a
//! directory). Archives found inside the GIS bundle are listed separately
//! under `nested`.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// Branch of the HCAD output tree an archive was extracted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// `gis_data/`: the GIS bundle and the shapefile archives inside it
    Gis,
    /// `pdata/`: every other property-data archive
    Pdata,
}

/// Outcome of extracting one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Path of the source archive.
    pub archive: PathBuf,
    /// Name shown in the manifest: the path relative to the input
    /// directory, `/`-separated.
    pub archive_name: String,
    pub destination: PathBuf,
    pub extracted_count: u64,
    /// Members refused by the path validator.
    pub skipped_count: u64,
    pub extracted_bytes: u64,
    pub error: Option<String>,
    /// Set only for the HCAD layout.
    pub category: Option<Category>,
}

/// One archive's line in the manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub archive: String,
    pub destination: PathBuf,
    pub extracted_count: u64,
    pub skipped_count: u64,
    pub extracted_bytes: u64,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl From<ExtractionResult> for ManifestEntry {
    fn from(result: ExtractionResult) -> Self {
        Self {
            archive: result.archive_name,
            destination: result.destination,
            extracted_count: result.extracted_count,
            skipped_count: result.skipped_count,
            extracted_bytes: result.extracted_bytes,
            error: result.error,
            category: result.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(with = "rfc3339_seconds")]
    pub generated_at: DateTime<Utc>,
    pub indir: PathBuf,
    pub outdir: PathBuf,
    pub archives: Vec<ManifestEntry>,
    /// Archives extracted out of other archives' output, in the order found.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<ManifestEntry>,
    /// Why the manifest file could not be written. Never persisted.
    #[serde(skip)]
    pub write_error: Option<String>,
}

impl Manifest {
    pub fn new(indir: &Path, outdir: &Path, results: Vec<ExtractionResult>) -> Self {
        Self {
            generated_at: Utc::now().trunc_subsecs(0),
            indir: indir.to_path_buf(),
            outdir: outdir.to_path_buf(),
            archives: results.into_iter().map(ManifestEntry::from).collect(),
            nested: Vec::new(),
            write_error: None,
        }
    }

    pub fn with_nested(mut self, results: Vec<ExtractionResult>) -> Self {
        self.nested = results.into_iter().map(ManifestEntry::from).collect();
        self
    }

    /// Top-level archives followed by nested ones.
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.archives.iter().chain(&self.nested)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries().filter(|a| a.error.is_some())
    }

    pub fn total_extracted(&self) -> u64 {
        self.entries().map(|a| a.extracted_count).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.entries().map(|a| a.skipped_count).sum()
    }

    /// True when there was at least one top-level archive and none
    /// succeeded.
    pub fn all_failed(&self) -> bool {
        !self.archives.is_empty() && self.archives.iter().all(|a| a.error.is_some())
    }

    /// Where the manifest lands for a requested `path`.
    ///
    /// An existing directory gets a timestamped file inside it, so repeated
    /// runs into the same directory keep their history.
    pub fn target_path(&self, path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(format!(
                "manifest_{}.json",
                self.generated_at.format("%Y%m%dT%H%M%SZ")
            ))
        } else {
            path.to_path_buf()
        }
    }

    /// Serialize to pretty JSON at `path` (see [`Manifest::target_path`]).
    ///
    /// Returns the path actually written.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        let target = self.target_path(path);
        let failed = |reason: String| ExtractError::ManifestWrite {
            path: target.clone(),
            reason,
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
            }
        }
        let mut json = serde_json::to_vec_pretty(self).map_err(|e| failed(e.to_string()))?;
        json.push(b'\n');
        std::fs::write(&target, json).map_err(|e| failed(e.to_string()))?;

        Ok(target)
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// `2025-01-01T00:00:00Z`: second precision keeps manifests diffable.
mod rfc3339_seconds {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result(name: &str, extracted: u64, skipped: u64, error: Option<&str>) -> ExtractionResult {
        ExtractionResult {
            archive: PathBuf::from("downloads").join(name),
            archive_name: name.to_string(),
            destination: PathBuf::from("extracted").join(name.trim_end_matches(".zip")),
            extracted_count: extracted,
            skipped_count: skipped,
            extracted_bytes: extracted * 10,
            error: error.map(str::to_string),
            category: None,
        }
    }

    fn sample() -> Manifest {
        let mut manifest = Manifest::new(
            Path::new("downloads"),
            Path::new("extracted"),
            vec![
                result("good.zip", 3, 0, None),
                result("traversal.zip", 1, 1, None),
                result("corrupt.zip", 0, 0, Some("Not a valid ZIP file")),
            ],
        );
        manifest.generated_at = Utc.with_ymd_and_hms(2025, 4, 1, 12, 30, 5).unwrap();
        manifest
    }

    #[test]
    fn json_layout() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["generated_at"], "2025-04-01T12:30:05Z");
        assert_eq!(value["indir"], "downloads");
        assert_eq!(value["outdir"], "extracted");

        let archives = value["archives"].as_array().unwrap();
        assert_eq!(archives.len(), 3);
        assert_eq!(archives[0]["archive"], "good.zip");
        assert_eq!(archives[0]["extracted_count"], 3);
        assert!(archives[0]["error"].is_null());
        assert_eq!(archives[1]["skipped_count"], 1);
        assert_eq!(archives[2]["error"], "Not a valid ZIP file");
    }

    #[test]
    fn summaries() {
        let manifest = sample();
        assert_eq!(manifest.total_extracted(), 4);
        assert_eq!(manifest.total_skipped(), 1);
        assert_eq!(manifest.failed().count(), 1);
        assert!(!manifest.all_failed());

        let none = Manifest::new(Path::new("a"), Path::new("b"), Vec::new());
        assert!(!none.all_failed());
    }

    #[test]
    fn nested_entries_count_towards_totals() {
        let mut parcels = result("gis_data/GIS_Public/Parcels.zip", 2, 0, None);
        parcels.category = Some(Category::Gis);
        let manifest = sample().with_nested(vec![parcels, result("bad.zip", 0, 1, Some("CRC"))]);

        assert_eq!(manifest.archives.len(), 3);
        assert_eq!(manifest.total_extracted(), 6);
        assert_eq!(manifest.total_skipped(), 2);
        assert_eq!(manifest.failed().count(), 2);

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["nested"][0]["category"], "gis");
        assert!(value["archives"][0].get("category").is_none());
        assert!(value.get("write_error").is_none());
    }

    #[test]
    fn flat_manifest_has_no_nested_key() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("nested").is_none());
    }

    #[test]
    fn write_to_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample();

        let file = dir.path().join("runs").join("manifest.json");
        assert_eq!(manifest.write(&file).unwrap(), file);
        assert_eq!(Manifest::read(&file).unwrap(), manifest);

        let written = manifest.write(dir.path()).unwrap();
        assert_eq!(written, dir.path().join("manifest_20250401T123005Z.json"));
        assert!(written.is_file());
    }
}
