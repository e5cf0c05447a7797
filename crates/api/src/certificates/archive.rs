//! Zip archives for batch certificate issuance.
//!
//! A batch archive holds one artifact per successful issuance plus
//! [`MANIFEST_FILE`], a JSON [`BatchManifest`] listing every success and
//! every failure.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use chrono::NaiveDate;
use serde::Serialize;
use tiketon_core::certificate::ArtifactFormat;
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the manifest entry inside every batch archive.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One certificate that was issued.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedItem {
    /// Participant id (event batch) or scanner id (scanner batch).
    pub id: DbId,
    pub scanner_id: DbId,
    pub file: String,
    /// Rounded hours printed on the certificate.
    pub hours: i64,
    /// Exact pending hours that were reset to zero.
    pub hours_claimed: f64,
}

/// One certificate that could not be issued.
#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub id: DbId,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchManifest {
    pub issued_on: NaiveDate,
    pub format: ArtifactFormat,
    pub issued: Vec<IssuedItem>,
    pub failed: Vec<FailedItem>,
}

/// Collects batch results and writes the archive.
pub struct ArchiveBuilder {
    manifest: BatchManifest,
    files: Vec<(String, Vec<u8>)>,
    names: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new(issued_on: NaiveDate, format: ArtifactFormat) -> Self {
        Self {
            manifest: BatchManifest {
                issued_on,
                format,
                issued: Vec::new(),
                failed: Vec::new(),
            },
            files: Vec::new(),
            names: HashSet::from([MANIFEST_FILE.to_string()]),
        }
    }

    /// Add an issued artifact. Clashing file names get a numeric suffix.
    pub fn add_issued(&mut self, mut item: IssuedItem, bytes: Vec<u8>) {
        let file = self.unique_name(&item.file);
        item.file = file.clone();
        self.manifest.issued.push(item);
        self.files.push((file, bytes));
    }

    pub fn add_failure(&mut self, id: DbId, error: impl ToString) {
        self.manifest.failed.push(FailedItem {
            id,
            error: error.to_string(),
        });
    }

    pub fn issued_count(&self) -> usize {
        self.manifest.issued.len()
    }

    pub fn failed_count(&self) -> usize {
        self.manifest.failed.len()
    }

    /// Write the zip. Fails with `NoHoursAvailable` when nothing was issued.
    pub fn finish(self) -> Result<Vec<u8>, CoreError> {
        if self.manifest.issued.is_empty() {
            return Err(CoreError::NoHoursAvailable);
        }

        let manifest = serde_json::to_vec_pretty(&self.manifest)
            .map_err(|e| CoreError::Internal(format!("Failed to encode manifest: {e}")))?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in self
            .files
            .iter()
            .map(|(n, b)| (n.as_str(), b.as_slice()))
            .chain(std::iter::once((MANIFEST_FILE, manifest.as_slice())))
        {
            zip.start_file(name, options).map_err(archive_error)?;
            zip.write_all(bytes)
                .map_err(|e| archive_error(zip::result::ZipError::Io(e)))?;
        }
        let cursor = zip.finish().map_err(archive_error)?;
        Ok(cursor.into_inner())
    }

    fn unique_name(&mut self, wanted: &str) -> String {
        if self.names.insert(wanted.to_string()) {
            return wanted.to_string();
        }
        let (stem, ext) = match wanted.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{ext}")),
            None => (wanted, String::new()),
        };
        let mut n = 2;
        loop {
            let candidate = format!("{stem}_{n}{ext}");
            if self.names.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn archive_error(err: zip::result::ZipError) -> CoreError {
    CoreError::Internal(format!("Failed to build certificate archive: {err}"))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use assert_matches::assert_matches;

    use super::*;

    fn item(id: DbId, file: &str) -> IssuedItem {
        IssuedItem {
            id,
            scanner_id: id,
            file: file.to_string(),
            hours: 4,
            hours_claimed: 4.0,
        }
    }

    fn builder() -> ArchiveBuilder {
        ArchiveBuilder::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), ArtifactFormat::Txt)
    }

    #[test]
    fn archive_contains_artifacts_and_manifest() {
        let mut builder = builder();
        builder.add_issued(item(1, "certificate_Abenova.txt"), b"one".to_vec());
        builder.add_issued(item(2, "certificate_Abenova.txt"), b"two".to_vec());
        builder.add_failure(3, "No hours available to certify");
        assert_eq!(builder.issued_count(), 2);
        assert_eq!(builder.failed_count(), 1);

        let bytes = builder.finish().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut second = String::new();
        archive
            .by_name("certificate_Abenova_2.txt")
            .unwrap()
            .read_to_string(&mut second)
            .unwrap();
        assert_eq!(second, "two");

        let mut manifest = String::new();
        archive
            .by_name(MANIFEST_FILE)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["issued"].as_array().unwrap().len(), 2);
        assert_eq!(manifest["issued"][1]["file"], "certificate_Abenova_2.txt");
        assert_eq!(manifest["failed"][0]["id"], 3);
        assert_eq!(manifest["format"], "txt");
    }

    #[test]
    fn empty_batch_has_no_hours() {
        let mut builder = builder();
        builder.add_failure(1, "No hours available to certify");
        assert_matches!(builder.finish(), Err(CoreError::NoHoursAvailable));
    }

    #[test]
    fn manifest_name_is_reserved() {
        let mut builder = builder();
        assert_eq!(builder.unique_name(MANIFEST_FILE), "manifest_2.json");
    }
}
