//! # File Picker Rules
//!
//! The upload session never inspects the files it is given; rejecting
//! oversized or unsupported files is the picker's job. These rules mirror the
//! drop zone the upload modal used: at most 30 MiB and a fixed MIME allow-list
//! covering images, documents, spreadsheets, presentations, archives, video
//! and executables.
//!
//! When several files are dropped at once only the first accepted one is kept.

use log::warn;
use std::path::Path;

use crate::common::config::PickerConfig;
use crate::common::error::PickError;
use crate::common::file::SelectedFile;

/// Extension → MIME type for every type the picker accepts by default.
const KNOWN_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("pdf", "application/pdf"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("csv", "text/csv"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("doc", "application/msword"),
    ("exe", "application/vnd.microsoft.portable-executable"),
    ("mp4", "video/mp4"),
    ("heic", "image/heic"),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("zip", "application/zip"),
];

/// Guess a MIME type from a file name's extension.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    KNOWN_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// The default MIME allow-list.
pub fn default_accepted_types() -> Vec<String> {
    let mut types: Vec<String> = KNOWN_TYPES.iter().map(|(_, m)| m.to_string()).collect();
    types.dedup();
    types
}

/// A file offered to the picker but not yet accepted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    /// Type declared by the sender, if any
    pub declared_type: Option<String>,
    pub contents: Vec<u8>,
}

/// Size and type limits applied to picked files.
#[derive(Debug, Clone)]
pub struct PickerRules {
    max_size: u64,
    accepted: Vec<String>,
}

impl PickerRules {
    pub fn new(max_size: u64, accepted: Vec<String>) -> Self {
        Self { max_size, accepted }
    }

    pub fn from_config(config: &PickerConfig) -> Self {
        Self::new(
            config.max_size_bytes,
            config
                .accepted_types
                .clone()
                .unwrap_or_else(default_accepted_types),
        )
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Decide the MIME type for a file and check it against the limits.
    ///
    /// A declared type wins over the extension unless it is missing or the
    /// generic `application/octet-stream`.
    pub fn check(&self, name: &str, declared_type: Option<&str>, size: u64) -> Result<String, PickError> {
        if size > self.max_size {
            return Err(PickError::TooLarge {
                size,
                max: self.max_size,
            });
        }

        let mime = declared_type
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "application/octet-stream")
            .map(|t| t.to_ascii_lowercase())
            .or_else(|| mime_for_name(name).map(str::to_string))
            .ok_or_else(|| PickError::UnsupportedType(name.to_string()))?;

        if !self.accepted.iter().any(|a| a.eq_ignore_ascii_case(&mime)) {
            return Err(PickError::UnsupportedType(mime));
        }

        Ok(mime)
    }

    /// Accept a single in-memory file.
    pub fn accept(&self, candidate: Candidate) -> Result<SelectedFile, PickError> {
        let mime = self.check(
            &candidate.name,
            candidate.declared_type.as_deref(),
            candidate.contents.len() as u64,
        )?;
        Ok(SelectedFile::new(candidate.name, mime, candidate.contents))
    }

    /// Keep the first acceptable file out of a drop of several.
    ///
    /// # Errors
    /// - [`PickError::NoFiles`] if nothing was dropped
    /// - the first rejection, if every candidate was rejected
    pub fn pick_first<I>(&self, candidates: I) -> Result<SelectedFile, PickError>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut first_error = None;

        for candidate in candidates {
            let name = candidate.name.clone();
            match self.accept(candidate) {
                Ok(file) => return Ok(file),
                Err(e) => {
                    warn!("Rejected {}: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(first_error.unwrap_or(PickError::NoFiles))
    }

    /// Pick a file from disk. The size is checked before the file is read.
    pub async fn pick_path(&self, path: &Path) -> Result<SelectedFile, PickError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(PickError::NoFiles)?
            .to_string();

        let size = tokio::fs::metadata(path).await?.len();
        let mime = self.check(&name, None, size)?;
        let contents = tokio::fs::read(path).await?;

        Ok(SelectedFile::new(name, mime, contents))
    }
}

impl Default for PickerRules {
    fn default() -> Self {
        Self::from_config(&PickerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, declared: Option<&str>, len: usize) -> Candidate {
        Candidate {
            name: name.to_string(),
            declared_type: declared.map(str::to_string),
            contents: vec![0u8; len],
        }
    }

    #[test]
    fn guesses_from_extension_case_insensitively() {
        assert_eq!(mime_for_name("report.PDF"), Some("application/pdf"));
        assert_eq!(mime_for_name("photo.jpg"), Some("image/jpeg"));
        assert_eq!(mime_for_name("README"), None);
        assert_eq!(mime_for_name("notes.txt"), None);
    }

    #[test]
    fn default_allow_list_has_seventeen_types() {
        assert_eq!(default_accepted_types().len(), 17);
    }

    #[test]
    fn enforces_thirty_mib_limit() {
        let rules = PickerRules::default();
        assert_eq!(rules.max_size(), 30 * 1024 * 1024);
        assert!(rules.check("a.png", None, 30 * 1024 * 1024).is_ok());
        assert!(matches!(
            rules.check("a.png", None, 30 * 1024 * 1024 + 1),
            Err(PickError::TooLarge { .. })
        ));
    }

    #[test]
    fn declared_type_wins_unless_generic() {
        let rules = PickerRules::default();
        assert_eq!(rules.check("blob", Some("image/webp"), 1).unwrap(), "image/webp");
        assert_eq!(
            rules.check("a.zip", Some("application/octet-stream"), 1).unwrap(),
            "application/zip"
        );
        assert!(matches!(
            rules.check("a.png", Some("text/plain"), 1),
            Err(PickError::UnsupportedType(_))
        ));
    }

    #[test]
    fn pick_first_skips_rejected_files() {
        let rules = PickerRules::default();
        let file = rules
            .pick_first(vec![
                candidate("notes.txt", None, 4),
                candidate("report.pdf", None, 8),
                candidate("photo.png", None, 2),
            ])
            .unwrap();
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.size(), 8);
    }

    #[test]
    fn pick_first_reports_first_rejection_or_nothing() {
        let rules = PickerRules::new(4, default_accepted_types());
        assert!(matches!(
            rules.pick_first(vec![candidate("big.png", None, 5), candidate("x.txt", None, 1)]),
            Err(PickError::TooLarge { size: 5, max: 4 })
        ));
        assert!(matches!(rules.pick_first(Vec::new()), Err(PickError::NoFiles)));
    }

    #[tokio::test]
    async fn pick_path_reads_accepted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();

        let file = PickerRules::default().pick_path(&path).await.unwrap();
        assert_eq!(file.name(), "sheet.csv");
        assert_eq!(file.mime(), "text/csv");
        assert_eq!(file.contents(), b"a,b\n1,2\n");
    }
}
