use crate::config::DeliveryMode;
use crate::docx;
use crate::error::{Result, SwiftError};
use crate::report::ReportDocument;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where an assembled report should go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// Write `{directory}/SWIFT_{date}.docx`. The directory must already exist.
    Directory(PathBuf),
    /// Keep the encoded bytes in memory for a download link.
    Download,
}

impl From<&DeliveryMode> for DeliveryTarget {
    fn from(mode: &DeliveryMode) -> Self {
        match mode {
            DeliveryMode::File { directory } => DeliveryTarget::Directory(directory.clone()),
            DeliveryMode::Download => DeliveryTarget::Download,
        }
    }
}

/// An encoded report ready to be streamed to a browser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivered {
    Saved(PathBuf),
    Download(Download),
}

/// `{directory}/SWIFT_{date}.docx`
pub fn report_path(directory: &Path, document: &ReportDocument) -> PathBuf {
    directory.join(document.file_name())
}

/// Encodes the report and sends it to `target`.
///
/// # Examples
/// ```no_run
/// use swift::downloader::{deliver, DeliveryTarget};
/// # fn demo(doc: &swift::report::ReportDocument) -> swift::error::Result<()> {
/// deliver(doc, &DeliveryTarget::Directory("C:/SWIFT/Report".into()))?;
/// # Ok(())
/// # }
/// ```
pub fn deliver(document: &ReportDocument, target: &DeliveryTarget) -> Result<Delivered> {
    let bytes = docx::encode(document)?;

    match target {
        DeliveryTarget::Directory(directory) => {
            if !directory.is_dir() {
                return Err(SwiftError::Delivery(format!(
                    "{} is not an existing directory",
                    directory.display()
                )));
            }
            let path = report_path(directory, document);
            std::fs::write(&path, &bytes).map_err(|e| {
                SwiftError::Delivery(format!("could not write {}: {}", path.display(), e))
            })?;
            info!(path = %path.display(), bytes = bytes.len(), "report saved");
            Ok(Delivered::Saved(path))
        }
        DeliveryTarget::Download => {
            info!(
                file = %document.file_name(),
                bytes = bytes.len(),
                "report prepared for download"
            );
            Ok(Delivered::Download(Download {
                file_name: document.file_name(),
                content_type: docx::CONTENT_TYPE,
                bytes,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FinalSelections;
    use crate::report::{ProjectMetadata, assemble};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn report() -> ReportDocument {
        let meta = ProjectMetadata::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assemble(&meta, &FinalSelections::default())
    }

    #[test]
    fn saves_into_an_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let delivered = deliver(&report(), &DeliveryTarget::Directory(dir.path().into())).unwrap();

        let expected = dir.path().join("SWIFT_2024-01-01.docx");
        assert_eq!(delivered, Delivered::Saved(expected.clone()));
        assert!(std::fs::metadata(&expected).unwrap().len() > 0);
    }

    #[test]
    fn missing_directory_is_a_delivery_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = DeliveryTarget::Directory(dir.path().join("nope"));
        assert!(matches!(deliver(&report(), &target), Err(SwiftError::Delivery(_))));
    }

    #[test]
    fn download_carries_name_type_and_bytes() {
        match deliver(&report(), &DeliveryTarget::Download).unwrap() {
            Delivered::Download(download) => {
                assert_eq!(download.file_name, "SWIFT_2024-01-01.docx");
                assert_eq!(download.content_type, docx::CONTENT_TYPE);
                assert_eq!(&download.bytes[..2], b"PK");
            }
            other => panic!("expected a download, got {:?}", other),
        }
    }

    #[test]
    fn target_follows_configuration() {
        let mode = DeliveryMode::File {
            directory: PathBuf::from("out"),
        };
        assert_eq!(
            DeliveryTarget::from(&mode),
            DeliveryTarget::Directory(PathBuf::from("out"))
        );
        assert_eq!(
            DeliveryTarget::from(&DeliveryMode::Download),
            DeliveryTarget::Download
        );
    }
}
