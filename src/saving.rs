use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, SwiftError};
use crate::report::ProjectMetadata;
use crate::selection::Selections;

/// A half-filled form: project details plus the current picks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub metadata: ProjectMetadata,
    pub selections: Selections,
}

fn snapshot_error(path: &Path, err: impl std::fmt::Display) -> SwiftError {
    SwiftError::Snapshot(format!("{}: {}", path.display(), err))
}

/// Saves the form as gzip-compressed bincode.
pub fn save_state(state: &FormState, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| snapshot_error(path, e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, state).map_err(|e| snapshot_error(path, e))?;

    let encoder = writer
        .into_inner()
        .map_err(|e| snapshot_error(path, e.error()))?;
    let mut file = encoder.finish().map_err(|e| snapshot_error(path, e))?;
    file.flush().map_err(|e| snapshot_error(path, e))?;

    Ok(())
}

pub fn load_state(path: impl AsRef<Path>) -> Result<FormState> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| snapshot_error(path, e))?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let state: FormState = deserialize_from(&mut reader).map_err(|e| snapshot_error(path, e))?;

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn form_state_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.swift.gz");

        let mut metadata = ProjectMetadata::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        metadata.project_name = "US-36 Bridge".to_string();
        let state = FormState {
            metadata,
            selections: Selections::new()
                .with_county("Boulder")
                .with_species("Bat")
                .with_impact_checked("Roosting", false),
        };

        save_state(&state, &path).unwrap();
        assert_eq!(load_state(&path).unwrap(), state);
    }

    #[test]
    fn garbage_is_a_snapshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();
        assert!(matches!(load_state(&path), Err(SwiftError::Snapshot(_))));
    }

    #[test]
    fn missing_file_is_a_snapshot_error() {
        assert!(matches!(
            load_state("/no/such/form.gz"),
            Err(SwiftError::Snapshot(_))
        ));
    }
}
