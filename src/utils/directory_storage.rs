// timegate-service/src/utils/directory_storage.rs
use crate::utils::team_directory::{apply_write, pad_row, ColumnRange, DirectoryError, Row, TeamDirectory};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// On-disk shape of the directory file
#[derive(Serialize, Deserialize, Debug, Default)]
struct DirectoryFile {
    rows: Vec<Row>,
}

/// Team directory persisted as a single JSON document.
///
/// Writes are serialized by a process-wide mutex and land through a temp file
/// plus rename, so readers never observe a half-written document.
pub struct JsonFileDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileDirectory {
    // Open the directory file, creating an empty one if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating directory storage folder: {}", parent.display());
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create storage folder: {:?}", e);
                    DirectoryError::Unavailable(e.to_string())
                })?;
            }
        }

        let directory = Self {
            path,
            write_lock: Mutex::new(()),
        };

        if !directory.path.exists() {
            info!("No team directory at {}, starting empty", directory.path.display());
            directory.persist(&DirectoryFile::default())?;
        }

        Ok(directory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<DirectoryFile, DirectoryError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read team directory: {:?}", e);
            DirectoryError::Unavailable(e.to_string())
        })?;

        let mut file: DirectoryFile = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse team directory JSON: {:?}", e);
            DirectoryError::Unavailable(format!("malformed directory file: {}", e))
        })?;

        for row in file.rows.iter_mut() {
            pad_row(row);
        }

        Ok(file)
    }

    fn persist(&self, file: &DirectoryFile) -> Result<(), DirectoryError> {
        let json = serde_json::to_string_pretty(file).map_err(|e| {
            error!("Failed to serialize team directory: {:?}", e);
            DirectoryError::Unavailable(e.to_string())
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| {
            error!("Failed to write team directory: {:?}", e);
            DirectoryError::Unavailable(e.to_string())
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            error!("Failed to replace team directory: {:?}", e);
            DirectoryError::Unavailable(e.to_string())
        })?;

        debug!("Persisted team directory ({} rows)", file.rows.len());
        Ok(())
    }
}

impl TeamDirectory for JsonFileDirectory {
    fn read_all(&self) -> Result<Vec<Row>, DirectoryError> {
        Ok(self.load()?.rows)
    }

    fn write_range(
        &self,
        team_name: &str,
        range: ColumnRange,
        values: &[String],
        expected_revision: Option<&str>,
    ) -> Result<String, DirectoryError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| DirectoryError::Unavailable(format!("Lock error: {:?}", e)))?;

        let mut file = self.load()?;
        let revision = apply_write(&mut file.rows, team_name, range, values, expected_revision)?;
        self.persist(&file)?;

        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::team_directory::{columns, find_team_for_email};
    use serde_json::json;
    use uuid::Uuid;

    fn temp_directory_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("timegate_{}", Uuid::new_v4()))
            .join("directory.json")
    }

    #[test]
    fn creates_missing_file_and_reads_roster() {
        let path = temp_directory_path();
        let directory = JsonFileDirectory::open(&path).unwrap();
        assert!(path.exists());
        assert!(directory.read_all().unwrap().is_empty());

        // Roster provisioning happens outside the service; short rows are padded
        fs::write(
            &path,
            json!({ "rows": [["Falcon", "a@falcon.io"], ["Falcon", "b@falcon.io"]] }).to_string(),
        )
        .unwrap();

        let rows = directory.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), columns::WIDTH);

        let team = find_team_for_email(&directory, "b@falcon.io").unwrap();
        assert_eq!(team.team_name, "Falcon");

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn writes_survive_reopen_and_respect_revisions() {
        let path = temp_directory_path();
        let directory = JsonFileDirectory::open(&path).unwrap();
        fs::write(&path, json!({ "rows": [["Falcon", "a@falcon.io"]] }).to_string()).unwrap();

        let range = ColumnRange::new(columns::FIRST_SCANNER, columns::STATUS);
        let values = vec!["a@falcon.io".to_string(), "Active".to_string()];
        let revision = directory.write_range("Falcon", range, &values, Some("")).unwrap();

        let stale = directory.write_range("Falcon", range, &values, Some(""));
        assert!(matches!(stale, Err(DirectoryError::Conflict { .. })));

        let reopened = JsonFileDirectory::open(directory.path()).unwrap();
        let rows = reopened.read_all().unwrap();
        assert_eq!(rows[0][columns::REVISION], revision);
        assert_eq!(rows[0][columns::STATUS], "Active");

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn corrupt_file_is_reported_as_unavailable() {
        let path = temp_directory_path();
        let directory = JsonFileDirectory::open(&path).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(matches!(directory.read_all(), Err(DirectoryError::Unavailable(_))));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
