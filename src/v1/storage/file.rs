//! State file on local disk.
//!
//! Layout: the `RSPS` magic, a little-endian `u32` format version, then the
//! bincode-encoded records sorted by address. Saves go through a sibling
//! temporary file that is renamed over the state file, so a crash mid-write
//! leaves the previous state intact.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::v1::datastore::{DatastoreError, Storage};

pub const DEFAULT_STATE_FILE: &str = "rsprovider.state";

const MAGIC: &[u8; 4] = b"RSPS";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scratch_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn decode(&self, bytes: &[u8]) -> Result<HashMap<String, Vec<u8>>, DatastoreError> {
        let header = bytes
            .get(..HEADER_LEN)
            .filter(|header| header.starts_with(MAGIC))
            .ok_or_else(|| {
                DatastoreError::LoadError(format!("{} is not a state file", self.path.display()))
            })?;
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != FORMAT_VERSION {
            return Err(DatastoreError::LoadError(format!(
                "{} has state format {}, expected {}",
                self.path.display(),
                version,
                FORMAT_VERSION
            )));
        }
        Ok(bincode::deserialize(&bytes[HEADER_LEN..])?)
    }

    fn encode(data: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>, DatastoreError> {
        let sorted: BTreeMap<&String, &Vec<u8>> = data.iter().collect();
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::serialize_into(&mut bytes, &sorted)?;
        Ok(bytes)
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<HashMap<String, Vec<u8>>, DatastoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let records = self.decode(&bytes)?;
                tracing::debug!("Read {} records from {}", records.len(), self.path.display());
                Ok(records)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No state at {}, starting empty", self.path.display());
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, data: &HashMap<String, Vec<u8>>) -> Result<(), DatastoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = Self::encode(data)?;
        let scratch = self.scratch_path();
        let written = fs::File::create(&scratch).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&scratch, &self.path)) {
            let _ = fs::remove_file(&scratch);
            return Err(e.into());
        }
        tracing::debug!("Wrote {} records to {}", data.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> HashMap<String, Vec<u8>> {
        HashMap::from([
            ("aws_cloudwatch_log_group.b".to_string(), vec![2, 2]),
            ("aws_cloudwatch_log_group.a".to_string(), vec![1]),
        ])
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("state"));
        storage.save(&records()).unwrap();
        assert_eq!(storage.load().unwrap(), records());

        let names: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["state".to_string()]);
    }

    #[test]
    fn output_does_not_depend_on_insertion_order() {
        let mut entries: Vec<_> = records().into_iter().collect();
        entries.sort();
        let forward: HashMap<_, _> = entries.iter().cloned().collect();
        let reversed: HashMap<_, _> = entries.into_iter().rev().collect();
        assert_eq!(
            FileStorage::encode(&forward).unwrap(),
            FileStorage::encode(&reversed).unwrap()
        );
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn foreign_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, b"{\"not\": \"state\"}").unwrap();
        let err = FileStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, DatastoreError::LoadError(_)));
        assert!(err.to_string().contains("is not a state file"));
    }

    #[test]
    fn other_format_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let mut bytes = FileStorage::encode(&records()).unwrap();
        bytes[4..HEADER_LEN].copy_from_slice(&2u32.to_le_bytes());
        fs::write(&path, bytes).unwrap();
        let err = FileStorage::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("state format 2, expected 1"));
    }

    #[test]
    fn save_replaces_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));
        storage.save(&records()).unwrap();
        storage.save(&HashMap::new()).unwrap();
        assert!(storage.load().unwrap().is_empty());
    }
}
