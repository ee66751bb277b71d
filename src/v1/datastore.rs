use std::{collections::HashMap, io, sync::Arc};

use thiserror::Error;

use super::{resource::StateRecord, storage::file::FileStorage};

#[derive(Clone)]
pub struct Datastore {
    inner: HashMap<String, Vec<u8>>,
    storage: Arc<dyn Storage + Send + Sync>,
}

impl Default for Datastore {
    fn default() -> Self {
        Datastore::new(FileStorage::default())
    }
}

pub trait Storage {
    fn load(&self) -> Result<HashMap<String, Vec<u8>>, DatastoreError>;
    fn save(&self, data: &HashMap<String, Vec<u8>>) -> Result<(), DatastoreError>;
}

impl Datastore {
    pub fn new(storage: impl Storage + 'static + Send + Sync) -> Self {
        Self {
            inner: Default::default(),
            storage: Arc::new(storage),
        }
    }

    pub fn reload(&mut self) -> Result<HashMap<String, Vec<u8>>, DatastoreError> {
        tracing::debug!("Loading state from storage");
        self.storage
            .load()
            .map_err(|e| DatastoreError::LoadError(e.to_string()))
            .inspect(|h| {
                for k in h.keys() {
                    tracing::debug!("Resource[{}] loaded from state", k);
                }
            })
            .map(|data| std::mem::replace(&mut self.inner, data))
    }

    pub fn save(&self) -> Result<(), DatastoreError> {
        tracing::debug!("Saving {} state records", self.inner.len());
        self.storage.save(&self.inner)
    }

    pub fn insert_record(&mut self, record: &StateRecord) -> Result<Option<StateRecord>, DatastoreError> {
        tracing::debug!("Insert Resource[{}] to state", record.address);
        let bytes = serde_json::to_vec(record)?;
        self.inner
            .insert(record.address.clone(), bytes)
            .map(|previous| serde_json::from_slice(&previous))
            .transpose()
            .map_err(DatastoreError::JsonError)
    }

    pub fn get(&self, address: &str) -> Result<Option<StateRecord>, DatastoreError> {
        self.inner
            .get(address)
            .map(|data| serde_json::from_slice(data))
            .transpose()
            .map_err(DatastoreError::JsonError)
    }

    pub fn remove(&mut self, address: &str) -> Option<Vec<u8>> {
        tracing::debug!("Remove Resource[{}] from state", address);
        self.inner.remove(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.contains_key(address)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn records(&self) -> Result<Vec<StateRecord>, DatastoreError> {
        self.keys()
            .iter()
            .filter_map(|key| self.get(key).transpose())
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("Load Error error: {0}")]
    LoadError(String),
    #[error("IO Error error: {0}")]
    IOError(#[from] io::Error),
    #[error("Serialization or deserialization error: {0}")]
    BincodeError(#[from] bincode::Error),
    #[error("Serialization or deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
