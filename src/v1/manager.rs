use thiserror::Error;

pub trait ResourceManager<Input, Output>: Send + Sync {
    fn lookup(&self, id: &str) -> Result<Option<Output>, ManagerError>;
    /// Finds an object that already exists under the identity the input names.
    /// Objects whose identity is assigned by the service never match.
    fn lookup_by_input(&self, _input: &Input) -> Result<Option<Output>, ManagerError> {
        Ok(None)
    }
    fn create(&self, input: &mut Input) -> Result<Output, ManagerError>;
    fn delete(&self, latest: &Output) -> Result<bool, ManagerError>;
    fn syncup(&self, latest: &Output, input: &mut Input) -> Result<Option<Output>, ManagerError>;
    fn ensure_absent(&self, id: &str, latest: &Output) -> Result<bool, ManagerError> {
        match self.lookup(id) {
            Ok(Some(_)) => self.delete(latest),
            Ok(None) => Ok(false),
            Err(err) => Err(err),
        }
    }
    fn ensure_present(&self, id: Option<&str>, input: &mut Input) -> Result<Output, ManagerError> {
        let latest = match id {
            Some(id) => self.lookup(id)?,
            None => None,
        };
        let actual = self.lookup_by_input(input)?;
        match actual.or(latest) {
            Some(output) => self.syncup(&output, input).map(|response| match response {
                Some(output) => output,
                None => output,
            }),
            None => self.create(input),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ManagerError {
    #[error("DeleteFail: {0}")]
    DeleteFail(String),
    #[error("CreateFail: {0}")]
    CreateFail(String),
    #[error("UpdateFail: {0}")]
    UpdateFail(String),
    #[error("LookupFail: {0}")]
    LookupFail(String),
    #[error("CannotSyncWithoutRecreate: {0}")]
    CannotSyncWithoutRecreate(String),
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("InvalidInput: {0}")]
    InvalidInput(String),
}

impl ManagerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagerError::NotFound(_))
    }
}

/// Turns a lookup failure whose message carries one of the `markers` into
/// an absent result.
pub fn not_found_as_none<T>(
    result: Result<T, ManagerError>,
    markers: &[&str],
) -> Result<Option<T>, ManagerError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ManagerError::LookupFail(ref msg)) if markers.iter().all(|m| msg.contains(m)) => {
            tracing::debug!("Lookup found nothing: {}", msg);
            Ok(None)
        }
        Err(ManagerError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CountingManager {
        existing: Mutex<Option<String>>,
        created: Mutex<u32>,
        synced: Mutex<u32>,
    }

    impl ResourceManager<String, String> for CountingManager {
        fn lookup(&self, id: &str) -> Result<Option<String>, ManagerError> {
            Ok(self
                .existing
                .lock()
                .unwrap()
                .clone()
                .filter(|existing| existing == id))
        }
        fn create(&self, input: &mut String) -> Result<String, ManagerError> {
            *self.created.lock().unwrap() += 1;
            *self.existing.lock().unwrap() = Some(input.clone());
            Ok(input.clone())
        }
        fn delete(&self, _latest: &String) -> Result<bool, ManagerError> {
            *self.existing.lock().unwrap() = None;
            Ok(true)
        }
        fn syncup(
            &self,
            _latest: &String,
            _input: &mut String,
        ) -> Result<Option<String>, ManagerError> {
            *self.synced.lock().unwrap() += 1;
            Ok(None)
        }
    }

    #[test]
    fn ensure_present_creates_then_syncs() {
        let manager = CountingManager::default();
        let mut input = "loc-1".to_string();
        manager.ensure_present(None, &mut input).unwrap();
        manager.ensure_present(Some("loc-1"), &mut input).unwrap();
        assert_eq!(*manager.created.lock().unwrap(), 1);
        assert_eq!(*manager.synced.lock().unwrap(), 1);
    }

    #[test]
    fn ensure_present_recreates_after_disappearing() {
        let manager = CountingManager::default();
        let mut input = "loc-1".to_string();
        manager.ensure_present(None, &mut input).unwrap();
        manager.delete(&input).unwrap();
        manager.ensure_present(Some("loc-1"), &mut input).unwrap();
        assert_eq!(*manager.created.lock().unwrap(), 2);
    }

    #[test]
    fn ensure_absent_skips_missing_objects() {
        let manager = CountingManager::default();
        assert!(!manager.ensure_absent("loc-1", &"loc-1".to_string()).unwrap());
    }

    #[test]
    fn not_found_markers_must_all_match() {
        let err = || Err::<(), _>(ManagerError::LookupFail("InvalidRequestException: not found".into()));
        assert!(not_found_as_none(err(), &["InvalidRequestException", "not found"])
            .unwrap()
            .is_none());
        assert!(not_found_as_none(err(), &["ResourceNotFoundException"]).is_err());
    }
}
