//! Patient record lookup.
//!
//! The record store is an external collaborator from the pipeline's point of
//! view: a simple keyed lookup with explicit not-found signaling.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use cds_core::{CdsError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// A patient's clinical data, as stored in the record system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// The patient's identifier, e.g. `PT-101`.
    pub patient_id: String,
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Recorded gender.
    pub gender: String,
    /// Smoking history category (e.g. `Never`, `Ex-Smoker`, `Current Smoker`).
    pub smoking_history: String,
    /// Presenting symptoms.
    pub symptoms: Vec<String>,
    /// How long the symptoms have been present.
    pub symptom_duration_days: u32,
}

/// Keyed lookup of patient records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a patient by id. `None` when no such record exists.
    async fn lookup(&self, patient_id: &str) -> Result<Option<PatientRecord>>;

    /// All known patient ids, sorted.
    async fn ids(&self) -> Result<Vec<String>>;
}

/// A record store backed by a JSON file containing an array of records.
///
/// The file is read and indexed once, on first access.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    cache: OnceCell<HashMap<String, PatientRecord>>,
}

impl JsonFileRecordStore {
    /// Create a store over the given file. The file is not read until the
    /// first lookup.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: OnceCell::new() }
    }

    async fn records(&self) -> Result<&HashMap<String, PatientRecord>> {
        self.cache
            .get_or_try_init(|| async {
                let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
                    CdsError::Internal(format!("reading {}: {e}", self.path.display()))
                })?;
                let list: Vec<PatientRecord> = serde_json::from_slice(&bytes).map_err(|e| {
                    CdsError::Internal(format!("parsing {}: {e}", self.path.display()))
                })?;
                Ok(list.into_iter().map(|r| (r.patient_id.clone(), r)).collect())
            })
            .await
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn lookup(&self, patient_id: &str) -> Result<Option<PatientRecord>> {
        Ok(self.records().await?.get(patient_id).cloned())
    }

    async fn ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.records().await?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// An in-memory record store, for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: HashMap<String, PatientRecord>,
}

impl InMemoryRecordStore {
    /// Create a store holding the given records.
    pub fn new(records: impl IntoIterator<Item = PatientRecord>) -> Self {
        Self { records: records.into_iter().map(|r| (r.patient_id.clone(), r)).collect() }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn lookup(&self, patient_id: &str) -> Result<Option<PatientRecord>> {
        Ok(self.records.get(patient_id).cloned())
    }

    async fn ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> PatientRecord {
        PatientRecord {
            patient_id: id.to_string(),
            name: name.to_string(),
            age: 55,
            gender: "Male".to_string(),
            smoking_history: "Current Smoker".to_string(),
            symptoms: vec!["unexplained hemoptysis".to_string()],
            symptom_duration_days: 21,
        }
    }

    #[tokio::test]
    async fn lookup_returns_none_for_unknown_ids() {
        let store = InMemoryRecordStore::new([record("PT-101", "John Doe")]);
        assert!(store.lookup("PT-999").await.unwrap().is_none());
        assert_eq!(store.lookup("PT-101").await.unwrap().unwrap().name, "John Doe");
    }

    #[tokio::test]
    async fn json_file_store_loads_and_sorts_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.json");
        let records = vec![record("PT-102", "Jane Roe"), record("PT-101", "John Doe")];
        std::fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();

        let store = JsonFileRecordStore::new(&path);
        assert_eq!(store.ids().await.unwrap(), ["PT-101", "PT-102"]);
        assert_eq!(store.lookup("PT-102").await.unwrap().unwrap().name, "Jane Roe");
    }

    #[tokio::test]
    async fn missing_file_surfaces_an_internal_error() {
        let store = JsonFileRecordStore::new("/nonexistent/patients.json");
        assert!(store.lookup("PT-101").await.is_err());
    }
}
