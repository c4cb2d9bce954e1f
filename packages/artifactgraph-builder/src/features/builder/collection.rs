//! Indexed collection of derived records
//!
//! Records keep their insertion order (that order is what gets persisted).
//! Two side indexes serve in-batch reference resolution:
//!
//! - (kind, qualified name) → record, first insertion wins
//! - (port type, operation name) → operation record

use rustc_hash::FxHashMap;

use artifactgraph_storage::{ArtifactType, DerivedRecord, Target};

use crate::shared::QName;

#[derive(Debug, Default)]
pub struct IndexedArtifactCollection {
    records: Vec<DerivedRecord>,
    positions: FxHashMap<String, usize>,
    by_name: FxHashMap<(ArtifactType, QName), usize>,
    operations: FxHashMap<(QName, String), usize>,
}

impl IndexedArtifactCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, indexing it under its qualified name when it has one
    pub fn add(&mut self, record: DerivedRecord) -> Target {
        let idx = self.records.len();
        let target = record.as_target();

        if let Some(ncname) = &record.ncname {
            let key = QName::new(record.namespace.clone().unwrap_or_default(), ncname.clone());
            self.by_name.entry((record.artifact_type(), key)).or_insert(idx);
        }
        self.positions.insert(record.uuid().to_string(), idx);
        self.records.push(record);
        target
    }

    /// Append an operation, additionally indexed under its owning port type
    pub fn add_operation(&mut self, port_type: &QName, record: DerivedRecord) -> Target {
        let key = (port_type.clone(), record.name().to_string());
        let idx = self.records.len();
        self.operations.entry(key).or_insert(idx);
        self.add(record)
    }

    pub fn lookup(&self, kind: ArtifactType, qname: &QName) -> Option<&DerivedRecord> {
        self.by_name
            .get(&(kind, qname.clone()))
            .map(|&idx| &self.records[idx])
    }

    /// First kind in `kinds` with a match wins
    pub fn lookup_any(&self, kinds: &[ArtifactType], qname: &QName) -> Option<&DerivedRecord> {
        kinds.iter().find_map(|kind| self.lookup(*kind, qname))
    }

    pub fn lookup_operation(&self, port_type: &QName, name: &str) -> Option<&DerivedRecord> {
        self.operations
            .get(&(port_type.clone(), name.to_string()))
            .map(|&idx| &self.records[idx])
    }

    pub fn get(&self, uuid: &str) -> Option<&DerivedRecord> {
        self.positions.get(uuid).map(|&idx| &self.records[idx])
    }

    pub fn get_mut(&mut self, uuid: &str) -> Option<&mut DerivedRecord> {
        let idx = *self.positions.get(uuid)?;
        Some(&mut self.records[idx])
    }

    pub fn records(&self) -> &[DerivedRecord] {
        &self.records
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DerivedRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
        self.by_name.clear();
        self.operations.clear();
    }
}
