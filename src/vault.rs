//! The vault aggregate: a named, ordered collection of records.

use serde_json::{Map, Value};

use crate::dedup::{deduplicate_records, DedupStats, DuplicateObserver};
use crate::error::VaultResult;
use crate::normalize::NormalizeOptions;
use crate::record::Record;

/// A named collection of records plus display metadata.
///
/// The vault owns its records exclusively; the raw vault document it was read
/// from is kept so that keys outside the model survive a save.
#[derive(Debug, Clone, PartialEq)]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Display hints (color, icon), passed through untouched.
    pub display_hints: Value,
    pub records: Vec<Record>,
    raw: Map<String, Value>,
}

impl Vault {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            display_hints: Value::Null,
            records: Vec::new(),
            raw: Map::new(),
        }
    }

    /// Attach the raw vault document used as the serialization template.
    pub fn with_raw(mut self, raw: Map<String, Value>) -> Self {
        self.raw = raw;
        self
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Normalize every record in place.
    pub fn normalize_all(&mut self, options: &NormalizeOptions) {
        for record in &mut self.records {
            record.normalize(options);
        }
    }

    /// Replace the records with one merged record per duplicate group.
    ///
    /// Output order is the order in which each group's first member appeared.
    pub fn deduplicate(&mut self, observer: &mut dyn DuplicateObserver) -> VaultResult<DedupStats> {
        let records = std::mem::take(&mut self.records);
        let (records, stats) = deduplicate_records(&self.name, records, observer)?;
        self.records = records;
        Ok(stats)
    }
}
