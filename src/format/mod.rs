//! Format adapters: a load/save pair per export format.
//!
//! Adding a format means writing a new pair of functions and registering it
//! in [`FORMATS`]; the rest of the pipeline only sees [`VaultDocument`].

mod proton_pass;

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::archive::ArchiveLayout;
use crate::error::{VaultError, VaultResult};
use crate::vault::Vault;

/// Format-level fields captured verbatim at load time (encryption flag,
/// owner id, version, and the raw vault documents).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    raw: Map<String, Value>,
}

impl Envelope {
    pub fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn encrypted(&self) -> bool {
        self.raw
            .get("encrypted")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.raw.get("userId").and_then(|v| v.as_str())
    }

    pub fn version(&self) -> Option<&str> {
        self.raw.get("version").and_then(|v| v.as_str())
    }
}

/// A loaded export: the materialized vaults plus the envelope they came in.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultDocument {
    pub vaults: Vec<Vault>,
    pub envelope: Envelope,
}

/// Parse a raw document, materializing only vaults whose name is in the filter.
pub type LoadFn = fn(&[u8], Option<&BTreeSet<String>>) -> VaultResult<VaultDocument>;

/// Serialize a document back into the format's raw shape.
pub type SaveFn = fn(&VaultDocument) -> VaultResult<Vec<u8>>;

/// A registered export format.
#[derive(Clone, Copy)]
pub struct FormatAdapter {
    /// Name used to select the format
    pub name: &'static str,
    /// One-line description for help output
    pub description: &'static str,
    /// Where the document lives on disk
    pub layout: ArchiveLayout,
    pub load: LoadFn,
    pub save: SaveFn,
}

/// All supported formats.
pub static FORMATS: &[FormatAdapter] = &[
    FormatAdapter {
        name: "protonpass",
        description: "Proton Pass export archive (.zip)",
        layout: ArchiveLayout::Zip {
            inner_path: proton_pass::DOCUMENT_PATH,
        },
        load: proton_pass::load,
        save: proton_pass::save,
    },
    FormatAdapter {
        name: "protonpass-json",
        description: "Proton Pass data.json, already extracted",
        layout: ArchiveLayout::PlainFile,
        load: proton_pass::load,
        save: proton_pass::save,
    },
];

/// List of format names (for CLI choices).
pub const FORMAT_NAMES: &[&str] = &["protonpass", "protonpass-json"];

/// Find the adapter registered under `name`.
pub fn lookup_format(name: &str) -> VaultResult<&'static FormatAdapter> {
    FORMATS
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| VaultError::UnsupportedFormat {
            format: name.to_string(),
            supported: FORMAT_NAMES.join(", "),
        })
}
