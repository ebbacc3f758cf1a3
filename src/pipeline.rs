//! One deduplication run: read, load, normalize, merge, save, write.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::dedup::{DedupStats, DuplicateObserver};
use crate::error::VaultResult;
use crate::format::{lookup_format, FormatAdapter, VaultDocument};
use crate::normalize::NormalizeOptions;

/// Settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupOptions {
    /// Registered format name
    #[serde(default = "default_format")]
    pub format: String,
    /// Only these vaults are processed (default: all)
    #[serde(default)]
    pub vault_names: Option<BTreeSet<String>>,
    #[serde(default)]
    pub normalize: NormalizeOptions,
}

fn default_format() -> String {
    "protonpass".to_string()
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            format: default_format(),
            vault_names: None,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// Per-vault outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultReport {
    pub name: String,
    pub stats: DedupStats,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub vaults: Vec<VaultReport>,
    pub totals: DedupStats,
}

/// Normalize and deduplicate every vault of a loaded document in place.
pub fn clean_document(
    document: &mut VaultDocument,
    options: &NormalizeOptions,
    observer: &mut dyn DuplicateObserver,
) -> VaultResult<RunReport> {
    let mut report = RunReport::default();

    for vault in &mut document.vaults {
        vault.normalize_all(options);
    }
    for vault in &mut document.vaults {
        let stats = vault.deduplicate(observer)?;
        report.totals.absorb(&stats);
        report.vaults.push(VaultReport {
            name: vault.name.clone(),
            stats,
        });
    }

    Ok(report)
}

/// Run the whole transformation on an in-memory document.
pub fn process_document(
    adapter: &FormatAdapter,
    raw: &[u8],
    options: &DedupOptions,
    observer: &mut dyn DuplicateObserver,
) -> VaultResult<(Vec<u8>, RunReport)> {
    let mut document = (adapter.load)(raw, options.vault_names.as_ref())?;
    let report = clean_document(&mut document, &options.normalize, observer)?;
    let output = (adapter.save)(&document)?;
    Ok((output, report))
}

/// Deduplicate the export at `input` and write the result to `output`.
///
/// Everything happens in memory; `output` is only created once the new
/// document is complete.
pub fn run(
    input: &Path,
    output: &Path,
    options: &DedupOptions,
    observer: &mut dyn DuplicateObserver,
) -> VaultResult<RunReport> {
    let adapter = lookup_format(&options.format)?;
    tracing::info!(input = %input.display(), format = adapter.name, "processing export");

    let raw = adapter.layout.read_document(input)?;
    let (document, report) = process_document(adapter, &raw, options, observer)?;
    adapter.layout.write_document(input, output, &document)?;

    tracing::info!(
        output = %output.display(),
        records_in = report.totals.records_in,
        records_out = report.totals.records_out,
        "export written"
    );
    Ok(report)
}
