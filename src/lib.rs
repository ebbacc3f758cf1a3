//! Vault Dedup Library
//!
//! Normalizes and deduplicates records in password-manager vault exports,
//! writing a cleaned export in the same container format:
//! - **record**: Record model with lossless round trip of the external payload
//! - **normalize**: URL canonicalization and list de-duplication
//! - **dedup**: Equality keys, duplicate grouping and field-by-field merge
//! - **vault**: Vault aggregate orchestrating normalization and merge
//! - **format**: Load/save adapters per export format
//! - **archive**: Reading and atomically writing the export on disk
//!
//! # Example (conceptual)
//! ```ignore
//! let options = DedupOptions {
//!     vault_names: Some(["Personal".to_string()].into()),
//!     ..DedupOptions::default()
//! };
//! let report = run(input, output, &options, &mut TracingObserver)?;
//! println!("removed {} duplicates", report.totals.records_removed);
//! ```

pub mod archive;
pub mod dedup;
pub mod error;
pub mod format;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod vault;

pub use archive::ArchiveLayout;
pub use dedup::{
    deduplicate_records, fold_group, group_records, DedupStats, DuplicateEvent,
    DuplicateObserver, TracingObserver,
};
pub use error::{VaultError, VaultResult};
pub use format::{lookup_format, Envelope, FormatAdapter, VaultDocument, FORMATS, FORMAT_NAMES};
pub use normalize::NormalizeOptions;
pub use pipeline::{clean_document, process_document, run, DedupOptions, RunReport, VaultReport};
pub use record::{CreditCardFields, EqualityKey, LoginFields, Passkey, Record, RecordHeader, RecordKind};
pub use vault::Vault;
