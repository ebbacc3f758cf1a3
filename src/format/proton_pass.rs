//! Proton Pass export: a JSON document with an envelope
//! (`encrypted`, `userId`, `version`) and a map of vault id -> vault.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::{Envelope, VaultDocument};
use crate::error::{VaultError, VaultResult};
use crate::record::payload::{get_object, get_str, put};
use crate::record::Record;
use crate::vault::Vault;

/// Location of the document inside the export archive.
pub const DOCUMENT_PATH: &str = "Proton Pass/data.json";

pub(super) fn load(raw: &[u8], vault_names: Option<&BTreeSet<String>>) -> VaultResult<VaultDocument> {
    let root: Value = serde_json::from_slice(raw)
        .map_err(|e| VaultError::format(DOCUMENT_PATH, format!("invalid JSON: {}", e)))?;
    let Value::Object(root) = root else {
        return Err(VaultError::format(DOCUMENT_PATH, "top level is not a JSON object"));
    };

    let envelope = Envelope::new(root);
    if envelope.encrypted() {
        return Err(VaultError::format(
            DOCUMENT_PATH,
            "encrypted exports are not supported; export without encryption",
        ));
    }

    let raw_vaults = get_object(envelope.raw(), "vaults")
        .ok_or_else(|| VaultError::format(DOCUMENT_PATH, "missing 'vaults' object"))?;

    let mut vaults = Vec::new();
    for (id, raw_vault) in raw_vaults {
        let context = format!("{} vaults.{}", DOCUMENT_PATH, id);
        let Value::Object(raw_vault) = raw_vault else {
            return Err(VaultError::format(context, "vault is not a JSON object"));
        };
        let name = get_str(raw_vault, "name")
            .ok_or_else(|| VaultError::format(&context, "vault has no name"))?;

        if let Some(filter) = vault_names {
            if !filter.contains(&name) {
                tracing::debug!(vault = %name, "skipping vault not in filter");
                continue;
            }
        }

        vaults.push(load_vault(id, name, raw_vault, &context)?);
    }

    if let Some(filter) = vault_names {
        for wanted in filter {
            if !vaults.iter().any(|v| &v.name == wanted) {
                tracing::warn!(vault = %wanted, "no vault with this name in the export");
            }
        }
    }

    tracing::debug!(
        vaults = vaults.len(),
        version = envelope.version().unwrap_or_default(),
        "loaded Proton Pass export"
    );

    Ok(VaultDocument { vaults, envelope })
}

fn load_vault(id: &str, name: String, raw: &Map<String, Value>, context: &str) -> VaultResult<Vault> {
    let items = match raw.get("items") {
        Some(Value::Array(items)) => items.as_slice(),
        None => &[],
        Some(_) => return Err(VaultError::format(context, "'items' is not an array")),
    };

    let records = items
        .iter()
        .cloned()
        .map(Record::from_external)
        .collect::<VaultResult<Vec<_>>>()
        .map_err(|err| match err {
            VaultError::MalformedRecord { record, reason } => VaultError::MalformedRecord {
                record: format!("{} in vault '{}'", record, name),
                reason,
            },
            other => other,
        })?;

    let mut vault = Vault::new(id, name).with_raw(raw.clone());
    vault.description = get_str(raw, "description").unwrap_or_default();
    vault.display_hints = raw.get("display").cloned().unwrap_or(Value::Null);
    vault.records = records;
    Ok(vault)
}

pub(super) fn save(document: &VaultDocument) -> VaultResult<Vec<u8>> {
    let mut root = document.envelope.raw().clone();
    let mut raw_vaults = get_object(&root, "vaults").cloned().unwrap_or_default();

    // Vaults skipped by the filter stay in `raw_vaults` untouched.
    for vault in &document.vaults {
        let mut out = vault.raw().clone();
        put(&mut out, "name", Value::String(vault.name.clone()));
        put(&mut out, "description", Value::String(vault.description.clone()));
        put(&mut out, "display", vault.display_hints.clone());
        out.insert(
            "items".to_string(),
            Value::Array(vault.records.iter().map(Record::to_external).collect()),
        );
        raw_vaults.insert(vault.id.clone(), Value::Object(out));
    }
    root.insert("vaults".to_string(), Value::Object(raw_vaults));

    to_pretty_json(&Value::Object(root))
}

/// Pretty JSON with 4-space indentation; non-ASCII text is written as-is.
fn to_pretty_json(value: &Value) -> VaultResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
