//! Vault records: a shared header, a variant-specific field set, and the raw
//! external payload the record was read from.
//!
//! Serialization patches the fields the model owns over a copy of the raw
//! payload, so keys the model never interprets come back out untouched.

mod credit_card;
mod login;
pub(crate) mod payload;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{VaultError, VaultResult};
use crate::normalize::{title_case_name, NormalizeOptions};
pub use credit_card::CreditCardFields;
pub use login::{LoginFields, Passkey};
use payload::{fill_missing, get_object, get_str, parse_timestamp, put, put_opt_str, put_timestamp};

pub const LOGIN: &str = "login";
pub const CREDIT_CARD: &str = "creditCard";
pub const NOTE: &str = "note";

/// Fields every record carries regardless of variant.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    pub id: String,
    pub name: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub favorite: bool,
    /// App-specific auxiliary fields, kept as exported.
    pub extra_fields: Vec<Value>,
}

impl RecordHeader {
    /// Combine with an older duplicate's header.
    fn merge(self, older: RecordHeader) -> RecordHeader {
        let note = match (self.note, older.note) {
            (Some(note), _) if !note.is_empty() => Some(note),
            (newer, None) => newer,
            (_, older) => older,
        };

        let mut extra_fields = self.extra_fields;
        extra_fields.extend(older.extra_fields);

        RecordHeader {
            id: self.id,
            name: self.name.or(older.name),
            note,
            created_at: self.created_at.min(older.created_at),
            modified_at: self.modified_at.max(older.modified_at),
            favorite: self.favorite || older.favorite,
            extra_fields,
        }
    }
}

/// The concrete shape of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    Login(LoginFields),
    CreditCard(CreditCardFields),
    /// Secure note: the text lives in the header's `note`.
    Note,
    /// A variant the model does not interpret (alias, identity, ...).
    /// Carried through verbatim and never merged.
    Opaque { variant: String },
}

impl RecordKind {
    pub fn variant(&self) -> &str {
        match self {
            RecordKind::Login(_) => LOGIN,
            RecordKind::CreditCard(_) => CREDIT_CARD,
            RecordKind::Note => NOTE,
            RecordKind::Opaque { variant } => variant,
        }
    }
}

/// The fields that decide whether two records are the same logical entry.
///
/// Never includes ids, timestamps or the favorite flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EqualityKey {
    Login {
        name: Option<String>,
        username: String,
        password: String,
    },
    CreditCard {
        number: String,
        cardholder_name: String,
    },
    Note {
        name: Option<String>,
        note: Option<String>,
    },
}

/// Secrets are kept out of the rendering: passwords are omitted and card
/// numbers cut to their last four digits.
impl fmt::Display for EqualityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EqualityKey::Login { name, username, .. } => write!(
                f,
                "{} '{}' (user '{}')",
                LOGIN,
                name.as_deref().unwrap_or_default(),
                username
            ),
            EqualityKey::CreditCard {
                number,
                cardholder_name,
            } => {
                let digits: Vec<char> = number.chars().collect();
                let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
                write!(f, "{} '{}' (****{})", CREDIT_CARD, cardholder_name, tail)
            }
            EqualityKey::Note { name, .. } => {
                write!(f, "{} '{}'", NOTE, name.as_deref().unwrap_or_default())
            }
        }
    }
}

/// A single vault entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: RecordHeader,
    pub kind: RecordKind,
    /// The external item exactly as loaded (always a JSON object).
    raw: Value,
}

impl Record {
    /// Build a record from an exported item.
    ///
    /// Missing optional fields take defaults (a fresh id, the current time,
    /// empty strings and lists). Fails only when the item is not an object
    /// or lacks `data.type`.
    pub fn from_external(item: Value) -> VaultResult<Record> {
        let Value::Object(map) = &item else {
            return Err(VaultError::malformed("<unidentified item>", "item is not a JSON object"));
        };

        let id = get_str(map, "itemId");
        let label = id.clone().unwrap_or_else(|| "<item without itemId>".to_string());

        let data = get_object(map, "data")
            .ok_or_else(|| VaultError::malformed(&label, "missing 'data' section"))?;
        let variant = get_str(data, "type")
            .ok_or_else(|| VaultError::malformed(&label, "missing 'data.type'"))?;

        let empty = Map::new();
        let metadata = get_object(data, "metadata").unwrap_or(&empty);
        let content = get_object(data, "content").unwrap_or(&empty);
        let now = Utc::now();

        let header = RecordHeader {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: get_str(metadata, "name"),
            note: get_str(metadata, "note"),
            created_at: map.get("createTime").and_then(parse_timestamp).unwrap_or(now),
            modified_at: map.get("modifyTime").and_then(parse_timestamp).unwrap_or(now),
            favorite: map.get("pinned").and_then(|v| v.as_bool()).unwrap_or(false),
            extra_fields: data
                .get("extraFields")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        };

        let kind = match variant.as_str() {
            LOGIN => RecordKind::Login(LoginFields::from_content(content)),
            CREDIT_CARD => RecordKind::CreditCard(CreditCardFields::from_content(content)),
            NOTE => RecordKind::Note,
            _ => RecordKind::Opaque { variant },
        };

        Ok(Record {
            header,
            kind,
            raw: item,
        })
    }

    pub fn variant(&self) -> &str {
        self.kind.variant()
    }

    pub fn login(&self) -> Option<&LoginFields> {
        match &self.kind {
            RecordKind::Login(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn credit_card(&self) -> Option<&CreditCardFields> {
        match &self.kind {
            RecordKind::CreditCard(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short human-readable label for logs and error messages.
    pub fn describe(&self) -> String {
        format!(
            "{} '{}' ({})",
            self.variant(),
            self.header.name.as_deref().unwrap_or_default(),
            self.header.id
        )
    }

    /// Apply the variant's cleanup rules in place.
    pub fn normalize(&mut self, options: &NormalizeOptions) {
        match &mut self.kind {
            RecordKind::Login(fields) => {
                fields.normalize(options);
                if options.title_case_names {
                    if let Some(name) = self.header.name.as_mut() {
                        *name = title_case_name(name);
                    }
                }
            }
            RecordKind::CreditCard(fields) => fields.normalize(),
            RecordKind::Note | RecordKind::Opaque { .. } => {}
        }
    }

    /// The record's equality key, or `None` for variants that are never
    /// merge-eligible.
    pub fn equality_key(&self) -> Option<EqualityKey> {
        match &self.kind {
            RecordKind::Login(fields) => Some(EqualityKey::Login {
                name: self.header.name.clone(),
                username: fields.username.clone(),
                password: fields.password.clone(),
            }),
            RecordKind::CreditCard(fields) => Some(EqualityKey::CreditCard {
                number: fields.number.clone(),
                cardholder_name: fields.cardholder_name.clone(),
            }),
            RecordKind::Note => Some(EqualityKey::Note {
                name: self.header.name.clone(),
                note: self.header.note.clone(),
            }),
            RecordKind::Opaque { .. } => None,
        }
    }

    /// Merge an older duplicate into this record.
    ///
    /// `self` is the authoritative operand: callers pass the more recently
    /// modified record as `self`. Fails with `MergeMismatch` when the
    /// variants or equality keys differ.
    pub fn merge_with(self, older: Record) -> VaultResult<Record> {
        let mismatch = |reason: String| VaultError::MergeMismatch {
            left: self.describe(),
            right: older.describe(),
            reason,
        };

        if self.variant() != older.variant() {
            return Err(mismatch(format!(
                "variants differ ({} vs {})",
                self.variant(),
                older.variant()
            )));
        }
        match (self.equality_key(), older.equality_key()) {
            (Some(left), Some(right)) if left == right => {}
            (Some(left), Some(right)) => {
                return Err(mismatch(format!("equality keys differ ({} vs {})", left, right)))
            }
            _ => {
                return Err(mismatch(format!(
                    "'{}' records are never merged",
                    self.variant()
                )))
            }
        }

        let Record {
            header,
            kind,
            mut raw,
        } = self;
        fill_missing(&mut raw, &older.raw);

        let kind = match (kind, older.kind) {
            (RecordKind::Login(newer), RecordKind::Login(old)) => RecordKind::Login(newer.merge(old)),
            (RecordKind::CreditCard(newer), RecordKind::CreditCard(old)) => {
                RecordKind::CreditCard(newer.merge(old))
            }
            (kind, _) => kind,
        };

        Ok(Record {
            header: header.merge(older.header),
            kind,
            raw,
        })
    }

    /// Serialize by patching the owned fields over a copy of the raw payload.
    pub fn to_external(&self) -> Value {
        let mut item = self.raw.clone();
        if let Value::Object(map) = &mut item {
            self.patch_onto(map);
        }
        item
    }

    fn patch_onto(&self, map: &mut Map<String, Value>) {
        put(map, "itemId", Value::String(self.header.id.clone()));
        put_timestamp(map, "createTime", self.header.created_at);
        put_timestamp(map, "modifyTime", self.header.modified_at);
        put(map, "pinned", Value::Bool(self.header.favorite));

        let mut data = get_object(map, "data").cloned().unwrap_or_default();
        put(&mut data, "extraFields", Value::Array(self.header.extra_fields.clone()));

        let mut metadata = get_object(&data, "metadata").cloned().unwrap_or_default();
        put_opt_str(&mut metadata, "name", self.header.name.as_deref());
        put_opt_str(&mut metadata, "note", self.header.note.as_deref());
        put(&mut data, "metadata", Value::Object(metadata));

        let mut content = get_object(&data, "content").cloned().unwrap_or_default();
        match &self.kind {
            RecordKind::Login(fields) => fields.write_content(&mut content),
            RecordKind::CreditCard(fields) => fields.write_content(&mut content),
            RecordKind::Note | RecordKind::Opaque { .. } => {}
        }
        put(&mut data, "content", Value::Object(content));
        put(map, "data", Value::Object(data));
    }
}
