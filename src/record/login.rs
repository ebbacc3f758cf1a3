//! Login records: username/password credentials with URLs and passkeys.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::payload::{get_str, put};
use crate::normalize::{canonicalize_url, unique_preserving_order, NormalizeOptions};

/// A passkey attached to a login, identified by its `keyId`.
///
/// The full passkey object is kept as exported; only the id is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct Passkey {
    pub key_id: Option<String>,
    pub raw: Value,
}

impl Passkey {
    fn from_external(raw: Value) -> Self {
        let key_id = raw.get("keyId").and_then(|v| v.as_str()).map(String::from);
        Self { key_id, raw }
    }
}

/// Login-specific fields, read from the item's `content` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginFields {
    pub username: String,
    pub password: String,
    pub totp_uri: String,
    pub urls: Vec<String>,
    /// `urls` entries that are not strings, written back after the others.
    pub foreign_urls: Vec<Value>,
    pub passkeys: Vec<Passkey>,
}

impl LoginFields {
    pub(crate) fn from_content(content: &Map<String, Value>) -> Self {
        let (urls, foreign_urls) = content
            .get("urls")
            .and_then(|v| v.as_array())
            .map(|entries| -> (Vec<String>, Vec<Value>) {
                let (urls, foreign): (Vec<&Value>, Vec<&Value>) =
                    entries.iter().partition(|u| u.is_string());
                (
                    urls.into_iter().filter_map(|u| u.as_str().map(String::from)).collect(),
                    foreign.into_iter().cloned().collect(),
                )
            })
            .unwrap_or_default();

        let passkeys = content
            .get("passkeys")
            .and_then(|v| v.as_array())
            .map(|keys| keys.iter().cloned().map(Passkey::from_external).collect())
            .unwrap_or_default();

        Self {
            username: get_str(content, "username").unwrap_or_default(),
            password: get_str(content, "password").unwrap_or_default(),
            totp_uri: get_str(content, "totpUri").unwrap_or_default(),
            urls,
            foreign_urls,
            passkeys,
        }
    }

    pub(crate) fn write_content(&self, content: &mut Map<String, Value>) {
        put(content, "username", Value::String(self.username.clone()));
        put(content, "password", Value::String(self.password.clone()));
        let urls = self
            .urls
            .iter()
            .cloned()
            .map(Value::String)
            .chain(self.foreign_urls.iter().cloned())
            .collect();
        put(content, "urls", Value::Array(urls));
        put(content, "totpUri", Value::String(self.totp_uri.clone()));
        put(
            content,
            "passkeys",
            Value::Array(self.passkeys.iter().map(|p| p.raw.clone()).collect()),
        );
    }

    /// Canonicalize every URL, then drop duplicates keeping first-seen order.
    pub(crate) fn normalize(&mut self, options: &NormalizeOptions) {
        let urls = std::mem::take(&mut self.urls);
        self.urls = if options.canonicalize_urls {
            unique_preserving_order(urls.iter().map(|u| canonicalize_url(u)))
        } else {
            unique_preserving_order(urls)
        };
    }

    /// Combine with an older duplicate.
    ///
    /// List fields become order-preserving unions with `self` first; scalar
    /// fields keep `self`'s value unless it is empty.
    pub(crate) fn merge(self, older: LoginFields) -> LoginFields {
        let urls = unique_preserving_order(self.urls.into_iter().chain(older.urls));
        let mut foreign_urls = self.foreign_urls;
        for entry in older.foreign_urls {
            if !foreign_urls.contains(&entry) {
                foreign_urls.push(entry);
            }
        }

        let mut seen_ids = HashSet::new();
        let passkeys = self
            .passkeys
            .into_iter()
            .chain(older.passkeys)
            .filter(|p| match &p.key_id {
                Some(id) => seen_ids.insert(id.clone()),
                None => true,
            })
            .collect();

        LoginFields {
            username: prefer_non_empty(self.username, older.username),
            password: prefer_non_empty(self.password, older.password),
            totp_uri: prefer_non_empty(self.totp_uri, older.totp_uri),
            urls,
            foreign_urls,
            passkeys,
        }
    }
}

pub(crate) fn prefer_non_empty(preferred: String, fallback: String) -> String {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}
