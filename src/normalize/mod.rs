//! In-place cleanup rules shared by the record variants.
//!
//! Every rule here is idempotent: running it on its own output changes nothing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Switches for the normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Reduce login URLs to `scheme://host/` and drop the resulting duplicates.
    #[serde(default = "default_true")]
    pub canonicalize_urls: bool,
    /// Title-case record names that are not URLs ("my bank" -> "My Bank").
    #[serde(default)]
    pub title_case_names: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            canonicalize_urls: true,
            title_case_names: false,
        }
    }
}

/// Split `text` into `(scheme, remainder)` when it starts with `scheme://`.
fn split_scheme(text: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = text.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((scheme, rest))
}

/// Returns true if `text` carries a URL scheme (`https://...`, `ftp://...`).
pub fn has_scheme(text: &str) -> bool {
    split_scheme(text).is_some()
}

/// Reduce a URL to `scheme://host/`.
///
/// Scheme and host are lowercased; a port and any userinfo are kept.
/// Strings without a scheme are labels, not URLs, and come back unchanged,
/// as do URLs with an empty authority (`file:///etc/hosts`).
pub fn canonicalize_url(url: &str) -> String {
    let Some((scheme, rest)) = split_scheme(url) else {
        return url.to_string();
    };

    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    if authority.is_empty() {
        return url.to_string();
    }

    let authority = match authority.rsplit_once('@') {
        Some((userinfo, host)) => format!("{}@{}", userinfo, host.to_lowercase()),
        None => authority.to_lowercase(),
    };

    format!("{}://{}/", scheme.to_lowercase(), authority)
}

/// Drop repeated items, keeping the first occurrence of each.
pub fn unique_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Title-case a display name unless it is a URL.
///
/// A letter is uppercased when it follows a non-letter (or starts the string)
/// and lowercased otherwise, so "o'neil bank" becomes "O'Neil Bank".
pub fn title_case_name(name: &str) -> String {
    if has_scheme(name) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut previous_was_letter = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if previous_was_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_was_letter = true;
        } else {
            out.push(c);
            previous_was_letter = false;
        }
    }
    out
}
