//! Credit card records.

use serde_json::{Map, Value};

use super::payload::{get_str, put};

/// Card fields, read from the item's `content` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreditCardFields {
    pub cardholder_name: String,
    /// Network code as exported (`cardType`, numeric in Proton Pass exports).
    pub card_network: Value,
    pub number: String,
    pub expiry: String,
    pub pin: String,
    pub security_code: String,
}

impl CreditCardFields {
    pub(crate) fn from_content(content: &Map<String, Value>) -> Self {
        Self {
            cardholder_name: get_str(content, "cardholderName").unwrap_or_default(),
            card_network: content.get("cardType").cloned().unwrap_or(Value::Null),
            number: get_str(content, "number").unwrap_or_default(),
            expiry: get_str(content, "expirationDate").unwrap_or_default(),
            pin: get_str(content, "pin").unwrap_or_default(),
            security_code: get_str(content, "verificationNumber").unwrap_or_default(),
        }
    }

    pub(crate) fn write_content(&self, content: &mut Map<String, Value>) {
        put(content, "cardholderName", Value::String(self.cardholder_name.clone()));
        put(content, "cardType", self.card_network.clone());
        put(content, "number", Value::String(self.number.clone()));
        put(content, "expirationDate", Value::String(self.expiry.clone()));
        put(content, "pin", Value::String(self.pin.clone()));
        put(content, "verificationNumber", Value::String(self.security_code.clone()));
    }

    /// Intentionally inert: card fields currently have no cleanup rules.
    /// Card-number formatting would go here.
    pub(crate) fn normalize(&mut self) {}

    /// Card fields have no element-wise union, so the newer card replaces
    /// the older one outright.
    pub(crate) fn merge(self, _older: CreditCardFields) -> CreditCardFields {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_mapping() {
        let content = json!({
            "cardholderName": "Jane Doe",
            "cardType": 2,
            "number": "4111111111111111",
            "expirationDate": "2027-04",
            "verificationNumber": "123",
            "pin": "",
            "issuer": "Example Bank"
        });
        let fields = CreditCardFields::from_content(content.as_object().unwrap());
        assert_eq!(fields.cardholder_name, "Jane Doe");
        assert_eq!(fields.card_network, json!(2));
        assert_eq!(fields.expiry, "2027-04");
        assert_eq!(fields.security_code, "123");

        let mut written = content.as_object().cloned().unwrap();
        fields.write_content(&mut written);
        assert_eq!(Value::Object(written), content);
    }

    #[test]
    fn test_normalize_is_inert() {
        let mut fields = CreditCardFields {
            number: "4111 1111 1111 1111".to_string(),
            ..CreditCardFields::default()
        };
        let before = fields.clone();
        fields.normalize();
        assert_eq!(fields, before);
    }

    #[test]
    fn test_merge_replaces_with_newer() {
        let newer = CreditCardFields {
            expiry: "2029-01".to_string(),
            pin: String::new(),
            ..CreditCardFields::default()
        };
        let older = CreditCardFields {
            expiry: "2026-01".to_string(),
            pin: "9999".to_string(),
            ..CreditCardFields::default()
        };
        let merged = newer.clone().merge(older);
        assert_eq!(merged, newer);
    }
}
