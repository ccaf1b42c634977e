//! Collapse the editable value tree into the wire payload.
//!
//! The value tree keeps oneOf scaffolding around for editing; the payload
//! must carry exactly one branch of each union. `normalize` is a pure
//! projection: applying it twice gives the same result as applying it once.
//! Nodes with no populated branch pass through unchanged.

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::schema::is_blank;

const DOCUMENT_SOURCE: &str = "documentSourceIdentifier";
const RECIPIENT_SOURCE: &str = "recipientAddressSource";
const PAYMENT_DETAILS: &str = "paymentDetails";

/// Discriminator and detail key for each payment method, in precedence order.
const PAYMENT_PAIRS: [(&str, &str); 4] = [
    ("CREDIT_CARD", "creditCardDetails"),
    ("INVOICE", "invoiceDetails"),
    ("ACH", "achDetails"),
    ("USER_CREDIT", "creditAmount"),
];

pub fn normalize(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(normalize_object(map)),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

fn normalize_object(map: &JsonMap<String, JsonValue>) -> JsonMap<String, JsonValue> {
    map.iter()
        .map(|(k, v)| {
            let out = match (k.as_str(), v) {
                (DOCUMENT_SOURCE, JsonValue::Object(inner)) => {
                    JsonValue::Object(normalize_object(&collapse_document_source(inner)))
                }
                (RECIPIENT_SOURCE, JsonValue::Array(items)) => JsonValue::Array(
                    items
                        .iter()
                        .map(|item| normalize(&collapse_recipient(item)))
                        .collect(),
                ),
                (PAYMENT_DETAILS, JsonValue::Object(inner)) => {
                    JsonValue::Object(normalize_object(&collapse_payment(inner)))
                }
                _ => normalize(v),
            };
            (k.clone(), out)
        })
        .collect()
}

fn non_empty_str(v: Option<&JsonValue>) -> bool {
    v.and_then(JsonValue::as_str).is_some_and(|s| !s.is_empty())
}

fn collapse_document_source(inner: &JsonMap<String, JsonValue>) -> JsonMap<String, JsonValue> {
    let mut out = inner.clone();
    if inner.contains_key("documentId") && inner.contains_key("externalUrl") {
        if non_empty_str(inner.get("documentId")) {
            out.remove("externalUrl");
        } else if non_empty_str(inner.get("externalUrl")) {
            out.remove("documentId");
        }
    }
    out
}

fn collapse_recipient(item: &JsonValue) -> JsonValue {
    let Some(obj) = item.as_object() else {
        return item.clone();
    };
    let keep = match obj.get("recipientAddress") {
        Some(addr @ JsonValue::Object(_)) if !is_blank(addr) => Some("recipientAddress"),
        _ => ["addressListId", "addressId"]
            .into_iter()
            .find(|k| non_empty_str(obj.get(*k))),
    };
    match keep.and_then(|k| obj.get(k).map(|v| (k, v))) {
        Some((k, v)) => {
            let mut m = JsonMap::new();
            m.insert(k.to_string(), v.clone());
            JsonValue::Object(m)
        }
        None => item.clone(),
    }
}

fn collapse_payment(inner: &JsonMap<String, JsonValue>) -> JsonMap<String, JsonValue> {
    for (kind, detail) in PAYMENT_PAIRS {
        if !non_empty_str(inner.get(kind)) {
            continue;
        }
        if let (Some(k), Some(d)) = (inner.get(kind), inner.get(detail)) {
            let mut m = JsonMap::new();
            m.insert(kind.to_string(), k.clone());
            m.insert(detail.to_string(), d.clone());
            return m;
        }
    }
    inner.clone()
}
