//! Recursive parameter field schema.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One field of an endpoint's parameter form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterField {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Field variants, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text(ScalarSpec),
    Number(ScalarSpec),
    File(ScalarSpec),
    Select(SelectSpec),
    Object(GroupSpec),
    /// `fields` is the item schema.
    Array(GroupSpec),
    OneOf(OneOfSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSpec {
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub fields: Vec<ParameterField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneOfSpec {
    #[serde(default)]
    pub one_of_options: Vec<OneOfOption>,
}

/// A discriminated-union variant with its own sub-schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneOfOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub fields: Vec<ParameterField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// How the items of an array field are stored in the value tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemShape<'a> {
    /// A single unnamed scalar field: items are plain values.
    Scalar(&'a ParameterField),
    /// A single unnamed oneOf field: items are inline variant objects.
    Variant(&'a OneOfSpec),
    /// Anything else: items are objects keyed by field name.
    Object(&'a [ParameterField]),
}

impl ParameterField {
    pub fn default_value(&self) -> Option<&JsonValue> {
        match &self.kind {
            FieldKind::Text(s) | FieldKind::Number(s) | FieldKind::File(s) => {
                s.default_value.as_ref()
            }
            FieldKind::Select(s) => s.default_value.as_ref(),
            _ => None,
        }
    }

    pub fn validation(&self) -> Option<&Validation> {
        match &self.kind {
            FieldKind::Text(s) | FieldKind::Number(s) | FieldKind::File(s) => s.validation.as_ref(),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Text(_) | FieldKind::Number(_) | FieldKind::File(_) | FieldKind::Select(_)
        )
    }

    pub fn one_of(&self) -> Option<&OneOfSpec> {
        match &self.kind {
            FieldKind::OneOf(spec) => Some(spec),
            _ => None,
        }
    }

    /// Child fields of object and array fields.
    pub fn children(&self) -> &[ParameterField] {
        match &self.kind {
            FieldKind::Object(g) | FieldKind::Array(g) => &g.fields,
            _ => &[],
        }
    }

    /// Item layout for array fields, `None` for everything else.
    pub fn item_shape(&self) -> Option<ItemShape<'_>> {
        let FieldKind::Array(group) = &self.kind else {
            return None;
        };
        Some(match group.fields.as_slice() {
            [only] if only.name.is_empty() && only.is_scalar() => ItemShape::Scalar(only),
            [only] if only.name.is_empty() => match &only.kind {
                FieldKind::OneOf(spec) => ItemShape::Variant(spec),
                _ => ItemShape::Object(&group.fields),
            },
            fields => ItemShape::Object(fields),
        })
    }
}

impl OneOfSpec {
    pub fn variant(&self, value: &str) -> Option<&OneOfOption> {
        self.one_of_options.iter().find(|o| o.value == value)
    }

    pub fn first(&self) -> Option<&OneOfOption> {
        self.one_of_options.first()
    }

    /// The recorded selection if it names a variant, else the inferred one.
    pub fn active(&self, selected: Option<&str>, value: &JsonValue) -> Option<&OneOfOption> {
        selected
            .and_then(|s| self.variant(s))
            .or_else(|| self.infer(value))
    }

    /// Pick the variant whose field names best cover the keys of `value`.
    ///
    /// Populated keys count first, then keys merely present; ties go to the
    /// variant with fewer fields. Used when no selection was recorded, e.g.
    /// for values set directly by a client.
    pub fn infer(&self, value: &JsonValue) -> Option<&OneOfOption> {
        let obj = value.as_object()?;
        self.one_of_options
            .iter()
            .map(|o| {
                let present = o.fields.iter().filter_map(|f| obj.get(&f.name));
                let filled = present.clone().filter(|v| !is_blank(v)).count();
                ((filled, present.count()), o)
            })
            .filter(|((_, present), _)| *present > 0)
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.fields.len().cmp(&a.1.fields.len())))
            .map(|(_, o)| o)
    }
}

/// Empty string, null, empty array or empty object.
pub fn is_blank(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_tagged_fields() {
        let v = json!({
            "name": "paymentDetails",
            "label": "Payment Details",
            "type": "oneOf",
            "required": true,
            "oneOfOptions": [
                {"label": "Invoice", "value": "invoice", "fields": [
                    {"name": "INVOICE", "label": "Payment Type", "type": "text", "required": true, "defaultValue": "INVOICE"}
                ]}
            ]
        });
        let f: ParameterField = serde_json::from_value(v).unwrap();
        let spec = f.one_of().unwrap();
        assert_eq!(spec.first().unwrap().value, "invoice");
        assert_eq!(
            spec.variant("invoice").unwrap().fields[0].default_value(),
            Some(&json!("INVOICE"))
        );
        let back = serde_json::to_value(&f).unwrap();
        assert_eq!(back["type"], "oneOf");
        assert!(back["oneOfOptions"].is_array());
    }

    #[test]
    fn classifies_array_items() {
        let tags: ParameterField = serde_json::from_value(json!({
            "name": "tags", "label": "Tags", "type": "array",
            "fields": [{"name": "", "label": "Tag", "type": "text", "required": true}]
        }))
        .unwrap();
        assert!(matches!(tags.item_shape(), Some(ItemShape::Scalar(_))));

        let docs: ParameterField = serde_json::from_value(json!({
            "name": "documentsToMerge", "label": "Documents", "type": "array",
            "fields": [{"name": "documentSourceIdentifier", "label": "Document", "type": "oneOf", "oneOfOptions": []}]
        }))
        .unwrap();
        assert!(matches!(docs.item_shape(), Some(ItemShape::Object(f)) if f.len() == 1));
        assert!(docs.children()[0].item_shape().is_none());
    }

    #[test]
    fn infers_variant_from_populated_keys() {
        let spec: OneOfSpec = serde_json::from_value(json!({"oneOfOptions": [
            {"label": "A", "value": "documentId", "fields": [{"name": "documentId", "label": "Id", "type": "text"}]},
            {"label": "B", "value": "zip", "fields": [
                {"name": "zipId", "label": "Zip", "type": "text"},
                {"name": "documentName", "label": "Name", "type": "text"}
            ]}
        ]}))
        .unwrap();
        assert_eq!(
            spec.infer(&json!({"zipId": "z", "documentName": "d"})).unwrap().value,
            "zip"
        );
        assert_eq!(spec.infer(&json!({"documentId": "x"})).unwrap().value, "documentId");
        assert!(spec.infer(&json!({})).is_none());
    }
}
