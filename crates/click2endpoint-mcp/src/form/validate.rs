//! Per-field rules: required, pattern, length and numeric range.

use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::path::FieldPath;
use crate::schema::{FieldKind, ItemShape, ParameterField};

/// Whether validation findings block payload generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Advisory,
    Blocking,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advisory" => Ok(Self::Advisory),
            "blocking" => Ok(Self::Blocking),
            other => Err(format!("unknown validation mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Source of recorded oneOf selections; without one, variants are inferred.
pub trait SelectionLookup {
    fn selected(&self, path: &FieldPath) -> Option<&str>;
}

impl SelectionLookup for () {
    fn selected(&self, _path: &FieldPath) -> Option<&str> {
        None
    }
}

/// Null, empty string, `false`, empty array or empty object. `0` counts as present.
fn is_missing(v: Option<&JsonValue>) -> bool {
    match v {
        None | Some(JsonValue::Null) | Some(JsonValue::Bool(false)) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(JsonValue::Array(a)) => a.is_empty(),
        Some(JsonValue::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

fn as_number(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First rule a scalar value breaks, as a user-facing message.
pub fn validate_field(field: &ParameterField, value: Option<&JsonValue>) -> Option<String> {
    let label = &field.label;
    if is_missing(value) {
        return field.required.then(|| format!("{label} is required"));
    }
    let value = value?;
    if matches!(field.kind, FieldKind::Number(_)) {
        let Some(n) = as_number(value) else {
            return Some(format!("{label} must be a number"));
        };
        let rule = field.validation()?;
        return match (rule.min, rule.max) {
            (Some(min), _) if n < min => Some(format!("{label} must be at least {min}")),
            (_, Some(max)) if n > max => Some(format!("{label} must be no more than {max}")),
            _ => None,
        };
    }
    let (Some(rule), Some(text)) = (field.validation(), value.as_str()) else {
        return None;
    };
    if let Some(pattern) = &rule.pattern {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(text) => return Some(format!("{label} format is invalid")),
            Ok(_) => {}
            Err(e) => tracing::warn!("skipping invalid pattern for {}: {}", field.name, e),
        }
    }
    let len = text.chars().count();
    match (rule.min_length, rule.max_length) {
        (Some(min), _) if len < min => Some(format!("{label} must be at least {min} characters")),
        (_, Some(max)) if len > max => Some(format!("{label} must be no more than {max} characters")),
        _ => None,
    }
}

/// Validate a whole value tree against its schema.
///
/// Walks objects, array items and the active variant of every oneOf.
pub fn validate_tree(
    fields: &[ParameterField],
    values: &JsonValue,
    selections: &dyn SelectionLookup,
) -> Vec<FieldError> {
    let mut out = Vec::new();
    walk_fields(fields, values, &FieldPath::root(), selections, &mut out);
    out
}

fn walk_fields(
    fields: &[ParameterField],
    obj: &JsonValue,
    at: &FieldPath,
    selections: &dyn SelectionLookup,
    out: &mut Vec<FieldError>,
) {
    for f in fields {
        walk_field(f, obj.get(&f.name), &at.child(&f.name), selections, out);
    }
}

fn walk_field(
    field: &ParameterField,
    value: Option<&JsonValue>,
    at: &FieldPath,
    selections: &dyn SelectionLookup,
    out: &mut Vec<FieldError>,
) {
    let mut push = |message: String| {
        out.push(FieldError {
            path: at.to_string(),
            message,
        })
    };
    if field.is_scalar() {
        if let Some(message) = validate_field(field, value) {
            push(message);
        }
        return;
    }
    let Some(value) = value.filter(|v| !is_missing(Some(*v))) else {
        if field.required {
            push(format!("{} is required", field.label));
        }
        return;
    };
    match &field.kind {
        FieldKind::Object(g) => walk_fields(&g.fields, value, at, selections, out),
        FieldKind::OneOf(spec) => {
            if let Some(option) = spec.active(selections.selected(at), value) {
                walk_fields(&option.fields, value, at, selections, out);
            }
        }
        FieldKind::Array(_) => {
            let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
            for (i, item) in items.iter().enumerate() {
                let item_at = at.index(i);
                match field.item_shape() {
                    Some(ItemShape::Scalar(f)) => {
                        walk_field(f, Some(item), &item_at, selections, out)
                    }
                    Some(ItemShape::Variant(spec)) => {
                        if let Some(option) = spec.active(selections.selected(&item_at), item) {
                            walk_fields(&option.fields, item, &item_at, selections, out);
                        }
                    }
                    Some(ItemShape::Object(fs)) => {
                        walk_fields(fs, item, &item_at, selections, out)
                    }
                    None => {}
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::paths;
    use crate::schema::SchemaCatalog;
    use serde_json::json;

    fn field(v: JsonValue) -> ParameterField {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn required_treats_zero_as_present() {
        let f = field(json!({"name": "n", "label": "Count", "type": "number", "required": true}));
        assert_eq!(validate_field(&f, Some(&json!(0))), None);
        assert_eq!(
            validate_field(&f, Some(&json!(""))).as_deref(),
            Some("Count is required")
        );
        assert_eq!(
            validate_field(&f, Some(&json!("abc"))).as_deref(),
            Some("Count must be a number")
        );
        assert_eq!(validate_field(&f, Some(&json!(" 42 "))), None);
    }

    #[test]
    fn pattern_and_length_rules() {
        let state = field(json!({
            "name": "state", "label": "State", "type": "text", "required": true,
            "validation": {"pattern": "^[A-Z]{2}$", "maxLength": 2}
        }));
        assert_eq!(validate_field(&state, Some(&json!("NY"))), None);
        assert_eq!(
            validate_field(&state, Some(&json!("ny"))).as_deref(),
            Some("State format is invalid")
        );
        let nick = field(json!({
            "name": "nick", "label": "Nickname", "type": "text",
            "validation": {"minLength": 3}
        }));
        assert_eq!(validate_field(&nick, Some(&json!(""))), None);
        assert_eq!(
            validate_field(&nick, Some(&json!("ab"))).as_deref(),
            Some("Nickname must be at least 3 characters")
        );
    }

    #[test]
    fn numeric_range() {
        let month = field(json!({
            "name": "month", "label": "Month", "type": "number", "required": true,
            "validation": {"min": 1, "max": 12}
        }));
        assert_eq!(
            validate_field(&month, Some(&json!(13))).as_deref(),
            Some("Month must be no more than 12")
        );
        assert_eq!(
            validate_field(&month, Some(&json!("0"))).as_deref(),
            Some("Month must be at least 1")
        );
    }

    #[test]
    fn walks_items_and_inferred_variants() {
        let fields = SchemaCatalog::builtin()
            .fields(paths::SINGLE_DOC)
            .to_vec();
        let values = json!({
            "documentSourceIdentifier": {"documentId": "doc_1"},
            "recipientAddressSource": [{"addressId": ""}, {"addressListId": "l1"}],
            "jobOptions": {
                "documentClass": "businessLetter", "layout": "portrait",
                "mailclass": "firstClassMail", "paperType": "letter",
                "printOption": "none", "envelope": "flat"
            },
            "paymentDetails": {"ACH": "ACH", "achDetails": {
                "routingNumber": "1", "accountNumber": "2", "checkDigit": "x"
            }}
        });
        let errors = validate_tree(&fields, &values, &());
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "recipientAddressSource[0].addressId",
                "paymentDetails.achDetails.checkDigit"
            ]
        );
        assert_eq!(errors[0].message, "Address ID is required");
        assert_eq!(errors[1].message, "Check Digit must be a number");
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Blocking".parse::<ValidationMode>(), Ok(ValidationMode::Blocking));
        assert!("strict".parse::<ValidationMode>().is_err());
        assert_eq!(ValidationMode::default(), ValidationMode::Advisory);
    }
}
