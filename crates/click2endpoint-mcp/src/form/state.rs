//! Editable value tree for one endpoint's parameter form.
//!
//! Variant selections and array item identities are keyed by a stable key in
//! which every array index is replaced by the item's id (`items#<uuid>.x`).
//! Removing an item therefore never shifts another item's selection.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use uuid::Uuid;

use super::normalize::normalize;
use super::path::{FieldPath, PathSegment};
use super::validate::{FieldError, SelectionLookup, ValidationMode, validate_tree};
use crate::error::FormError;
use crate::schema::{FieldKind, ItemShape, OneOfOption, OneOfSpec, ParameterField};

#[derive(Debug, Clone, Default)]
struct Registry {
    selections: HashMap<String, String>,
    item_ids: HashMap<String, Vec<Uuid>>,
}

impl Registry {
    /// Drop everything recorded at or below `key`.
    fn purge(&mut self, key: &str) {
        let under = |k: &String| {
            k == key
                || k.strip_prefix(key)
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('#'))
        };
        self.selections.retain(|k, _| !under(k));
        self.item_ids.retain(|k, _| !under(k));
    }

    /// Drop everything strictly below `key`, keeping `key` itself.
    fn purge_children(&mut self, key: &str) {
        let below = |k: &String| {
            k.strip_prefix(key)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('#'))
        };
        self.selections.retain(|k, _| !below(k));
        self.item_ids.retain(|k, _| !below(k));
    }
}

/// Result of projecting the form into a request body.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadReport {
    pub payload: JsonValue,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone)]
pub struct FormState {
    fields: Vec<ParameterField>,
    values: JsonValue,
    reg: Registry,
}

impl FormState {
    /// Seed every field with its default. Variant arrays start with one item
    /// set to their first variant; named oneOf fields start empty.
    pub fn new(fields: Vec<ParameterField>) -> Self {
        let mut reg = Registry::default();
        let values = seed_object(&fields, "", &mut reg);
        Self {
            fields,
            values,
            reg,
        }
    }

    pub fn fields(&self) -> &[ParameterField] {
        &self.fields
    }

    pub fn values(&self) -> &JsonValue {
        &self.values
    }

    /// Write a value, creating missing intermediate containers along the way.
    ///
    /// An index may address an existing item or append one past the end.
    /// Selections under the written node are forgotten and re-inferred from
    /// the new value.
    pub fn set_value(&mut self, path: &FieldPath, value: JsonValue) -> Result<(), FormError> {
        if path.is_root() {
            return Err(FormError::InvalidPath(String::new()));
        }
        resolve(&self.fields, &self.reg, path, false)?;
        *slot_mut(&mut self.values, path)? = value;
        reconcile_fields(&self.fields, &self.values, "", &mut self.reg);
        let key = stable_key(&self.reg, path)?;
        self.reg.purge(&key);
        reconcile_fields(&self.fields, &self.values, "", &mut self.reg);
        Ok(())
    }

    /// Switch a oneOf field (or a variant array item) to `variant`.
    ///
    /// The previous value is discarded and replaced by the new variant's defaults.
    pub fn select_variant(&mut self, path: &FieldPath, variant: &str) -> Result<(), FormError> {
        let (target, key) = resolve(&self.fields, &self.reg, path, true)?;
        let spec = target
            .one_of()
            .ok_or_else(|| FormError::NotOneOf(path.to_string()))?;
        let option = spec
            .variant(variant)
            .ok_or_else(|| FormError::UnknownVariant {
                field: path.to_string(),
                variant: variant.to_string(),
            })?;
        self.reg.purge_children(&key);
        self.reg.selections.insert(key.clone(), option.value.clone());
        let fresh = seed_object(&option.fields, &key, &mut self.reg);
        *slot_mut(&mut self.values, path)? = fresh;
        tracing::debug!("{} -> variant '{}'", path, option.value);
        Ok(())
    }

    /// Append a defaulted item and return its index.
    pub fn add_item(&mut self, path: &FieldPath) -> Result<usize, FormError> {
        let (target, key) = resolve(&self.fields, &self.reg, path, true)?;
        let field = match target {
            Target::Field(f) if matches!(f.kind, FieldKind::Array(_)) => f,
            _ => return Err(FormError::NotArray(path.to_string())),
        };
        let slot = slot_mut(&mut self.values, path)?;
        if !slot.is_array() {
            *slot = json!([]);
            self.reg.purge(&key);
        }
        let item = seed_item(field, &key, &mut self.reg);
        let items = slot
            .as_array_mut()
            .ok_or_else(|| FormError::NotArray(path.to_string()))?;
        items.push(item);
        Ok(items.len() - 1)
    }

    /// Remove an item along with every selection recorded under it.
    pub fn remove_item(&mut self, path: &FieldPath, index: usize) -> Result<(), FormError> {
        let (target, key) = resolve(&self.fields, &self.reg, path, true)?;
        if !matches!(target, Target::Field(f) if matches!(f.kind, FieldKind::Array(_))) {
            return Err(FormError::NotArray(path.to_string()));
        }
        let items = slot_mut(&mut self.values, path)?
            .as_array_mut()
            .ok_or_else(|| FormError::NotArray(path.to_string()))?;
        if index >= items.len() {
            return Err(FormError::IndexOutOfRange {
                field: path.to_string(),
                index,
                len: items.len(),
            });
        }
        items.remove(index);
        let removed = self
            .reg
            .item_ids
            .get_mut(&key)
            .filter(|ids| index < ids.len())
            .map(|ids| ids.remove(index));
        if let Some(id) = removed {
            self.reg.purge(&format!("{key}#{id}"));
        }
        Ok(())
    }

    /// Variant recorded for a oneOf field or variant item.
    pub fn selection(&self, path: &FieldPath) -> Option<&str> {
        let key = stable_key(&self.reg, path).ok()?;
        self.reg.selections.get(&key).map(String::as_str)
    }

    /// All recorded selections keyed by their current index path.
    pub fn selections(&self) -> BTreeMap<String, String> {
        self.reg
            .selections
            .iter()
            .filter_map(|(k, v)| Some((display_key(&self.reg, k)?, v.clone())))
            .collect()
    }

    pub fn validate(&self) -> Vec<FieldError> {
        validate_tree(&self.fields, &self.values, self)
    }

    /// Normalized payload plus validation findings.
    ///
    /// In blocking mode any finding turns into an error instead.
    pub fn build_payload(&self, mode: ValidationMode) -> Result<PayloadReport, FormError> {
        let errors = self.validate();
        if mode == ValidationMode::Blocking && !errors.is_empty() {
            return Err(FormError::Blocked(errors.len()));
        }
        Ok(PayloadReport {
            payload: normalize(&self.values),
            errors,
        })
    }
}

impl SelectionLookup for FormState {
    fn selected(&self, path: &FieldPath) -> Option<&str> {
        self.selection(path)
    }
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Root,
    Field(&'a ParameterField),
    /// An item of this array field.
    Item(&'a ParameterField),
}

impl<'a> Target<'a> {
    fn one_of(self) -> Option<&'a OneOfSpec> {
        match self {
            Target::Field(f) => f.one_of(),
            Target::Item(arr) => match arr.item_shape()? {
                ItemShape::Variant(spec) => Some(spec),
                _ => None,
            },
            Target::Root => None,
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn find<'a>(
    fields: &'a [ParameterField],
    name: &str,
    parent: &str,
) -> Result<&'a ParameterField, FormError> {
    fields
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| FormError::UnknownField(join(parent, name)))
}

/// Look `name` up in the selected variant first, then in any variant.
fn find_in_variant<'a>(
    spec: &'a OneOfSpec,
    selected: Option<&String>,
    name: &str,
    parent: &str,
) -> Result<&'a ParameterField, FormError> {
    let chosen = selected
        .and_then(|s| spec.variant(s))
        .and_then(|o| o.fields.iter().find(|f| f.name == name));
    chosen
        .or_else(|| {
            spec.one_of_options
                .iter()
                .flat_map(|o| o.fields.iter())
                .find(|f| f.name == name)
        })
        .ok_or_else(|| FormError::UnknownField(join(parent, name)))
}

fn item_key(reg: &Registry, array_key: &str, index: usize) -> Result<String, FormError> {
    let ids = reg
        .item_ids
        .get(array_key)
        .ok_or_else(|| FormError::NotArray(array_key.to_string()))?;
    let id = ids.get(index).ok_or_else(|| FormError::IndexOutOfRange {
        field: array_key.to_string(),
        index,
        len: ids.len(),
    })?;
    Ok(format!("{array_key}#{id}"))
}

fn stable_key(reg: &Registry, path: &FieldPath) -> Result<String, FormError> {
    path.segments()
        .iter()
        .try_fold(String::new(), |key, seg| match seg {
            PathSegment::Property(name) => Ok(join(&key, name)),
            PathSegment::Index(i) => item_key(reg, &key, *i),
        })
}

/// Walk the schema along `path`, returning the node it addresses and its stable key.
///
/// When `existing` is false, indices past the end of an array are accepted
/// and get a placeholder key that matches nothing recorded.
fn resolve<'a>(
    fields: &'a [ParameterField],
    reg: &Registry,
    path: &FieldPath,
    existing: bool,
) -> Result<(Target<'a>, String), FormError> {
    let mut target = Target::Root;
    let mut key = String::new();
    for seg in path.segments() {
        target = match (target, seg) {
            (Target::Root, PathSegment::Property(name)) => Target::Field(find(fields, name, &key)?),
            (Target::Field(f), PathSegment::Property(name)) => match &f.kind {
                FieldKind::Object(g) => Target::Field(find(&g.fields, name, &key)?),
                FieldKind::OneOf(spec) => {
                    Target::Field(find_in_variant(spec, reg.selections.get(&key), name, &key)?)
                }
                _ => return Err(FormError::UnknownField(join(&key, name))),
            },
            (Target::Field(f), PathSegment::Index(i)) if f.item_shape().is_some() => {
                key = match item_key(reg, &key, *i) {
                    Err(FormError::IndexOutOfRange { .. }) | Err(FormError::NotArray(_))
                        if !existing =>
                    {
                        format!("{key}#{i}")
                    }
                    other => other?,
                };
                target = Target::Item(f);
                continue;
            }
            (Target::Item(arr), PathSegment::Property(name)) => match arr.item_shape() {
                Some(ItemShape::Variant(spec)) => {
                    Target::Field(find_in_variant(spec, reg.selections.get(&key), name, &key)?)
                }
                Some(ItemShape::Object(fs)) => Target::Field(find(fs, name, &key)?),
                _ => return Err(FormError::UnknownField(join(&key, name))),
            },
            _ => return Err(FormError::InvalidPath(path.to_string())),
        };
        if let PathSegment::Property(name) = seg {
            key = join(&key, name);
        }
    }
    Ok((target, key))
}

/// Reject indices more than one past the end of their array before
/// anything is written.
fn check_indices(root: &JsonValue, path: &FieldPath) -> Result<(), FormError> {
    let mut cur = Some(root);
    let mut walked = FieldPath::root();
    for seg in path.segments() {
        match seg {
            PathSegment::Property(name) => {
                cur = cur.and_then(|v| v.get(name));
                walked = walked.child(name);
            }
            PathSegment::Index(i) => {
                let len = cur.and_then(JsonValue::as_array).map_or(0, Vec::len);
                if *i > len {
                    return Err(FormError::IndexOutOfRange {
                        field: walked.to_string(),
                        index: *i,
                        len,
                    });
                }
                cur = cur.and_then(|v| v.get(*i));
                walked = walked.index(*i);
            }
        }
    }
    Ok(())
}

/// Mutable slot at `path`, creating containers as needed: objects for
/// property segments, a `null` item for an index one past the end.
fn slot_mut<'v>(
    root: &'v mut JsonValue,
    path: &FieldPath,
) -> Result<&'v mut JsonValue, FormError> {
    check_indices(root, path)?;
    let mut cur = root;
    for seg in path.segments() {
        cur = match seg {
            PathSegment::Property(name) => {
                if !cur.is_object() {
                    *cur = JsonValue::Object(JsonMap::new());
                }
                match cur {
                    JsonValue::Object(map) => map.entry(name.clone()).or_insert(JsonValue::Null),
                    other => other,
                }
            }
            PathSegment::Index(i) => {
                if !cur.is_array() {
                    *cur = JsonValue::Array(Vec::new());
                }
                match cur {
                    JsonValue::Array(items) => {
                        if items.len() == *i {
                            items.push(JsonValue::Null);
                        }
                        &mut items[*i]
                    }
                    other => other,
                }
            }
        };
    }
    Ok(cur)
}

/// Turn a stable key back into an index path; `None` once the item is gone.
fn display_key(reg: &Registry, key: &str) -> Option<String> {
    let mut parts = key.split('#');
    let first = parts.next()?;
    let mut stable = first.to_string();
    let mut shown = first.to_string();
    for part in parts {
        let (id, rest) = part.split_at_checked(36)?;
        let id: Uuid = id.parse().ok()?;
        let index = reg.item_ids.get(&stable)?.iter().position(|x| *x == id)?;
        shown.push_str(&format!("[{index}]{rest}"));
        stable.push_str(&format!("#{id}{rest}"));
    }
    Some(shown)
}

fn seed(field: &ParameterField, key: &str, reg: &mut Registry) -> JsonValue {
    match &field.kind {
        FieldKind::Object(g) => seed_object(&g.fields, key, reg),
        FieldKind::OneOf(_) => JsonValue::Object(JsonMap::new()),
        FieldKind::Array(_) => JsonValue::Array(vec![seed_item(field, key, reg)]),
        _ => field.default_value().cloned().unwrap_or_else(|| json!("")),
    }
}

fn seed_object(fields: &[ParameterField], key: &str, reg: &mut Registry) -> JsonValue {
    let map = fields
        .iter()
        .map(|f| (f.name.clone(), seed(f, &join(key, &f.name), reg)))
        .collect();
    JsonValue::Object(map)
}

/// Allocate an id for a new item of `array` and build its default value.
fn seed_item(array: &ParameterField, array_key: &str, reg: &mut Registry) -> JsonValue {
    let id = Uuid::new_v4();
    reg.item_ids
        .entry(array_key.to_string())
        .or_default()
        .push(id);
    let key = format!("{array_key}#{id}");
    match array.item_shape() {
        Some(ItemShape::Scalar(f)) => f.default_value().cloned().unwrap_or_else(|| json!("")),
        Some(ItemShape::Variant(spec)) => match spec.first() {
            Some(first) => seed_variant(first, &key, reg),
            None => JsonValue::Object(JsonMap::new()),
        },
        Some(ItemShape::Object(fields)) => seed_object(fields, &key, reg),
        None => JsonValue::Null,
    }
}

fn seed_variant(option: &OneOfOption, key: &str, reg: &mut Registry) -> JsonValue {
    reg.selections.insert(key.to_string(), option.value.clone());
    seed_object(&option.fields, key, reg)
}

/// Bring item ids in line with the arrays in `obj` after a direct write.
fn reconcile_fields(fields: &[ParameterField], obj: &JsonValue, key: &str, reg: &mut Registry) {
    for f in fields {
        if let Some(v) = obj.get(&f.name) {
            reconcile_field(f, v, &join(key, &f.name), reg);
        }
    }
}

fn reconcile_field(field: &ParameterField, value: &JsonValue, key: &str, reg: &mut Registry) {
    match &field.kind {
        FieldKind::Object(g) => reconcile_fields(&g.fields, value, key, reg),
        FieldKind::OneOf(spec) => {
            let selected = reg.selections.get(key).cloned();
            if let Some(option) = spec.active(selected.as_deref(), value) {
                reconcile_fields(&option.fields, value, key, reg);
            }
        }
        FieldKind::Array(_) => {
            let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
            let ids = reg.item_ids.entry(key.to_string()).or_default();
            let dropped = ids.split_off(items.len().min(ids.len()));
            while ids.len() < items.len() {
                ids.push(Uuid::new_v4());
            }
            let ids = ids.clone();
            for id in dropped {
                reg.purge(&format!("{key}#{id}"));
            }
            for (item, id) in items.iter().zip(ids) {
                let item_key = format!("{key}#{id}");
                match field.item_shape() {
                    Some(ItemShape::Variant(spec)) => {
                        let selected = reg.selections.get(&item_key).cloned();
                        if let Some(option) = spec.active(selected.as_deref(), item) {
                            if selected.is_none() {
                                reg.selections.insert(item_key.clone(), option.value.clone());
                            }
                            reconcile_fields(&option.fields, item, &item_key, reg);
                        }
                    }
                    Some(ItemShape::Object(fs)) => reconcile_fields(fs, item, &item_key, reg),
                    _ => {}
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

    fn form(path: &str) -> FormState {
        FormState::new(SchemaCatalog::builtin().fields(path).to_vec())
    }

    fn p(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    #[test]
    fn seeds_defaults_and_first_variant_items() {
        let f = form(paths::SINGLE_DOC_JOB_TEMPLATE);
        let v = f.values();
        assert_eq!(v["jobTemplate"], "legal-contract-template");
        assert_eq!(v["documentSourceIdentifier"], json!({}));
        assert_eq!(v["paymentDetails"], json!({}));
        let first = &v["recipientAddressSource"][0];
        assert_eq!(first["recipientAddress"]["country"], "USA");
        assert_eq!(first["recipientAddress"]["firstName"], "");
        assert_eq!(
            f.selection(&p("recipientAddressSource[0]")),
            Some("recipientAddress")
        );
        assert_eq!(f.selection(&p("paymentDetails")), None);
    }

    #[test]
    fn array_item_shapes() {
        let f = form(paths::MULTI_DOCS_JOB_TEMPLATE);
        assert_eq!(f.values()["tags"], json!([""]));
        let item = &f.values()["items"][0];
        assert_eq!(item["documentSourceIdentifier"], json!({}));
        assert_eq!(item["recipientAddressSource"]["recipientAddress"]["zip"], "");

        let f = form(paths::MULTI_DOC_MERGE_JOB_TEMPLATE);
        assert_eq!(
            f.values()["documentsToMerge"],
            json!([{"documentSourceIdentifier": {}}])
        );
    }

    #[test]
    fn set_value_creates_containers() {
        let mut f = form(paths::SINGLE_DOC);
        f.set_value(&p("documentSourceIdentifier.documentId"), json!("doc_9"))
            .unwrap();
        assert_eq!(f.values()["documentSourceIdentifier"], json!({"documentId": "doc_9"}));
        f.set_value(&p("jobOptions.layout"), json!("landscape")).unwrap();
        assert_eq!(f.values()["jobOptions"]["layout"], "landscape");
        assert_eq!(f.values()["jobOptions"]["paperType"], "letter");

        assert!(matches!(
            f.set_value(&p("nope"), json!(1)),
            Err(FormError::UnknownField(_))
        ));
        f.set_value(&p("recipientAddressSource[1].addressId"), json!("a"))
            .unwrap();
        let recipients = f.values()["recipientAddressSource"].as_array().unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[1], json!({"addressId": "a"}));
        assert_eq!(f.selection(&p("recipientAddressSource[1]")), Some("addressId"));
    }

    #[test]
    fn set_value_rejects_indices_past_the_end() {
        let mut f = form(paths::SINGLE_DOC);
        let before = f.values().clone();
        let huge = p(&format!("recipientAddressSource[{}].addressId", usize::MAX));
        assert!(matches!(
            f.set_value(&huge, json!("a")),
            Err(FormError::IndexOutOfRange { len: 1, .. })
        ));
        assert!(matches!(
            f.set_value(&p("recipientAddressSource[1000000000]"), json!({})),
            Err(FormError::IndexOutOfRange { index: 1000000000, .. })
        ));
        assert!(matches!(
            f.set_value(&p("recipientAddressSource[2].addressId"), json!("a")),
            Err(FormError::IndexOutOfRange { index: 2, len: 1, .. })
        ));
        assert_eq!(f.values(), &before);
    }

    #[test]
    fn variant_switch_is_destructive() {
        let mut f = form(paths::SINGLE_DOC);
        f.select_variant(&p("paymentDetails"), "creditCard").unwrap();
        assert_eq!(f.values()["paymentDetails"]["CREDIT_CARD"], "CREDIT_CARD");
        assert_eq!(
            f.values()["paymentDetails"]["creditCardDetails"]["expirationDate"]["month"],
            12
        );
        f.set_value(
            &p("paymentDetails.creditCardDetails.cardNumber"),
            json!("5500000000000004"),
        )
        .unwrap();

        f.select_variant(&p("paymentDetails"), "invoice").unwrap();
        assert_eq!(
            f.values()["paymentDetails"],
            json!({"INVOICE": "INVOICE", "invoiceDetails": {"invoiceNumber": "", "amountDue": ""}})
        );

        f.select_variant(&p("paymentDetails"), "creditCard").unwrap();
        assert_eq!(
            f.values()["paymentDetails"]["creditCardDetails"]["cardNumber"],
            "4111111111111111"
        );
        assert_eq!(f.selection(&p("paymentDetails")), Some("creditCard"));

        assert!(matches!(
            f.select_variant(&p("paymentDetails"), "cash"),
            Err(FormError::UnknownVariant { .. })
        ));
        assert!(matches!(
            f.select_variant(&p("jobOptions"), "x"),
            Err(FormError::NotOneOf(_))
        ));
    }

    #[test]
    fn removing_an_item_keeps_other_selections() {
        let mut f = form(paths::SINGLE_DOC);
        let arr = p("recipientAddressSource");
        assert_eq!(f.add_item(&arr).unwrap(), 1);
        f.select_variant(&p("recipientAddressSource[1]"), "addressId")
            .unwrap();
        f.set_value(&p("recipientAddressSource[1].addressId"), json!("addr_7"))
            .unwrap();

        f.remove_item(&arr, 0).unwrap();
        assert_eq!(f.values()["recipientAddressSource"], json!([{"addressId": "addr_7"}]));
        assert_eq!(f.selection(&p("recipientAddressSource[0]")), Some("addressId"));
        let sel = f.selections();
        assert_eq!(sel.len(), 1);
        assert_eq!(sel["recipientAddressSource[0]"], "addressId");

        assert!(matches!(
            f.remove_item(&arr, 3),
            Err(FormError::IndexOutOfRange { len: 1, .. })
        ));
        assert!(matches!(
            f.add_item(&p("jobOptions")),
            Err(FormError::NotArray(_))
        ));
    }

    #[test]
    fn nested_selections_follow_their_item() {
        let mut f = form(paths::MULTI_DOC);
        let items = p("items");
        f.add_item(&items).unwrap();
        f.select_variant(&p("items[0].documentSourceIdentifier"), "documentId")
            .unwrap();
        f.select_variant(&p("items[1].documentSourceIdentifier"), "externalUrl")
            .unwrap();
        f.remove_item(&items, 0).unwrap();
        assert_eq!(
            f.selection(&p("items[0].documentSourceIdentifier")),
            Some("externalUrl")
        );
        assert_eq!(
            f.values()["items"][0]["documentSourceIdentifier"],
            json!({"externalUrl": ""})
        );
    }

    #[test]
    fn replacing_an_array_resyncs_item_ids() {
        let mut f = form(paths::SINGLE_DOC);
        f.set_value(
            &p("recipientAddressSource"),
            json!([{"addressListId": "l1"}, {"addressId": "a2"}]),
        )
        .unwrap();
        assert_eq!(f.selection(&p("recipientAddressSource[0]")), Some("addressListId"));
        assert_eq!(f.selection(&p("recipientAddressSource[1]")), Some("addressId"));
        f.remove_item(&p("recipientAddressSource"), 1).unwrap();
        assert_eq!(f.selections().len(), 1);
    }

    #[test]
    fn payload_is_normalized() {
        let mut f = form(paths::SINGLE_DOC);
        f.select_variant(&p("documentSourceIdentifier"), "documentId")
            .unwrap();
        let report = f.build_payload(ValidationMode::Advisory).unwrap();
        assert_eq!(
            report.payload["documentSourceIdentifier"],
            json!({"documentId": "doc_sample_contract_001"})
        );
        assert!(!report.errors.is_empty());
        assert!(matches!(
            f.build_payload(ValidationMode::Blocking),
            Err(FormError::Blocked(n)) if n == report.errors.len()
        ));
    }
}
