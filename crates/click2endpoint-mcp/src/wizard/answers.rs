//! Insertion-ordered answer set.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::questions::QuestionId;
use crate::error::WizardError;

/// Confirmed answers keyed by question, in the order they were first confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    entries: Vec<(QuestionId, String)>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: QuestionId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == id)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.entries.iter().any(|(k, _)| *k == id)
    }

    /// Record a confirmed answer. Re-confirming keeps the original position.
    pub fn confirm(&mut self, id: QuestionId, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == id) {
            slot.1 = value;
        } else {
            self.entries.push((id, value));
        }
    }

    /// Remove the most recently inserted answer.
    pub fn pop_last(&mut self) -> Option<(QuestionId, String)> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Build from a JSON object of `questionId -> string`. Unknown ids and non-string values are rejected.
    pub fn from_json(map: &JsonMap<String, JsonValue>) -> Result<Self, WizardError> {
        let mut out = AnswerSet::new();
        for (k, v) in map {
            let id: QuestionId = k.parse()?;
            let Some(s) = v.as_str() else {
                return Err(WizardError::InvalidOption {
                    question: k.clone(),
                    value: v.to_string(),
                });
            };
            out.confirm(id, s);
        }
        Ok(out)
    }
}

impl<'a> FromIterator<(QuestionId, &'a str)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (QuestionId, &'a str)>>(iter: T) -> Self {
        let mut out = AnswerSet::new();
        for (k, v) in iter {
            out.confirm(k, v);
        }
        out
    }
}

impl Serialize for AnswerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_str(), v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reconfirm_keeps_position_and_pop_removes_latest() {
        let mut a = AnswerSet::new();
        a.confirm(QuestionId::DocType, "single");
        a.confirm(QuestionId::TemplateUsage, "false");
        a.confirm(QuestionId::DocType, "multi");
        assert_eq!(a.get(QuestionId::DocType), Some("multi"));
        assert_eq!(a.len(), 2);
        assert_eq!(
            a.pop_last(),
            Some((QuestionId::TemplateUsage, "false".to_string()))
        );
        assert!(!a.contains(QuestionId::TemplateUsage));
    }

    #[test]
    fn json_conversion_preserves_order_and_rejects_unknown_ids() {
        let v = json!({"docType": "merge", "templateUsage": "true"});
        let a = AnswerSet::from_json(v.as_object().unwrap()).unwrap();
        let out = serde_json::to_string(&a).unwrap();
        assert_eq!(out, r#"{"docType":"merge","templateUsage":"true"}"#);

        let bad = json!({"colour": "red"});
        assert_eq!(
            AnswerSet::from_json(bad.as_object().unwrap()),
            Err(WizardError::UnknownQuestion("colour".into()))
        );
        let non_string = json!({"docType": 3});
        assert!(AnswerSet::from_json(non_string.as_object().unwrap()).is_err());
    }
}
