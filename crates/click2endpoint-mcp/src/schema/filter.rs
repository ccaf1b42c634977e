//! Hide fields the chosen job template already supplies.

use super::field::ParameterField;
use crate::wizard::questions::values;
use crate::wizard::{AnswerSet, QuestionId};

/// Name of the field a template makes redundant, if any.
pub fn hidden_field(answers: &AnswerSet) -> Option<&'static str> {
    match answers.get(QuestionId::TemplateContent)? {
        values::ADDRESS_LIST => Some("addressListId"),
        values::DOCUMENT => Some("documentSourceIdentifier"),
        _ => None,
    }
}

/// Schema to present for these answers.
///
/// Only top-level fields are hidden; nested fields of the same name stay.
pub fn filter_for_answers(fields: &[ParameterField], answers: &AnswerSet) -> Vec<ParameterField> {
    match hidden_field(answers) {
        Some(name) => {
            tracing::debug!("hiding '{}' supplied by template", name);
            fields.iter().filter(|f| f.name != name).cloned().collect()
        }
        None => fields.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::paths;
    use crate::form::{FormState, ValidationMode};
    use crate::schema::SchemaCatalog;
    use serde_json::json;

    fn answers(content: &str) -> AnswerSet {
        [
            (QuestionId::DocType, "single"),
            (QuestionId::TemplateUsage, "true"),
            (QuestionId::TemplateContent, content),
        ]
        .into_iter()
        .collect()
    }

    fn mentions(fields: &[ParameterField], name: &str) -> bool {
        fields.iter().any(|f| {
            f.name == name
                || mentions(f.children(), name)
                || f.one_of()
                    .is_some_and(|s| s.one_of_options.iter().any(|o| o.value == name || mentions(&o.fields, name)))
        })
    }

    #[test]
    fn document_template_hides_document_source() {
        let c = SchemaCatalog::builtin();
        let raw = c.fields(paths::SINGLE_DOC_JOB_TEMPLATE);
        let shown = filter_for_answers(raw, &answers("document"));
        assert_eq!(shown.len(), raw.len() - 1);
        assert!(!mentions(&shown, "documentSourceIdentifier"));
    }

    #[test]
    fn address_list_template_keeps_nested_list_variant() {
        let c = SchemaCatalog::builtin();
        let raw = c.fields(paths::SINGLE_DOC_JOB_TEMPLATE);
        let shown = filter_for_answers(raw, &answers("addressList"));
        assert_eq!(shown, raw.to_vec());
        let recipients = shown
            .iter()
            .find(|f| f.name == "recipientAddressSource")
            .unwrap();
        let variants = &recipients.children()[0].one_of().unwrap().one_of_options;
        assert_eq!(variants.len(), 3);
        assert!(mentions(&shown, "addressListId"));
    }

    #[test]
    fn document_template_keeps_per_item_document_source() {
        let c = SchemaCatalog::builtin();
        let raw = c.fields(paths::MULTI_DOC_MERGE_JOB_TEMPLATE);
        let shown = filter_for_answers(raw, &answers("document"));
        let merged = shown
            .iter()
            .find(|f| f.name == "documentsToMerge")
            .unwrap();
        assert!(mentions(merged.children(), "documentSourceIdentifier"));

        let mut form = FormState::new(shown);
        form.set_value(
            &"documentsToMerge[0].documentSourceIdentifier.documentId"
                .parse()
                .unwrap(),
            json!("doc_1"),
        )
        .unwrap();
        let report = form.build_payload(ValidationMode::Advisory).unwrap();
        assert_eq!(
            report.payload["documentsToMerge"],
            json!([{"documentSourceIdentifier": {"documentId": "doc_1"}}])
        );
    }

    #[test]
    fn neither_keeps_everything() {
        let c = SchemaCatalog::builtin();
        let raw = c.fields(paths::SINGLE_DOC_JOB_TEMPLATE);
        assert_eq!(filter_for_answers(raw, &answers("neither")), raw.to_vec());
        assert_eq!(filter_for_answers(raw, &AnswerSet::new()), raw.to_vec());
    }
}
