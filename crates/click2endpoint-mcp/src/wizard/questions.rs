//! Static question catalog for the endpoint wizard.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// Identifier of a wizard question. Serialized with the camelCase ids clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionId {
    DocType,
    TemplateUsage,
    TemplateContent,
    RecipientStyle,
    Personalized,
}

impl QuestionId {
    pub const ALL: [QuestionId; 5] = [
        QuestionId::DocType,
        QuestionId::TemplateUsage,
        QuestionId::TemplateContent,
        QuestionId::RecipientStyle,
        QuestionId::Personalized,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionId::DocType => "docType",
            QuestionId::TemplateUsage => "templateUsage",
            QuestionId::TemplateContent => "templateContent",
            QuestionId::RecipientStyle => "recipientStyle",
            QuestionId::Personalized => "personalized",
        }
    }

    fn index(self) -> usize {
        match self {
            QuestionId::DocType => 0,
            QuestionId::TemplateUsage => 1,
            QuestionId::TemplateContent => 2,
            QuestionId::RecipientStyle => 3,
            QuestionId::Personalized => 4,
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionId {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| WizardError::UnknownQuestion(s.to_string()))
    }
}

/// Option values the decision graph branches on.
pub mod values {
    pub const SINGLE: &str = "single";
    pub const MULTI: &str = "multi";
    pub const MERGE: &str = "merge";
    pub const PDF_SPLIT: &str = "pdfSplit";
    pub const TRUE: &str = "true";
    pub const ADDRESS_CAPTURE: &str = "addressCapture";
    pub const ADDRESS_LIST: &str = "addressList";
    pub const DOCUMENT: &str = "document";
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionOption {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<&'static str>,
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

static QUESTIONS: Lazy<Vec<Question>> =
    Lazy::new(|| QuestionId::ALL.into_iter().map(build_question).collect());

/// Look up the static definition of a question.
pub fn question(id: QuestionId) -> &'static Question {
    &QUESTIONS[id.index()]
}

/// All questions in catalog order.
pub fn all_questions() -> &'static [Question] {
    &QUESTIONS
}

fn build_question(id: QuestionId) -> Question {
    let opt = |value, label, description, icon| QuestionOption {
        value,
        label,
        description,
        icon: Some(icon),
    };
    match id {
        QuestionId::DocType => Question {
            id,
            title: "What type of document submission do you need?",
            subtitle: Some("Select the option that best describes your use case"),
            options: vec![
                opt(
                    values::SINGLE,
                    "Single document",
                    "One document going to one or more recipients",
                    "📄",
                ),
                opt(
                    values::MULTI,
                    "Multiple separate documents",
                    "Multiple individual documents, each processed separately",
                    "📑",
                ),
                opt(
                    values::MERGE,
                    "Multiple documents to merge",
                    "Multiple documents combined into one mailing",
                    "📎",
                ),
                opt(
                    values::PDF_SPLIT,
                    "Split a combined PDF",
                    "One PDF containing multiple documents that need to be separated",
                    "✂️",
                ),
            ],
        },
        QuestionId::TemplateUsage => Question {
            id,
            title: "Will you use a saved job template?",
            subtitle: Some("Templates save time by reusing common job settings"),
            options: vec![
                opt(
                    values::TRUE,
                    "Yes - Use saved template",
                    "Reuse settings from a previously saved job template",
                    "🔖",
                ),
                opt(
                    "false",
                    "No - Configure manually",
                    "Set up all job parameters from scratch",
                    "⚙️",
                ),
            ],
        },
        QuestionId::TemplateContent => Question {
            id,
            title: "What is stored in your job template?",
            subtitle: Some(
                "Templates can contain either address lists OR documents (but not both)",
            ),
            options: vec![
                opt(
                    values::ADDRESS_LIST,
                    "Address list",
                    "Template contains recipient addresses (you will provide documents)",
                    "📋",
                ),
                opt(
                    values::DOCUMENT,
                    "Document",
                    "Template contains the document (you will provide addresses)",
                    "📄",
                ),
                opt(
                    "neither",
                    "Neither",
                    "Template only contains job options (you provide both)",
                    "⚙️",
                ),
            ],
        },
        QuestionId::RecipientStyle => Question {
            id,
            title: "How will recipient addresses be provided?",
            subtitle: Some("Choose how you want to specify the mailing addresses"),
            options: vec![
                opt(
                    "explicit",
                    "Provided in API call",
                    "Addresses sent as part of the API request",
                    "📮",
                ),
                opt(
                    "template",
                    "From template/mailing list",
                    "Use addresses saved in template or mailing list",
                    "📋",
                ),
                opt(
                    values::ADDRESS_CAPTURE,
                    "Extract from document",
                    "Automatically capture addresses from the document content",
                    "🔍",
                ),
            ],
        },
        QuestionId::Personalized => Question {
            id,
            title: "Is each document personalized for its recipient?",
            subtitle: Some("Personalized documents have unique content per recipient"),
            options: vec![
                opt(
                    values::TRUE,
                    "Yes - Unique per recipient",
                    "Each document has recipient-specific content",
                    "👤",
                ),
                opt(
                    "false",
                    "No - Same for all",
                    "Same document content for all recipients",
                    "👥",
                ),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_id() {
        for id in QuestionId::ALL {
            assert_eq!(question(id).id, id);
        }
        assert_eq!(all_questions().len(), 5);
    }

    #[test]
    fn ids_round_trip_through_strings() {
        for id in QuestionId::ALL {
            assert_eq!(id.as_str().parse::<QuestionId>().unwrap(), id);
        }
        assert!("docKind".parse::<QuestionId>().is_err());
    }

    #[test]
    fn serialized_question_uses_client_ids() {
        let v = serde_json::to_value(question(QuestionId::TemplateContent)).unwrap();
        assert_eq!(v["id"], "templateContent");
        assert_eq!(v["options"].as_array().unwrap().len(), 3);
        assert!(question(QuestionId::DocType).has_option("pdfSplit"));
        assert!(!question(QuestionId::DocType).has_option("zip"));
    }
}
