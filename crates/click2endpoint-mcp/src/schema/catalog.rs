//! Built-in parameter schemas for each endpoint.

use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use super::field::{
    FieldKind, GroupSpec, OneOfOption, OneOfSpec, ParameterField, ScalarSpec, SelectOption,
    SelectSpec, Validation,
};
use crate::endpoints::paths;

/// Endpoint path to field schema. Paths without an entry have no parameters.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    by_path: HashMap<String, Vec<ParameterField>>,
}

impl SchemaCatalog {
    pub fn builtin() -> Self {
        let mut by_path = HashMap::new();
        by_path.insert(
            paths::SINGLE_DOC_JOB_TEMPLATE.to_string(),
            vec![
                job_template(),
                document_source(),
                recipients(),
                payment_details(),
            ],
        );
        by_path.insert(
            paths::MULTI_DOCS_JOB_TEMPLATE.to_string(),
            vec![job_template(), items(), payment_details(), tags()],
        );
        by_path.insert(
            paths::SINGLE_DOC.to_string(),
            vec![
                document_source(),
                recipients(),
                job_options(),
                payment_details(),
            ],
        );
        by_path.insert(
            paths::MULTI_DOC.to_string(),
            vec![items(), job_options(), payment_details()],
        );
        by_path.insert(
            paths::MULTI_DOC_MERGE_JOB_TEMPLATE.to_string(),
            vec![job_template(), documents_to_merge(), simple_recipient()],
        );
        for p in [
            paths::MULTI_DOC_MERGE,
            paths::SINGLE_PDF_SPLIT,
            paths::SINGLE_PDF_SPLIT_ADDRESS_CAPTURE,
        ] {
            by_path.insert(p.to_string(), Vec::new());
        }
        Self { by_path }
    }

    /// Fields for `path`; an unknown path yields an empty slice.
    pub fn fields(&self, path: &str) -> &[ParameterField] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, fields: Vec<ParameterField>) {
        self.by_path.insert(path.into(), fields);
    }

    /// Replace same-named fields in place and append new ones.
    pub fn merge(&mut self, path: impl Into<String>, fields: Vec<ParameterField>) {
        let existing = self.by_path.entry(path.into()).or_default();
        for f in fields {
            if let Some(slot) = existing.iter_mut().find(|e| e.name == f.name) {
                *slot = f;
            } else {
                existing.push(f);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl ParameterField {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required: true,
            description: None,
            kind,
        }
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    fn placeholder(mut self, text: &str) -> Self {
        if let FieldKind::Text(s) | FieldKind::Number(s) | FieldKind::File(s) = &mut self.kind {
            s.placeholder = Some(text.to_string());
        }
        self
    }

    fn default_to(mut self, value: JsonValue) -> Self {
        match &mut self.kind {
            FieldKind::Text(s) | FieldKind::Number(s) | FieldKind::File(s) => {
                s.default_value = Some(value)
            }
            FieldKind::Select(s) => s.default_value = Some(value),
            _ => {}
        }
        self
    }

    fn validated(mut self, rule: Validation) -> Self {
        if let FieldKind::Text(s) | FieldKind::Number(s) | FieldKind::File(s) = &mut self.kind {
            s.validation = Some(rule);
        }
        self
    }
}

fn text(name: &str, label: &str) -> ParameterField {
    ParameterField::new(name, label, FieldKind::Text(ScalarSpec::default()))
}

fn number(name: &str, label: &str) -> ParameterField {
    ParameterField::new(name, label, FieldKind::Number(ScalarSpec::default()))
}

fn select(name: &str, label: &str, options: &[(&str, &str)]) -> ParameterField {
    let options = options
        .iter()
        .map(|(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();
    ParameterField::new(
        name,
        label,
        FieldKind::Select(SelectSpec {
            options,
            default_value: None,
        }),
    )
}

fn object(name: &str, label: &str, fields: Vec<ParameterField>) -> ParameterField {
    ParameterField::new(name, label, FieldKind::Object(GroupSpec { fields }))
}

fn array(name: &str, label: &str, fields: Vec<ParameterField>) -> ParameterField {
    ParameterField::new(name, label, FieldKind::Array(GroupSpec { fields }))
}

fn one_of(name: &str, label: &str, one_of_options: Vec<OneOfOption>) -> ParameterField {
    ParameterField::new(name, label, FieldKind::OneOf(OneOfSpec { one_of_options }))
}

fn variant(label: &str, value: &str, fields: Vec<ParameterField>) -> OneOfOption {
    OneOfOption {
        label: label.to_string(),
        value: value.to_string(),
        fields,
    }
}

fn state_rule() -> Validation {
    Validation {
        pattern: Some("^[A-Z]{2}$".to_string()),
        max_length: Some(2),
        ..Default::default()
    }
}

fn zip_rule() -> Validation {
    Validation {
        pattern: Some(r"^\d{5}(-\d{4})?$".to_string()),
        ..Default::default()
    }
}

fn job_template() -> ParameterField {
    text("jobTemplate", "Job Template ID")
        .placeholder("template_123")
        .default_to(json!("legal-contract-template"))
        .describe("The ID of the saved job template to use")
}

fn upload_request_id() -> ParameterField {
    text("uploadRequestId", "Upload Request ID")
        .placeholder("req_123")
        .describe("ID of the upload session")
}

fn document_name(description: &str) -> ParameterField {
    text("documentName", "Document Name")
        .placeholder("report.pdf")
        .describe(description)
}

fn document_source() -> ParameterField {
    one_of(
        "documentSourceIdentifier",
        "Document Source",
        vec![
            variant(
                "Document ID (Previously Uploaded)",
                "documentId",
                vec![
                    text("documentId", "Document ID")
                        .placeholder("doc_456")
                        .default_to(json!("doc_sample_contract_001"))
                        .describe("ID of a document previously uploaded to the system"),
                ],
            ),
            variant(
                "External URL",
                "externalUrl",
                vec![
                    text("externalUrl", "Document URL")
                        .placeholder("https://example.com/document.pdf")
                        .describe("URL where the document can be downloaded"),
                ],
            ),
            variant(
                "Upload Request + Document Name",
                "uploadRequestDocument",
                vec![
                    upload_request_id(),
                    document_name("Name of the document in the upload session"),
                ],
            ),
            variant(
                "Upload Request + ZIP + Document",
                "uploadRequestZipDocument",
                vec![
                    upload_request_id(),
                    text("zipId", "ZIP ID")
                        .placeholder("zip_456")
                        .describe("ID of the ZIP file in the session"),
                    document_name("Name of the document inside the ZIP"),
                ],
            ),
            variant(
                "ZIP + Document Name",
                "zipDocument",
                vec![
                    text("zipId", "ZIP ID")
                        .placeholder("zip_456")
                        .describe("ID of an archived ZIP file"),
                    document_name("Name of the document inside the ZIP"),
                ],
            ),
        ],
    )
    .describe("Choose how to specify your document")
}

fn recipients() -> ParameterField {
    let address = object(
        "recipientAddress",
        "Address Details",
        vec![
            text("firstName", "First Name").placeholder("John"),
            text("lastName", "Last Name").placeholder("Doe"),
            text("address1", "Street Address").placeholder("123 Main St"),
            text("city", "City").placeholder("Anytown"),
            text("state", "State")
                .placeholder("NY")
                .validated(state_rule()),
            text("zip", "ZIP Code")
                .placeholder("12345")
                .validated(zip_rule()),
            text("country", "Country")
                .placeholder("USA")
                .default_to(json!("USA")),
            text("nickName", "Nickname")
                .optional()
                .placeholder("Johnny")
                .describe("Optional informal name"),
            text("address2", "Address Line 2")
                .optional()
                .placeholder("Apt 4B"),
            text("address3", "Address Line 3")
                .optional()
                .placeholder("Building C"),
            text("phoneNumber", "Phone Number")
                .optional()
                .placeholder("(555) 123-4567"),
        ],
    );
    let recipient = one_of(
        "",
        "Recipient",
        vec![
            variant("New Address", "recipientAddress", vec![address]),
            variant(
                "Address List ID",
                "addressListId",
                vec![
                    text("addressListId", "List ID")
                        .placeholder("list_789")
                        .default_to(json!("list_clients_q4_2024"))
                        .describe("ID of a pre-uploaded address list"),
                ],
            ),
            variant(
                "Saved Address ID",
                "addressId",
                vec![
                    text("addressId", "Address ID")
                        .placeholder("addr_456")
                        .describe("ID of a saved address"),
                ],
            ),
        ],
    );
    array("recipientAddressSource", "Recipients", vec![recipient])
        .describe("Add one or more recipients using different methods")
}

fn payment_details() -> ParameterField {
    let kind = |name: &str| text(name, "Payment Type").default_to(json!(name)).placeholder(name);
    one_of(
        "paymentDetails",
        "Payment Details",
        vec![
            variant(
                "Credit Card",
                "creditCard",
                vec![
                    kind("CREDIT_CARD"),
                    object(
                        "creditCardDetails",
                        "Card Information",
                        vec![
                            select(
                                "cardType",
                                "Card Type",
                                &[
                                    ("visa", "Visa"),
                                    ("mastercard", "Mastercard"),
                                    ("discover", "Discover"),
                                    ("americanExpress", "American Express"),
                                ],
                            ),
                            text("cardNumber", "Card Number")
                                .placeholder("4111111111111111")
                                .default_to(json!("4111111111111111")),
                            object(
                                "expirationDate",
                                "Expiration",
                                vec![
                                    number("month", "Month")
                                        .placeholder("12")
                                        .default_to(json!(12))
                                        .validated(Validation {
                                            min: Some(1.0),
                                            max: Some(12.0),
                                            ..Default::default()
                                        }),
                                    number("year", "Year")
                                        .placeholder("2025")
                                        .default_to(json!(2025))
                                        .validated(Validation {
                                            min: Some(2024.0),
                                            ..Default::default()
                                        }),
                                ],
                            ),
                            number("cvv", "CVV")
                                .placeholder("123")
                                .default_to(json!(123)),
                        ],
                    ),
                ],
            ),
            variant(
                "Invoice",
                "invoice",
                vec![
                    kind("INVOICE"),
                    object(
                        "invoiceDetails",
                        "Invoice Information",
                        vec![
                            text("invoiceNumber", "Invoice Number").placeholder("INV-12345"),
                            number("amountDue", "Amount Due").placeholder("100.00"),
                        ],
                    ),
                ],
            ),
            variant(
                "ACH Transfer",
                "ach",
                vec![
                    kind("ACH"),
                    object(
                        "achDetails",
                        "ACH Information",
                        vec![
                            text("routingNumber", "Routing Number").placeholder("123456789"),
                            text("accountNumber", "Account Number").placeholder("1234567890"),
                            number("checkDigit", "Check Digit").placeholder("1"),
                        ],
                    ),
                ],
            ),
            variant(
                "User Credit",
                "userCredit",
                vec![
                    kind("USER_CREDIT"),
                    object(
                        "creditAmount",
                        "Credit Amount",
                        vec![
                            number("amount", "Amount").placeholder("100.00"),
                            select(
                                "currency",
                                "Currency",
                                &[
                                    ("USD", "USD"),
                                    ("EUR", "EUR"),
                                    ("GBP", "GBP"),
                                    ("CAD", "CAD"),
                                    ("AUD", "AUD"),
                                ],
                            )
                            .default_to(json!("USD")),
                        ],
                    ),
                ],
            ),
        ],
    )
    .describe("Choose your payment method")
}

fn job_options() -> ParameterField {
    object(
        "jobOptions",
        "Job Options",
        vec![
            select(
                "documentClass",
                "Document Class",
                &[
                    ("businessLetter", "Business Letter"),
                    ("personalLetter", "Personal Letter"),
                ],
            )
            .default_to(json!("businessLetter")),
            select(
                "layout",
                "Layout",
                &[("portrait", "Portrait"), ("landscape", "Landscape")],
            )
            .default_to(json!("portrait")),
            select(
                "mailclass",
                "Mail Class",
                &[
                    ("firstClassMail", "First Class Mail"),
                    ("priorityMail", "Priority Mail"),
                    ("largeEnvelope", "Large Envelope"),
                ],
            )
            .default_to(json!("firstClassMail")),
            select(
                "paperType",
                "Paper Type",
                &[
                    ("letter", "Letter (8.5\" x 11\")"),
                    ("legal", "Legal (8.5\" x 14\")"),
                    ("postcard", "Postcard"),
                ],
            )
            .default_to(json!("letter")),
            select(
                "printOption",
                "Print Option",
                &[
                    ("none", "None"),
                    ("color", "Full Color"),
                    ("grayscale", "Grayscale"),
                ],
            )
            .default_to(json!("grayscale")),
            select(
                "envelope",
                "Envelope",
                &[
                    ("flat", "Flat"),
                    ("windowedFlat", "Windowed Flat"),
                    ("letter", "Letter"),
                    ("legal", "Legal"),
                    ("postcard", "Postcard"),
                ],
            )
            .default_to(json!("flat")),
        ],
    )
}

/// Two-way document source used inside array items.
fn item_document_source(label: &str) -> ParameterField {
    one_of(
        "documentSourceIdentifier",
        label,
        vec![
            variant(
                "Document ID",
                "documentId",
                vec![text("documentId", "Document ID").placeholder("doc_456")],
            ),
            variant(
                "External URL",
                "externalUrl",
                vec![text("externalUrl", "Document URL").placeholder("https://example.com/doc.pdf")],
            ),
        ],
    )
}

fn simple_recipient() -> ParameterField {
    object(
        "recipientAddressSource",
        "Recipient",
        vec![object(
            "recipientAddress",
            "Address",
            vec![
                text("name", "Name").placeholder("John Doe"),
                text("address", "Street").placeholder("123 Main St"),
                text("city", "City").placeholder("Anytown"),
                text("state", "State")
                    .placeholder("NY")
                    .validated(state_rule()),
                text("zip", "ZIP").placeholder("12345").validated(zip_rule()),
            ],
        )],
    )
}

fn items() -> ParameterField {
    array(
        "items",
        "Documents and Recipients",
        vec![item_document_source("Document Source"), simple_recipient()],
    )
    .describe("Each document paired with its recipient")
}

fn tags() -> ParameterField {
    array(
        "tags",
        "Tags",
        vec![text("", "Tag").placeholder("campaign-2024")],
    )
    .optional()
    .describe("Optional metadata tags for analytics or categorization")
}

fn documents_to_merge() -> ParameterField {
    array(
        "documentsToMerge",
        "Documents to Merge",
        vec![item_document_source("Document")],
    )
    .describe("Documents will be merged in the order listed")
}
