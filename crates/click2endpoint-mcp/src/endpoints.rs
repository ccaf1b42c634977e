//! Endpoint descriptor catalog keyed by path.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

pub mod paths {
    pub const SINGLE_DOC_JOB_TEMPLATE: &str = "/jobs/single-doc-job-template";
    pub const MULTI_DOCS_JOB_TEMPLATE: &str = "/jobs/multi-docs-job-template";
    pub const MULTI_DOC_MERGE_JOB_TEMPLATE: &str = "/jobs/multi-doc-merge-job-template";
    pub const SINGLE_DOC: &str = "/jobs/single-doc";
    pub const MULTI_DOC: &str = "/jobs/multi-doc";
    pub const MULTI_DOC_MERGE: &str = "/jobs/multi-doc-merge";
    pub const SINGLE_PDF_SPLIT: &str = "/jobs/single-pdf-split";
    pub const SINGLE_PDF_SPLIT_ADDRESS_CAPTURE: &str = "/jobs/single-pdf-split-addressCapture";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Static metadata for one API operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub path: &'static str,
    pub description: &'static str,
    pub method: HttpMethod,
    pub parameters: Vec<&'static str>,
    pub request_example: String,
    pub payload_example: JsonValue,
}

static ENDPOINTS: Lazy<Vec<EndpointDescriptor>> = Lazy::new(build_catalog);

pub fn lookup(path: &str) -> Option<&'static EndpointDescriptor> {
    ENDPOINTS.iter().find(|e| e.path == path)
}

pub fn all() -> &'static [EndpointDescriptor] {
    &ENDPOINTS
}

fn curl_example(path: &str, body: &str) -> String {
    format!(
        "curl -X POST https://api.c2m.com/v2{path} \\\n  -H 'Authorization: Bearer <token>' \\\n  -H 'Content-Type: application/json' \\\n  -d '{body}'"
    )
}

fn build_catalog() -> Vec<EndpointDescriptor> {
    let post = |path: &'static str,
                description: &'static str,
                parameters: Vec<&'static str>,
                body_hint: &str,
                payload_example: JsonValue| EndpointDescriptor {
        path,
        description,
        method: HttpMethod::Post,
        parameters,
        request_example: curl_example(path, body_hint),
        payload_example,
    };

    vec![
        post(
            paths::SINGLE_DOC_JOB_TEMPLATE,
            "Submit a single document job using a saved job template",
            vec!["jobTemplateId", "document", "recipients"],
            r#"{"jobTemplateId": "template_123", "document": {...}}"#,
            json!({
                "jobTemplateId": "template_123",
                "document": { "documentId": "doc_456" },
                "recipients": [{
                    "name": "John Doe",
                    "address": "123 Main St",
                    "city": "Anytown",
                    "state": "NY",
                    "zip": "12345"
                }]
            }),
        ),
        post(
            paths::MULTI_DOCS_JOB_TEMPLATE,
            "Submit multiple documents using a saved job template",
            vec!["jobTemplateId", "documents", "recipients"],
            r#"{"jobTemplateId": "template_123", "documents": [...]}"#,
            json!({
                "jobTemplateId": "template_123",
                "documents": [{ "documentId": "doc_456" }, { "documentId": "doc_789" }],
                "recipients": [{
                    "name": "Jane Smith",
                    "address": "456 Oak Ave",
                    "city": "Somewhere",
                    "state": "CA",
                    "zip": "98765"
                }]
            }),
        ),
        post(
            paths::MULTI_DOC_MERGE_JOB_TEMPLATE,
            "Merge multiple documents into one mailing using a saved template",
            vec!["jobTemplateId", "documents", "recipients"],
            r#"{"jobTemplateId": "template_123", "documents": [...]}"#,
            json!({
                "jobTemplateId": "template_123",
                "documents": [
                    { "documentUrl": "https://example.com/cover.pdf" },
                    { "documentUrl": "https://example.com/report.pdf" }
                ],
                "recipients": [{ "addressListId": "list_789" }]
            }),
        ),
        post(
            paths::SINGLE_DOC,
            "Submit a single document job with manual configuration",
            vec!["document", "recipients", "jobOptions"],
            r#"{"document": {...}, "recipients": [...], "jobOptions": {...}}"#,
            json!({
                "document": { "uploadRequestId": "upload_123", "documentName": "invoice.pdf" },
                "recipients": [{
                    "name": "Bob Johnson",
                    "address": "789 Pine St",
                    "city": "Elsewhere",
                    "state": "TX",
                    "zip": "54321"
                }],
                "jobOptions": {
                    "paperType": "STANDARD",
                    "printColor": true,
                    "printBothSides": false,
                    "mailClass": "FIRST_CLASS"
                }
            }),
        ),
        post(
            paths::MULTI_DOC,
            "Submit multiple separate documents with manual configuration",
            vec!["documents", "recipients", "jobOptions"],
            r#"{"documents": [...], "recipients": [...], "jobOptions": {...}}"#,
            json!({
                "documents": [
                    { "documentUrl": "https://example.com/doc1.pdf" },
                    { "documentUrl": "https://example.com/doc2.pdf" }
                ],
                "recipients": [{
                    "name": "Alice Williams",
                    "address": "321 Maple Dr",
                    "city": "Hometown",
                    "state": "FL",
                    "zip": "13579"
                }],
                "jobOptions": { "paperType": "PREMIUM", "printColor": true, "envelope": "WINDOW" }
            }),
        ),
        post(
            paths::MULTI_DOC_MERGE,
            "Merge multiple documents into one mailing with manual configuration",
            vec!["documents", "recipients", "jobOptions"],
            r#"{"documents": [...], "recipients": [...], "jobOptions": {...}}"#,
            json!({
                "documents": [
                    { "zipId": "zip_456", "documentName": "cover_letter.pdf" },
                    { "zipId": "zip_456", "documentName": "attachment.pdf" }
                ],
                "recipients": [{ "addressBookId": "book_123" }],
                "jobOptions": { "paperType": "STANDARD", "printColor": false, "mailClass": "STANDARD" }
            }),
        ),
        post(
            paths::SINGLE_PDF_SPLIT,
            "Split a combined PDF into multiple mailings",
            vec!["document", "recipients", "jobOptions", "splitOptions"],
            r#"{"document": {...}, "recipients": [...], "splitOptions": {...}}"#,
            json!({
                "document": { "documentUrl": "https://example.com/combined.pdf" },
                "recipients": [{ "addressListId": "list_123" }],
                "splitOptions": { "pageBreakOn": "BLANK_PAGE", "documentsPerRecipient": 1 },
                "jobOptions": { "paperType": "STANDARD", "mailClass": "FIRST_CLASS" }
            }),
        ),
        post(
            paths::SINGLE_PDF_SPLIT_ADDRESS_CAPTURE,
            "Split a PDF and capture addresses from the document content",
            vec!["document", "jobOptions", "splitOptions", "addressCaptureOptions"],
            r#"{"document": {...}, "splitOptions": {...}, "addressCaptureOptions": {...}}"#,
            json!({
                "document": {
                    "uploadRequestId": "upload_789",
                    "zipId": "zip_123",
                    "documentName": "bulk_mail.pdf"
                },
                "splitOptions": { "pageBreakOn": "PAGE_COUNT", "pagesPerDocument": 3 },
                "addressCaptureOptions": { "captureArea": "TOP_RIGHT", "returnAddressCapture": true },
                "jobOptions": { "paperType": "STANDARD", "envelope": "WINDOW" }
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{AnswerSet, QuestionId, resolve_endpoint};

    #[test]
    fn every_resolvable_path_has_a_descriptor() {
        for doc in ["single", "multi", "merge"] {
            for t in ["true", "false"] {
                let a: AnswerSet = [(QuestionId::DocType, doc), (QuestionId::TemplateUsage, t)]
                    .into_iter()
                    .collect();
                let path = resolve_endpoint(&a).unwrap();
                assert_eq!(lookup(path).unwrap().path, path);
            }
        }
        for style in ["explicit", "addressCapture"] {
            let a: AnswerSet = [
                (QuestionId::DocType, "pdfSplit"),
                (QuestionId::RecipientStyle, style),
            ]
            .into_iter()
            .collect();
            assert!(lookup(resolve_endpoint(&a).unwrap()).is_some());
        }
        assert_eq!(all().len(), 8);
    }

    #[test]
    fn unknown_path_is_a_miss() {
        assert!(lookup("/jobs/fax").is_none());
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let d = lookup(paths::SINGLE_DOC).unwrap();
        let v = serde_json::to_value(d).unwrap();
        assert_eq!(v["method"], "POST");
        assert!(
            v["requestExample"]
                .as_str()
                .unwrap()
                .contains("https://api.c2m.com/v2/jobs/single-doc")
        );
        assert_eq!(v["payloadExample"]["jobOptions"]["mailClass"], "FIRST_CLASS");
    }
}
