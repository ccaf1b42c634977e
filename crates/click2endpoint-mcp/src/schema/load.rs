use std::path::Path;

use serde::Deserialize;

use super::catalog::SchemaCatalog;
use super::field::ParameterField;

/// Override file layout:
///
/// ```toml
/// [[endpoint]]
/// path = "/jobs/single-doc"
/// replace = false
/// [[endpoint.fields]]
/// name = "reference"
/// label = "Reference"
/// type = "text"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawSchemaFile {
    #[serde(default)]
    pub endpoint: Vec<RawEndpointSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEndpointSchema {
    pub path: String,
    /// Replace the built-in schema instead of merging field-by-field.
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub fields: Vec<ParameterField>,
}

pub fn from_toml_str(s: &str) -> anyhow::Result<SchemaCatalog> {
    let raw: RawSchemaFile = toml::from_str(s)?;
    Ok(build_catalog(raw))
}

pub fn from_json_str(s: &str) -> anyhow::Result<SchemaCatalog> {
    let raw: RawSchemaFile = serde_json::from_str(s)?;
    Ok(build_catalog(raw))
}

/// Load overrides from a `.json` or `.toml` file on top of the built-in catalog.
pub fn load_from_file(path: &Path) -> anyhow::Result<SchemaCatalog> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => from_json_str(&content),
        _ => from_toml_str(&content),
    }
}

pub fn load_default() -> SchemaCatalog {
    SchemaCatalog::builtin()
}

fn build_catalog(raw: RawSchemaFile) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::builtin();
    for e in raw.endpoint {
        tracing::debug!(
            "schema override for {} ({} field(s), replace={})",
            e.path,
            e.fields.len(),
            e.replace
        );
        if e.replace {
            catalog.insert(e.path, e.fields);
        } else {
            catalog.merge(e.path, e.fields);
        }
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::paths;
    use crate::schema::field::FieldKind;
    use std::io::Write;

    #[test]
    fn toml_overrides_merge_and_replace() {
        let toml = r#"
[[endpoint]]
path = "/jobs/single-doc"
[[endpoint.fields]]
name = "reference"
label = "Reference"
type = "text"
required = false
placeholder = "ref-1"

[[endpoint]]
path = "/jobs/single-pdf-split"
replace = true
[[endpoint.fields]]
name = "pagesPerDocument"
label = "Pages per document"
type = "number"
required = true
defaultValue = 2
validation = { min = 1 }
"#;
        let c = from_toml_str(toml).expect("parse ok");
        let single = c.fields(paths::SINGLE_DOC);
        assert_eq!(single.len(), 5);
        assert_eq!(single[4].name, "reference");
        let split = c.fields(paths::SINGLE_PDF_SPLIT);
        assert_eq!(split.len(), 1);
        assert!(matches!(split[0].kind, FieldKind::Number(_)));
        assert_eq!(split[0].validation().unwrap().min, Some(1.0));
    }

    #[test]
    fn json_file_is_detected_by_extension() {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            f,
            r#"{{"endpoint": [{{"path": "/jobs/custom", "fields": [
                {{"name": "mode", "label": "Mode", "type": "select",
                  "options": [{{"value": "a", "label": "A"}}], "defaultValue": "a"}}
            ]}}]}}"#
        )
        .unwrap();
        let c = load_from_file(f.path()).unwrap();
        assert_eq!(c.fields("/jobs/custom").len(), 1);
        assert!(!c.fields(paths::SINGLE_DOC).is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(from_toml_str("[[endpoint]]\nfields = 3").is_err());
        assert_eq!(load_default().len(), 8);
    }
}
