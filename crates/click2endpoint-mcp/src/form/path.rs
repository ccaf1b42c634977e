//! Addresses into the form value tree.

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::FormError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

/// Ordered property names and array indices, e.g. `items[0].recipientAddressSource`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut p = self.clone();
        p.segments.push(PathSegment::Property(name.to_string()));
        p
    }

    pub fn index(&self, i: usize) -> Self {
        let mut p = self.clone();
        p.segments.push(PathSegment::Index(i));
        p
    }

    /// Build from JSON: a dotted string, or an array of names and indices.
    pub fn from_json(v: &JsonValue) -> Result<Self, FormError> {
        match v {
            JsonValue::String(s) => s.parse(),
            JsonValue::Array(items) => {
                let segments = items
                    .iter()
                    .map(|item| match item {
                        JsonValue::String(s) => Ok(PathSegment::Property(s.clone())),
                        JsonValue::Number(n) => n
                            .as_u64()
                            .map(|i| PathSegment::Index(i as usize))
                            .ok_or_else(|| FormError::InvalidPath(v.to_string())),
                        _ => Err(FormError::InvalidPath(v.to_string())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self { segments })
            }
            _ => Err(FormError::InvalidPath(v.to_string())),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Property(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Property(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Accepts `a.b[0].c` as well as `a.b.0.c`.
impl FromStr for FieldPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormError::InvalidPath(s.to_string());
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self { segments });
        }
        for part in s.split('.') {
            let (name, rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if !name.is_empty() {
                match name.parse::<usize>() {
                    Ok(i) => segments.push(PathSegment::Index(i)),
                    Err(_) => segments.push(PathSegment::Property(name.to_string())),
                }
            } else if rest.is_empty() {
                return Err(invalid());
            }
            let mut rest = rest;
            while let Some(stripped) = rest.strip_prefix('[') {
                let end = stripped.find(']').ok_or_else(invalid)?;
                let idx = stripped[..end].parse::<usize>().map_err(|_| invalid())?;
                segments.push(PathSegment::Index(idx));
                rest = &stripped[end + 1..];
            }
            if !rest.is_empty() {
                return Err(invalid());
            }
        }
        Ok(Self { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bracket_and_dotted_indices() {
        let a: FieldPath = "items[1].recipientAddressSource.recipientAddress.zip"
            .parse()
            .unwrap();
        let b: FieldPath = "items.1.recipientAddressSource.recipientAddress.zip"
            .parse()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.segments()[1], PathSegment::Index(1));
        assert_eq!(
            a.to_string(),
            "items[1].recipientAddressSource.recipientAddress.zip"
        );
    }

    #[test]
    fn json_arrays_mix_names_and_indices() {
        let p = FieldPath::from_json(&json!(["recipientAddressSource", 0, "addressId"])).unwrap();
        assert_eq!(p, FieldPath::root().child("recipientAddressSource").index(0).child("addressId"));
        assert!(FieldPath::from_json(&json!([true])).is_err());
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!("a[x]".parse::<FieldPath>().is_err());
        assert!("a..b".parse::<FieldPath>().is_err());
        assert!("a[1".parse::<FieldPath>().is_err());
        assert!("".parse::<FieldPath>().unwrap().is_root());
    }
}
