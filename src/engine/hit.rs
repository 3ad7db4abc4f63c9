use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::key::NULL_BYTE;

/// A verified occurrence: `datatype\0owner\0value\0field`.
///
/// Hits order byte-wise, which is also the order of term-frequency qualifiers,
/// so a hit set can be used directly as a skip-scan search space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hit(String);

impl Hit {
    pub fn new(datatype: &str, owner: &str, value: &str, field: &str) -> Self {
        Hit(format!("{datatype}{NULL_BYTE}{owner}{NULL_BYTE}{value}{NULL_BYTE}{field}"))
    }

    /// Build from a `datatype`, `owner` and an already joined `value\0field` pair.
    pub(crate) fn from_value_field(datatype: &str, owner: &str, value_field: &str) -> Self {
        Hit(format!("{datatype}{NULL_BYTE}{owner}{NULL_BYTE}{value_field}"))
    }

    /// Parse a term-frequency qualifier.
    pub fn parse(qualifier: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(qualifier)
            .map_err(|e| ProximaError::malformed_key(format!("hit is not UTF-8: {e}")))?;
        if text.split(NULL_BYTE).count() != 4 {
            return Err(ProximaError::malformed_key(format!(
                "expected `datatype\\0uid\\0value\\0field` but found {} parts",
                text.split(NULL_BYTE).count()
            )));
        }
        Ok(Hit(text.to_string()))
    }

    fn part(&self, index: usize) -> &str {
        self.0.split(NULL_BYTE).nth(index).unwrap_or("")
    }

    pub fn datatype(&self) -> &str {
        self.part(0)
    }

    pub fn owner(&self) -> &str {
        self.part(1)
    }

    pub fn value(&self) -> &str {
        self.part(2)
    }

    pub fn field(&self) -> &str {
        self.part(3)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}:{}={}",
            self.datatype(),
            self.owner(),
            self.field(),
            self.value()
        )
    }
}

impl AsRef<[u8]> for Hit {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let hit = Hit::new("datatype", "uid0.1", "fox", "TEXT");
        assert_eq!(hit.as_str(), "datatype\0uid0.1\0fox\0TEXT");
        assert_eq!(hit.datatype(), "datatype");
        assert_eq!(hit.owner(), "uid0.1");
        assert_eq!(hit.value(), "fox");
        assert_eq!(hit.field(), "TEXT");
        assert_eq!(hit.to_string(), "datatype/uid0.1:TEXT=fox");
        assert_eq!(Hit::from_value_field("datatype", "uid0.1", "fox\0TEXT"), hit);
    }

    #[test]
    fn test_parse() {
        let hit = Hit::parse(b"datatype\0uid0\0fox\0TEXT").unwrap();
        assert_eq!(hit.owner(), "uid0");
        assert!(Hit::parse(b"datatype\0uid0\0fox").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let hit = Hit::new("d", "u", "v", "F");
        assert_eq!(serde_json::to_string(&hit).unwrap(), "\"d\\u0000u\\u0000v\\u0000F\"");
    }
}
