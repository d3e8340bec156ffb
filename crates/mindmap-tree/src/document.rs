//! Persisted file format
//!
//! The unit written to and read from a synced file, the local autosave
//! slot and bulk exports: `{ "root": <node>, "lastSaved": <epoch ms> }`,
//! UTF-8 JSON indented with two spaces.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub root: Tree,
    /// Logical save time stamped by the writer. Distinct from the file
    /// system's modification time.
    pub last_saved: i64,
}

impl Document {
    pub fn new(root: Tree, last_saved: i64) -> Self {
        Self { root, last_saved }
    }

    /// Parse document content. Malformed JSON, missing fields and
    /// duplicate node ids are all rejected.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn document_uses_camel_case_keys() {
        let doc = Document::new(Tree::default(), 1234);
        let json = doc.to_json_pretty().unwrap();

        assert!(json.contains("\"lastSaved\": 1234"));
        assert!(json.contains("\"isImportant\": true"));
        assert!(json.contains("\n  \"root\""), "two-space indent expected:\n{}", json);
    }

    #[test]
    fn parse_rejects_missing_last_saved() {
        let result = Document::parse(r#"{"root": {"id": "r", "text": "x"}}"#);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Document::parse("{not json").is_err());
    }
}
