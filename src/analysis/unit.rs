//! Compilation-unit data model.
//!
//! A unit describes one analysis task: the textproto to index, the schema
//! files it depends on (each with the stable VName identifying it in the
//! output graph), and the argument list. Drivers typically deserialize
//! units from JSON containers; the analyzer only ever borrows them.

use serde::{Deserialize, Serialize};

/// A 5-tuple uniquely naming a node in the output graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VName {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub corpus: String,
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredInput {
    pub info: FileInfo,
    pub v_name: VName,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Exactly one entry: the textproto's path.
    pub source_file: Vec<String>,
    pub required_input: Vec<RequiredInput>,
    pub argument: Vec<String>,
}

impl CompilationUnit {
    /// VName of the required input registered under `full_path`.
    pub fn vname_for_full_path(&self, full_path: &str) -> Option<&VName> {
        self.required_input
            .iter()
            .find(|input| input.info.path == full_path)
            .map(|input| &input.v_name)
    }
}

/// One file's content, for either the textproto or a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    pub content: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vname_lookup() {
        let unit = CompilationUnit {
            source_file: vec!["f.textproto".to_string()],
            required_input: vec![RequiredInput {
                info: FileInfo {
                    path: "f.textproto".to_string(),
                },
                v_name: VName {
                    corpus: "corpus".to_string(),
                    path: "f.textproto".to_string(),
                    ..Default::default()
                },
            }],
            argument: vec![],
        };
        assert_eq!(
            unit.vname_for_full_path("f.textproto").map(|v| v.corpus.as_str()),
            Some("corpus")
        );
        assert!(unit.vname_for_full_path("other").is_none());
    }
}
