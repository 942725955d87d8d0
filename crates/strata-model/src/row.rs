use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One row as returned by reads and scans: the latest visible value for each
/// qualified column name. Missing cells are represented by absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub cells: HashMap<String, Vec<u8>>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: HashMap::new(),
        }
    }

    pub fn cell(&self, qualified_name: &str) -> Option<&[u8]> {
        self.cells.get(qualified_name).map(|v| v.as_slice())
    }
}
