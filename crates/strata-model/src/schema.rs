use serde::{Deserialize, Serialize};

/// Storage options for one column family.
///
/// Omitted fields take their defaults when deserialized, matching the DDL
/// surface where callers only name the options they care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    pub name: String,
    #[serde(default = "default_max_versions")]
    pub max_versions: u32,
    #[serde(default)]
    pub compression: Compression,
    #[serde(default)]
    pub keep_in_memory: bool,
}

fn default_max_versions() -> u32 {
    3
}

impl FamilyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_versions: default_max_versions(),
            compression: Compression::default(),
            keep_in_memory: false,
        }
    }

    pub fn with_max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = max_versions;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Lzo,
}

/// A table's shape: its name and family descriptors.
///
/// Family names are immutable once stored; modifying a family replaces the
/// descriptor under the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub families: Vec<FamilyDescriptor>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, families: Vec<FamilyDescriptor>) -> Self {
        Self {
            name: name.into(),
            families,
        }
    }

    pub fn family(&self, name: &str) -> Option<&FamilyDescriptor> {
        self.families.iter().find(|f| f.name == name)
    }

    pub fn family_mut(&mut self, name: &str) -> Option<&mut FamilyDescriptor> {
        self.families.iter_mut().find(|f| f.name == name)
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.family(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults() {
        let fam = FamilyDescriptor::new("info");
        assert_eq!(fam.max_versions, 3);
        assert_eq!(fam.compression, Compression::None);
        assert!(!fam.keep_in_memory);
    }

    #[test]
    fn omitted_fields_deserialize_to_defaults() {
        let fam: FamilyDescriptor = serde_json::from_str(r#"{"name": "info"}"#).unwrap();
        assert_eq!(fam, FamilyDescriptor::new("info"));

        let fam: FamilyDescriptor =
            serde_json::from_str(r#"{"name": "log", "max_versions": 10, "compression": "gzip"}"#)
                .unwrap();
        assert_eq!(fam.max_versions, 10);
        assert_eq!(fam.compression, Compression::Gzip);
        assert!(!fam.keep_in_memory);
    }

    #[test]
    fn schema_family_lookup() {
        let schema = TableSchema::new(
            "people",
            vec![FamilyDescriptor::new("info"), FamilyDescriptor::new("misc")],
        );
        assert!(schema.has_family("info"));
        assert!(!schema.has_family("addresses"));
        assert_eq!(schema.family("misc").map(|f| f.max_versions), Some(3));
    }

    #[test]
    fn schema_wire_roundtrip() {
        let schema = TableSchema::new(
            "people",
            vec![FamilyDescriptor::new("info").with_max_versions(5)],
        );
        let bytes = rmp_serde::to_vec(&schema).unwrap();
        let back: TableSchema = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, schema);
    }
}
