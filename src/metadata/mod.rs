//! Token metadata model and the two-tier resolution core.
//!
//! # Module Structure
//!
//! ```text
//! metadata/
//! ├── index       # Static (base-tier) metadata index, built at startup
//! ├── resolver    # Dynamic-first resolution state machine
//! └── mod.rs      # MetadataRecord (this file)
//! ```

pub mod index;
pub mod resolver;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single token attribute in the common NFT metadata shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: Value,
}

/// One token's metadata record.
///
/// Only structural presence is validated; attribute values are free-form.
/// Base-tier files may carry collection-specific extra fields (equipment
/// slots, rarity, ...) which round-trip through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_record_round_trips() {
        let json = r#"{
            "name": "Duck #1",
            "image": "ipfs://Qm123",
            "description": "A duck.",
            "attributes": [{"trait_type": "Beak", "value": "Golden"}]
        }"#;
        let record: MetadataRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Duck #1");
        assert_eq!(record.attributes.len(), 1);
        assert_eq!(record.attributes[0].value, Value::from("Golden"));
    }

    #[test]
    fn test_minimal_record_parses() {
        // Burned-token placeholders carry only a name
        let record: MetadataRecord = serde_json::from_str(r#"{"name": "<BURNED> #7"}"#).unwrap();
        assert_eq!(record.name, "<BURNED> #7");
        assert!(record.image.is_empty());
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let json = r#"{"name": "Iron Sword", "slot": "hand", "damage": 10}"#;
        let record: MetadataRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra["slot"], Value::from("hand"));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["damage"], Value::from(10));
        // Empty optional fields must not appear in the serialized body
        assert!(back.get("image").is_none());
    }

    #[test]
    fn test_record_without_name_is_rejected() {
        assert!(serde_json::from_str::<MetadataRecord>(r#"{"image": "x"}"#).is_err());
    }
}
