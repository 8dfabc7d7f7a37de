//! The staged-result document submitted to the device service.
//!
//! The device service names the result collection `result` where a
//! [`ResultSet`] says `results`. Every other field is passed through untouched
//! as a sibling of the collection.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::ResultSet;

/// Element name the device service expects for the result collection.
pub const RESULT_ELEMENT: &str = "result";

/// A [`ResultSet`] in the device service's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagedResultDocument(serde_json::Map<String, serde_json::Value>);

impl StagedResultDocument {
    /// Build the wire document for a result set.
    pub fn from_result_set(set: &ResultSet) -> Result<Self, ModelError> {
        let serde_json::Value::Object(mut fields) = serde_json::to_value(set)? else {
            return Err(ModelError::Serialization(
                "result set did not serialize to an object".to_string(),
            ));
        };

        let results = fields
            .remove("results")
            .unwrap_or(serde_json::Value::Array(Vec::new()));
        fields.insert(RESULT_ELEMENT.to_string(), results);

        Ok(Self(fields))
    }

    /// The result collection.
    pub fn results(&self) -> Option<&serde_json::Value> {
        self.0.get(RESULT_ELEMENT)
    }

    /// A top-level field other than the result collection.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Serialize as the JSON text submitted to the device service.
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl TryFrom<&ResultSet> for StagedResultDocument {
    type Error = ModelError;

    fn try_from(set: &ResultSet) -> Result<Self, Self::Error> {
        Self::from_result_set(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssayResult;

    #[test]
    fn test_results_renamed_other_fields_untouched() {
        let set = ResultSet {
            results: vec![
                AssayResult::new("GLU", "102"),
                AssayResult {
                    assay_name: "BUN".into(),
                    value: "18".into(),
                    notes: Some("lipemic".into()),
                },
            ],
            delay_amount: Some(5),
            dilution: Some(2),
            sample_type: Some("SERUM".into()),
            groups: Some(serde_json::json!([{"name": "panel-a"}])),
            ..Default::default()
        };

        let doc = StagedResultDocument::from_result_set(&set).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc.to_json_string().unwrap()).unwrap();

        assert!(value.get("results").is_none());
        assert_eq!(value["result"][1]["assayName"], "BUN");
        assert_eq!(value["result"][1]["notes"], "lipemic");
        assert_eq!(value["delayAmount"], 5);
        assert_eq!(value["dilution"], 2);
        assert_eq!(value["sampleType"], "SERUM");
        assert_eq!(value["groups"][0]["name"], "panel-a");
        assert!(value.get("acceptDelay").is_none());
    }

    #[test]
    fn test_empty_result_set_still_names_collection() {
        let doc = StagedResultDocument::from_result_set(&ResultSet::default()).unwrap();
        assert_eq!(doc.results(), Some(&serde_json::json!([])));
        assert!(doc.field("notes").is_none());
    }
}
