use crate::error::{EngineError, EngineResult};
use crate::person::Person;
use serde::{Deserialize, Serialize};

/// Return-level settings that are not forms, e.g. loaded from a JSON file:
///
/// ```json
/// { "year": 2019, "includeJointPersonForms": true,
///   "people": [{ "name": "Billy Bob", "relation": "self" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnConfig {
    pub year: i32,
    #[serde(default)]
    pub include_joint_person_forms: bool,
    #[serde(default)]
    pub people: Vec<Person>,
}

impl ReturnConfig {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            include_joint_person_forms: false,
            people: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|err| EngineError::InvalidConfig(err.to_string()))
    }
}
