//! Descriptive records for each score, loaded from one JSON file per score.

mod store;

pub use store::{MetadataError, MetadataStore, ReloadSummary, SkippedFile};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full documentation record for a score as stored on disk and served by `GET /api/scores/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub result: ResultInfo,
    #[serde(default)]
    pub interpretation: Interpretation,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub notes: Vec<String>,
    /// Request body that calculates successfully; used by catalogue checks and the CLI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl ScoreMetadata {
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            version: self.version.clone(),
        }
    }

    fn matches_term(&self, lowered_term: &str) -> bool {
        self.title.to_lowercase().contains(lowered_term)
            || self.description.to_lowercase().contains(lowered_term)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ParameterValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(
        default,
        rename = "enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(default)]
    pub ranges: Vec<InterpretationRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationRange {
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
    pub stage: String,
    pub description: String,
    pub interpretation: String,
}

/// Listing entry for discovery endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
