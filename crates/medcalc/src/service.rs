use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::metadata::{MetadataError, MetadataStore, ReloadSummary, ScoreMetadata, ScoreSummary};
use crate::registry::{CalculatorError, CalculatorRegistry};

/// Facade combining the metadata catalogue with the calculator registry.
pub struct ScoreService {
    metadata: MetadataStore,
    registry: CalculatorRegistry,
}

/// Availability of a score's calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculatorStatus {
    pub score_id: String,
    pub score_exists: bool,
    pub calculator_available: bool,
    pub status: &'static str,
}

/// Result of reloading metadata and calculators together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    #[serde(flatten)]
    pub summary: ReloadSummary,
    pub calculators_registered: usize,
}

impl ScoreService {
    pub fn new(metadata: MetadataStore, registry: CalculatorRegistry) -> Self {
        Self { metadata, registry }
    }

    /// Loads metadata from `directory` and registers every built-in calculator.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        let metadata = MetadataStore::open(directory)?;
        Ok(Self::new(metadata, CalculatorRegistry::new()))
    }

    pub fn list(&self, category: Option<&str>, search: Option<&str>) -> Vec<ScoreSummary> {
        self.metadata.query(category, search)
    }

    pub fn metadata(&self, score_id: &str) -> Result<ScoreMetadata, ServiceError> {
        self.metadata
            .get(score_id)
            .ok_or_else(|| ServiceError::ScoreNotFound {
                score_id: score_id.to_string(),
            })
    }

    pub fn categories(&self) -> BTreeMap<String, usize> {
        self.metadata.categories()
    }

    pub fn scores_loaded(&self) -> usize {
        self.metadata.len()
    }

    /// Runs the calculator for `score_id`. The score must be present in the catalogue.
    pub fn calculate(&self, score_id: &str, params: Value) -> Result<Value, ServiceError> {
        if !self.metadata.contains(score_id) {
            return Err(ServiceError::ScoreNotFound {
                score_id: score_id.to_string(),
            });
        }

        let calculator =
            self.registry
                .resolve(score_id)
                .ok_or_else(|| ServiceError::CalculatorNotImplemented {
                    score_id: score_id.to_string(),
                })?;

        match calculator.invoke(params) {
            Ok(result) => {
                debug!(score_id, "score calculated");
                Ok(result)
            }
            Err(err) => {
                match &err {
                    CalculatorError::InvalidParameters { .. }
                    | CalculatorError::Validation { .. } => {
                        warn!(score_id, error = %err, "rejected calculation request")
                    }
                    _ => error!(score_id, error = %err, "calculation failed"),
                }
                Err(err.into())
            }
        }
    }

    pub fn validate_calculator(&self, score_id: &str) -> Result<CalculatorStatus, ServiceError> {
        if !self.metadata.contains(score_id) {
            return Err(ServiceError::ScoreNotFound {
                score_id: score_id.to_string(),
            });
        }

        let calculator_available = self.registry.is_available(score_id);
        Ok(CalculatorStatus {
            score_id: score_id.to_string(),
            score_exists: true,
            calculator_available,
            status: if calculator_available {
                "ready"
            } else {
                "no_calculator"
            },
        })
    }

    /// Re-reads metadata and rebuilds the calculator table.
    pub fn reload(&self) -> Result<ReloadReport, ServiceError> {
        let summary = self.metadata.reload()?;
        let calculators_registered = self.registry.reload();
        Ok(ReloadReport {
            summary,
            calculators_registered,
        })
    }
}

/// Error raised by the score service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Score '{score_id}' not found")]
    ScoreNotFound { score_id: String },
    #[error("Calculator for '{score_id}' not yet implemented")]
    CalculatorNotImplemented { score_id: String },
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Reload(#[from] MetadataError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn catalogue_with(ids: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        for id in ids {
            let body = json!({
                "id": id,
                "title": id,
                "description": "test score",
                "category": "testing",
                "result": { "name": id, "type": "float" }
            });
            fs::write(dir.path().join(format!("{id}.json")), body.to_string())
                .expect("write metadata");
        }
        dir
    }

    #[test]
    fn calculate_requires_catalogued_score() {
        let dir = catalogue_with(&["bmi_calculator"]);
        let service = ScoreService::open(dir.path()).expect("opens");

        let error = service
            .calculate("gad_7", json!({}))
            .expect_err("gad_7 not catalogued");
        assert!(matches!(error, ServiceError::ScoreNotFound { .. }));

        let value = service
            .calculate("bmi_calculator", json!({ "weight": 70.0, "height": 175.0 }))
            .expect("calculates");
        assert_eq!(value["result"], 22.9);
    }

    #[test]
    fn metadata_without_formula_is_not_implemented() {
        let dir = catalogue_with(&["sofa_score"]);
        let service = ScoreService::open(dir.path()).expect("opens");

        let error = service
            .calculate("sofa_score", json!({}))
            .expect_err("no formula");
        assert!(matches!(
            error,
            ServiceError::CalculatorNotImplemented { score_id } if score_id == "sofa_score"
        ));

        let status = service.validate_calculator("sofa_score").expect("known id");
        assert_eq!(status.status, "no_calculator");
        assert!(!status.calculator_available);
    }

    #[test]
    fn validate_calculator_reports_ready_scores() {
        let dir = catalogue_with(&["gad_7"]);
        let service = ScoreService::open(dir.path()).expect("opens");
        let status = service.validate_calculator("gad_7").expect("known id");
        assert_eq!(status.status, "ready");
        assert!(service.validate_calculator("missing").is_err());
    }

    #[test]
    fn reload_reports_scores_and_calculators() {
        let dir = catalogue_with(&["gad_7"]);
        let service = ScoreService::open(dir.path()).expect("opens");
        fs::write(dir.path().join("broken.json"), "[]").expect("write broken");

        let report = service.reload().expect("reloads");
        assert_eq!(report.summary.scores, vec!["gad_7"]);
        assert_eq!(report.summary.skipped_files.len(), 1);
        assert_eq!(
            report.calculators_registered,
            crate::registry::ScoreId::ALL.len()
        );

        let json = serde_json::to_value(&report).expect("serializes");
        assert_eq!(json["scores"][0], "gad_7");
        assert!(json["skipped_files"][0]["reason"].is_string());
    }
}
