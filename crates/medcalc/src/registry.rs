//! Maps score ids to executable formulas.
//!
//! The id space is the closed [`ScoreId`] enum: every variant is matched to a formula in
//! [`ScoreId::formula`], so a known id without a calculator cannot be compiled. The string-keyed
//! table built from it is what request handlers consult, and it can be rebuilt on reload.

use crate::scores::cardiology::{Cha2ds2Vasc, Chads2Score, CorrectedQtInterval, LdlCalculated};
use crate::scores::critical_care::ApacheIiScore;
use crate::scores::emergency::{CedocsScore, News2, QsofaScore};
use crate::scores::gastroenterology::ChildPughScore;
use crate::scores::general::{BmiCalculator, BsaCalculator, FatFreeMass};
use crate::scores::hematology::{Anc, CapriniScore2005};
use crate::scores::nephrology::{BicarbonateDeficit, CkdEpi2021, FreeWaterDeficit};
use crate::scores::neurology::{Abcd2Score, CerebralPerfusionPressure, GlasgowComaScale};
use crate::scores::psychiatry::{Aims, Gad7};
use crate::scores::pulmonology::{AAO2Gradient, AbgAnalyzer, Curb65, RoxIndex, WintersFormula};
use crate::scores::{Score, ScoreResult};
use crate::validation::{Validate, ValidationError};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Type-erased entry point: raw parameter map in, serialized assessment out.
pub type Formula = fn(Value) -> Result<Value, CalculatorError>;

#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    #[error("no calculator registered for '{score_id}'")]
    NotFound { score_id: String },
    #[error("invalid parameters for {score_id}: {source}")]
    InvalidParameters {
        score_id: &'static str,
        source: serde_json::Error,
    },
    #[error("invalid parameters for {score_id}: {source}")]
    Validation {
        score_id: &'static str,
        source: ValidationError,
    },
    #[error("{score_id} produced a non-finite result")]
    NonFinite { score_id: &'static str },
    #[error("failed to serialize {score_id} result: {source}")]
    Serialization {
        score_id: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreId {
    AAO2Gradient,
    Abcd2Score,
    AbgAnalyzer,
    Aims,
    Anc,
    ApacheIiScore,
    BicarbonateDeficit,
    BmiCalculator,
    BsaCalculator,
    CapriniScore2005,
    CedocsScore,
    CerebralPerfusionPressure,
    Cha2ds2Vasc,
    Chads2Score,
    ChildPughScore,
    CkdEpi2021,
    CorrectedQtInterval,
    Curb65,
    FatFreeMass,
    FreeWaterDeficit,
    Gad7,
    GlasgowComaScale,
    LdlCalculated,
    News2,
    QsofaScore,
    RoxIndex,
    WintersFormula,
}

impl ScoreId {
    pub const ALL: [ScoreId; 27] = [
        ScoreId::AAO2Gradient,
        ScoreId::Abcd2Score,
        ScoreId::AbgAnalyzer,
        ScoreId::Aims,
        ScoreId::Anc,
        ScoreId::ApacheIiScore,
        ScoreId::BicarbonateDeficit,
        ScoreId::BmiCalculator,
        ScoreId::BsaCalculator,
        ScoreId::CapriniScore2005,
        ScoreId::CedocsScore,
        ScoreId::CerebralPerfusionPressure,
        ScoreId::Cha2ds2Vasc,
        ScoreId::Chads2Score,
        ScoreId::ChildPughScore,
        ScoreId::CkdEpi2021,
        ScoreId::CorrectedQtInterval,
        ScoreId::Curb65,
        ScoreId::FatFreeMass,
        ScoreId::FreeWaterDeficit,
        ScoreId::Gad7,
        ScoreId::GlasgowComaScale,
        ScoreId::LdlCalculated,
        ScoreId::News2,
        ScoreId::QsofaScore,
        ScoreId::RoxIndex,
        ScoreId::WintersFormula,
    ];

    /// Wire id, matching the metadata file's `id` and the URL path segment.
    pub const fn as_str(self) -> &'static str {
        match self {
            ScoreId::AAO2Gradient => "a_a_o2_gradient",
            ScoreId::Abcd2Score => "abcd2_score",
            ScoreId::AbgAnalyzer => "abg_analyzer",
            ScoreId::Aims => "aims",
            ScoreId::Anc => "anc",
            ScoreId::ApacheIiScore => "apache_ii_score",
            ScoreId::BicarbonateDeficit => "bicarbonate_deficit",
            ScoreId::BmiCalculator => "bmi_calculator",
            ScoreId::BsaCalculator => "bsa_calculator",
            ScoreId::CapriniScore2005 => "caprini_score_2005",
            ScoreId::CedocsScore => "cedocs_score",
            ScoreId::CerebralPerfusionPressure => "cerebral_perfusion_pressure",
            ScoreId::Cha2ds2Vasc => "cha2ds2_vasc",
            ScoreId::Chads2Score => "chads2_score",
            ScoreId::ChildPughScore => "child_pugh_score",
            ScoreId::CkdEpi2021 => "ckd_epi_2021",
            ScoreId::CorrectedQtInterval => "corrected_qt_interval",
            ScoreId::Curb65 => "curb_65",
            ScoreId::FatFreeMass => "fat_free_mass",
            ScoreId::FreeWaterDeficit => "free_water_deficit",
            ScoreId::Gad7 => "gad_7",
            ScoreId::GlasgowComaScale => "glasgow_coma_scale",
            ScoreId::LdlCalculated => "ldl_calculated",
            ScoreId::News2 => "news_2",
            ScoreId::QsofaScore => "qsofa_score",
            ScoreId::RoxIndex => "rox_index",
            ScoreId::WintersFormula => "winters_formula_metabolic_acidosis",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == raw)
    }

    fn formula(self) -> Formula {
        match self {
            ScoreId::AAO2Gradient => run::<AAO2Gradient>,
            ScoreId::Abcd2Score => run::<Abcd2Score>,
            ScoreId::AbgAnalyzer => run::<AbgAnalyzer>,
            ScoreId::Aims => run::<Aims>,
            ScoreId::Anc => run::<Anc>,
            ScoreId::ApacheIiScore => run::<ApacheIiScore>,
            ScoreId::BicarbonateDeficit => run::<BicarbonateDeficit>,
            ScoreId::BmiCalculator => run::<BmiCalculator>,
            ScoreId::BsaCalculator => run::<BsaCalculator>,
            ScoreId::CapriniScore2005 => run::<CapriniScore2005>,
            ScoreId::CedocsScore => run::<CedocsScore>,
            ScoreId::CerebralPerfusionPressure => run::<CerebralPerfusionPressure>,
            ScoreId::Cha2ds2Vasc => run::<Cha2ds2Vasc>,
            ScoreId::Chads2Score => run::<Chads2Score>,
            ScoreId::ChildPughScore => run::<ChildPughScore>,
            ScoreId::CkdEpi2021 => run::<CkdEpi2021>,
            ScoreId::CorrectedQtInterval => run::<CorrectedQtInterval>,
            ScoreId::Curb65 => run::<Curb65>,
            ScoreId::FatFreeMass => run::<FatFreeMass>,
            ScoreId::FreeWaterDeficit => run::<FreeWaterDeficit>,
            ScoreId::Gad7 => run::<Gad7>,
            ScoreId::GlasgowComaScale => run::<GlasgowComaScale>,
            ScoreId::LdlCalculated => run::<LdlCalculated>,
            ScoreId::News2 => run::<News2>,
            ScoreId::QsofaScore => run::<QsofaScore>,
            ScoreId::RoxIndex => run::<RoxIndex>,
            ScoreId::WintersFormula => run::<WintersFormula>,
        }
    }
}

impl fmt::Display for ScoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreId {
    type Err = CalculatorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw).ok_or_else(|| CalculatorError::NotFound {
            score_id: raw.to_string(),
        })
    }
}

fn run<S: Score>(params: Value) -> Result<Value, CalculatorError> {
    let score_id = S::ID.as_str();
    let input: S::Input = serde_json::from_value(params)
        .map_err(|source| CalculatorError::InvalidParameters { score_id, source })?;
    input
        .validate()
        .map_err(|source| CalculatorError::Validation { score_id, source })?;

    let output = S::calculate(&input);
    if output
        .numeric_result()
        .is_some_and(|value| !value.is_finite())
    {
        return Err(CalculatorError::NonFinite { score_id });
    }

    serde_json::to_value(&output)
        .map_err(|source| CalculatorError::Serialization { score_id, source })
}

/// A resolved formula.
#[derive(Debug, Clone, Copy)]
pub struct Calculator {
    id: ScoreId,
    formula: Formula,
}

impl Calculator {
    pub fn id(&self) -> ScoreId {
        self.id
    }

    pub fn invoke(&self, params: Value) -> Result<Value, CalculatorError> {
        (self.formula)(params)
    }
}

/// String-keyed dispatch table shared by request handlers.
pub struct CalculatorRegistry {
    table: RwLock<Arc<HashMap<&'static str, Calculator>>>,
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Arc::new(build_table())),
        }
    }

    pub fn resolve(&self, score_id: &str) -> Option<Calculator> {
        self.snapshot().get(score_id).copied()
    }

    pub fn is_available(&self, score_id: &str) -> bool {
        self.snapshot().contains_key(score_id)
    }

    pub fn invoke(&self, score_id: &str, params: Value) -> Result<Value, CalculatorError> {
        let calculator = self
            .resolve(score_id)
            .ok_or_else(|| CalculatorError::NotFound {
                score_id: score_id.to_string(),
            })?;
        calculator.invoke(params)
    }

    /// Rebuilds the dispatch table and swaps it in; returns the number of calculators.
    pub fn reload(&self) -> usize {
        let fresh = Arc::new(build_table());
        let registered = fresh.len();
        *self
            .table
            .write()
            .expect("calculator table lock poisoned") = fresh;
        info!(registered, "calculator registry rebuilt");
        registered
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<HashMap<&'static str, Calculator>> {
        self.table
            .read()
            .expect("calculator table lock poisoned")
            .clone()
    }
}

fn build_table() -> HashMap<&'static str, Calculator> {
    ScoreId::ALL
        .into_iter()
        .map(|id| {
            (
                id.as_str(),
                Calculator {
                    id,
                    formula: id.formula(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn every_id_round_trips_through_its_wire_name() {
        let mut seen = HashSet::new();
        for id in ScoreId::ALL {
            assert!(seen.insert(id.as_str()), "duplicate wire id {id}");
            assert_eq!(ScoreId::parse(id.as_str()), Some(id));
            assert_eq!(id.as_str().parse::<ScoreId>().ok(), Some(id));
        }
    }

    #[test]
    fn registry_resolves_every_known_score() {
        let registry = CalculatorRegistry::new();
        assert_eq!(registry.len(), ScoreId::ALL.len());
        for id in ScoreId::ALL {
            let calculator = registry.resolve(id.as_str()).expect("calculator registered");
            assert_eq!(calculator.id(), id);
        }
        assert!(registry.resolve("ckd_epi_2009").is_none());
    }

    #[test]
    fn invoke_reports_unknown_scores() {
        let registry = CalculatorRegistry::new();
        let error = registry
            .invoke("mystery_score", json!({}))
            .expect_err("unknown id");
        assert!(matches!(error, CalculatorError::NotFound { score_id } if score_id == "mystery_score"));
    }

    #[test]
    fn invoke_rejects_missing_arguments() {
        let registry = CalculatorRegistry::new();
        let error = registry
            .invoke("ckd_epi_2021", json!({ "sex": "female", "age": 65 }))
            .expect_err("serum creatinine missing");
        assert!(matches!(
            error,
            CalculatorError::InvalidParameters {
                score_id: "ckd_epi_2021",
                ..
            }
        ));
    }

    #[test]
    fn invoke_rejects_out_of_range_arguments() {
        let registry = CalculatorRegistry::new();
        let error = registry
            .invoke(
                "ckd_epi_2021",
                json!({ "sex": "female", "age": 12, "serum_creatinine": 1.2 }),
            )
            .expect_err("age below adult range");
        match error {
            CalculatorError::Validation { source, .. } => assert!(source.is_about("age")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn invoke_returns_serialized_assessment() {
        let registry = CalculatorRegistry::new();
        let value = registry
            .invoke(
                "ckd_epi_2021",
                json!({ "sex": "female", "age": 65, "serum_creatinine": 1.2 }),
            )
            .expect("calculates");
        assert_eq!(value["stage"], "G3a");
        assert_eq!(value["unit"], "mL/min/1.73 m²");
    }

    #[test]
    fn reload_rebuilds_the_full_table() {
        let registry = CalculatorRegistry::new();
        assert_eq!(registry.reload(), ScoreId::ALL.len());
        assert!(registry.is_available("curb_65"));
        assert!(!registry.is_empty());
    }
}
