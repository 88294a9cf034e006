//! Score formulas grouped by clinical specialty.
//!
//! Every calculator is a unit struct implementing [`Score`]: a typed request that has already
//! passed [`Validate`], a pure `calculate`, and an [`Assessment`] carrying the common
//! `result`/`unit`/`interpretation`/`stage`/`stage_description` fields plus any score-specific
//! details flattened next to them.

pub mod cardiology;
pub mod critical_care;
pub mod emergency;
pub mod gastroenterology;
pub mod general;
pub mod hematology;
pub mod nephrology;
pub mod neurology;
pub mod psychiatry;
pub mod pulmonology;

use crate::registry::ScoreId;
use crate::validation::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A clinical calculator bound to its registry id.
pub trait Score {
    const ID: ScoreId;
    type Input: DeserializeOwned + Validate;
    type Output: Serialize + ScoreResult;

    /// Total over every input that passed validation.
    fn calculate(input: &Self::Input) -> Self::Output;
}

/// Common view over every calculator output.
pub trait ScoreResult {
    /// Numeric value of `result`, `None` for categorical results.
    fn numeric_result(&self) -> Option<f64>;
    fn unit(&self) -> &str;
    fn interpretation(&self) -> &str;
    fn stage(&self) -> &str;
    fn stage_description(&self) -> &str;
}

/// Value types allowed in the `result` slot.
pub trait ResultValue: Serialize {
    fn as_f64(&self) -> Option<f64>;
}

impl ResultValue for f64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self)
    }
}

impl ResultValue for u32 {
    fn as_f64(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl ResultValue for String {
    fn as_f64(&self) -> Option<f64> {
        None
    }
}

/// Placeholder for scores without extra output fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoDetails {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment<T, D = NoDetails> {
    pub result: T,
    pub unit: &'static str,
    pub interpretation: String,
    pub stage: String,
    pub stage_description: String,
    #[serde(flatten)]
    pub details: D,
}

impl<T: ResultValue> Assessment<T> {
    pub(crate) fn from_band(result: T, unit: &'static str, band: &Band) -> Self {
        Assessment::with_details(result, unit, band, NoDetails {})
    }
}

impl<T: ResultValue, D> Assessment<T, D> {
    pub(crate) fn with_details(result: T, unit: &'static str, band: &Band, details: D) -> Self {
        Self {
            result,
            unit,
            interpretation: band.interpretation.to_string(),
            stage: band.stage.to_string(),
            stage_description: band.description.to_string(),
            details,
        }
    }
}

impl<T: ResultValue, D> ScoreResult for Assessment<T, D> {
    fn numeric_result(&self) -> Option<f64> {
        self.result.as_f64()
    }

    fn unit(&self) -> &str {
        self.unit
    }

    fn interpretation(&self) -> &str {
        &self.interpretation
    }

    fn stage(&self) -> &str {
        &self.stage
    }

    fn stage_description(&self) -> &str {
        &self.stage_description
    }
}

/// One row of an interpretation table. `below` is the exclusive upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub below: f64,
    pub stage: &'static str,
    pub description: &'static str,
    pub interpretation: &'static str,
}

impl Band {
    pub(crate) const fn new(
        below: f64,
        stage: &'static str,
        description: &'static str,
        interpretation: &'static str,
    ) -> Self {
        Self {
            below,
            stage,
            description,
            interpretation,
        }
    }

    pub(crate) const fn last(
        stage: &'static str,
        description: &'static str,
        interpretation: &'static str,
    ) -> Self {
        Self::new(f64::INFINITY, stage, description, interpretation)
    }
}

/// First band whose upper bound exceeds `value`. Tables are ascending and end unbounded.
pub(crate) fn classify(bands: &'static [Band], value: f64) -> &'static Band {
    bands
        .iter()
        .find(|band| value < band.below)
        .unwrap_or(&bands[bands.len() - 1])
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub(crate) fn points(condition: bool, weight: u32) -> u32 {
    if condition {
        weight
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

#[cfg(test)]
pub(crate) fn assert_table_is_exhaustive(bands: &[Band]) {
    assert!(!bands.is_empty(), "band table must not be empty");
    assert!(
        bands.windows(2).all(|pair| pair[0].below < pair[1].below),
        "band bounds must be strictly ascending"
    );
    assert_eq!(
        bands[bands.len() - 1].below,
        f64::INFINITY,
        "last band must be unbounded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: [Band; 3] = [
        Band::new(10.0, "Low", "low", "low risk"),
        Band::new(20.0, "Moderate", "moderate", "moderate risk"),
        Band::last("High", "high", "high risk"),
    ];

    #[test]
    fn classify_uses_exclusive_upper_bounds() {
        assert_eq!(classify(&TABLE, 9.99).stage, "Low");
        assert_eq!(classify(&TABLE, 10.0).stage, "Moderate");
        assert_eq!(classify(&TABLE, 20.0).stage, "High");
        assert_eq!(classify(&TABLE, 1.0e9).stage, "High");
        assert_table_is_exhaustive(&TABLE);
    }

    #[test]
    fn round_to_keeps_requested_precision() {
        assert_eq!(round_to(22.857, 1), 22.9);
        assert_eq!(round_to(1.005_1, 2), 1.01);
        assert_eq!(round_to(-3.14159, 0), -3.0);
    }

    #[test]
    fn assessment_flattens_details() {
        #[derive(Serialize)]
        struct Extra {
            annual_risk: &'static str,
        }

        let assessment =
            Assessment::with_details(3u32, "points", &TABLE[0], Extra { annual_risk: "1%" });
        let json = serde_json::to_value(&assessment).expect("serializes");

        assert_eq!(json["result"], 3);
        assert_eq!(json["stage"], "Low");
        assert_eq!(json["annual_risk"], "1%");
        assert_eq!(assessment.numeric_result(), Some(3.0));
    }

    #[test]
    fn sex_uses_lowercase_wire_names() {
        let sex: Sex = serde_json::from_str("\"female\"").expect("parses");
        assert_eq!(sex, Sex::Female);
        assert!(serde_json::from_str::<Sex>("\"F\"").is_err());
    }
}
