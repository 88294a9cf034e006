use serde::{Deserialize, Serialize};

use super::{classify, points, round_to, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

static CURB_65_RISK: [Band; 3] = [
    Band::new(
        2.0,
        "Low Risk",
        "Low risk of 30-day mortality",
        "Consider outpatient treatment.",
    ),
    Band::new(
        3.0,
        "Moderate Risk",
        "Moderate risk of 30-day mortality",
        "Consider short inpatient stay or closely supervised outpatient treatment.",
    ),
    Band::last(
        "High Risk",
        "High risk of 30-day mortality",
        "Hospitalize and assess for intensive care admission, especially with 4-5 points.",
    ),
];

/// 30-day mortality by score (Lim 2003).
const CURB_65_MORTALITY: [&str; 6] = ["0.7%", "2.1%", "9.2%", "14.5%", "40.0%", "57.0%"];

#[derive(Debug, Clone, Deserialize)]
pub struct Curb65Request {
    pub confusion: bool,
    /// Blood urea nitrogen, mg/dL
    pub urea: f64,
    pub respiratory_rate: u32,
    pub systolic_bp: u32,
    pub diastolic_bp: u32,
    pub age: u32,
}

impl Validate for Curb65Request {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("urea", self.urea, 0.0, 200.0)
            .range("respiratory_rate", self.respiratory_rate, 0, 60)
            .range("systolic_bp", self.systolic_bp, 0, 300)
            .range("diastolic_bp", self.diastolic_bp, 0, 200)
            .range("age", self.age, 0, 120)
            .ensure(
                self.diastolic_bp <= self.systolic_bp,
                "diastolic_bp",
                "must not exceed systolic_bp",
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Curb65Components {
    pub confusion: u32,
    pub urea: u32,
    pub respiratory_rate: u32,
    pub blood_pressure: u32,
    pub age_65_or_older: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curb65Details {
    pub mortality_risk: &'static str,
    pub components: Curb65Components,
}

pub struct Curb65;

impl Score for Curb65 {
    const ID: ScoreId = ScoreId::Curb65;
    type Input = Curb65Request;
    type Output = Assessment<u32, Curb65Details>;

    fn calculate(input: &Curb65Request) -> Self::Output {
        let components = Curb65Components {
            confusion: points(input.confusion, 1),
            urea: points(input.urea > 19.0, 1),
            respiratory_rate: points(input.respiratory_rate >= 30, 1),
            blood_pressure: points(input.systolic_bp < 90 || input.diastolic_bp <= 60, 1),
            age_65_or_older: points(input.age >= 65, 1),
        };
        let total = components.confusion
            + components.urea
            + components.respiratory_rate
            + components.blood_pressure
            + components.age_65_or_older;
        let mortality_risk = CURB_65_MORTALITY[total.min(5) as usize];
        let band = classify(&CURB_65_RISK, f64::from(total));

        let mut assessment = Assessment::with_details(
            total,
            "points",
            band,
            Curb65Details {
                mortality_risk,
                components,
            },
        );
        assessment.interpretation = format!(
            "CURB-65 score of {total}: 30-day mortality {mortality_risk}. {}",
            band.interpretation
        );
        assessment
    }
}

const NORMAL_PH: (f64, f64) = (7.35, 7.45);
const NORMAL_PCO2: (f64, f64) = (35.0, 45.0);
const NORMAL_HCO3: (f64, f64) = (22.0, 26.0);

/// Winter's formula: expected PCO2 for a metabolic acidosis.
pub(crate) fn winters_expected_pco2(bicarbonate: f64) -> f64 {
    1.5 * bicarbonate + 8.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbgRequest {
    pub ph: f64,
    /// mmHg
    pub pco2: f64,
    /// mEq/L
    pub hco3: f64,
    /// mmHg
    #[serde(default)]
    pub po2: Option<f64>,
    #[serde(default)]
    pub fio2: Option<f64>,
}

impl Validate for AbgRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("ph", self.ph, 6.8, 7.8)
            .range("pco2", self.pco2, 10.0, 100.0)
            .range("hco3", self.hco3, 5.0, 50.0)
            .optional_range("po2", self.po2, 30.0, 600.0)
            .optional_range("fio2", self.fio2, 0.21, 1.0)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhStatus {
    Acidemia,
    Normal,
    Alkalemia,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Oxygenation {
    pub po2: f64,
    pub status: &'static str,
    pub severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fio2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pf_ratio: Option<f64>,
}

impl Oxygenation {
    fn assess(po2: f64, fio2: Option<f64>) -> Self {
        let severity = if po2 < 60.0 {
            "Severe hypoxemia"
        } else if po2 < 80.0 {
            "Mild to moderate hypoxemia"
        } else {
            "Normal oxygenation"
        };
        Self {
            po2,
            status: if po2 >= 80.0 { "Normal" } else { "Hypoxemia" },
            severity,
            fio2,
            pf_ratio: fio2.map(|fio2| round_to(po2 / fio2, 0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbgDetails {
    pub ph_status: PhStatus,
    pub compensation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygenation: Option<Oxygenation>,
}

/// Stepwise arterial blood gas interpretation.
pub struct AbgAnalyzer;

impl AbgAnalyzer {
    fn respiratory_compensation_for_acidosis(pco2: f64, hco3: f64) -> String {
        let expected = winters_expected_pco2(hco3);
        let verdict = if pco2 < expected - 2.0 {
            "Overcompensation or concomitant respiratory alkalosis"
        } else if pco2 > expected + 2.0 {
            "Inadequate respiratory compensation (concomitant respiratory acidosis)"
        } else {
            "Appropriate respiratory compensation"
        };
        format!("{verdict} (PCO2 {pco2:.1}, expected {expected:.1}±2)")
    }

    fn respiratory_compensation_for_alkalosis(pco2: f64, hco3: f64) -> String {
        let expected = 40.0 + 0.7 * (hco3 - 24.0);
        let verdict = if pco2 < expected - 5.0 {
            "Inadequate respiratory compensation"
        } else if pco2 > expected + 5.0 {
            "Overcompensation or mixed disorder"
        } else {
            "Appropriate respiratory compensation"
        };
        format!("{verdict} (PCO2 {pco2:.1}, expected ~{expected:.1})")
    }

    fn metabolic_compensation_for_acidosis(hco3: f64, pco2: f64) -> String {
        let excess = pco2 - 40.0;
        let acute = 24.0 + excess / 10.0;
        let chronic = 24.0 + 3.5 * excess / 10.0;
        if hco3 <= acute + 2.0 {
            format!("Acute respiratory acidosis (HCO3 {hco3:.1}, acute expected ~{acute:.1})")
        } else if hco3 >= chronic - 2.0 {
            format!(
                "Chronic respiratory acidosis with compensation (HCO3 {hco3:.1}, chronic expected ~{chronic:.1})"
            )
        } else {
            format!("Partial metabolic compensation (HCO3 {hco3:.1})")
        }
    }

    fn metabolic_compensation_for_alkalosis(hco3: f64, pco2: f64) -> String {
        let deficit = 40.0 - pco2;
        let acute = 24.0 - 2.0 * deficit / 10.0;
        let chronic = 24.0 - 5.0 * deficit / 10.0;
        if hco3 >= acute - 2.0 {
            format!("Acute respiratory alkalosis (HCO3 {hco3:.1}, acute expected ~{acute:.1})")
        } else if hco3 <= chronic + 2.0 {
            format!(
                "Chronic respiratory alkalosis with compensation (HCO3 {hco3:.1}, chronic expected ~{chronic:.1})"
            )
        } else {
            format!("Partial metabolic compensation (HCO3 {hco3:.1})")
        }
    }

    fn normal_ph_pattern(pco2: f64, hco3: f64) -> &'static str {
        let low_hco3 = hco3 < NORMAL_HCO3.0;
        let high_hco3 = hco3 > NORMAL_HCO3.1;
        let low_pco2 = pco2 < NORMAL_PCO2.0;
        let high_pco2 = pco2 > NORMAL_PCO2.1;
        match (low_hco3, high_hco3, low_pco2, high_pco2) {
            (true, _, true, _) => "Fully compensated metabolic acidosis",
            (_, true, _, true) => "Fully compensated metabolic alkalosis",
            (true, _, _, true) => "Fully compensated respiratory acidosis",
            (_, true, true, _) => "Fully compensated respiratory alkalosis",
            _ => "No compensation needed",
        }
    }
}

impl Score for AbgAnalyzer {
    const ID: ScoreId = ScoreId::AbgAnalyzer;
    type Input = AbgRequest;
    type Output = Assessment<String, AbgDetails>;

    fn calculate(input: &AbgRequest) -> Self::Output {
        let AbgRequest {
            ph, pco2, hco3, ..
        } = *input;

        let ph_status = if ph < NORMAL_PH.0 {
            PhStatus::Acidemia
        } else if ph > NORMAL_PH.1 {
            PhStatus::Alkalemia
        } else {
            PhStatus::Normal
        };

        let mixed = || {
            (
                "Mixed Acid-Base Disorder",
                "Mixed Disorder",
                "Complex acid-base disturbance",
                "Mixed disorder present".to_string(),
            )
        };
        let (disorder, stage, description, compensation) = match ph_status {
            PhStatus::Acidemia if hco3 < NORMAL_HCO3.0 => (
                "Metabolic Acidosis",
                "Metabolic Acidosis",
                "Primary metabolic acidosis",
                Self::respiratory_compensation_for_acidosis(pco2, hco3),
            ),
            PhStatus::Acidemia if pco2 > NORMAL_PCO2.1 => (
                "Respiratory Acidosis",
                "Respiratory Acidosis",
                "Primary respiratory acidosis",
                Self::metabolic_compensation_for_acidosis(hco3, pco2),
            ),
            PhStatus::Alkalemia if hco3 > NORMAL_HCO3.1 => (
                "Metabolic Alkalosis",
                "Metabolic Alkalosis",
                "Primary metabolic alkalosis",
                Self::respiratory_compensation_for_alkalosis(pco2, hco3),
            ),
            PhStatus::Alkalemia if pco2 < NORMAL_PCO2.0 => (
                "Respiratory Alkalosis",
                "Respiratory Alkalosis",
                "Primary respiratory alkalosis",
                Self::metabolic_compensation_for_alkalosis(hco3, pco2),
            ),
            PhStatus::Acidemia | PhStatus::Alkalemia => mixed(),
            PhStatus::Normal => (
                "Normal pH",
                "Normal pH",
                "pH within normal range",
                Self::normal_ph_pattern(pco2, hco3).to_string(),
            ),
        };

        let oxygenation = input.po2.map(|po2| Oxygenation::assess(po2, input.fio2));

        let mut parts = vec![
            format!("Primary disorder: {disorder}"),
            format!(
                "pH {ph:.2} indicates {}",
                format!("{ph_status:?}").to_lowercase()
            ),
            format!("Compensation: {compensation}"),
            format!("Values: pH {ph:.2}, PCO2 {pco2:.1} mmHg, HCO3 {hco3:.1} mEq/L"),
        ];
        if let Some(oxygenation) = &oxygenation {
            parts.push(format!(
                "Oxygenation: PO2 {:.1} mmHg - {}",
                oxygenation.po2, oxygenation.severity
            ));
        }
        if disorder == "Metabolic Acidosis" {
            parts.push("Calculate the anion gap and assess for underlying causes".to_string());
        } else if disorder.starts_with("Respiratory") {
            parts.push(
                "Assess respiratory function and underlying pulmonary or neuromuscular causes"
                    .to_string(),
            );
        }

        Assessment {
            result: disorder.to_string(),
            unit: "",
            interpretation: format!("{}.", parts.join(". ")),
            stage: stage.to_string(),
            stage_description: description.to_string(),
            details: AbgDetails {
                ph_status,
                compensation,
                oxygenation,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WintersRequest {
    /// mEq/L
    pub bicarbonate: f64,
    /// mmHg
    #[serde(default)]
    pub measured_pco2: Option<f64>,
}

impl Validate for WintersRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("bicarbonate", self.bicarbonate, 5.0, 35.0)
            .optional_range("measured_pco2", self.measured_pco2, 10.0, 80.0)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedRange {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WintersDetails {
    pub expected_range: ExpectedRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_pco2: Option<f64>,
}

/// Expected respiratory compensation for metabolic acidosis.
pub struct WintersFormula;

impl Score for WintersFormula {
    const ID: ScoreId = ScoreId::WintersFormula;
    type Input = WintersRequest;
    type Output = Assessment<f64, WintersDetails>;

    fn calculate(input: &WintersRequest) -> Self::Output {
        let expected = round_to(winters_expected_pco2(input.bicarbonate), 1);
        let range = ExpectedRange {
            lower: round_to(expected - 2.0, 1),
            upper: round_to(expected + 2.0, 1),
        };

        let (stage, description, interpretation) = match input.measured_pco2 {
            None => (
                "Expected Range",
                "Expected PCO2 for appropriate compensation",
                format!(
                    "Expected PCO2 {expected:.1} mmHg (range {:.1}-{:.1} mmHg) if respiratory compensation is appropriate.",
                    range.lower, range.upper
                ),
            ),
            Some(measured) if measured > range.upper => (
                "Concomitant Respiratory Acidosis",
                "PCO2 above expected range",
                format!(
                    "Measured PCO2 {measured:.1} mmHg exceeds the expected {:.1}-{:.1} mmHg: concomitant respiratory acidosis. Evaluate ventilation.",
                    range.lower, range.upper
                ),
            ),
            Some(measured) if measured < range.lower => (
                "Concomitant Respiratory Alkalosis",
                "PCO2 below expected range",
                format!(
                    "Measured PCO2 {measured:.1} mmHg is below the expected {:.1}-{:.1} mmHg: concomitant respiratory alkalosis. Look for a primary hyperventilation cause.",
                    range.lower, range.upper
                ),
            ),
            Some(measured) => (
                "Appropriate Compensation",
                "PCO2 within expected range",
                format!(
                    "Measured PCO2 {measured:.1} mmHg lies within the expected {:.1}-{:.1} mmHg: appropriate respiratory compensation.",
                    range.lower, range.upper
                ),
            ),
        };

        Assessment {
            result: expected,
            unit: "mmHg",
            interpretation,
            stage: stage.to_string(),
            stage_description: description.to_string(),
            details: WintersDetails {
                expected_range: range,
                measured_pco2: input.measured_pco2,
            },
        }
    }
}

const WATER_VAPOUR_PRESSURE: f64 = 47.0;
const RESPIRATORY_QUOTIENT: f64 = 0.8;

#[derive(Debug, Clone, Deserialize)]
pub struct AaGradientRequest {
    pub age: u32,
    pub fio2: f64,
    /// mmHg
    pub pao2: f64,
    /// mmHg
    pub paco2: f64,
    /// mmHg, defaults to 760
    #[serde(default)]
    pub atmospheric_pressure: Option<f64>,
}

impl AaGradientRequest {
    fn alveolar_o2(&self) -> f64 {
        let patm = self.atmospheric_pressure.unwrap_or(760.0);
        self.fio2 * (patm - WATER_VAPOUR_PRESSURE) - self.paco2 / RESPIRATORY_QUOTIENT
    }
}

impl Validate for AaGradientRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .range("age", self.age, 0, 120)
            .range("fio2", self.fio2, 0.21, 1.0)
            .range("pao2", self.pao2, 20.0, 700.0)
            .range("paco2", self.paco2, 10.0, 120.0)
            .optional_range(
                "atmospheric_pressure",
                self.atmospheric_pressure,
                400.0,
                800.0,
            );
        validator.ensure(
            self.pao2 <= self.alveolar_o2(),
            "pao2",
            "exceeds the calculated alveolar oxygen tension",
        );
        validator.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AaGradientDetails {
    pub alveolar_o2: f64,
    pub expected_gradient: f64,
}

pub struct AAO2Gradient;

impl Score for AAO2Gradient {
    const ID: ScoreId = ScoreId::AAO2Gradient;
    type Input = AaGradientRequest;
    type Output = Assessment<f64, AaGradientDetails>;

    fn calculate(input: &AaGradientRequest) -> Self::Output {
        let alveolar = input.alveolar_o2();
        let gradient = round_to(alveolar - input.pao2, 1);
        let expected = round_to(f64::from(input.age) / 4.0 + 4.0, 1);

        let (stage, description, interpretation) = if gradient <= expected {
            (
                "Normal",
                "A-a gradient within age-expected limit",
                format!(
                    "A-a gradient {gradient:.1} mmHg is within the age-expected {expected:.1} mmHg. Hypoxemia, if present, suggests hypoventilation or low inspired oxygen."
                ),
            )
        } else {
            (
                "Elevated",
                "A-a gradient above age-expected limit",
                format!(
                    "A-a gradient {gradient:.1} mmHg exceeds the age-expected {expected:.1} mmHg, suggesting V/Q mismatch, shunt or diffusion impairment."
                ),
            )
        };

        Assessment {
            result: gradient,
            unit: "mmHg",
            interpretation,
            stage: stage.to_string(),
            stage_description: description.to_string(),
            details: AaGradientDetails {
                alveolar_o2: round_to(alveolar, 1),
                expected_gradient: expected,
            },
        }
    }
}

static ROX_RISK: [Band; 3] = [
    Band::new(
        3.85,
        "High Risk",
        "High risk of high-flow nasal cannula failure",
        "High risk of HFNC failure. Consider escalation to intubation.",
    ),
    Band::new(
        4.88,
        "Intermediate Risk",
        "Indeterminate risk of high-flow nasal cannula failure",
        "Indeterminate risk. Reassess the ROX index within 1-2 hours.",
    ),
    Band::last(
        "Low Risk",
        "Low risk of high-flow nasal cannula failure",
        "Low risk of progression to intubation. Continue HFNC with monitoring.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct RoxRequest {
    /// %
    pub spo2: f64,
    pub fio2: f64,
    pub respiratory_rate: f64,
}

impl Validate for RoxRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("spo2", self.spo2, 50.0, 100.0)
            .range("fio2", self.fio2, 0.21, 1.0)
            .range("respiratory_rate", self.respiratory_rate, 5.0, 60.0)
            .finish()
    }
}

pub struct RoxIndex;

impl Score for RoxIndex {
    const ID: ScoreId = ScoreId::RoxIndex;
    type Input = RoxRequest;
    type Output = Assessment<f64>;

    fn calculate(input: &RoxRequest) -> Assessment<f64> {
        let rox = round_to(input.spo2 / input.fio2 / input.respiratory_rate, 2);
        Assessment::from_band(rox, "", classify(&ROX_RISK, rox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::assert_table_is_exhaustive;

    fn curb_request() -> Curb65Request {
        Curb65Request {
            confusion: true,
            urea: 25.0,
            respiratory_rate: 32,
            systolic_bp: 85,
            diastolic_bp: 55,
            age: 70,
        }
    }

    #[test]
    fn tables_are_exhaustive() {
        assert_table_is_exhaustive(&CURB_65_RISK);
        assert_table_is_exhaustive(&ROX_RISK);
    }

    #[test]
    fn curb_65_all_criteria_present() {
        let request = curb_request();
        assert!(request.validate().is_ok());
        let result = Curb65::calculate(&request);
        assert_eq!(result.result, 5);
        assert_eq!(result.stage, "High Risk");
        assert_eq!(result.details.mortality_risk, "57.0%");
    }

    #[test]
    fn curb_65_boundaries() {
        let result = Curb65::calculate(&Curb65Request {
            confusion: false,
            urea: 19.0,
            respiratory_rate: 30,
            systolic_bp: 120,
            diastolic_bp: 60,
            age: 64,
        });
        // urea must exceed 19; RR 30 and DBP 60 both score
        assert_eq!(result.details.components.urea, 0);
        assert_eq!(result.details.components.respiratory_rate, 1);
        assert_eq!(result.details.components.blood_pressure, 1);
        assert_eq!(result.result, 2);
        assert_eq!(result.stage, "Moderate Risk");
    }

    #[test]
    fn curb_65_rejects_diastolic_above_systolic() {
        let mut request = curb_request();
        request.systolic_bp = 80;
        request.diastolic_bp = 90;
        let error = request.validate().expect_err("inconsistent pressures");
        assert!(error.is_about("diastolic_bp"));
    }

    fn abg(ph: f64, pco2: f64, hco3: f64) -> Assessment<String, AbgDetails> {
        AbgAnalyzer::calculate(&AbgRequest {
            ph,
            pco2,
            hco3,
            po2: None,
            fio2: None,
        })
    }

    #[test]
    fn abg_metabolic_acidosis_with_appropriate_compensation() {
        // Winter's: 1.5 * 12 + 8 = 26 +/- 2
        let result = abg(7.25, 26.0, 12.0);
        assert_eq!(result.result, "Metabolic Acidosis");
        assert!(result
            .details
            .compensation
            .starts_with("Appropriate respiratory compensation"));
        assert!(result.interpretation.contains("anion gap"));
    }

    #[test]
    fn abg_acute_respiratory_acidosis() {
        let result = abg(7.25, 60.0, 25.0);
        assert_eq!(result.stage, "Respiratory Acidosis");
        assert!(result
            .details
            .compensation
            .starts_with("Acute respiratory acidosis"));
    }

    #[test]
    fn abg_chronic_respiratory_alkalosis() {
        // deficit 10 -> chronic expected 19
        let result = abg(7.47, 30.0, 19.0);
        assert_eq!(result.stage, "Respiratory Alkalosis");
        assert!(result.details.compensation.starts_with("Chronic"));
    }

    #[test]
    fn abg_metabolic_alkalosis_and_mixed_patterns() {
        assert_eq!(abg(7.50, 47.0, 34.0).stage, "Metabolic Alkalosis");
        assert_eq!(abg(7.30, 40.0, 24.0).stage, "Mixed Disorder");
    }

    #[test]
    fn abg_normal_ph_detects_full_compensation() {
        let result = abg(7.38, 30.0, 18.0);
        assert_eq!(result.stage, "Normal pH");
        assert_eq!(
            result.details.compensation,
            "Fully compensated metabolic acidosis"
        );
        assert_eq!(result.details.ph_status, PhStatus::Normal);
    }

    #[test]
    fn abg_reports_oxygenation_when_po2_given() {
        let result = AbgAnalyzer::calculate(&AbgRequest {
            ph: 7.40,
            pco2: 40.0,
            hco3: 24.0,
            po2: Some(55.0),
            fio2: Some(0.5),
        });
        let oxygenation = result.details.oxygenation.expect("po2 given");
        assert_eq!(oxygenation.severity, "Severe hypoxemia");
        assert_eq!(oxygenation.pf_ratio, Some(110.0));
        assert!(result.interpretation.contains("Severe hypoxemia"));
    }

    #[test]
    fn winters_without_measured_pco2_reports_range() {
        let result = WintersFormula::calculate(&WintersRequest {
            bicarbonate: 10.0,
            measured_pco2: None,
        });
        assert_eq!(result.result, 23.0);
        assert_eq!(result.stage, "Expected Range");
        assert_eq!(
            result.details.expected_range,
            ExpectedRange {
                lower: 21.0,
                upper: 25.0
            }
        );
    }

    #[test]
    fn winters_classifies_measured_pco2() {
        let with = |measured| {
            WintersFormula::calculate(&WintersRequest {
                bicarbonate: 10.0,
                measured_pco2: Some(measured),
            })
            .stage
        };
        assert_eq!(with(25.0), "Appropriate Compensation");
        assert_eq!(with(30.0), "Concomitant Respiratory Acidosis");
        assert_eq!(with(18.0), "Concomitant Respiratory Alkalosis");
    }

    #[test]
    fn aa_gradient_on_room_air() {
        let request = AaGradientRequest {
            age: 40,
            fio2: 0.21,
            pao2: 90.0,
            paco2: 40.0,
            atmospheric_pressure: None,
        };
        assert!(request.validate().is_ok());
        let result = AAO2Gradient::calculate(&request);
        // 0.21 * 713 - 50 = 99.73
        assert_eq!(result.details.alveolar_o2, 99.7);
        assert_eq!(result.result, 9.7);
        assert_eq!(result.stage, "Normal");
        assert_eq!(result.details.expected_gradient, 14.0);
    }

    #[test]
    fn aa_gradient_rejects_impossible_pao2() {
        let error = AaGradientRequest {
            age: 40,
            fio2: 0.21,
            pao2: 150.0,
            paco2: 40.0,
            atmospheric_pressure: None,
        }
        .validate()
        .expect_err("pao2 above alveolar");
        assert!(error.is_about("pao2"));
    }

    #[test]
    fn rox_index_bands() {
        let result = RoxIndex::calculate(&RoxRequest {
            spo2: 92.0,
            fio2: 0.6,
            respiratory_rate: 30.0,
        });
        // 153.33 / 30
        assert_eq!(result.result, 5.11);
        assert_eq!(result.stage, "Low Risk");

        let result = RoxIndex::calculate(&RoxRequest {
            spo2: 88.0,
            fio2: 0.9,
            respiratory_rate: 32.0,
        });
        assert_eq!(result.stage, "High Risk");
    }
}
