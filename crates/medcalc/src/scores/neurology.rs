use serde::{Deserialize, Serialize};

use super::{classify, points, round_to, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

static GCS_SEVERITY: [Band; 3] = [
    Band::new(
        9.0,
        "Severe",
        "Severe brain injury",
        "GCS 3-8. Comatose; airway protection with intubation is generally indicated. Urgent neuroimaging and neurosurgical evaluation.",
    ),
    Band::new(
        13.0,
        "Moderate",
        "Moderate brain injury",
        "GCS 9-12. Requires close neurological monitoring and CT imaging; risk of deterioration.",
    ),
    Band::last(
        "Mild",
        "Mild brain injury",
        "GCS 13-15. Observe for deterioration and image according to head injury decision rules.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct GlasgowComaRequest {
    pub eye_response: u32,
    pub verbal_response: u32,
    pub motor_response: u32,
}

impl Validate for GlasgowComaRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("eye_response", self.eye_response, 1, 4)
            .range("verbal_response", self.verbal_response, 1, 5)
            .range("motor_response", self.motor_response, 1, 6)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlasgowComaDetails {
    /// Conventional `E4V5M6` shorthand.
    pub notation: String,
}

pub struct GlasgowComaScale;

impl Score for GlasgowComaScale {
    const ID: ScoreId = ScoreId::GlasgowComaScale;
    type Input = GlasgowComaRequest;
    type Output = Assessment<u32, GlasgowComaDetails>;

    fn calculate(input: &GlasgowComaRequest) -> Self::Output {
        let total = input.eye_response + input.verbal_response + input.motor_response;
        Assessment::with_details(
            total,
            "points",
            classify(&GCS_SEVERITY, f64::from(total)),
            GlasgowComaDetails {
                notation: format!(
                    "E{}V{}M{}",
                    input.eye_response, input.verbal_response, input.motor_response
                ),
            },
        )
    }
}

static ABCD2_RISK: [Band; 3] = [
    Band::new(
        4.0,
        "Low Risk",
        "2-day stroke risk 1.0%",
        "Low short-term stroke risk. Outpatient evaluation within days may be reasonable if rapid work-up is available.",
    ),
    Band::new(
        6.0,
        "Moderate Risk",
        "2-day stroke risk 4.1%",
        "Moderate short-term stroke risk. Consider hospital admission or urgent specialist TIA clinic evaluation.",
    ),
    Band::last(
        "High Risk",
        "2-day stroke risk 8.1%",
        "High short-term stroke risk. Hospital admission for expedited evaluation and secondary prevention is recommended.",
    ),
];

/// Stroke risk after TIA at 2, 7 and 90 days by ABCD² risk group (Johnston 2007).
const ABCD2_STROKE_RISK: [(&str, &str, &str); 3] = [
    ("1.0%", "1.2%", "3.1%"),
    ("4.1%", "5.9%", "9.8%"),
    ("8.1%", "11.7%", "17.8%"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalFeatures {
    UnilateralWeakness,
    SpeechDisturbanceWithoutWeakness,
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Abcd2Request {
    pub age: u32,
    pub systolic_bp: u32,
    pub diastolic_bp: u32,
    pub clinical_features: ClinicalFeatures,
    pub symptom_duration_minutes: u32,
    pub diabetes: bool,
}

impl Validate for Abcd2Request {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("age", self.age, 0, 120)
            .range("systolic_bp", self.systolic_bp, 50, 300)
            .range("diastolic_bp", self.diastolic_bp, 20, 200)
            .range("symptom_duration_minutes", self.symptom_duration_minutes, 0, 1440)
            .ensure(
                self.diastolic_bp <= self.systolic_bp,
                "diastolic_bp",
                "must not exceed systolic_bp",
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abcd2Components {
    pub age: u32,
    pub blood_pressure: u32,
    pub clinical_features: u32,
    pub duration: u32,
    pub diabetes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abcd2Details {
    pub two_day_stroke_risk: &'static str,
    pub seven_day_stroke_risk: &'static str,
    pub ninety_day_stroke_risk: &'static str,
    pub components: Abcd2Components,
}

/// Short-term stroke risk after a transient ischaemic attack.
pub struct Abcd2Score;

impl Score for Abcd2Score {
    const ID: ScoreId = ScoreId::Abcd2Score;
    type Input = Abcd2Request;
    type Output = Assessment<u32, Abcd2Details>;

    fn calculate(input: &Abcd2Request) -> Self::Output {
        let components = Abcd2Components {
            age: points(input.age >= 60, 1),
            blood_pressure: points(input.systolic_bp >= 140 || input.diastolic_bp >= 90, 1),
            clinical_features: match input.clinical_features {
                ClinicalFeatures::UnilateralWeakness => 2,
                ClinicalFeatures::SpeechDisturbanceWithoutWeakness => 1,
                ClinicalFeatures::Other => 0,
            },
            duration: match input.symptom_duration_minutes {
                0..=9 => 0,
                10..=59 => 1,
                _ => 2,
            },
            diabetes: points(input.diabetes, 1),
        };
        let total = components.age
            + components.blood_pressure
            + components.clinical_features
            + components.duration
            + components.diabetes;
        let group = match total {
            0..=3 => 0,
            4..=5 => 1,
            _ => 2,
        };
        let (two_day, seven_day, ninety_day) = ABCD2_STROKE_RISK[group];

        Assessment::with_details(
            total,
            "points",
            classify(&ABCD2_RISK, f64::from(total)),
            Abcd2Details {
                two_day_stroke_risk: two_day,
                seven_day_stroke_risk: seven_day,
                ninety_day_stroke_risk: ninety_day,
                components,
            },
        )
    }
}

static CPP_TARGETS: [Band; 6] = [
    Band::new(
        30.0,
        "Critical",
        "Critically low cerebral perfusion",
        "Critical risk of cerebral ischemia and brain death. Immediate aggressive intervention to raise MAP and/or reduce ICP; consider emergency neurosurgical consultation.",
    ),
    Band::new(
        50.0,
        "Severely Low",
        "High risk of cerebral ischemia",
        "High risk of cerebral ischemia and secondary brain injury. Consider vasopressor support, ICP-lowering measures and close neurological monitoring.",
    ),
    Band::new(
        60.0,
        "Low",
        "Below optimal range",
        "Below optimal range with risk of ischemia, especially with impaired autoregulation. Consider interventions to improve cerebral perfusion.",
    ),
    Band::new(
        80.0,
        "Optimal",
        "Target range for cerebral perfusion",
        "Optimal range for cerebral perfusion in most patients and the usual target in traumatic brain injury. Maintain current management.",
    ),
    Band::new(
        100.0,
        "Adequate",
        "Adequate cerebral perfusion",
        "Adequate cerebral perfusion. Monitor for complications of elevated pressures while maintaining cerebral blood flow.",
    ),
    Band::last(
        "High",
        "Elevated cerebral perfusion pressure",
        "Elevated cerebral perfusion pressure. Consider the risk of cerebral edema and balance perfusion needs with pressure management.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct CerebralPerfusionRequest {
    /// mmHg
    pub mean_arterial_pressure: f64,
    /// mmHg
    pub intracranial_pressure: f64,
}

impl Validate for CerebralPerfusionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("mean_arterial_pressure", self.mean_arterial_pressure, 30.0, 200.0)
            .range("intracranial_pressure", self.intracranial_pressure, 0.0, 80.0)
            .ensure(
                self.intracranial_pressure < self.mean_arterial_pressure,
                "intracranial_pressure",
                "must be lower than mean_arterial_pressure",
            )
            .finish()
    }
}

pub struct CerebralPerfusionPressure;

impl Score for CerebralPerfusionPressure {
    const ID: ScoreId = ScoreId::CerebralPerfusionPressure;
    type Input = CerebralPerfusionRequest;
    type Output = Assessment<f64>;

    fn calculate(input: &CerebralPerfusionRequest) -> Self::Output {
        let cpp = round_to(input.mean_arterial_pressure - input.intracranial_pressure, 1);
        let band = classify(&CPP_TARGETS, cpp);
        let mut assessment = Assessment::from_band(cpp, "mmHg", band);
        assessment.interpretation = format!("CPP {cpp:.1} mmHg: {}", band.interpretation);
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::assert_table_is_exhaustive;

    #[test]
    fn tables_are_exhaustive() {
        assert_table_is_exhaustive(&GCS_SEVERITY);
        assert_table_is_exhaustive(&ABCD2_RISK);
        assert_table_is_exhaustive(&CPP_TARGETS);
    }

    #[test]
    fn gcs_severity_cutoffs() {
        let gcs = |eye, verbal, motor| {
            GlasgowComaScale::calculate(&GlasgowComaRequest {
                eye_response: eye,
                verbal_response: verbal,
                motor_response: motor,
            })
        };
        assert_eq!(gcs(1, 1, 1).stage, "Severe");
        assert_eq!(gcs(2, 2, 4).stage, "Severe");
        assert_eq!(gcs(2, 3, 4).stage, "Moderate");
        assert_eq!(gcs(3, 4, 6).stage, "Mild");

        let intact = gcs(4, 5, 6);
        assert_eq!(intact.result, 15);
        assert_eq!(intact.details.notation, "E4V5M6");
    }

    #[test]
    fn gcs_rejects_out_of_range_motor_score() {
        let error = GlasgowComaRequest {
            eye_response: 4,
            verbal_response: 5,
            motor_response: 7,
        }
        .validate()
        .expect_err("motor above 6");
        assert!(error.is_about("motor_response"));
    }

    #[test]
    fn abcd2_high_risk_tia() {
        let request = Abcd2Request {
            age: 72,
            systolic_bp: 150,
            diastolic_bp: 85,
            clinical_features: ClinicalFeatures::UnilateralWeakness,
            symptom_duration_minutes: 75,
            diabetes: true,
        };
        assert!(request.validate().is_ok());
        let result = Abcd2Score::calculate(&request);
        assert_eq!(result.result, 7);
        assert_eq!(result.stage, "High Risk");
        assert_eq!(result.details.two_day_stroke_risk, "8.1%");
    }

    #[test]
    fn abcd2_moderate_and_low_groups() {
        let mut request = Abcd2Request {
            age: 65,
            systolic_bp: 130,
            diastolic_bp: 92,
            clinical_features: ClinicalFeatures::SpeechDisturbanceWithoutWeakness,
            symptom_duration_minutes: 30,
            diabetes: false,
        };
        let result = Abcd2Score::calculate(&request);
        assert_eq!(result.result, 4);
        assert_eq!(result.details.seven_day_stroke_risk, "5.9%");

        request.age = 40;
        request.diastolic_bp = 80;
        assert_eq!(Abcd2Score::calculate(&request).stage, "Low Risk");
    }

    #[test]
    fn abcd2_rejects_inverted_blood_pressure() {
        let error = Abcd2Request {
            age: 50,
            systolic_bp: 80,
            diastolic_bp: 90,
            clinical_features: ClinicalFeatures::Other,
            symptom_duration_minutes: 5,
            diabetes: false,
        }
        .validate()
        .expect_err("diastolic above systolic");
        assert!(error.is_about("diastolic_bp"));
    }

    #[test]
    fn cpp_in_target_range() {
        let result = CerebralPerfusionPressure::calculate(&CerebralPerfusionRequest {
            mean_arterial_pressure: 85.0,
            intracranial_pressure: 15.0,
        });
        assert_eq!(result.result, 70.0);
        assert_eq!(result.stage, "Optimal");
        assert!(result.interpretation.starts_with("CPP 70.0 mmHg:"));
    }

    #[test]
    fn cpp_requires_icp_below_map() {
        let error = CerebralPerfusionRequest {
            mean_arterial_pressure: 40.0,
            intracranial_pressure: 40.0,
        }
        .validate()
        .expect_err("icp equals map");
        assert!(error.is_about("intracranial_pressure"));
    }
}
