use serde::{Deserialize, Serialize};

use super::{classify, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

/// Descending `(lower bound, points)` steps; the first bound the value reaches wins.
type Steps = &'static [(f64, u32)];

fn step_points(value: f64, steps: Steps, below_all: u32) -> u32 {
    steps
        .iter()
        .find(|(lower, _)| value >= *lower)
        .map_or(below_all, |(_, points)| *points)
}

const TEMPERATURE: Steps = &[
    (41.0, 4),
    (39.0, 3),
    (38.5, 1),
    (36.0, 0),
    (34.0, 1),
    (32.0, 2),
    (30.0, 3),
];
const MEAN_ARTERIAL_PRESSURE: Steps = &[(160.0, 4), (130.0, 3), (110.0, 2), (70.0, 0), (50.0, 2)];
const HEART_RATE: Steps = &[
    (180.0, 4),
    (140.0, 3),
    (110.0, 2),
    (70.0, 0),
    (55.0, 2),
    (40.0, 3),
];
const RESPIRATORY_RATE: Steps = &[
    (50.0, 4),
    (35.0, 3),
    (25.0, 1),
    (12.0, 0),
    (10.0, 1),
    (6.0, 2),
];
const ARTERIAL_PH: Steps = &[
    (7.7, 4),
    (7.6, 3),
    (7.5, 1),
    (7.33, 0),
    (7.25, 2),
    (7.15, 3),
];
const SODIUM: Steps = &[
    (180.0, 4),
    (160.0, 3),
    (155.0, 2),
    (150.0, 1),
    (130.0, 0),
    (120.0, 2),
    (111.0, 3),
];
const POTASSIUM: Steps = &[
    (7.0, 4),
    (6.0, 3),
    (5.5, 1),
    (3.5, 0),
    (3.0, 1),
    (2.5, 2),
];
const CREATININE: Steps = &[(3.5, 4), (2.0, 3), (1.5, 2), (0.6, 0)];
const HEMATOCRIT: Steps = &[(60.0, 4), (50.0, 2), (46.0, 1), (30.0, 0), (20.0, 2)];
const WHITE_BLOOD_CELLS: Steps = &[(40.0, 4), (20.0, 2), (15.0, 1), (3.0, 0), (1.0, 2)];
/// FiO2 < 0.5: PaO2 of 70 or more scores 0, 61-70 scores 1, 55-60 scores 3.
const PAO2: Steps = &[(70.0, 0), (61.0, 1), (55.0, 3)];
/// FiO2 >= 0.5: A-a gradient.
const AADO2: Steps = &[(500.0, 4), (350.0, 3), (200.0, 2)];

static APACHE_II_RISK: [Band; 5] = [
    Band::new(
        10.0,
        "Low Risk",
        "Low mortality risk",
        "Low severity of illness with predicted mortality typically below 10%.",
    ),
    Band::new(
        20.0,
        "Moderate Risk",
        "Moderate mortality risk",
        "Moderate severity of illness with predicted mortality typically 10-25%. Close monitoring and standard ICU care are appropriate.",
    ),
    Band::new(
        30.0,
        "High Risk",
        "High mortality risk",
        "High severity of illness with predicted mortality typically 25-50%. Aggressive intensive care management is warranted.",
    ),
    Band::new(
        40.0,
        "Very High Risk",
        "Very high mortality risk",
        "Very high severity of illness with predicted mortality typically 50-75%. Consider goals of care discussions.",
    ),
    Band::last(
        "Extremely High Risk",
        "Extremely high mortality risk",
        "Extremely high severity of illness with predicted mortality typically above 75%. Consider palliative care consultation.",
    ),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChronicHealthStatus {
    #[default]
    None,
    Present,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionType {
    ElectivePostoperative,
    #[default]
    Nonoperative,
    EmergencyPostoperative,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApacheIiRequest {
    pub age: u32,
    /// Worst temperature, °C
    pub temperature: f64,
    pub mean_arterial_pressure: f64,
    pub ph: f64,
    pub heart_rate: f64,
    pub respiratory_rate: f64,
    /// mEq/L
    pub sodium: f64,
    /// mEq/L
    pub potassium: f64,
    /// mg/dL
    pub creatinine: f64,
    pub acute_renal_failure: bool,
    /// %
    pub hematocrit: f64,
    /// ×10³/mm³
    pub white_blood_cell_count: f64,
    pub glasgow_coma_scale: u32,
    pub fio2: f64,
    /// mmHg, required when FiO2 < 0.5
    #[serde(default)]
    pub pao2: Option<f64>,
    /// mmHg, required when FiO2 >= 0.5
    #[serde(default)]
    pub aado2: Option<f64>,
    #[serde(default)]
    pub chronic_health_status: ChronicHealthStatus,
    #[serde(default)]
    pub admission_type: AdmissionType,
}

impl Validate for ApacheIiRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let low_fio2 = self.fio2 < 0.5;
        Validator::new()
            .range("age", self.age, 0, 120)
            .range("temperature", self.temperature, 25.0, 46.0)
            .range("mean_arterial_pressure", self.mean_arterial_pressure, 30.0, 250.0)
            .range("ph", self.ph, 6.5, 8.0)
            .range("heart_rate", self.heart_rate, 20.0, 250.0)
            .range("respiratory_rate", self.respiratory_rate, 5.0, 80.0)
            .range("sodium", self.sodium, 100.0, 200.0)
            .range("potassium", self.potassium, 1.0, 10.0)
            .range("creatinine", self.creatinine, 0.1, 20.0)
            .range("hematocrit", self.hematocrit, 10.0, 70.0)
            .range("white_blood_cell_count", self.white_blood_cell_count, 0.1, 100.0)
            .range("glasgow_coma_scale", self.glasgow_coma_scale, 3, 15)
            .range("fio2", self.fio2, 0.21, 1.0)
            .optional_range("pao2", self.pao2, 30.0, 700.0)
            .optional_range("aado2", self.aado2, 0.0, 800.0)
            .ensure(
                !low_fio2 || self.pao2.is_some(),
                "pao2",
                "is required when fio2 is below 0.5",
            )
            .ensure(
                low_fio2 || self.aado2.is_some(),
                "aado2",
                "is required when fio2 is 0.5 or higher",
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApachePhysiology {
    pub temperature: u32,
    pub mean_arterial_pressure: u32,
    pub heart_rate: u32,
    pub respiratory_rate: u32,
    pub oxygenation: u32,
    pub ph: u32,
    pub sodium: u32,
    pub potassium: u32,
    pub creatinine: u32,
    pub hematocrit: u32,
    pub white_blood_cell_count: u32,
    pub glasgow_coma_scale: u32,
}

impl ApachePhysiology {
    fn total(&self) -> u32 {
        self.temperature
            + self.mean_arterial_pressure
            + self.heart_rate
            + self.respiratory_rate
            + self.oxygenation
            + self.ph
            + self.sodium
            + self.potassium
            + self.creatinine
            + self.hematocrit
            + self.white_blood_cell_count
            + self.glasgow_coma_scale
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApacheIiDetails {
    pub acute_physiology_score: u32,
    pub age_points: u32,
    pub chronic_health_points: u32,
    pub components: ApachePhysiology,
}

pub struct ApacheIiScore;

impl ApacheIiScore {
    fn oxygenation_points(input: &ApacheIiRequest) -> u32 {
        if input.fio2 < 0.5 {
            input.pao2.map_or(0, |pao2| step_points(pao2, PAO2, 4))
        } else {
            input.aado2.map_or(0, |aado2| step_points(aado2, AADO2, 0))
        }
    }

    fn age_points(age: u32) -> u32 {
        match age {
            0..=44 => 0,
            45..=54 => 2,
            55..=64 => 3,
            65..=74 => 5,
            _ => 6,
        }
    }

    fn chronic_health_points(status: ChronicHealthStatus, admission: AdmissionType) -> u32 {
        match (status, admission) {
            (ChronicHealthStatus::None, _) => 0,
            (ChronicHealthStatus::Present, AdmissionType::ElectivePostoperative) => 2,
            (ChronicHealthStatus::Present, _) => 5,
        }
    }
}

impl Score for ApacheIiScore {
    const ID: ScoreId = ScoreId::ApacheIiScore;
    type Input = ApacheIiRequest;
    type Output = Assessment<u32, ApacheIiDetails>;

    fn calculate(input: &ApacheIiRequest) -> Self::Output {
        let creatinine = step_points(input.creatinine, CREATININE, 2);
        let components = ApachePhysiology {
            temperature: step_points(input.temperature, TEMPERATURE, 4),
            mean_arterial_pressure: step_points(
                input.mean_arterial_pressure,
                MEAN_ARTERIAL_PRESSURE,
                4,
            ),
            heart_rate: step_points(input.heart_rate, HEART_RATE, 4),
            respiratory_rate: step_points(input.respiratory_rate, RESPIRATORY_RATE, 4),
            oxygenation: Self::oxygenation_points(input),
            ph: step_points(input.ph, ARTERIAL_PH, 4),
            sodium: step_points(input.sodium, SODIUM, 4),
            potassium: step_points(input.potassium, POTASSIUM, 4),
            creatinine: if input.acute_renal_failure {
                creatinine * 2
            } else {
                creatinine
            },
            hematocrit: step_points(input.hematocrit, HEMATOCRIT, 4),
            white_blood_cell_count: step_points(
                input.white_blood_cell_count,
                WHITE_BLOOD_CELLS,
                4,
            ),
            glasgow_coma_scale: 15 - input.glasgow_coma_scale.min(15),
        };

        let acute_physiology_score = components.total();
        let age_points = Self::age_points(input.age);
        let chronic_health_points =
            Self::chronic_health_points(input.chronic_health_status, input.admission_type);
        let total = acute_physiology_score + age_points + chronic_health_points;

        let band = classify(&APACHE_II_RISK, f64::from(total));
        let mut assessment = Assessment::with_details(
            total,
            "points",
            band,
            ApacheIiDetails {
                acute_physiology_score,
                age_points,
                chronic_health_points,
                components,
            },
        );
        assessment.interpretation = format!("APACHE II score of {total}. {}", band.interpretation);
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::assert_table_is_exhaustive;

    fn healthy_adult() -> ApacheIiRequest {
        ApacheIiRequest {
            age: 40,
            temperature: 37.0,
            mean_arterial_pressure: 90.0,
            ph: 7.40,
            heart_rate: 80.0,
            respiratory_rate: 16.0,
            sodium: 140.0,
            potassium: 4.0,
            creatinine: 1.0,
            acute_renal_failure: false,
            hematocrit: 40.0,
            white_blood_cell_count: 8.0,
            glasgow_coma_scale: 15,
            fio2: 0.21,
            pao2: Some(90.0),
            aado2: None,
            chronic_health_status: ChronicHealthStatus::None,
            admission_type: AdmissionType::Nonoperative,
        }
    }

    #[test]
    fn risk_table_is_exhaustive() {
        assert_table_is_exhaustive(&APACHE_II_RISK);
    }

    #[test]
    fn normal_physiology_scores_zero() {
        let request = healthy_adult();
        assert!(request.validate().is_ok());
        let result = ApacheIiScore::calculate(&request);
        assert_eq!(result.result, 0);
        assert_eq!(result.stage, "Low Risk");
    }

    #[test]
    fn step_boundaries_follow_published_ranges() {
        assert_eq!(step_points(41.0, TEMPERATURE, 4), 4);
        assert_eq!(step_points(40.9, TEMPERATURE, 4), 3);
        assert_eq!(step_points(29.9, TEMPERATURE, 4), 4);
        assert_eq!(step_points(7.33, ARTERIAL_PH, 4), 0);
        assert_eq!(step_points(7.32, ARTERIAL_PH, 4), 2);
        assert_eq!(step_points(110.0, SODIUM, 4), 4);
        assert_eq!(step_points(0.5, CREATININE, 2), 2);
        assert_eq!(step_points(70.0, PAO2, 4), 0);
        assert_eq!(step_points(70.3, PAO2, 4), 0);
        assert_eq!(step_points(69.9, PAO2, 4), 1);
        assert_eq!(step_points(61.0, PAO2, 4), 1);
        assert_eq!(step_points(60.9, PAO2, 4), 3);
        assert_eq!(step_points(54.0, PAO2, 4), 4);
    }

    #[test]
    fn pao2_of_seventy_on_room_air_scores_nothing() {
        let mut request = healthy_adult();
        request.pao2 = Some(70.0);
        assert_eq!(ApacheIiScore::calculate(&request).details.components.oxygenation, 0);
        request.pao2 = Some(69.9);
        assert_eq!(ApacheIiScore::calculate(&request).details.components.oxygenation, 1);
    }

    #[test]
    fn acute_renal_failure_doubles_creatinine_points() {
        let mut request = healthy_adult();
        request.creatinine = 2.5;
        request.acute_renal_failure = true;
        let result = ApacheIiScore::calculate(&request);
        assert_eq!(result.details.components.creatinine, 6);
    }

    #[test]
    fn critically_ill_emergency_surgery_patient() {
        let request = ApacheIiRequest {
            age: 70,
            temperature: 39.5,
            mean_arterial_pressure: 55.0,
            ph: 7.20,
            heart_rate: 150.0,
            respiratory_rate: 36.0,
            sodium: 128.0,
            potassium: 3.2,
            creatinine: 2.1,
            acute_renal_failure: false,
            hematocrit: 28.0,
            white_blood_cell_count: 22.0,
            glasgow_coma_scale: 9,
            fio2: 0.6,
            pao2: None,
            aado2: Some(360.0),
            chronic_health_status: ChronicHealthStatus::Present,
            admission_type: AdmissionType::EmergencyPostoperative,
        };
        assert!(request.validate().is_ok());
        let result = ApacheIiScore::calculate(&request);
        // physiology 3+2+3+3+3+3+2+1+3+2+2+6 = 33, age 5, chronic 5
        assert_eq!(result.details.acute_physiology_score, 33);
        assert_eq!(result.details.age_points, 5);
        assert_eq!(result.details.chronic_health_points, 5);
        assert_eq!(result.result, 43);
        assert_eq!(result.stage, "Extremely High Risk");
    }

    #[test]
    fn oxygenation_input_must_match_fio2() {
        let mut request = healthy_adult();
        request.fio2 = 0.6;
        let error = request.validate().expect_err("aado2 missing");
        assert!(error.is_about("aado2"));

        let mut request = healthy_adult();
        request.pao2 = None;
        let error = request.validate().expect_err("pao2 missing");
        assert!(error.is_about("pao2"));
    }

    #[test]
    fn elective_surgery_limits_chronic_health_points() {
        let mut request = healthy_adult();
        request.chronic_health_status = ChronicHealthStatus::Present;
        request.admission_type = AdmissionType::ElectivePostoperative;
        assert_eq!(ApacheIiScore::calculate(&request).result, 2);
    }
}
