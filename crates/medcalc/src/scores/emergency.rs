use serde::{Deserialize, Serialize};

use super::{classify, points, round_to, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

static NEWS_2_RESPONSE: [Band; 4] = [
    Band::new(
        1.0,
        "Low Risk",
        "Very low early warning score",
        "Continue routine monitoring. Minimum monitoring frequency every 12 hours.",
    ),
    Band::new(
        5.0,
        "Low Risk",
        "Low early warning score",
        "Assessment by competent registered nurse. Minimum monitoring frequency every 4-6 hours.",
    ),
    Band::new(
        7.0,
        "Medium Risk",
        "Medium early warning score",
        "Urgent review by ward-based doctor or acute team nurse to decide if critical care team assessment is needed. Minimum monitoring frequency every hour.",
    ),
    Band::last(
        "High Risk",
        "High early warning score",
        "Emergent assessment by clinical team or critical care team. Continuous monitoring of vital signs, usually with transfer to a higher level of care.",
    ),
];

/// A single parameter scoring 3 escalates an otherwise low aggregate.
static NEWS_2_RED_SCORE: Band = Band::new(
    f64::INFINITY,
    "Low-Medium Risk",
    "RED score: single parameter scoring 3",
    "Urgent review by ward-based doctor required. Minimum monitoring frequency every hour.",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consciousness {
    Alert,
    NewConfusion,
    Voice,
    Pain,
    Unresponsive,
}

#[derive(Debug, Clone, Deserialize)]
pub struct News2Request {
    /// breaths/min
    pub respiratory_rate: u32,
    /// %
    pub oxygen_saturation: u32,
    /// Selects SpO2 scale 2 (target 88-92%).
    #[serde(default)]
    pub hypercapnic_respiratory_failure: bool,
    pub supplemental_oxygen: bool,
    /// °C
    pub temperature: f64,
    /// mmHg
    pub systolic_bp: u32,
    /// beats/min
    pub heart_rate: u32,
    pub consciousness: Consciousness,
}

impl Validate for News2Request {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("respiratory_rate", self.respiratory_rate, 0, 80)
            .range("oxygen_saturation", self.oxygen_saturation, 50, 100)
            .range("temperature", self.temperature, 25.0, 45.0)
            .range("systolic_bp", self.systolic_bp, 40, 300)
            .range("heart_rate", self.heart_rate, 20, 250)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct News2Components {
    pub respiratory_rate: u32,
    pub oxygen_saturation: u32,
    pub supplemental_oxygen: u32,
    pub temperature: u32,
    pub systolic_bp: u32,
    pub heart_rate: u32,
    pub consciousness: u32,
}

impl News2Components {
    fn total(&self) -> u32 {
        self.respiratory_rate
            + self.oxygen_saturation
            + self.supplemental_oxygen
            + self.temperature
            + self.systolic_bp
            + self.heart_rate
            + self.consciousness
    }

    fn has_red_score(&self) -> bool {
        [
            self.respiratory_rate,
            self.oxygen_saturation,
            self.temperature,
            self.systolic_bp,
            self.heart_rate,
            self.consciousness,
        ]
        .contains(&3)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct News2Details {
    pub spo2_scale: u8,
    pub red_score: bool,
    pub components: News2Components,
}

/// National Early Warning Score 2 (RCP 2017).
pub struct News2;

impl News2 {
    fn respiratory_rate_points(rate: u32) -> u32 {
        match rate {
            0..=8 => 3,
            9..=11 => 1,
            12..=20 => 0,
            21..=24 => 2,
            _ => 3,
        }
    }

    fn spo2_scale_1(spo2: u32) -> u32 {
        match spo2 {
            0..=91 => 3,
            92..=93 => 2,
            94..=95 => 1,
            _ => 0,
        }
    }

    /// Scale 2 only penalises high saturations while on oxygen.
    fn spo2_scale_2(spo2: u32, on_oxygen: bool) -> u32 {
        match (spo2, on_oxygen) {
            (0..=83, _) => 3,
            (84..=85, _) => 2,
            (86..=87, _) => 1,
            (88..=92, _) | (_, false) => 0,
            (93..=94, true) => 1,
            (95..=96, true) => 2,
            (_, true) => 3,
        }
    }

    fn temperature_points(celsius: f64) -> u32 {
        if celsius <= 35.0 {
            3
        } else if celsius <= 36.0 {
            1
        } else if celsius <= 38.0 {
            0
        } else if celsius <= 39.0 {
            1
        } else {
            2
        }
    }

    fn systolic_points(systolic: u32) -> u32 {
        match systolic {
            0..=90 => 3,
            91..=100 => 2,
            101..=110 => 1,
            111..=219 => 0,
            _ => 3,
        }
    }

    fn heart_rate_points(rate: u32) -> u32 {
        match rate {
            0..=40 => 3,
            41..=50 => 1,
            51..=90 => 0,
            91..=110 => 1,
            111..=130 => 2,
            _ => 3,
        }
    }
}

impl Score for News2 {
    const ID: ScoreId = ScoreId::News2;
    type Input = News2Request;
    type Output = Assessment<u32, News2Details>;

    fn calculate(input: &News2Request) -> Self::Output {
        let oxygen_saturation = if input.hypercapnic_respiratory_failure {
            Self::spo2_scale_2(input.oxygen_saturation, input.supplemental_oxygen)
        } else {
            Self::spo2_scale_1(input.oxygen_saturation)
        };
        let components = News2Components {
            respiratory_rate: Self::respiratory_rate_points(input.respiratory_rate),
            oxygen_saturation,
            supplemental_oxygen: points(input.supplemental_oxygen, 2),
            temperature: Self::temperature_points(input.temperature),
            systolic_bp: Self::systolic_points(input.systolic_bp),
            heart_rate: Self::heart_rate_points(input.heart_rate),
            consciousness: points(input.consciousness != Consciousness::Alert, 3),
        };
        let total = components.total();
        let red_score = components.has_red_score();

        let band = if red_score && total < 5 {
            &NEWS_2_RED_SCORE
        } else {
            classify(&NEWS_2_RESPONSE, f64::from(total))
        };

        Assessment::with_details(
            total,
            "points",
            band,
            News2Details {
                spo2_scale: if input.hypercapnic_respiratory_failure { 2 } else { 1 },
                red_score,
                components,
            },
        )
    }
}

static QSOFA_RISK: [Band; 2] = [
    Band::new(
        2.0,
        "Low Risk",
        "Negative qSOFA",
        "Not high risk for poor outcome from sepsis. Continue to monitor and reassess if clinical status changes.",
    ),
    Band::last(
        "High Risk",
        "Positive qSOFA",
        "High risk of poor outcome (3-14 fold increase in in-hospital mortality). Assess for organ dysfunction with a full SOFA score and consider escalation of care.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct QsofaRequest {
    pub altered_mentation: bool,
    pub respiratory_rate: u32,
    pub systolic_bp: u32,
}

impl Validate for QsofaRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("respiratory_rate", self.respiratory_rate, 0, 80)
            .range("systolic_bp", self.systolic_bp, 0, 300)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QsofaComponents {
    pub altered_mentation: u32,
    pub respiratory_rate: u32,
    pub systolic_bp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QsofaDetails {
    pub components: QsofaComponents,
}

pub struct QsofaScore;

impl Score for QsofaScore {
    const ID: ScoreId = ScoreId::QsofaScore;
    type Input = QsofaRequest;
    type Output = Assessment<u32, QsofaDetails>;

    fn calculate(input: &QsofaRequest) -> Self::Output {
        let components = QsofaComponents {
            altered_mentation: points(input.altered_mentation, 1),
            respiratory_rate: points(input.respiratory_rate >= 22, 1),
            systolic_bp: points(input.systolic_bp <= 100, 1),
        };
        let total =
            components.altered_mentation + components.respiratory_rate + components.systolic_bp;
        let band = classify(&QSOFA_RISK, f64::from(total));
        Assessment::with_details(total, "points", band, QsofaDetails { components })
    }
}

// CEDOCS (Weiss 2014) regression coefficients.
const CEDOCS_INTERCEPT: f64 = -29.53;
const CEDOCS_CRITICAL_CARE: f64 = 3.14;
const CEDOCS_LONGEST_WAIT: f64 = 0.52;
const CEDOCS_WAITING_ROOM: f64 = 1.14;
const CEDOCS_PATIENT_BED_RATIO: f64 = 20.55;
const CEDOCS_ANNUAL_VISITS: f64 = 0.00124;
const CEDOCS_DEFAULT_SCALING: f64 = 2.0;

/// Cubic volume adjustments: `(annual visit knot, coefficient)`.
const CEDOCS_VOLUME_KNOTS: [(&str, u32, f64); 4] = [
    ("A", 18_811, -1.09e-12),
    ("B", 43_012, 8.18e-12),
    ("C", 49_466, -8.18e-12),
    ("D", 67_273, 1.08e-12),
];

struct OvercrowdingLevel {
    /// Inclusive upper bound.
    max: f64,
    level: &'static str,
    description: &'static str,
    status: &'static str,
    guidance: &'static str,
}

const OVERCROWDING_LEVELS: [OvercrowdingLevel; 7] = [
    OvercrowdingLevel {
        max: 20.0,
        level: "Level 1",
        description: "Not busy",
        status: "Normal operations",
        guidance: "Normal ED operations with minimal crowding. Adequate resources and optimal patient flow. Continue standard protocols.",
    },
    OvercrowdingLevel {
        max: 60.0,
        level: "Level 2",
        description: "Busy",
        status: "Increased activity",
        guidance: "Increased activity but manageable. Monitor patient flow and resource allocation. Prepare for potential volume increases.",
    },
    OvercrowdingLevel {
        max: 100.0,
        level: "Level 3",
        description: "Extremely busy but not overcrowded",
        status: "High activity",
        guidance: "High activity level approaching capacity. Consider proactive measures to prevent overcrowding including expedited discharge planning.",
    },
    OvercrowdingLevel {
        max: 140.0,
        level: "Level 4",
        description: "Overcrowded",
        status: "Overcrowding threshold exceeded",
        guidance: "Overcrowding threshold exceeded. Implement overcrowding protocols, resource reallocation, and consider reducing non-urgent admissions.",
    },
    OvercrowdingLevel {
        max: 180.0,
        level: "Level 5",
        description: "Severely overcrowded",
        status: "Severe overcrowding",
        guidance: "Severe overcrowding requiring immediate intervention. Consider diversion protocols, emergency staffing, and expedited patient placement.",
    },
    OvercrowdingLevel {
        max: 200.0,
        level: "Level 6",
        description: "Dangerously overcrowded",
        status: "Critical overcrowding",
        guidance: "Critical overcrowding situation. Implement emergency measures including possible ambulance diversion and crisis management protocols.",
    },
    OvercrowdingLevel {
        max: f64::INFINITY,
        level: "Level 6+",
        description: "Extreme overcrowding",
        status: "Crisis-level overcrowding",
        guidance: "Extreme overcrowding exceeding the validated scale. Immediate crisis intervention required including emergency protocols, ambulance diversion, and urgent administrative intervention.",
    },
];

fn overcrowding_level(score: f64) -> &'static OvercrowdingLevel {
    OVERCROWDING_LEVELS
        .iter()
        .find(|level| score <= level.max)
        .unwrap_or(&OVERCROWDING_LEVELS[OVERCROWDING_LEVELS.len() - 1])
}

#[derive(Debug, Clone, Deserialize)]
pub struct CedocsRequest {
    pub critical_care_patients: u32,
    pub longest_wait_time_minutes: u32,
    pub waiting_room_patients: u32,
    pub total_ed_patients: u32,
    pub ed_beds: u32,
    pub annual_ed_visits: u32,
    #[serde(default)]
    pub scaling_factor: Option<f64>,
}

impl Validate for CedocsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("critical_care_patients", self.critical_care_patients, 0, 100)
            .range("longest_wait_time_minutes", self.longest_wait_time_minutes, 0, 2880)
            .range("waiting_room_patients", self.waiting_room_patients, 0, 500)
            .range("total_ed_patients", self.total_ed_patients, 0, 1000)
            .range("ed_beds", self.ed_beds, 1, 500)
            .range("annual_ed_visits", self.annual_ed_visits, 1000, 500_000)
            .optional_range("scaling_factor", self.scaling_factor, 0.1, 10.0)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CedocsBreakdown {
    pub intercept: f64,
    pub critical_care_contribution: f64,
    pub wait_time_contribution: f64,
    pub waiting_room_contribution: f64,
    pub patient_bed_ratio_contribution: f64,
    pub annual_visits_contribution: f64,
    pub raw_score: f64,
    pub volume_adjustment: f64,
    pub adjustments_applied: Vec<&'static str>,
    pub scaling_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CedocsDetails {
    pub overcrowding_status: &'static str,
    pub is_overcrowded: bool,
    pub patient_bed_ratio: f64,
    pub calculation_breakdown: CedocsBreakdown,
}

/// Community Emergency Department Overcrowding Scale.
pub struct CedocsScore;

impl CedocsScore {
    fn volume_adjustment(annual_visits: u32) -> (f64, Vec<&'static str>) {
        CEDOCS_VOLUME_KNOTS
            .iter()
            .filter(|(_, knot, _)| annual_visits >= *knot)
            .fold((0.0, Vec::new()), |(sum, mut applied), (name, knot, coefficient)| {
                applied.push(*name);
                let excess = f64::from(annual_visits - knot);
                (sum + coefficient * excess.powi(3), applied)
            })
    }
}

impl Score for CedocsScore {
    const ID: ScoreId = ScoreId::CedocsScore;
    type Input = CedocsRequest;
    type Output = Assessment<f64, CedocsDetails>;

    fn calculate(input: &CedocsRequest) -> Self::Output {
        let scaling_factor = input.scaling_factor.unwrap_or(CEDOCS_DEFAULT_SCALING);
        let patient_bed_ratio = f64::from(input.total_ed_patients) / f64::from(input.ed_beds);

        let critical_care = CEDOCS_CRITICAL_CARE * f64::from(input.critical_care_patients);
        let wait_time = CEDOCS_LONGEST_WAIT * f64::from(input.longest_wait_time_minutes);
        let waiting_room = CEDOCS_WAITING_ROOM * f64::from(input.waiting_room_patients);
        let bed_ratio = CEDOCS_PATIENT_BED_RATIO * patient_bed_ratio;
        let annual_visits = CEDOCS_ANNUAL_VISITS * f64::from(input.annual_ed_visits);
        let raw_score =
            CEDOCS_INTERCEPT + critical_care + wait_time + waiting_room + bed_ratio + annual_visits;
        let (volume_adjustment, adjustments_applied) =
            Self::volume_adjustment(input.annual_ed_visits);

        let score = ((raw_score + volume_adjustment) * scaling_factor).max(1.0);
        let result = round_to(score, 1);
        let level = overcrowding_level(result);

        Assessment {
            result,
            unit: "points",
            interpretation: format!(
                "CEDOCS score {result:.1}: {}. {}",
                level.description, level.guidance
            ),
            stage: level.level.to_string(),
            stage_description: level.description.to_string(),
            details: CedocsDetails {
                overcrowding_status: level.status,
                is_overcrowded: result > 100.0,
                patient_bed_ratio: round_to(patient_bed_ratio, 2),
                calculation_breakdown: CedocsBreakdown {
                    intercept: CEDOCS_INTERCEPT,
                    critical_care_contribution: round_to(critical_care, 2),
                    wait_time_contribution: round_to(wait_time, 2),
                    waiting_room_contribution: round_to(waiting_room, 2),
                    patient_bed_ratio_contribution: round_to(bed_ratio, 2),
                    annual_visits_contribution: round_to(annual_visits, 2),
                    raw_score: round_to(raw_score, 2),
                    volume_adjustment: round_to(volume_adjustment, 2),
                    adjustments_applied,
                    scaling_factor,
                },
            },
        }
    }
}
