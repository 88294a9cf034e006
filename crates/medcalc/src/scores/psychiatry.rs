use serde::{Deserialize, Serialize};

use super::{classify, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

#[derive(Debug, Clone, Deserialize)]
pub struct AimsRequest {
    pub facial_expression: u32,
    pub lips_perioral: u32,
    pub jaw: u32,
    pub tongue: u32,
    pub upper_extremities: u32,
    pub lower_extremities: u32,
    pub trunk: u32,
    pub global_severity: u32,
    pub incapacitation: u32,
    pub patient_awareness: u32,
    #[serde(default)]
    pub current_dental_problems: bool,
    #[serde(default)]
    pub wears_dentures: bool,
}

impl AimsRequest {
    fn movement_items(&self) -> [(&'static str, u32); 7] {
        [
            ("facial_expression", self.facial_expression),
            ("lips_perioral", self.lips_perioral),
            ("jaw", self.jaw),
            ("tongue", self.tongue),
            ("upper_extremities", self.upper_extremities),
            ("lower_extremities", self.lower_extremities),
            ("trunk", self.trunk),
        ]
    }
}

impl Validate for AimsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        for (field, rating) in self.movement_items() {
            validator.range(field, rating, 0, 4);
        }
        validator
            .range("global_severity", self.global_severity, 0, 4)
            .range("incapacitation", self.incapacitation, 0, 4)
            .range("patient_awareness", self.patient_awareness, 0, 4)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AimsDetails {
    pub areas_rated_mild: u32,
    pub areas_rated_moderate_or_severe: u32,
    pub global_severity: u32,
    pub incapacitation: u32,
    pub patient_awareness: u32,
    pub dental_status_may_confound: bool,
}

/// Abnormal Involuntary Movement Scale with Schooler-Kane screening criteria.
pub struct Aims;

impl Score for Aims {
    const ID: ScoreId = ScoreId::Aims;
    type Input = AimsRequest;
    type Output = Assessment<u32, AimsDetails>;

    fn calculate(input: &AimsRequest) -> Self::Output {
        let items = input.movement_items();
        let total: u32 = items.iter().map(|(_, rating)| rating).sum();
        let mild = items.iter().filter(|(_, rating)| *rating == 2).count() as u32;
        let marked = items.iter().filter(|(_, rating)| *rating >= 3).count() as u32;

        let (stage, description, guidance) = if marked >= 1 || mild + marked >= 2 {
            (
                "Probable Tardive Dyskinesia",
                "Meets Schooler-Kane criteria",
                "Moderate or severe movements in one body area, or mild movements in two or more areas. Review the need for antipsychotic therapy and consider dose reduction or switching agents.",
            )
        } else if mild == 1 {
            (
                "Possible Tardive Dyskinesia",
                "Mild movements in a single body area",
                "Does not meet Schooler-Kane criteria. Repeat the examination and monitor closely at each visit.",
            )
        } else {
            (
                "No Tardive Dyskinesia",
                "Minimal or no abnormal movements",
                "No clinically significant involuntary movements. Continue routine AIMS monitoring.",
            )
        };

        Assessment {
            result: total,
            unit: "points",
            interpretation: format!("AIMS movement total {total}/28. {guidance}"),
            stage: stage.to_string(),
            stage_description: description.to_string(),
            details: AimsDetails {
                areas_rated_mild: mild,
                areas_rated_moderate_or_severe: marked,
                global_severity: input.global_severity,
                incapacitation: input.incapacitation,
                patient_awareness: input.patient_awareness,
                dental_status_may_confound: input.current_dental_problems || input.wears_dentures,
            },
        }
    }
}

static GAD_7_SEVERITY: [Band; 4] = [
    Band::new(
        5.0,
        "Minimal Anxiety",
        "Minimal anxiety symptoms",
        "Minimal anxiety. No treatment usually needed; monitor if clinically indicated.",
    ),
    Band::new(
        10.0,
        "Mild Anxiety",
        "Mild anxiety symptoms",
        "Mild anxiety. Watchful waiting with reassessment; consider supportive counselling.",
    ),
    Band::new(
        15.0,
        "Moderate Anxiety",
        "Moderate anxiety symptoms",
        "Moderate anxiety. Further diagnostic evaluation is warranted; consider psychotherapy and/or pharmacotherapy.",
    ),
    Band::last(
        "Severe Anxiety",
        "Severe anxiety symptoms",
        "Severe anxiety. Active treatment with psychotherapy and/or pharmacotherapy is recommended; consider specialist referral.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Gad7Request {
    pub feeling_nervous: u32,
    pub unable_to_stop_worrying: u32,
    pub worrying_too_much: u32,
    pub trouble_relaxing: u32,
    pub restlessness: u32,
    pub easily_annoyed: u32,
    pub feeling_afraid: u32,
}

impl Gad7Request {
    fn items(&self) -> [(&'static str, u32); 7] {
        [
            ("feeling_nervous", self.feeling_nervous),
            ("unable_to_stop_worrying", self.unable_to_stop_worrying),
            ("worrying_too_much", self.worrying_too_much),
            ("trouble_relaxing", self.trouble_relaxing),
            ("restlessness", self.restlessness),
            ("easily_annoyed", self.easily_annoyed),
            ("feeling_afraid", self.feeling_afraid),
        ]
    }
}

impl Validate for Gad7Request {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        for (field, answer) in self.items() {
            validator.range(field, answer, 0, 3);
        }
        validator.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gad7Details {
    pub further_evaluation_recommended: bool,
}

pub struct Gad7;

impl Score for Gad7 {
    const ID: ScoreId = ScoreId::Gad7;
    type Input = Gad7Request;
    type Output = Assessment<u32, Gad7Details>;

    fn calculate(input: &Gad7Request) -> Self::Output {
        let total: u32 = input.items().iter().map(|(_, answer)| answer).sum();
        Assessment::with_details(
            total,
            "points",
            classify(&GAD_7_SEVERITY, f64::from(total)),
            Gad7Details {
                further_evaluation_recommended: total >= 10,
            },
        )
    }
}
