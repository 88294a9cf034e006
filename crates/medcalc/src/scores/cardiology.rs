use serde::{Deserialize, Serialize};

use super::{classify, points, round_to, Assessment, Band, Score, Sex};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

static CHA2DS2_VASC_RISK: [Band; 3] = [
    Band::new(
        1.0,
        "Low Risk",
        "Low annual stroke risk",
        "Anticoagulation is generally not recommended.",
    ),
    Band::new(
        2.0,
        "Moderate Risk",
        "Moderate annual stroke risk",
        "Consider oral anticoagulation, weighing stroke risk against bleeding risk.",
    ),
    Band::last(
        "High Risk",
        "High annual stroke risk",
        "Oral anticoagulation is recommended unless contraindicated.",
    ),
];

/// Female sex alone does not raise stroke risk.
static CHA2DS2_VASC_SEX_ONLY: Band = Band::new(
    2.0,
    "Low Risk",
    "Low annual stroke risk",
    "Female sex is the only risk factor; anticoagulation is generally not recommended.",
);

/// Stroke/TIA/systemic embolism per 100 patient-years, indexed by score (Friberg 2012).
const CHA2DS2_VASC_ANNUAL_RISK: [&str; 10] = [
    "0.3%", "0.9%", "2.9%", "4.6%", "6.7%", "10.0%", "13.6%", "15.7%", "15.2%", "17.4%",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Cha2ds2VascRequest {
    pub age: u32,
    pub sex: Sex,
    pub congestive_heart_failure: bool,
    pub hypertension: bool,
    pub stroke_tia_thromboembolism: bool,
    pub vascular_disease: bool,
    pub diabetes: bool,
}

impl Validate for Cha2ds2VascRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new().range("age", self.age, 18, 120).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cha2ds2VascComponents {
    pub congestive_heart_failure: u32,
    pub hypertension: u32,
    pub age: u32,
    pub diabetes: u32,
    pub stroke_tia_thromboembolism: u32,
    pub vascular_disease: u32,
    pub sex_category: u32,
}

impl Cha2ds2VascComponents {
    fn total(&self) -> u32 {
        self.congestive_heart_failure
            + self.hypertension
            + self.age
            + self.diabetes
            + self.stroke_tia_thromboembolism
            + self.vascular_disease
            + self.sex_category
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cha2ds2VascDetails {
    pub annual_stroke_risk: &'static str,
    pub components: Cha2ds2VascComponents,
}

pub struct Cha2ds2Vasc;

impl Score for Cha2ds2Vasc {
    const ID: ScoreId = ScoreId::Cha2ds2Vasc;
    type Input = Cha2ds2VascRequest;
    type Output = Assessment<u32, Cha2ds2VascDetails>;

    fn calculate(input: &Cha2ds2VascRequest) -> Self::Output {
        let components = Cha2ds2VascComponents {
            congestive_heart_failure: points(input.congestive_heart_failure, 1),
            hypertension: points(input.hypertension, 1),
            age: match input.age {
                75.. => 2,
                65..=74 => 1,
                _ => 0,
            },
            diabetes: points(input.diabetes, 1),
            stroke_tia_thromboembolism: points(input.stroke_tia_thromboembolism, 2),
            vascular_disease: points(input.vascular_disease, 1),
            sex_category: points(input.sex == Sex::Female, 1),
        };
        let total = components.total();
        let band = if total == 1 && components.sex_category == 1 {
            &CHA2DS2_VASC_SEX_ONLY
        } else {
            classify(&CHA2DS2_VASC_RISK, f64::from(total))
        };
        let annual_stroke_risk = CHA2DS2_VASC_ANNUAL_RISK[total.min(9) as usize];

        let mut assessment = Assessment::with_details(
            total,
            "points",
            band,
            Cha2ds2VascDetails {
                annual_stroke_risk,
                components,
            },
        );
        assessment.stage_description = format!("Annual stroke risk: {annual_stroke_risk}");
        assessment.interpretation = format!(
            "CHA₂DS₂-VASc score of {total}: {} ({annual_stroke_risk} per year). {}",
            band.description.to_lowercase(),
            band.interpretation
        );
        assessment
    }
}

static CHADS2_RISK: [Band; 5] = [
    Band::new(
        1.0,
        "Low",
        "Low stroke risk",
        "Antithrombotic therapy may be omitted or aspirin considered.",
    ),
    Band::new(
        2.0,
        "Low-Intermediate",
        "Low to intermediate stroke risk",
        "Consider oral anticoagulation or aspirin according to bleeding risk.",
    ),
    Band::new(
        3.0,
        "Intermediate",
        "Intermediate stroke risk",
        "Oral anticoagulation is recommended.",
    ),
    Band::new(
        5.0,
        "High",
        "High stroke risk",
        "Oral anticoagulation is strongly recommended.",
    ),
    Band::last(
        "Very High",
        "Very high stroke risk",
        "Oral anticoagulation is strongly recommended; reassess bleeding risk regularly.",
    ),
];

/// Adjusted annual stroke rate by score (Gage 2001).
const CHADS2_ANNUAL_RISK: [&str; 7] = ["1.9%", "2.8%", "4.0%", "5.9%", "8.5%", "12.5%", "18.2%"];

#[derive(Debug, Clone, Deserialize)]
pub struct Chads2Request {
    pub congestive_heart_failure: bool,
    pub hypertension: bool,
    pub age: u32,
    pub diabetes: bool,
    pub stroke_tia: bool,
}

impl Validate for Chads2Request {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new().range("age", self.age, 18, 120).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chads2Details {
    pub annual_stroke_risk: &'static str,
}

pub struct Chads2Score;

impl Score for Chads2Score {
    const ID: ScoreId = ScoreId::Chads2Score;
    type Input = Chads2Request;
    type Output = Assessment<u32, Chads2Details>;

    fn calculate(input: &Chads2Request) -> Self::Output {
        let total = points(input.congestive_heart_failure, 1)
            + points(input.hypertension, 1)
            + points(input.age >= 75, 1)
            + points(input.diabetes, 1)
            + points(input.stroke_tia, 2);
        let annual_stroke_risk = CHADS2_ANNUAL_RISK[total.min(6) as usize];
        let band = classify(&CHADS2_RISK, f64::from(total));

        let mut assessment = Assessment::with_details(
            total,
            "points",
            band,
            Chads2Details { annual_stroke_risk },
        );
        assessment.stage_description =
            format!("{} (annual stroke risk {annual_stroke_risk})", band.description);
        assessment
    }
}

static LDL_CATEGORIES: [Band; 5] = [
    Band::new(
        100.0,
        "Optimal",
        "Optimal LDL cholesterol",
        "LDL cholesterol is at goal for most patients.",
    ),
    Band::new(
        130.0,
        "Near Optimal",
        "Near or above optimal LDL cholesterol",
        "Lifestyle measures; drug therapy depends on overall cardiovascular risk.",
    ),
    Band::new(
        160.0,
        "Borderline High",
        "Borderline high LDL cholesterol",
        "Therapeutic lifestyle changes; consider statin therapy when other risk factors are present.",
    ),
    Band::new(
        190.0,
        "High",
        "High LDL cholesterol",
        "Statin therapy is usually indicated together with lifestyle changes.",
    ),
    Band::last(
        "Very High",
        "Very high LDL cholesterol",
        "High-intensity statin therapy is indicated; evaluate for familial hypercholesterolemia.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct LdlRequest {
    /// mg/dL
    pub total_cholesterol: f64,
    /// mg/dL
    pub hdl_cholesterol: f64,
    /// mg/dL
    pub triglycerides: f64,
}

impl LdlRequest {
    fn friedewald(&self) -> f64 {
        self.total_cholesterol - self.hdl_cholesterol - self.triglycerides / 5.0
    }
}

impl Validate for LdlRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .range("total_cholesterol", self.total_cholesterol, 50.0, 1000.0)
            .range("hdl_cholesterol", self.hdl_cholesterol, 10.0, 200.0)
            .range("triglycerides", self.triglycerides, 30.0, 400.0)
            .ensure(
                self.hdl_cholesterol < self.total_cholesterol,
                "hdl_cholesterol",
                "must be lower than total_cholesterol",
            );
        if self.hdl_cholesterol < self.total_cholesterol {
            validator.ensure(
                self.friedewald() > 0.0,
                "triglycerides",
                "leave no room for a positive LDL estimate; measure LDL directly",
            );
        }
        validator.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdlDetails {
    pub vldl_cholesterol: f64,
    pub non_hdl_cholesterol: f64,
}

/// Friedewald LDL cholesterol estimate.
pub struct LdlCalculated;

impl Score for LdlCalculated {
    const ID: ScoreId = ScoreId::LdlCalculated;
    type Input = LdlRequest;
    type Output = Assessment<f64, LdlDetails>;

    fn calculate(input: &LdlRequest) -> Self::Output {
        let ldl = round_to(input.friedewald(), 1);
        Assessment::with_details(
            ldl,
            "mg/dL",
            classify(&LDL_CATEGORIES, ldl),
            LdlDetails {
                vldl_cholesterol: round_to(input.triglycerides / 5.0, 1),
                non_hdl_cholesterol: round_to(input.total_cholesterol - input.hdl_cholesterol, 1),
            },
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QtcFormula {
    #[default]
    Bazett,
    Fridericia,
    Framingham,
    Hodges,
}

impl QtcFormula {
    fn correct(self, qt: f64, heart_rate: f64) -> f64 {
        let rr = 60.0 / heart_rate;
        match self {
            QtcFormula::Bazett => qt / rr.sqrt(),
            QtcFormula::Fridericia => qt / rr.cbrt(),
            QtcFormula::Framingham => qt + 154.0 * (1.0 - rr),
            QtcFormula::Hodges => qt + 1.75 * (heart_rate - 60.0),
        }
    }
}

static QTC_MALE: [Band; 4] = [
    Band::new(350.0, "Short", "Short QTc", "Short QT interval. Consider short QT syndrome, hypercalcemia or digoxin effect."),
    Band::new(451.0, "Normal", "Normal QTc", "QTc within normal limits for men."),
    Band::new(500.0, "Prolonged", "Prolonged QTc", "Prolonged QTc. Review QT-prolonging drugs and correct potassium and magnesium."),
    Band::last("Markedly Prolonged", "Markedly prolonged QTc", "QTc of 500 ms or more carries a high risk of torsades de pointes. Stop offending drugs and monitor."),
];

static QTC_FEMALE: [Band; 4] = [
    Band::new(350.0, "Short", "Short QTc", "Short QT interval. Consider short QT syndrome, hypercalcemia or digoxin effect."),
    Band::new(461.0, "Normal", "Normal QTc", "QTc within normal limits for women."),
    Band::new(500.0, "Prolonged", "Prolonged QTc", "Prolonged QTc. Review QT-prolonging drugs and correct potassium and magnesium."),
    Band::last("Markedly Prolonged", "Markedly prolonged QTc", "QTc of 500 ms or more carries a high risk of torsades de pointes. Stop offending drugs and monitor."),
];

#[derive(Debug, Clone, Deserialize)]
pub struct QtcRequest {
    /// ms
    pub qt_interval: f64,
    /// bpm
    pub heart_rate: f64,
    pub sex: Sex,
    #[serde(default)]
    pub formula: QtcFormula,
}

impl Validate for QtcRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .range("qt_interval", self.qt_interval, 200.0, 800.0)
            .range("heart_rate", self.heart_rate, 20.0, 250.0);
        if self.heart_rate > 0.0 {
            validator.ensure(
                self.formula.correct(self.qt_interval, self.heart_rate) > 0.0,
                "heart_rate",
                "too slow for the chosen formula: corrected QT would not be positive",
            );
        }
        validator.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QtcDetails {
    pub formula: QtcFormula,
    pub rr_interval_s: f64,
}

pub struct CorrectedQtInterval;

impl Score for CorrectedQtInterval {
    const ID: ScoreId = ScoreId::CorrectedQtInterval;
    type Input = QtcRequest;
    type Output = Assessment<f64, QtcDetails>;

    fn calculate(input: &QtcRequest) -> Self::Output {
        let rr = 60.0 / input.heart_rate;
        let corrected = round_to(input.formula.correct(input.qt_interval, input.heart_rate), 0);
        let table = match input.sex {
            Sex::Male => &QTC_MALE,
            Sex::Female => &QTC_FEMALE,
        };

        Assessment::with_details(
            corrected,
            "ms",
            classify(table, corrected),
            QtcDetails {
                formula: input.formula,
                rr_interval_s: round_to(rr, 3),
            },
        )
    }
}
