use serde::{Deserialize, Serialize};

use super::{classify, round_to, Assessment, Band, Score, Sex};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

/// KDIGO GFR categories.
static GFR_CATEGORIES: [Band; 6] = [
    Band::new(
        15.0,
        "G5",
        "Kidney failure",
        "Kidney failure. Evaluate for renal replacement therapy (dialysis or transplant).",
    ),
    Band::new(
        30.0,
        "G4",
        "Severely decreased",
        "Severely decreased kidney function. Prepare for renal replacement therapy and refer to nephrology.",
    ),
    Band::new(
        45.0,
        "G3b",
        "Moderately to severely decreased",
        "Moderate to severe reduction. Nephrology referral and management of complications recommended.",
    ),
    Band::new(
        60.0,
        "G3a",
        "Mildly to moderately decreased",
        "Mild to moderate reduction. Monitor progression and adjust renally cleared medications.",
    ),
    Band::new(
        90.0,
        "G2",
        "Mildly decreased",
        "Mildly decreased function. Chronic kidney disease only with other markers of kidney damage.",
    ),
    Band::last(
        "G1",
        "Normal or high",
        "Normal or high kidney function. Chronic kidney disease only with other markers of kidney damage.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct CkdEpi2021Request {
    pub sex: Sex,
    pub age: u32,
    /// mg/dL
    pub serum_creatinine: f64,
}

impl Validate for CkdEpi2021Request {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("age", self.age, 18, 120)
            .range("serum_creatinine", self.serum_creatinine, 0.1, 20.0)
            .finish()
    }
}

/// Race-free CKD-EPI 2021 creatinine equation.
pub struct CkdEpi2021;

impl Score for CkdEpi2021 {
    const ID: ScoreId = ScoreId::CkdEpi2021;
    type Input = CkdEpi2021Request;
    type Output = Assessment<f64>;

    fn calculate(input: &CkdEpi2021Request) -> Assessment<f64> {
        let (kappa, alpha, sex_factor) = match input.sex {
            Sex::Female => (0.7, -0.241, 1.012),
            Sex::Male => (0.9, -0.302, 1.0),
        };
        let ratio = input.serum_creatinine / kappa;
        let egfr = 142.0
            * ratio.min(1.0).powf(alpha)
            * ratio.max(1.0).powf(-1.200)
            * 0.9938_f64.powf(f64::from(input.age))
            * sex_factor;
        let egfr = round_to(egfr, 1);

        Assessment::from_band(egfr, "mL/min/1.73 m²", classify(&GFR_CATEGORIES, egfr))
    }
}

static ACIDOSIS_SEVERITY: [Band; 4] = [
    Band::new(
        10.0,
        "Severe",
        "Severe metabolic acidosis",
        "Severe acidosis. Bicarbonate replacement may be considered; give half the deficit over 3-4 hours and reassess with blood gases.",
    ),
    Band::new(
        18.0,
        "Moderate",
        "Moderate metabolic acidosis",
        "Moderate acidosis. Treat the underlying cause; bicarbonate therapy only in selected cases.",
    ),
    Band::new(
        22.0,
        "Mild",
        "Mild metabolic acidosis",
        "Mild acidosis. Bicarbonate replacement is rarely needed; correct the underlying cause.",
    ),
    Band::last(
        "No Deficit",
        "Bicarbonate within target",
        "Serum bicarbonate is at or above the lower reference limit. No replacement indicated.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct BicarbonateDeficitRequest {
    /// kg
    pub weight: f64,
    /// mEq/L
    pub current_bicarbonate: f64,
    /// mEq/L, defaults to 24
    #[serde(default)]
    pub target_bicarbonate: Option<f64>,
}

impl BicarbonateDeficitRequest {
    fn target(&self) -> f64 {
        self.target_bicarbonate.unwrap_or(24.0)
    }
}

impl Validate for BicarbonateDeficitRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("weight", self.weight, 1.0, 300.0)
            .range("current_bicarbonate", self.current_bicarbonate, 1.0, 50.0)
            .optional_range("target_bicarbonate", self.target_bicarbonate, 10.0, 40.0)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BicarbonateDetails {
    pub target_bicarbonate: f64,
    pub distribution_volume_l: f64,
}

pub struct BicarbonateDeficit;

impl Score for BicarbonateDeficit {
    const ID: ScoreId = ScoreId::BicarbonateDeficit;
    type Input = BicarbonateDeficitRequest;
    type Output = Assessment<f64, BicarbonateDetails>;

    fn calculate(input: &BicarbonateDeficitRequest) -> Self::Output {
        let target = input.target();
        let distribution_volume = 0.4 * input.weight;
        let deficit = (distribution_volume * (target - input.current_bicarbonate)).max(0.0);

        Assessment::with_details(
            round_to(deficit, 1),
            "mEq",
            classify(&ACIDOSIS_SEVERITY, input.current_bicarbonate),
            BicarbonateDetails {
                target_bicarbonate: target,
                distribution_volume_l: round_to(distribution_volume, 1),
            },
        )
    }
}

static HYPERNATREMIA_GRADES: [Band; 5] = [
    Band::new(
        146.0,
        "No Hypernatremia",
        "Sodium within reference range",
        "Serum sodium is not elevated; a free water deficit is only relevant when a lower target is intended.",
    ),
    Band::new(
        150.0,
        "Mild",
        "Mild hypernatremia",
        "Mild hypernatremia. Replace the deficit orally or intravenously and correct the cause.",
    ),
    Band::new(
        160.0,
        "Moderate",
        "Moderate hypernatremia",
        "Moderate hypernatremia. Replace free water over 48 hours and monitor sodium every 4-6 hours.",
    ),
    Band::new(
        170.0,
        "Severe",
        "Severe hypernatremia",
        "Severe hypernatremia. Correct slowly (no faster than 10-12 mEq/L per day) with close sodium monitoring.",
    ),
    Band::last(
        "Critical",
        "Critical hypernatremia",
        "Life-threatening hypernatremia. Manage in a monitored setting; avoid rapid correction because of cerebral edema risk.",
    ),
];

/// Maximum safe correction rate in mEq/L per hour.
const SODIUM_CORRECTION_RATE: f64 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct FreeWaterDeficitRequest {
    pub sex: Sex,
    pub age: u32,
    /// kg
    pub weight: f64,
    /// mEq/L
    pub current_sodium: f64,
    /// mEq/L, defaults to 140
    #[serde(default)]
    pub desired_sodium: Option<f64>,
}

impl FreeWaterDeficitRequest {
    fn desired(&self) -> f64 {
        self.desired_sodium.unwrap_or(140.0)
    }

    fn total_body_water_fraction(&self) -> f64 {
        match (self.age, self.sex) {
            (0..=17, _) => 0.6,
            (18..=64, Sex::Male) => 0.6,
            (18..=64, Sex::Female) => 0.5,
            (_, Sex::Male) => 0.5,
            (_, Sex::Female) => 0.45,
        }
    }
}

impl Validate for FreeWaterDeficitRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let desired = self.desired();
        Validator::new()
            .range("age", self.age, 0, 120)
            .range("weight", self.weight, 1.0, 300.0)
            .range("current_sodium", self.current_sodium, 100.0, 200.0)
            .optional_range("desired_sodium", self.desired_sodium, 130.0, 150.0)
            .ensure(
                self.current_sodium > desired,
                "current_sodium",
                format!("must exceed desired_sodium ({desired})"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeWaterDetails {
    pub total_body_water_fraction: f64,
    pub total_body_water_l: f64,
    pub minimum_correction_hours: f64,
}

pub struct FreeWaterDeficit;

impl Score for FreeWaterDeficit {
    const ID: ScoreId = ScoreId::FreeWaterDeficit;
    type Input = FreeWaterDeficitRequest;
    type Output = Assessment<f64, FreeWaterDetails>;

    fn calculate(input: &FreeWaterDeficitRequest) -> Self::Output {
        let desired = input.desired();
        let fraction = input.total_body_water_fraction();
        let total_body_water = fraction * input.weight;
        let deficit = total_body_water * (input.current_sodium / desired - 1.0);

        Assessment::with_details(
            round_to(deficit, 1),
            "L",
            classify(&HYPERNATREMIA_GRADES, input.current_sodium),
            FreeWaterDetails {
                total_body_water_fraction: fraction,
                total_body_water_l: round_to(total_body_water, 1),
                minimum_correction_hours: round_to(
                    (input.current_sodium - desired) / SODIUM_CORRECTION_RATE,
                    1,
                ),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::assert_table_is_exhaustive;

    #[test]
    fn tables_are_exhaustive() {
        assert_table_is_exhaustive(&GFR_CATEGORIES);
        assert_table_is_exhaustive(&ACIDOSIS_SEVERITY);
        assert_table_is_exhaustive(&HYPERNATREMIA_GRADES);
    }

    #[test]
    fn ckd_epi_documented_example_is_g3a() {
        let request = CkdEpi2021Request {
            sex: Sex::Female,
            age: 65,
            serum_creatinine: 1.2,
        };
        assert!(request.validate().is_ok());
        let result = CkdEpi2021::calculate(&request);
        assert_eq!(result.result, 50.2);
        assert_eq!(result.stage, "G3a");
        assert_eq!(result.unit, "mL/min/1.73 m²");
    }

    #[test]
    fn ckd_epi_low_creatinine_young_male_is_g1() {
        let result = CkdEpi2021::calculate(&CkdEpi2021Request {
            sex: Sex::Male,
            age: 30,
            serum_creatinine: 0.8,
        });
        assert!(result.result >= 90.0, "got {}", result.result);
        assert_eq!(result.stage, "G1");
    }

    #[test]
    fn ckd_epi_rejects_paediatric_age() {
        let error = CkdEpi2021Request {
            sex: Sex::Male,
            age: 17,
            serum_creatinine: 1.0,
        }
        .validate()
        .expect_err("adult equation");
        assert!(error.is_about("age"));
    }

    #[test]
    fn ckd_epi_is_total_over_its_domain() {
        for sex in [Sex::Male, Sex::Female] {
            for age in [18, 50, 120] {
                for creatinine in [0.1, 0.7, 0.9, 5.0, 20.0] {
                    let result = CkdEpi2021::calculate(&CkdEpi2021Request {
                        sex,
                        age,
                        serum_creatinine: creatinine,
                    });
                    assert!(result.result.is_finite());
                    assert_eq!(
                        result.stage,
                        classify(&GFR_CATEGORIES, result.result).stage
                    );
                }
            }
        }
    }

    #[test]
    fn bicarbonate_deficit_uses_default_target() {
        let result = BicarbonateDeficit::calculate(&BicarbonateDeficitRequest {
            weight: 70.0,
            current_bicarbonate: 12.0,
            target_bicarbonate: None,
        });
        assert_eq!(result.result, 336.0);
        assert_eq!(result.stage, "Moderate");
        assert_eq!(result.details.target_bicarbonate, 24.0);
    }

    #[test]
    fn bicarbonate_at_target_has_no_deficit() {
        let result = BicarbonateDeficit::calculate(&BicarbonateDeficitRequest {
            weight: 80.0,
            current_bicarbonate: 26.0,
            target_bicarbonate: Some(24.0),
        });
        assert_eq!(result.result, 0.0);
        assert_eq!(result.stage, "No Deficit");
    }

    #[test]
    fn free_water_deficit_for_elderly_female() {
        let request = FreeWaterDeficitRequest {
            sex: Sex::Female,
            age: 80,
            weight: 60.0,
            current_sodium: 160.0,
            desired_sodium: None,
        };
        assert!(request.validate().is_ok());
        let result = FreeWaterDeficit::calculate(&request);
        // 0.45 * 60 * (160 / 140 - 1)
        assert_eq!(result.result, 3.9);
        assert_eq!(result.stage, "Severe");
        assert_eq!(result.details.total_body_water_fraction, 0.45);
        assert_eq!(result.details.minimum_correction_hours, 40.0);
    }

    #[test]
    fn free_water_deficit_requires_sodium_above_target() {
        let error = FreeWaterDeficitRequest {
            sex: Sex::Male,
            age: 40,
            weight: 70.0,
            current_sodium: 138.0,
            desired_sodium: Some(140.0),
        }
        .validate()
        .expect_err("no deficit to correct");
        assert!(error.is_about("current_sodium"));
    }
}
