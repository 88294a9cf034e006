use serde::{Deserialize, Serialize};

use super::{classify, round_to, Assessment, Band, Score, Sex};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

static WHO_BMI_CLASS: [Band; 6] = [
    Band::new(
        18.5,
        "Underweight",
        "Below healthy weight",
        "BMI below 18.5 kg/m². Evaluate nutritional status and consider underlying causes of low body weight.",
    ),
    Band::new(
        25.0,
        "Normal weight",
        "Healthy weight",
        "BMI 18.5-24.9 kg/m². Healthy weight range associated with the lowest risk of weight-related disease.",
    ),
    Band::new(
        30.0,
        "Overweight",
        "Pre-obesity",
        "BMI 25.0-29.9 kg/m². Increased risk of cardiovascular and metabolic disease. Lifestyle modification recommended.",
    ),
    Band::new(
        35.0,
        "Obesity Class I",
        "Moderate obesity",
        "BMI 30.0-34.9 kg/m². High risk of comorbidities. Structured weight management recommended.",
    ),
    Band::new(
        40.0,
        "Obesity Class II",
        "Severe obesity",
        "BMI 35.0-39.9 kg/m². Very high risk of comorbidities. Consider pharmacotherapy alongside lifestyle intervention.",
    ),
    Band::last(
        "Obesity Class III",
        "Very severe obesity",
        "BMI 40 kg/m² or higher. Extremely high risk of comorbidities. Consider referral for bariatric evaluation.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct BmiRequest {
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
}

impl Validate for BmiRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("weight", self.weight, 1.0, 500.0)
            .range("height", self.height, 50.0, 250.0)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BmiDetails {
    pub healthy_weight_range_kg: WeightRange,
}

pub struct BmiCalculator;

impl Score for BmiCalculator {
    const ID: ScoreId = ScoreId::BmiCalculator;
    type Input = BmiRequest;
    type Output = Assessment<f64, BmiDetails>;

    fn calculate(input: &BmiRequest) -> Self::Output {
        let bmi = round_to(body_mass_index(input.weight, input.height), 1);
        let height_m = input.height / 100.0;
        let band = classify(&WHO_BMI_CLASS, bmi);
        Assessment::with_details(
            bmi,
            "kg/m²",
            band,
            BmiDetails {
                healthy_weight_range_kg: WeightRange {
                    min: round_to(18.5 * height_m * height_m, 1),
                    max: round_to(24.9 * height_m * height_m, 1),
                },
            },
        )
    }
}

static BSA_CALCULATED: [Band; 1] = [Band::last(
    "Calculated",
    "Body surface area",
    "Body surface area for drug dosing and physiologic indexing. Average adult BSA is about 1.7 m².",
)];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BsaFormula {
    #[default]
    Mosteller,
    DuBois,
    Haycock,
}

impl BsaFormula {
    fn surface_area(self, weight_kg: f64, height_cm: f64) -> f64 {
        match self {
            BsaFormula::Mosteller => (weight_kg * height_cm / 3600.0).sqrt(),
            BsaFormula::DuBois => 0.007184 * weight_kg.powf(0.425) * height_cm.powf(0.725),
            BsaFormula::Haycock => 0.024265 * weight_kg.powf(0.5378) * height_cm.powf(0.3964),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BsaRequest {
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
    #[serde(default)]
    pub formula: BsaFormula,
}

impl Validate for BsaRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("weight", self.weight, 1.0, 500.0)
            .range("height", self.height, 30.0, 250.0)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BsaDetails {
    pub formula: BsaFormula,
}

pub struct BsaCalculator;

impl Score for BsaCalculator {
    const ID: ScoreId = ScoreId::BsaCalculator;
    type Input = BsaRequest;
    type Output = Assessment<f64, BsaDetails>;

    fn calculate(input: &BsaRequest) -> Self::Output {
        let bsa = round_to(input.formula.surface_area(input.weight, input.height), 2);
        let band = classify(&BSA_CALCULATED, bsa);
        Assessment::with_details(
            bsa,
            "m²",
            band,
            BsaDetails {
                formula: input.formula,
            },
        )
    }
}

static FAT_FREE_MASS: [Band; 1] = [Band::last(
    "Calculated",
    "Fat-free mass",
    "Estimated lean body weight (Janmahasatian). Useful for dosing hydrophilic drugs in obese patients.",
)];

#[derive(Debug, Clone, Deserialize)]
pub struct FatFreeMassRequest {
    pub sex: Sex,
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
}

impl Validate for FatFreeMassRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .range("weight", self.weight, 10.0, 300.0)
            .range("height", self.height, 100.0, 250.0);
        if self.weight.is_finite() && self.height.is_finite() && self.height > 0.0 {
            validator.range(
                "bmi",
                body_mass_index(self.weight, self.height),
                10.0,
                80.0,
            );
        }
        validator.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatFreeMassDetails {
    pub bmi: f64,
    pub fat_mass: f64,
    pub percentage_of_body_weight: f64,
}

/// Janmahasatian (2005) lean body weight.
pub struct FatFreeMass;

impl Score for FatFreeMass {
    const ID: ScoreId = ScoreId::FatFreeMass;
    type Input = FatFreeMassRequest;
    type Output = Assessment<f64, FatFreeMassDetails>;

    fn calculate(input: &FatFreeMassRequest) -> Self::Output {
        let bmi = body_mass_index(input.weight, input.height);
        let ffm = match input.sex {
            Sex::Male => 9270.0 * input.weight / (6680.0 + 216.0 * bmi),
            Sex::Female => 9270.0 * input.weight / (8780.0 + 244.0 * bmi),
        };
        let band = classify(&FAT_FREE_MASS, ffm);
        Assessment::with_details(
            round_to(ffm, 1),
            "kg",
            band,
            FatFreeMassDetails {
                bmi: round_to(bmi, 1),
                fat_mass: round_to(input.weight - ffm, 1),
                percentage_of_body_weight: round_to(ffm / input.weight * 100.0, 1),
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
        assert_table_is_exhaustive(&WHO_BMI_CLASS);
        assert_table_is_exhaustive(&BSA_CALCULATED);
        assert_table_is_exhaustive(&FAT_FREE_MASS);
    }

    #[test]
    fn bmi_of_average_adult() {
        let result = BmiCalculator::calculate(&BmiRequest {
            weight: 70.0,
            height: 175.0,
        });
        assert_eq!(result.result, 22.9);
        assert_eq!(result.unit, "kg/m²");
        assert_eq!(result.stage, "Normal weight");
        assert_eq!(result.details.healthy_weight_range_kg.min, 56.7);
        assert_eq!(result.details.healthy_weight_range_kg.max, 76.3);
    }

    #[test]
    fn bmi_classes_follow_who_cutoffs() {
        let classify_bmi = |weight| {
            BmiCalculator::calculate(&BmiRequest {
                weight,
                height: 100.0,
            })
            .stage
        };
        assert_eq!(classify_bmi(18.4), "Underweight");
        assert_eq!(classify_bmi(18.5), "Normal weight");
        assert_eq!(classify_bmi(30.0), "Obesity Class I");
        assert_eq!(classify_bmi(40.0), "Obesity Class III");
    }

    #[test]
    fn bmi_rejects_out_of_range_height() {
        let error = BmiRequest {
            weight: 70.0,
            height: 20.0,
        }
        .validate()
        .expect_err("too short");
        assert!(error.is_about("height"));
    }

    #[test]
    fn bsa_formulas_agree_for_average_adult() {
        let mosteller = BsaCalculator::calculate(&BsaRequest {
            weight: 70.0,
            height: 170.0,
            formula: BsaFormula::Mosteller,
        });
        assert_eq!(mosteller.result, 1.82);
        assert_eq!(mosteller.stage, "Calculated");

        for formula in [BsaFormula::DuBois, BsaFormula::Haycock] {
            let result = BsaCalculator::calculate(&BsaRequest {
                weight: 70.0,
                height: 170.0,
                formula,
            });
            assert!((result.result - 1.82).abs() < 0.05, "{formula:?}");
        }
    }

    #[test]
    fn bsa_formula_defaults_to_mosteller() {
        let request: BsaRequest =
            serde_json::from_str(r#"{"weight": 70, "height": 170}"#).expect("parses");
        assert_eq!(request.formula, BsaFormula::Mosteller);
    }

    #[test]
    fn fat_free_mass_by_sex() {
        let male = FatFreeMass::calculate(&FatFreeMassRequest {
            sex: Sex::Male,
            weight: 80.0,
            height: 180.0,
        });
        // BMI 24.69: 741600 / (6680 + 5333.3)
        assert_eq!(male.result, 61.7);
        assert_eq!(male.details.bmi, 24.7);
        assert_eq!(male.details.fat_mass, 18.3);

        let female = FatFreeMass::calculate(&FatFreeMassRequest {
            sex: Sex::Female,
            weight: 80.0,
            height: 180.0,
        });
        assert!(female.result < male.result);
    }

    #[test]
    fn fat_free_mass_rejects_implausible_bmi() {
        let error = FatFreeMassRequest {
            sex: Sex::Female,
            weight: 290.0,
            height: 150.0,
        }
        .validate()
        .expect_err("bmi above 80");
        assert!(error.is_about("bmi"));
    }
}
