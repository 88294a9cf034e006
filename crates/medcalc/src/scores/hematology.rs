use serde::{Deserialize, Serialize};

use super::{classify, points, round_to, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

static CAPRINI_VTE_RISK: [Band; 6] = [
    Band::new(
        1.0,
        "Lowest Risk",
        "Minimal risk",
        "Lowest risk of VTE. No specific anticoagulation prophylaxis required. Early ambulation and compression stockings recommended.",
    ),
    Band::new(
        3.0,
        "Low Risk",
        "Minimal risk",
        "Low risk of VTE. No specific anticoagulation prophylaxis required. Early ambulation and intermittent pneumatic compression recommended.",
    ),
    Band::new(
        5.0,
        "Moderate Risk",
        "0.7% VTE risk",
        "Moderate risk of VTE. Consider intermittent pneumatic compression or low molecular weight heparin after a risk-benefit assessment.",
    ),
    Band::new(
        7.0,
        "High Risk",
        "1.8% VTE risk",
        "High risk of VTE. Intermittent pneumatic compression and low molecular weight heparin recommended.",
    ),
    Band::new(
        9.0,
        "High Risk",
        "4.0% VTE risk",
        "High risk of VTE. Intermittent pneumatic compression and low molecular weight heparin strongly recommended; consider 30 days of extended prophylaxis post-operatively.",
    ),
    Band::last(
        "Highest Risk",
        "10.7% VTE risk",
        "Highest risk of VTE. Combined mechanical and pharmacological prophylaxis with 30 days of extended prophylaxis. Consider an IVC filter if anticoagulation is contraindicated.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "under_41")]
    Under41,
    #[serde(rename = "41_to_60")]
    From41To60,
    #[serde(rename = "61_to_74")]
    From61To74,
    #[serde(rename = "75_or_older")]
    From75,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapriniRequest {
    pub age_category: AgeCategory,
    pub minor_surgery: bool,
    pub major_surgery: bool,
    pub hip_knee_arthroplasty: bool,
    pub hip_pelvis_leg_fracture: bool,
    pub acute_spinal_cord_injury: bool,
    pub varicose_veins: bool,
    pub current_swollen_legs: bool,
    pub central_venous_access: bool,
    pub inflammatory_bowel_disease: bool,
    pub bmi_over_25: bool,
    pub acute_myocardial_infarction: bool,
    pub congestive_heart_failure: bool,
    pub sepsis: bool,
    pub serious_lung_disease: bool,
    pub abnormal_pulmonary_function: bool,
    pub medical_patient_bed_rest: bool,
    pub cast_or_brace: bool,
    pub history_of_vte: bool,
    pub family_history_thrombosis: bool,
    pub factor_v_leiden: bool,
    pub prothrombin_20210a: bool,
    pub lupus_anticoagulant: bool,
    pub anticardiolipin_antibodies: bool,
    pub heparin_induced_thrombocytopenia: bool,
    pub other_congenital_thrombophilia: bool,
    pub malignancy: bool,
}

impl Validate for CapriniRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapriniDetails {
    pub age_points: u32,
    pub risk_factor_points: u32,
}

/// Caprini risk assessment model for venous thromboembolism (2005 revision).
pub struct CapriniScore2005;

impl CapriniScore2005 {
    fn risk_factor_points(input: &CapriniRequest) -> u32 {
        let one_point = [
            input.minor_surgery,
            input.varicose_veins,
            input.inflammatory_bowel_disease,
            input.bmi_over_25,
            input.current_swollen_legs,
            input.central_venous_access,
        ];
        let two_points = [
            input.major_surgery,
            input.acute_myocardial_infarction,
            input.congestive_heart_failure,
            input.sepsis,
            input.serious_lung_disease,
            input.abnormal_pulmonary_function,
            input.medical_patient_bed_rest,
            input.cast_or_brace,
        ];
        let three_points = [
            input.history_of_vte,
            input.family_history_thrombosis,
            input.factor_v_leiden,
            input.prothrombin_20210a,
            input.lupus_anticoagulant,
            input.anticardiolipin_antibodies,
            input.heparin_induced_thrombocytopenia,
            input.other_congenital_thrombophilia,
        ];
        let five_points = [
            input.hip_knee_arthroplasty,
            input.hip_pelvis_leg_fracture,
            input.acute_spinal_cord_injury,
            input.malignancy,
        ];

        let weighted = |factors: &[bool], weight: u32| -> u32 {
            factors.iter().map(|present| points(*present, weight)).sum()
        };
        weighted(&one_point, 1)
            + weighted(&two_points, 2)
            + weighted(&three_points, 3)
            + weighted(&five_points, 5)
    }
}

impl Score for CapriniScore2005 {
    const ID: ScoreId = ScoreId::CapriniScore2005;
    type Input = CapriniRequest;
    type Output = Assessment<u32, CapriniDetails>;

    fn calculate(input: &CapriniRequest) -> Self::Output {
        let age_points = match input.age_category {
            AgeCategory::Under41 => 0,
            AgeCategory::From41To60 => 1,
            AgeCategory::From61To74 => 2,
            AgeCategory::From75 => 3,
        };
        let risk_factor_points = Self::risk_factor_points(input);
        let total = age_points + risk_factor_points;
        let band = classify(&CAPRINI_VTE_RISK, f64::from(total));
        Assessment::with_details(
            total,
            "points",
            band,
            CapriniDetails {
                age_points,
                risk_factor_points,
            },
        )
    }
}

static NEUTROPENIA_GRADE: [Band; 4] = [
    Band::new(
        500.0,
        "Severe Neutropenia",
        "ANC below 500 cells/µL",
        "High risk of serious infection. Neutropenic precautions are indicated and fever warrants immediate empiric broad-spectrum antibiotics.",
    ),
    Band::new(
        1000.0,
        "Moderate Neutropenia",
        "ANC 500-999 cells/µL",
        "Moderate risk of infection. Monitor closely and evaluate fever promptly.",
    ),
    Band::new(
        1500.0,
        "Mild Neutropenia",
        "ANC 1000-1499 cells/µL",
        "Minimal increase in infection risk. Investigate the cause and repeat the count.",
    ),
    Band::last(
        "Normal",
        "ANC 1500 cells/µL or higher",
        "Normal neutrophil count. No increased infection risk from neutropenia.",
    ),
];

#[derive(Debug, Clone, Deserialize)]
pub struct AncRequest {
    /// ×10³ cells/µL
    pub white_blood_cells: f64,
    /// Segmented neutrophils, %
    pub segmented_neutrophils: f64,
    /// Band neutrophils, %
    pub band_neutrophils: f64,
}

impl Validate for AncRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("white_blood_cells", self.white_blood_cells, 0.1, 100.0)
            .range("segmented_neutrophils", self.segmented_neutrophils, 0.0, 100.0)
            .range("band_neutrophils", self.band_neutrophils, 0.0, 100.0)
            .ensure(
                !(self.segmented_neutrophils + self.band_neutrophils > 100.0),
                "band_neutrophils",
                "segmented and band neutrophils must not exceed 100% combined",
            )
            .finish()
    }
}

/// Absolute neutrophil count.
pub struct Anc;

impl Score for Anc {
    const ID: ScoreId = ScoreId::Anc;
    type Input = AncRequest;
    type Output = Assessment<f64>;

    fn calculate(input: &AncRequest) -> Self::Output {
        let neutrophil_fraction = (input.segmented_neutrophils + input.band_neutrophils) / 100.0;
        let anc = round_to(input.white_blood_cells * 1000.0 * neutrophil_fraction, 0);
        Assessment::from_band(anc, "cells/µL", classify(&NEUTROPENIA_GRADE, anc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_risk_factors(age_category: AgeCategory) -> CapriniRequest {
        CapriniRequest {
            age_category,
            minor_surgery: false,
            major_surgery: false,
            hip_knee_arthroplasty: false,
            hip_pelvis_leg_fracture: false,
            acute_spinal_cord_injury: false,
            varicose_veins: false,
            current_swollen_legs: false,
            central_venous_access: false,
            inflammatory_bowel_disease: false,
            bmi_over_25: false,
            acute_myocardial_infarction: false,
            congestive_heart_failure: false,
            sepsis: false,
            serious_lung_disease: false,
            abnormal_pulmonary_function: false,
            medical_patient_bed_rest: false,
            cast_or_brace: false,
            history_of_vte: false,
            family_history_thrombosis: false,
            factor_v_leiden: false,
            prothrombin_20210a: false,
            lupus_anticoagulant: false,
            anticardiolipin_antibodies: false,
            heparin_induced_thrombocytopenia: false,
            other_congenital_thrombophilia: false,
            malignancy: false,
        }
    }

    #[test]
    fn tables_are_exhaustive() {
        crate::scores::assert_table_is_exhaustive(&CAPRINI_VTE_RISK);
        crate::scores::assert_table_is_exhaustive(&NEUTROPENIA_GRADE);
    }

    #[test]
    fn young_patient_without_factors_is_lowest_risk() {
        let result = CapriniScore2005::calculate(&no_risk_factors(AgeCategory::Under41));
        assert_eq!(result.result, 0);
        assert_eq!(result.stage, "Lowest Risk");
    }

    #[test]
    fn arthroplasty_in_older_patient() {
        let mut request = no_risk_factors(AgeCategory::From61To74);
        request.major_surgery = true;
        request.hip_knee_arthroplasty = true;
        request.bmi_over_25 = true;
        let result = CapriniScore2005::calculate(&request);
        // age 2 + major surgery 2 + arthroplasty 5 + BMI 1
        assert_eq!(result.result, 10);
        assert_eq!(result.stage, "Highest Risk");
        assert_eq!(result.details.age_points, 2);
        assert_eq!(result.details.risk_factor_points, 8);
    }

    #[test]
    fn age_categories_use_numeric_wire_names() {
        let parsed: AgeCategory = serde_json::from_str("\"41_to_60\"").expect("parses");
        assert_eq!(parsed, AgeCategory::From41To60);
    }

    #[test]
    fn anc_counts_segs_and_bands() {
        let request = AncRequest {
            white_blood_cells: 2.0,
            segmented_neutrophils: 30.0,
            band_neutrophils: 5.0,
        };
        assert!(request.validate().is_ok());
        let result = Anc::calculate(&request);
        assert_eq!(result.result, 700.0);
        assert_eq!(result.stage, "Moderate Neutropenia");
    }

    #[test]
    fn anc_rejects_differential_over_100_percent() {
        let error = AncRequest {
            white_blood_cells: 5.0,
            segmented_neutrophils: 90.0,
            band_neutrophils: 15.0,
        }
        .validate()
        .expect_err("105%");
        assert!(error.is_about("band_neutrophils"));
    }
}
