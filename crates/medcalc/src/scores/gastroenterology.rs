use serde::{Deserialize, Serialize};

use super::{classify, Assessment, Band, Score};
use crate::registry::ScoreId;
use crate::validation::{Validate, ValidationError, Validator};

static CHILD_PUGH_CLASS: [Band; 3] = [
    Band::new(
        7.0,
        "Child-Pugh A",
        "Well-compensated disease",
        "Well-compensated cirrhosis. Excellent operative risk; suitable for major surgery and liver resection.",
    ),
    Band::new(
        10.0,
        "Child-Pugh B",
        "Significant functional compromise",
        "Significant functional compromise. Consider surgery with caution; may require liver transplant evaluation.",
    ),
    Band::last(
        "Child-Pugh C",
        "Decompensated disease",
        "Decompensated cirrhosis. Poor operative risk with high surgical mortality; priority candidate for liver transplantation.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ascites {
    Absent,
    Slight,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encephalopathy {
    None,
    #[serde(rename = "grade_1_2")]
    Grade1To2,
    #[serde(rename = "grade_3_4")]
    Grade3To4,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChildPughRequest {
    /// Total bilirubin, mg/dL
    pub bilirubin: f64,
    /// g/dL
    pub albumin: f64,
    pub inr: f64,
    pub ascites: Ascites,
    pub encephalopathy: Encephalopathy,
}

impl Validate for ChildPughRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("bilirubin", self.bilirubin, 0.1, 50.0)
            .range("albumin", self.albumin, 1.0, 5.0)
            .range("inr", self.inr, 0.8, 10.0)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildPughComponents {
    pub bilirubin: u32,
    pub albumin: u32,
    pub inr: u32,
    pub ascites: u32,
    pub encephalopathy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildPughDetails {
    pub grade: char,
    pub one_year_survival: &'static str,
    pub two_year_survival: &'static str,
    pub components: ChildPughComponents,
}

pub struct ChildPughScore;

impl ChildPughScore {
    fn bilirubin_points(bilirubin: f64) -> u32 {
        if bilirubin < 2.0 {
            1
        } else if bilirubin <= 3.0 {
            2
        } else {
            3
        }
    }

    fn albumin_points(albumin: f64) -> u32 {
        if albumin > 3.5 {
            1
        } else if albumin >= 2.8 {
            2
        } else {
            3
        }
    }

    fn inr_points(inr: f64) -> u32 {
        if inr < 1.7 {
            1
        } else if inr <= 2.3 {
            2
        } else {
            3
        }
    }

    /// Grade letter with one- and two-year survival.
    fn outcomes(total: u32) -> (char, &'static str, &'static str) {
        match total {
            0..=6 => ('A', "100%", "85%"),
            7..=9 => ('B', "80%", "60%"),
            _ => ('C', "45%", "35%"),
        }
    }
}

impl Score for ChildPughScore {
    const ID: ScoreId = ScoreId::ChildPughScore;
    type Input = ChildPughRequest;
    type Output = Assessment<u32, ChildPughDetails>;

    fn calculate(input: &ChildPughRequest) -> Self::Output {
        let components = ChildPughComponents {
            bilirubin: Self::bilirubin_points(input.bilirubin),
            albumin: Self::albumin_points(input.albumin),
            inr: Self::inr_points(input.inr),
            ascites: match input.ascites {
                Ascites::Absent => 1,
                Ascites::Slight => 2,
                Ascites::Moderate => 3,
            },
            encephalopathy: match input.encephalopathy {
                Encephalopathy::None => 1,
                Encephalopathy::Grade1To2 => 2,
                Encephalopathy::Grade3To4 => 3,
            },
        };
        let total = components.bilirubin
            + components.albumin
            + components.inr
            + components.ascites
            + components.encephalopathy;
        let (grade, one_year_survival, two_year_survival) = Self::outcomes(total);
        let band = classify(&CHILD_PUGH_CLASS, f64::from(total));

        let mut assessment = Assessment::with_details(
            total,
            "points",
            band,
            ChildPughDetails {
                grade,
                one_year_survival,
                two_year_survival,
                components,
            },
        );
        assessment.interpretation = format!(
            "Child-Pugh grade {grade} (score {total}): one-year survival ~{one_year_survival}, two-year survival ~{two_year_survival}. {}",
            band.interpretation
        );
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::assert_table_is_exhaustive;

    #[test]
    fn class_table_is_exhaustive() {
        assert_table_is_exhaustive(&CHILD_PUGH_CLASS);
    }

    #[test]
    fn compensated_cirrhosis_is_class_a() {
        let request = ChildPughRequest {
            bilirubin: 1.2,
            albumin: 3.8,
            inr: 1.2,
            ascites: Ascites::Absent,
            encephalopathy: Encephalopathy::None,
        };
        let result = ChildPughScore::calculate(&request);
        assert_eq!(result.result, 5);
        assert_eq!(result.stage, "Child-Pugh A");
        assert_eq!(result.details.one_year_survival, "100%");
    }

    #[test]
    fn decompensated_cirrhosis_is_class_c() {
        let request = ChildPughRequest {
            bilirubin: 3.5,
            albumin: 2.5,
            inr: 2.5,
            ascites: Ascites::Moderate,
            encephalopathy: Encephalopathy::Grade1To2,
        };
        let result = ChildPughScore::calculate(&request);
        assert_eq!(result.result, 14);
        assert_eq!(result.stage, "Child-Pugh C");
        assert_eq!(result.details.grade, 'C');
    }

    #[test]
    fn boundary_values_take_the_milder_points() {
        assert_eq!(ChildPughScore::bilirubin_points(3.0), 2);
        assert_eq!(ChildPughScore::albumin_points(3.5), 2);
        assert_eq!(ChildPughScore::albumin_points(2.8), 2);
        assert_eq!(ChildPughScore::inr_points(2.3), 2);
        assert_eq!(ChildPughScore::outcomes(9).0, 'B');
    }

    #[test]
    fn encephalopathy_uses_grade_wire_names() {
        let parsed: Encephalopathy = serde_json::from_str("\"grade_3_4\"").expect("parses");
        assert_eq!(parsed, Encephalopathy::Grade3To4);
    }
}
