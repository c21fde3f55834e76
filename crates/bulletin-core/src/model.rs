//! Core data model types for bulletin.
//!
//! These are the fundamental types the whole workspace uses to represent
//! students, their subject scores, and the rosters they are imported from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::statistics::mean;

/// The fixed set of subjects graded in a middle-school bulletin.
///
/// Declaration order is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[serde(alias = "عربية")]
    Arabic,
    #[serde(alias = "أمازيغية")]
    Amazigh,
    #[serde(alias = "فرنسية")]
    French,
    #[serde(alias = "إنجليزية")]
    English,
    #[serde(alias = "إسلامية")]
    Islamic,
    #[serde(alias = "مدنية")]
    Civic,
    #[serde(alias = "تاريخ")]
    HistoryGeography,
    #[serde(alias = "رياضيات")]
    Mathematics,
    #[serde(alias = "طبيعة")]
    NaturalScience,
    #[serde(alias = "فيزياء")]
    Physics,
    #[serde(alias = "إعلامية")]
    ComputerScience,
    #[serde(alias = "تشكيلية")]
    FineArts,
    #[serde(alias = "موسيقية")]
    Music,
    #[serde(alias = "رياضة")]
    PhysicalEducation,
}

impl Subject {
    /// Every subject, in canonical report order.
    pub const ALL: [Subject; 14] = [
        Subject::Arabic,
        Subject::Amazigh,
        Subject::French,
        Subject::English,
        Subject::Islamic,
        Subject::Civic,
        Subject::HistoryGeography,
        Subject::Mathematics,
        Subject::NaturalScience,
        Subject::Physics,
        Subject::ComputerScience,
        Subject::FineArts,
        Subject::Music,
        Subject::PhysicalEducation,
    ];

    /// Stable machine key, used in config files and JSON.
    pub fn key(self) -> &'static str {
        match self {
            Subject::Arabic => "arabic",
            Subject::Amazigh => "amazigh",
            Subject::French => "french",
            Subject::English => "english",
            Subject::Islamic => "islamic",
            Subject::Civic => "civic",
            Subject::HistoryGeography => "history_geography",
            Subject::Mathematics => "mathematics",
            Subject::NaturalScience => "natural_science",
            Subject::Physics => "physics",
            Subject::ComputerScience => "computer_science",
            Subject::FineArts => "fine_arts",
            Subject::Music => "music",
            Subject::PhysicalEducation => "physical_education",
        }
    }

    /// Short Arabic column key used by school spreadsheets.
    pub fn arabic_key(self) -> &'static str {
        match self {
            Subject::Arabic => "عربية",
            Subject::Amazigh => "أمازيغية",
            Subject::French => "فرنسية",
            Subject::English => "إنجليزية",
            Subject::Islamic => "إسلامية",
            Subject::Civic => "مدنية",
            Subject::HistoryGeography => "تاريخ",
            Subject::Mathematics => "رياضيات",
            Subject::NaturalScience => "طبيعة",
            Subject::Physics => "فيزياء",
            Subject::ComputerScience => "إعلامية",
            Subject::FineArts => "تشكيلية",
            Subject::Music => "موسيقية",
            Subject::PhysicalEducation => "رياضة",
        }
    }

    /// Full Arabic subject name as printed on reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Subject::Arabic => "اللغة العربية",
            Subject::Amazigh => "اللغة الأمازيغية",
            Subject::French => "اللغة الفرنسية",
            Subject::English => "اللغة الإنجليزية",
            Subject::Islamic => "التربية الإسلامية",
            Subject::Civic => "التربية المدنية",
            Subject::HistoryGeography => "التاريخ والجغرافيا",
            Subject::Mathematics => "الرياضيات",
            Subject::NaturalScience => "العلوم الطبيعية والحياة",
            Subject::Physics => "العلوم الفزيائية",
            Subject::ComputerScience => "الإعلام الآلي",
            Subject::FineArts => "التربية التشكيلية",
            Subject::Music => "التربية الموسيقية",
            Subject::PhysicalEducation => "التربية البدنية",
        }
    }

    /// Column names used by the French-language export scripts.
    fn french_key(self) -> &'static str {
        match self {
            Subject::Arabic => "arabe",
            Subject::Amazigh => "amazigh",
            Subject::French => "francais",
            Subject::English => "anglais",
            Subject::Islamic => "islamique",
            Subject::Civic => "civique",
            Subject::HistoryGeography => "histgeo",
            Subject::Mathematics => "math",
            Subject::NaturalScience => "svt",
            Subject::Physics => "physique",
            Subject::ComputerScience => "informatique",
            Subject::FineArts => "arts",
            Subject::Music => "musique",
            Subject::PhysicalEducation => "sport",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| {
                subject.key() == lower
                    || subject.french_key() == lower
                    || subject.arabic_key() == trimmed
                    || subject.display_name() == trimmed
            })
            .ok_or_else(|| format!("unknown subject: {trimmed}"))
    }
}

/// Student sex as recorded in the school register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[serde(alias = "ذكر", alias = "m")]
    Male,
    #[serde(alias = "أنثى", alias = "f")]
    Female,
}

impl Sex {
    /// Arabic label as printed on reports.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "ذكر",
            Sex::Female => "أنثى",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "male" | "m" | "garcon" | "garçon" | "ذكر" => Ok(Sex::Male),
            "female" | "f" | "fille" | "أنثى" => Ok(Sex::Female),
            _ => Err(format!("unknown sex: {trimmed}")),
        }
    }
}

/// One student's semester record.
///
/// A score of 0, or a subject missing from `scores`, means the student was
/// absent for that subject. Absent scores never enter any statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Opaque identifier (register number).
    pub id: String,
    /// Display name.
    pub name: String,
    pub sex: Sex,
    /// Whether the student is repeating the year.
    #[serde(default)]
    pub repeater: bool,
    /// Class label (e.g. "4AM1").
    pub class: String,
    /// Level label (e.g. "4AM").
    #[serde(default)]
    pub level: String,
    /// Scores out of 20, keyed by subject.
    #[serde(default)]
    pub scores: BTreeMap<Subject, f64>,
    /// General average computed upstream (e.g. the register's weighted
    /// average). Used for orientation when present and non-zero.
    #[serde(default)]
    pub general_average: Option<f64>,
}

impl StudentRecord {
    /// Create a record with no scores.
    pub fn new(id: impl Into<String>, name: impl Into<String>, sex: Sex, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sex,
            repeater: false,
            class: class.into(),
            level: String::new(),
            scores: BTreeMap::new(),
            general_average: None,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_repeater(mut self, repeater: bool) -> Self {
        self.repeater = repeater;
        self
    }

    pub fn with_score(mut self, subject: Subject, score: f64) -> Self {
        self.scores.insert(subject, score);
        self
    }

    pub fn with_general_average(mut self, average: f64) -> Self {
        self.general_average = Some(average);
        self
    }

    /// The recorded score, or 0 (absent) when the subject is missing or
    /// the recorded value is not a finite number.
    pub fn score(&self, subject: Subject) -> f64 {
        self.scores
            .get(&subject)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Whether a score is recorded for this subject.
    pub fn is_present(&self, subject: Subject) -> bool {
        is_present_score(self.score(subject))
    }

    /// Every non-absent score, in subject order.
    pub fn present_scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.values().copied().filter(|s| is_present_score(*s))
    }

    /// Mean of the present scores, 0 when every subject is absent.
    pub fn personal_mean(&self) -> f64 {
        let scores: Vec<f64> = self.present_scores().collect();
        mean(&scores)
    }

    /// The upstream general average when supplied, otherwise the personal mean.
    pub fn general_average(&self) -> f64 {
        match self.general_average {
            Some(avg) if avg.is_finite() && avg > 0.0 => avg,
            _ => self.personal_mean(),
        }
    }
}

/// A score counts as present when it is a real, strictly positive number.
pub fn is_present_score(score: f64) -> bool {
    score.is_finite() && score > 0.0
}

/// A named collection of student records, as imported from one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    /// Identifier (file stem when the source has none).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Level label shared by the roster, when the source declares one.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
}
