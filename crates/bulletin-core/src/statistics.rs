//! Per-subject grade statistics.
//!
//! Every function here is total: empty inputs produce zeros, never NaN or
//! infinity, and nothing panics.

use serde::{Deserialize, Serialize};

use crate::config::{CohesionThresholds, IndicatorConfig, PerformanceThresholds};
use crate::model::{is_present_score, StudentRecord, Subject};

/// Arithmetic mean. Returns 0.0 if the slice is empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N). Returns 0.0 if the slice is empty.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of variation in percent. Defined as 0 when the mean is 0.
pub fn coefficient_of_variation(mean: f64, std_dev: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    let cv = std_dev / mean * 100.0;
    if cv.is_finite() {
        cv
    } else {
        0.0
    }
}

/// `count / total` in percent, 0 when `total` is 0.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// A count with its share of some denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub count: usize,
    pub percentage: f64,
}

impl Bucket {
    pub fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            percentage: percent(count, total),
        }
    }
}

/// Qualitative reading of a subject mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceNote {
    NotStudied,
    Excellent,
    GoodAndStable,
    GoodButVariable,
    Acceptable,
    WeakAndUnstable,
}

impl PerformanceNote {
    pub fn from_mean(mean: f64, thresholds: &PerformanceThresholds) -> Self {
        if mean == 0.0 || !mean.is_finite() {
            PerformanceNote::NotStudied
        } else if mean >= thresholds.excellent {
            PerformanceNote::Excellent
        } else if mean >= thresholds.good_and_stable {
            PerformanceNote::GoodAndStable
        } else if mean >= thresholds.good_but_variable {
            PerformanceNote::GoodButVariable
        } else if mean >= thresholds.acceptable {
            PerformanceNote::Acceptable
        } else {
            PerformanceNote::WeakAndUnstable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceNote::NotStudied => "لم تدرس",
            PerformanceNote::Excellent => "أداء ممتاز",
            PerformanceNote::GoodAndStable => "أداء جيد وثابت",
            PerformanceNote::GoodButVariable => "أداء جيد لكنه متنوع",
            PerformanceNote::Acceptable => "أداء مقبول",
            PerformanceNote::WeakAndUnstable => "أداء ضعيف وغير مستقر",
        }
    }
}

/// Qualitative reading of the coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohesionNote {
    NotStudied,
    FullCohesion,
    RelativeCohesion,
    Dispersion,
}

impl CohesionNote {
    /// Classify a CV value.
    ///
    /// `[full, relative)` and `[relative, relative_upper)` both map to
    /// `RelativeCohesion`; the two bands are kept separate in the thresholds
    /// so a distinct label can be attached to the upper one later.
    #[allow(clippy::if_same_then_else)]
    pub fn from_cv(cv: f64, thresholds: &CohesionThresholds) -> Self {
        if !cv.is_finite() {
            CohesionNote::NotStudied
        } else if cv < thresholds.full {
            CohesionNote::FullCohesion
        } else if cv < thresholds.relative {
            CohesionNote::RelativeCohesion
        } else if cv < thresholds.relative_upper {
            CohesionNote::RelativeCohesion
        } else {
            CohesionNote::Dispersion
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CohesionNote::NotStudied => "لم تدرس",
            CohesionNote::FullCohesion => "هناك إنسجام تام",
            CohesionNote::RelativeCohesion => "هناك إنسجام نسبي",
            CohesionNote::Dispersion => "هناك تشتت واختلاف",
        }
    }
}

/// Pass / near-pass / fail split of the present scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoarseBands {
    /// Scores at or above the pass mark ("10 ≤").
    pub passing: Bucket,
    /// Scores in `[near_pass_mark, pass_mark)` ("من 8 إلى 9.99").
    pub near_pass: Bucket,
    /// Scores below the near-pass mark ("أقل من 08").
    pub failing: Bucket,
}

impl CoarseBands {
    pub const LABELS: [&'static str; 3] = ["10 ≤", "من 8 إلى 9.99", "أقل من 08"];

    pub fn compute(scores: &[f64], pass_mark: f64, near_pass_mark: f64) -> Self {
        let total = scores.len();
        let passing = scores.iter().filter(|&&s| s >= pass_mark).count();
        let near_pass = scores
            .iter()
            .filter(|&&s| s >= near_pass_mark && s < pass_mark)
            .count();
        let failing = scores.iter().filter(|&&s| s < near_pass_mark).count();
        Self {
            passing: Bucket::of(passing, total),
            near_pass: Bucket::of(near_pass, total),
            failing: Bucket::of(failing, total),
        }
    }

    pub fn buckets(&self) -> [Bucket; 3] {
        [self.passing, self.near_pass, self.failing]
    }
}

/// Five-way split of the scores around their own 20/40/60/80% cut values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quintiles {
    pub weak: Bucket,
    pub near_average: Bucket,
    pub average: Bucket,
    pub good: Bucket,
    pub very_good: Bucket,
}

impl Quintiles {
    pub const LABELS: [&'static str; 5] = [
        "الفئة الضعيفة",
        "الفئة القريبة من المتوسط",
        "الفئة المتوسطة",
        "الفئة الحسنة",
        "الفئة الجيدة",
    ];

    /// Cut values are `sorted[floor(n * k / 5)]` for k = 1..=4, without
    /// interpolation. Equal cut values collapse the buckets between them.
    pub fn compute(scores: &[f64]) -> Self {
        let n = scores.len();
        if n == 0 {
            return Self::default();
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let cut = |k: usize| sorted[n * k / 5];
        let (q1, q2, q3, q4) = (cut(1), cut(2), cut(3), cut(4));

        let count = |pred: &dyn Fn(f64) -> bool| scores.iter().filter(|&&s| pred(s)).count();

        Self {
            weak: Bucket::of(count(&|s: f64| s < q1), n),
            near_average: Bucket::of(count(&|s: f64| s >= q1 && s < q2), n),
            average: Bucket::of(count(&|s: f64| s >= q2 && s < q3), n),
            good: Bucket::of(count(&|s: f64| s >= q3 && s < q4), n),
            very_good: Bucket::of(count(&|s: f64| s >= q4), n),
        }
    }

    pub fn buckets(&self) -> [Bucket; 5] {
        [
            self.weak,
            self.near_average,
            self.average,
            self.good,
            self.very_good,
        ]
    }
}

/// One band of the seven-band distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineBand {
    pub label: String,
    /// Inclusive lower bound.
    pub lower: f64,
    /// Exclusive upper bound, except for the last band which also takes
    /// every score at or above its lower bound.
    pub upper: f64,
    pub count: usize,
    pub percentage: f64,
}

/// Lower bounds of the seven-band distribution, with their labels.
pub const FINE_BANDS: [(&str, f64); 7] = [
    ("0 - 8.99", 0.0),
    ("9 - 9.99", 9.0),
    ("10 - 11.99", 10.0),
    ("12 - 13.99", 12.0),
    ("14 - 15.99", 14.0),
    ("16 - 17.99", 16.0),
    ("18 - 20", 18.0),
];

/// Count scores into the seven fixed bands. Every score lands in exactly one band.
pub fn fine_distribution(scores: &[f64], max_score: f64) -> Vec<FineBand> {
    let total = scores.len();
    FINE_BANDS
        .iter()
        .enumerate()
        .map(|(i, (label, lower))| {
            let next = FINE_BANDS.get(i + 1).map(|(_, lo)| *lo);
            let count = scores
                .iter()
                .filter(|&&s| match next {
                    Some(upper) => s >= *lower && s < upper,
                    None => s >= *lower,
                })
                .count();
            FineBand {
                label: (*label).to_string(),
                lower: *lower,
                upper: next.unwrap_or(max_score),
                count,
                percentage: percent(count, total),
            }
        })
        .collect()
}

/// Statistics for one subject over some set of students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStatistics {
    pub subject: Subject,
    /// Display name of the subject.
    pub name: String,
    /// Number of present (non-zero) scores.
    pub present: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Coefficient of variation, in percent.
    pub coefficient_of_variation: f64,
    pub performance: PerformanceNote,
    pub cohesion: CohesionNote,
    pub success_count: usize,
    pub success_rate: f64,
    pub bands: CoarseBands,
    pub quintiles: Quintiles,
    pub distribution: Vec<FineBand>,
    pub best_score: f64,
    pub worst_score: f64,
}

impl SubjectStatistics {
    /// Whether at least one student has a score in this subject.
    pub fn has_scores(&self) -> bool {
        self.present > 0
    }
}

/// Compute every statistic for one subject. Absent (zero) scores are dropped first.
pub fn subject_statistics(
    subject: Subject,
    scores: &[f64],
    config: &IndicatorConfig,
) -> SubjectStatistics {
    let present_scores: Vec<f64> = scores.iter().copied().filter(|s| is_present_score(*s)).collect();
    let present = present_scores.len();

    let mean = mean(&present_scores);
    let std_dev = population_std_dev(&present_scores);
    let cv = coefficient_of_variation(mean, std_dev);

    let bands = CoarseBands::compute(&present_scores, config.pass_mark, config.near_pass_mark);
    let success_count = bands.passing.count;

    let cohesion = if present == 0 {
        CohesionNote::NotStudied
    } else {
        CohesionNote::from_cv(cv, &config.cohesion)
    };

    let best_score = present_scores.iter().copied().fold(0.0, f64::max);
    let worst_score = present_scores
        .iter()
        .copied()
        .reduce(f64::min)
        .unwrap_or(0.0);

    SubjectStatistics {
        subject,
        name: subject.display_name().to_string(),
        present,
        mean,
        std_dev,
        coefficient_of_variation: cv,
        performance: PerformanceNote::from_mean(mean, &config.performance),
        cohesion,
        success_count,
        success_rate: percent(success_count, present),
        bands,
        quintiles: Quintiles::compute(&present_scores),
        distribution: fine_distribution(&present_scores, config.max_score),
        best_score,
        worst_score,
    }
}

/// Present scores of one subject across a set of students.
pub fn present_scores_for<'a, I>(students: I, subject: Subject) -> Vec<f64>
where
    I: IntoIterator<Item = &'a StudentRecord>,
{
    students
        .into_iter()
        .map(|s| s.score(subject))
        .filter(|s| is_present_score(*s))
        .collect()
}
