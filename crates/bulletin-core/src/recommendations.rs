//! Pedagogical recommendations derived from a finished analysis.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::RecommendationThresholds;
use crate::engine::CompleteAnalysis;
use crate::model::Subject;
use crate::statistics::percent;

/// One recommendation, with the figure that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    LowSuccessRate { success_rate: f64 },
    HighRepeatRate { repeat_rate: f64 },
    WeakSubject { subject: Subject, success_rate: f64 },
    ManyStudentsInDifficulty { share: f64 },
    GenderImbalance { male: usize, female: usize },
    WeakClass { class: String, mean: f64 },
}

impl Recommendation {
    /// Arabic message shown in reports.
    pub fn message(&self) -> String {
        match self {
            Recommendation::LowSuccessRate { success_rate } => format!(
                "تحسين معدل النجاح يتطلب تدابير إضافية للدعم التربوي (معدل النجاح: {success_rate:.1}%)"
            ),
            Recommendation::HighRepeatRate { repeat_rate } => format!(
                "معدل الإعادة مرتفع، ينصح بمراجعة استراتيجيات التدريس (معدل الإعادة: {repeat_rate:.1}%)"
            ),
            Recommendation::WeakSubject {
                subject,
                success_rate,
            } => format!(
                "مادة {} تحتاج إلى دعم خاص (معدل النجاح: {success_rate:.1}%)",
                subject.display_name()
            ),
            Recommendation::ManyStudentsInDifficulty { share } => format!(
                "عدد كبير من التلاميذ في صعوبة، ينصح ببرامج دعم مكثفة ({share:.1}%)"
            ),
            Recommendation::GenderImbalance { male, female } => format!(
                "يُنصح بمراجعة استراتيجيات التدريس لضمان المساواة بين الجنسين (الإناث: {female}، الذكور: {male})"
            ),
            Recommendation::WeakClass { class, mean } => {
                format!("قسم {class} يحتاج إلى دعم خاص (المعدل: {mean:.2})")
            }
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Evaluate every trigger against `analysis`.
///
/// An analysis with no students yields nothing.
pub fn recommend(
    analysis: &CompleteAnalysis,
    thresholds: &RecommendationThresholds,
) -> Vec<Recommendation> {
    let total = analysis.meta.total_students;
    if total == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let highlights = &analysis.highlights;

    if highlights.success_rate < thresholds.min_success_rate {
        out.push(Recommendation::LowSuccessRate {
            success_rate: highlights.success_rate,
        });
    }

    if highlights.repeat_rate > thresholds.max_repeat_rate {
        out.push(Recommendation::HighRepeatRate {
            repeat_rate: highlights.repeat_rate,
        });
    }

    if let Some(weak) = analysis
        .subjects
        .iter()
        .find(|s| s.success_rate < thresholds.min_subject_success_rate)
    {
        out.push(Recommendation::WeakSubject {
            subject: weak.subject,
            success_rate: weak.success_rate,
        });
    }

    let share = percent(highlights.in_difficulty.len(), total);
    if share > thresholds.max_difficulty_share {
        out.push(Recommendation::ManyStudentsInDifficulty { share });
    }

    let male = analysis.distribution.gender.male.count;
    let female = analysis.distribution.gender.female.count;
    if female as f64 > male as f64 * thresholds.gender_imbalance_ratio {
        out.push(Recommendation::GenderImbalance { male, female });
    }

    // Classes are checked in the order they first appear in the roster.
    let mut seen = HashSet::new();
    let weak_class = analysis
        .students
        .iter()
        .map(|s| s.class.as_str())
        .filter(|c| seen.insert(*c))
        .filter_map(|c| analysis.class_ranking.iter().find(|r| r.class == c))
        .find(|r| r.mean > 0.0 && r.mean < thresholds.min_class_mean);
    if let Some(class) = weak_class {
        out.push(Recommendation::WeakClass {
            class: class.class.clone(),
            mean: class.mean,
        });
    }

    out
}
