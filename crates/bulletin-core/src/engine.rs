//! The indicator engine.
//!
//! Turns a snapshot of student records into a [`CompleteAnalysis`]: subject
//! statistics for the whole cohort and for each sex / repeater subgroup,
//! per-student orientation, class ranking, mention counts and the
//! cohort-level distribution tables. The engine holds nothing but its
//! configuration and never fails.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{IndicatorConfig, MentionThresholds, OrientationThresholds};
use crate::model::{Sex, StudentRecord, Subject};
use crate::recommendations::{recommend, Recommendation};
use crate::statistics::{mean, percent, present_scores_for, subject_statistics, Bucket, SubjectStatistics};

/// Which students a statistics pass runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentFilter {
    All,
    Male,
    Female,
    Repeater,
    NonRepeater,
}

impl StudentFilter {
    pub fn matches(self, student: &StudentRecord) -> bool {
        match self {
            StudentFilter::All => true,
            StudentFilter::Male => student.sex == Sex::Male,
            StudentFilter::Female => student.sex == Sex::Female,
            StudentFilter::Repeater => student.repeater,
            StudentFilter::NonRepeater => !student.repeater,
        }
    }
}

/// Statistics for every configured subject over the students matching `filter`.
///
/// Subjects nobody sat are kept (all zeros) so that subgroup tables line up
/// row for row.
pub fn subgroup_statistics(
    students: &[StudentRecord],
    filter: StudentFilter,
    config: &IndicatorConfig,
) -> Vec<SubjectStatistics> {
    let members: Vec<&StudentRecord> = students.iter().filter(|s| filter.matches(s)).collect();
    config
        .subjects
        .iter()
        .map(|&subject| {
            let scores = present_scores_for(members.iter().copied(), subject);
            subject_statistics(subject, &scores, config)
        })
        .collect()
}

/// Recommended track after the year, from the general average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Scientific,
    Technical,
    Vocational,
    RepeatYear,
    Undetermined,
}

impl Orientation {
    pub const ALL: [Orientation; 5] = [
        Orientation::Scientific,
        Orientation::Technical,
        Orientation::Vocational,
        Orientation::RepeatYear,
        Orientation::Undetermined,
    ];

    pub fn classify(general_average: f64, thresholds: &OrientationThresholds) -> Self {
        if !general_average.is_finite() {
            Orientation::Undetermined
        } else if general_average >= thresholds.scientific {
            Orientation::Scientific
        } else if general_average >= thresholds.technical {
            Orientation::Technical
        } else if general_average >= thresholds.vocational {
            Orientation::Vocational
        } else if general_average > 0.0 {
            Orientation::RepeatYear
        } else {
            Orientation::Undetermined
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Orientation::Scientific => "ثانوي علمي",
            Orientation::Technical => "ثانوي تقني",
            Orientation::Vocational => "ثانوي مهني",
            Orientation::RepeatYear => "إعادة السنة",
            Orientation::Undetermined => "غير محدد",
        }
    }
}

/// Per-student orientation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentOrientation {
    pub id: String,
    pub name: String,
    pub sex: Sex,
    pub repeater: bool,
    pub class: String,
    pub level: String,
    pub general_average: f64,
    /// Mean of the science subjects (absent counted as 0).
    pub sciences: f64,
    /// Mean of the arts subjects (absent counted as 0).
    pub arts: f64,
    pub orientation: Orientation,
}

fn raw_mean(student: &StudentRecord, subjects: &[Subject]) -> f64 {
    let values: Vec<f64> = subjects.iter().map(|&s| student.score(s)).collect();
    mean(&values)
}

fn orient(student: &StudentRecord, config: &IndicatorConfig) -> StudentOrientation {
    let general_average = student.general_average();
    StudentOrientation {
        id: student.id.clone(),
        name: student.name.clone(),
        sex: student.sex,
        repeater: student.repeater,
        class: student.class.clone(),
        level: student.level.clone(),
        general_average,
        sciences: raw_mean(student, &config.science_subjects),
        arts: raw_mean(student, &config.arts_subjects),
        orientation: Orientation::classify(general_average, &config.orientation),
    }
}

/// One class in the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRanking {
    pub class: String,
    pub student_count: usize,
    /// Mean of every present score of every student in the class.
    pub mean: f64,
    /// 1 = best.
    pub rank: usize,
}

/// Rank classes by the flattened mean of their present scores.
///
/// Classes are grouped in first-seen order and sorted with a stable sort,
/// so ties keep that order.
pub fn rank_classes(students: &[StudentRecord]) -> Vec<ClassRanking> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&StudentRecord>)> = Vec::new();
    for student in students {
        let slot = *index.entry(student.class.as_str()).or_insert_with(|| {
            groups.push((student.class.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(student);
    }

    let mut ranking: Vec<ClassRanking> = groups
        .into_iter()
        .map(|(class, members)| {
            let scores: Vec<f64> = members.iter().flat_map(|s| s.present_scores()).collect();
            ClassRanking {
                class: class.to_string(),
                student_count: members.len(),
                mean: mean(&scores),
                rank: 0,
            }
        })
        .collect();

    ranking.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(std::cmp::Ordering::Equal));
    for (i, entry) in ranking.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    ranking
}

/// Merit category from a student's personal mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mention {
    Excellence,
    Congratulations,
    Encouragement,
    HonorRoll,
    Observation,
}

impl Mention {
    pub const ALL: [Mention; 5] = [
        Mention::Excellence,
        Mention::Congratulations,
        Mention::Encouragement,
        Mention::HonorRoll,
        Mention::Observation,
    ];

    pub fn classify(personal_mean: f64, thresholds: &MentionThresholds) -> Self {
        if personal_mean >= thresholds.excellence {
            Mention::Excellence
        } else if personal_mean >= thresholds.congratulations {
            Mention::Congratulations
        } else if personal_mean >= thresholds.encouragement {
            Mention::Encouragement
        } else if personal_mean >= thresholds.honor_roll {
            Mention::HonorRoll
        } else {
            Mention::Observation
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mention::Excellence => "امتياز",
            Mention::Congratulations => "تهنئة",
            Mention::Encouragement => "تشجيع",
            Mention::HonorRoll => "لوحة شرف",
            Mention::Observation => "ملاحظة",
        }
    }
}

/// Mention counts over the whole cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitativeIndicators {
    pub excellence: Bucket,
    pub congratulations: Bucket,
    pub encouragement: Bucket,
    pub honor_roll: Bucket,
    pub observation: Bucket,
}

impl QualitativeIndicators {
    pub fn get(&self, mention: Mention) -> Bucket {
        match mention {
            Mention::Excellence => self.excellence,
            Mention::Congratulations => self.congratulations,
            Mention::Encouragement => self.encouragement,
            Mention::HonorRoll => self.honor_roll,
            Mention::Observation => self.observation,
        }
    }
}

/// Classify every student by personal mean. Percentages use the student count.
pub fn qualitative_indicators(
    students: &[StudentRecord],
    thresholds: &MentionThresholds,
) -> QualitativeIndicators {
    let total = students.len();
    let mut counts = [0usize; 5];
    for student in students {
        let mention = Mention::classify(student.personal_mean(), thresholds);
        counts[mention as usize] += 1;
    }
    QualitativeIndicators {
        excellence: Bucket::of(counts[Mention::Excellence as usize], total),
        congratulations: Bucket::of(counts[Mention::Congratulations as usize], total),
        encouragement: Bucket::of(counts[Mention::Encouragement as usize], total),
        honor_roll: Bucket::of(counts[Mention::HonorRoll as usize], total),
        observation: Bucket::of(counts[Mention::Observation as usize], total),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SexSplit {
    pub male: Bucket,
    pub female: Bucket,
    pub total: Bucket,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatSplit {
    pub repeaters: Bucket,
    pub non_repeaters: Bucket,
    pub total: Bucket,
}

/// Students in one orientation track, overall and per sex.
///
/// `male` and `female` percentages are relative to that sex's head count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationCount {
    pub orientation: Orientation,
    pub total: Bucket,
    pub male: Bucket,
    pub female: Bucket,
}

/// Head counts of the cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub gender: SexSplit,
    pub repeat: RepeatSplit,
    pub orientation: Vec<OrientationCount>,
}

fn distribution_stats(students: &[StudentRecord], oriented: &[StudentOrientation]) -> DistributionStats {
    let total = students.len();
    let males = students.iter().filter(|s| s.sex == Sex::Male).count();
    let females = total - males;
    let repeaters = students.iter().filter(|s| s.repeater).count();

    let orientation = Orientation::ALL
        .iter()
        .map(|&orientation| {
            let in_track = oriented.iter().filter(|o| o.orientation == orientation);
            let (mut male, mut female) = (0usize, 0usize);
            for o in in_track {
                match o.sex {
                    Sex::Male => male += 1,
                    Sex::Female => female += 1,
                }
            }
            OrientationCount {
                orientation,
                total: Bucket::of(male + female, total),
                male: Bucket::of(male, males),
                female: Bucket::of(female, females),
            }
        })
        .collect();

    DistributionStats {
        gender: SexSplit {
            male: Bucket::of(males, total),
            female: Bucket::of(females, total),
            total: Bucket::of(total, total),
        },
        repeat: RepeatSplit {
            repeaters: Bucket::of(repeaters, total),
            non_repeaters: Bucket::of(total - repeaters, total),
            total: Bucket::of(total, total),
        },
        orientation,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenderAnalysis {
    pub male: Vec<SubjectStatistics>,
    pub female: Vec<SubjectStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatAnalysis {
    pub repeaters: Vec<SubjectStatistics>,
    pub non_repeaters: Vec<SubjectStatistics>,
}

/// A student singled out in the highlights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedStudent {
    pub id: String,
    pub name: String,
    pub class: String,
    pub general_average: f64,
}

/// Cohort-wide headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    /// Mean of the non-zero general averages.
    pub general_mean: f64,
    /// Share of all students whose general average reaches the pass mark.
    pub success_rate: f64,
    pub repeat_rate: f64,
    /// Weakest first.
    pub in_difficulty: Vec<HighlightedStudent>,
    /// Strongest first.
    pub excellent: Vec<HighlightedStudent>,
}

fn highlights(oriented: &[StudentOrientation], config: &IndicatorConfig) -> Highlights {
    let total = oriented.len();
    let averages: Vec<f64> = oriented
        .iter()
        .map(|o| o.general_average)
        .filter(|a| *a > 0.0)
        .collect();
    let passing = averages.iter().filter(|&&a| a >= config.pass_mark).count();
    let repeaters = oriented.iter().filter(|o| o.repeater).count();

    let pick = |o: &StudentOrientation| HighlightedStudent {
        id: o.id.clone(),
        name: o.name.clone(),
        class: o.class.clone(),
        general_average: o.general_average,
    };
    let by_average = |a: &HighlightedStudent, b: &HighlightedStudent| {
        a.general_average
            .partial_cmp(&b.general_average)
            .unwrap_or(std::cmp::Ordering::Equal)
    };

    let t = &config.highlights;
    let mut in_difficulty: Vec<HighlightedStudent> = oriented
        .iter()
        .filter(|o| o.general_average > 0.0 && o.general_average < t.difficulty_below)
        .map(pick)
        .collect();
    in_difficulty.sort_by(by_average);

    let mut excellent: Vec<HighlightedStudent> = oriented
        .iter()
        .filter(|o| o.general_average >= t.excellent_from)
        .map(pick)
        .collect();
    excellent.sort_by(|a, b| by_average(b, a));

    Highlights {
        general_mean: mean(&averages),
        success_rate: percent(passing, total),
        repeat_rate: percent(repeaters, total),
        in_difficulty,
        excellent,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub total_students: usize,
    pub semester: String,
    pub level: String,
}

/// Everything the reporting layer needs for one cohort and semester.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompleteAnalysis {
    pub students: Vec<StudentOrientation>,
    /// Subjects with at least one present score.
    pub subjects: Vec<SubjectStatistics>,
    pub gender_analysis: GenderAnalysis,
    pub repeat_analysis: RepeatAnalysis,
    pub class_ranking: Vec<ClassRanking>,
    pub qualitative_indicators: QualitativeIndicators,
    pub distribution: DistributionStats,
    pub highlights: Highlights,
    pub recommendations: Vec<Recommendation>,
    pub meta: AnalysisMeta,
}

impl CompleteAnalysis {
    /// Statistics of one subject from the top-level list.
    pub fn subject(&self, subject: Subject) -> Option<&SubjectStatistics> {
        self.subjects.iter().find(|s| s.subject == subject)
    }
}

/// The indicator engine, bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Analyse a cohort. Never fails; empty input yields an all-zero analysis.
    pub fn analyze(&self, students: &[StudentRecord], semester: &str, level: &str) -> CompleteAnalysis {
        let config = &self.config;
        tracing::debug!(
            "analyzing {} students ({} / {})",
            students.len(),
            semester,
            level
        );

        let oriented: Vec<StudentOrientation> = students.iter().map(|s| orient(s, config)).collect();

        let subjects: Vec<SubjectStatistics> = subgroup_statistics(students, StudentFilter::All, config)
            .into_iter()
            .filter(SubjectStatistics::has_scores)
            .collect();

        let gender_analysis = GenderAnalysis {
            male: subgroup_statistics(students, StudentFilter::Male, config),
            female: subgroup_statistics(students, StudentFilter::Female, config),
        };
        let repeat_analysis = RepeatAnalysis {
            repeaters: subgroup_statistics(students, StudentFilter::Repeater, config),
            non_repeaters: subgroup_statistics(students, StudentFilter::NonRepeater, config),
        };

        let class_ranking = rank_classes(students);
        let qualitative_indicators = qualitative_indicators(students, &config.mentions);
        let distribution = distribution_stats(students, &oriented);
        let highlights = highlights(&oriented, config);

        let mut analysis = CompleteAnalysis {
            students: oriented,
            subjects,
            gender_analysis,
            repeat_analysis,
            class_ranking,
            qualitative_indicators,
            distribution,
            highlights,
            recommendations: Vec::new(),
            meta: AnalysisMeta {
                total_students: students.len(),
                semester: semester.to_string(),
                level: level.to_string(),
            },
        };
        analysis.recommendations = recommend(&analysis, &config.recommendations);

        tracing::debug!(
            "analysis done: {} subjects with scores, {} classes, {} recommendations",
            analysis.subjects.len(),
            analysis.class_ranking.len(),
            analysis.recommendations.len()
        );
        analysis
    }
}

/// Analyse a cohort with the default indicator tables.
pub fn analyze(students: &[StudentRecord], semester: &str, level: &str) -> CompleteAnalysis {
    IndicatorEngine::default().analyze(students, semester, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, sex: Sex, class: &str, scores: &[(Subject, f64)]) -> StudentRecord {
        scores.iter().fold(
            StudentRecord::new(id, format!("student {id}"), sex, class).with_level("4AM"),
            |s, &(subject, score)| s.with_score(subject, score),
        )
    }

    fn uniform(id: &str, sex: Sex, class: &str, score: f64) -> StudentRecord {
        let scores: Vec<(Subject, f64)> = Subject::ALL.iter().map(|&s| (s, score)).collect();
        student(id, sex, class, &scores)
    }

    #[test]
    fn empty_input_yields_empty_analysis() {
        let analysis = analyze(&[], "S1", "4AM");
        assert_eq!(analysis.meta.total_students, 0);
        assert_eq!(analysis.meta.semester, "S1");
        assert!(analysis.subjects.is_empty());
        assert!(analysis.class_ranking.is_empty());
        assert!(analysis.students.is_empty());
        assert!(analysis.recommendations.is_empty());
        for mention in Mention::ALL {
            let bucket = analysis.qualitative_indicators.get(mention);
            assert_eq!(bucket.count, 0);
            assert_eq!(bucket.percentage, 0.0);
        }
        assert_eq!(analysis.distribution.gender.male.percentage, 0.0);
        assert_eq!(analysis.highlights.success_rate, 0.0);
        // Subgroup tables keep every configured subject even when empty.
        assert_eq!(analysis.gender_analysis.male.len(), 14);
        assert_eq!(analysis.repeat_analysis.repeaters.len(), 14);
    }

    #[test]
    fn class_ranking_orders_by_mean() {
        let students = vec![
            student("1", Sex::Male, "A", &[(Subject::Arabic, 15.0)]),
            student("2", Sex::Female, "B", &[(Subject::Arabic, 12.0)]),
            student("3", Sex::Male, "C", &[(Subject::Arabic, 18.0)]),
        ];
        let ranking = rank_classes(&students);
        let order: Vec<(&str, usize)> = ranking.iter().map(|r| (r.class.as_str(), r.rank)).collect();
        assert_eq!(order, vec![("C", 1), ("A", 2), ("B", 3)]);
    }

    #[test]
    fn class_ranking_flattens_scores_and_keeps_tie_order() {
        let students = vec![
            // class X: scores 10, 20, 12 -> flattened mean 14 (average of
            // per-student means would be 13.5)
            student("1", Sex::Male, "X", &[(Subject::Arabic, 10.0), (Subject::French, 20.0)]),
            student("2", Sex::Male, "X", &[(Subject::Arabic, 12.0)]),
            student("3", Sex::Female, "Y", &[(Subject::Arabic, 14.0)]),
            student("4", Sex::Female, "Z", &[(Subject::Arabic, 14.0), (Subject::Music, 0.0)]),
        ];
        let ranking = rank_classes(&students);
        assert!((ranking[0].mean - 14.0).abs() < 1e-10);
        let order: Vec<&str> = ranking.iter().map(|r| r.class.as_str()).collect();
        assert_eq!(order, vec!["X", "Y", "Z"]);
        assert_eq!(ranking[0].student_count, 2);
    }

    #[test]
    fn qualitative_indicators_one_per_bucket() {
        let students: Vec<StudentRecord> = [19.0, 16.0, 14.5, 12.5, 9.0]
            .iter()
            .enumerate()
            .map(|(i, &m)| uniform(&i.to_string(), Sex::Male, "A", m))
            .collect();
        let q = qualitative_indicators(&students, &MentionThresholds::default());
        for mention in Mention::ALL {
            let bucket = q.get(mention);
            assert_eq!(bucket.count, 1, "{mention:?}");
            assert!((bucket.percentage - 20.0).abs() < 1e-10);
        }
    }

    #[test]
    fn orientation_thresholds() {
        let t = OrientationThresholds::default();
        assert_eq!(Orientation::classify(16.0, &t), Orientation::Scientific);
        assert_eq!(Orientation::classify(14.0, &t), Orientation::Technical);
        assert_eq!(Orientation::classify(10.0, &t), Orientation::Vocational);
        assert_eq!(Orientation::classify(0.5, &t), Orientation::RepeatYear);
        assert_eq!(Orientation::classify(0.0, &t), Orientation::Undetermined);
    }

    #[test]
    fn sub_averages_count_absent_as_zero() {
        let s = student(
            "1",
            Sex::Female,
            "A",
            &[
                (Subject::Mathematics, 18.0),
                (Subject::Physics, 12.0),
                (Subject::Arabic, 15.0),
                (Subject::French, 12.0),
                (Subject::HistoryGeography, 9.0),
            ],
        );
        let o = orient(&s, &IndicatorConfig::default());
        assert!((o.sciences - 10.0).abs() < 1e-10);
        assert!((o.arts - 12.0).abs() < 1e-10);
    }

    #[test]
    fn non_finite_scores_are_absent() {
        let s = student(
            "1",
            Sex::Male,
            "A",
            &[
                (Subject::Mathematics, f64::NAN),
                (Subject::Physics, 12.0),
                (Subject::Arabic, f64::INFINITY),
            ],
        );
        let o = orient(&s, &IndicatorConfig::default());
        assert!(o.sciences.is_finite() && o.arts.is_finite());
        assert!((o.sciences - 4.0).abs() < 1e-10);
        assert_eq!(o.arts, 0.0);

        let analysis = analyze(&[s], "S1", "4AM");
        assert!(analysis.subject(Subject::Mathematics).is_none());
        let json = serde_json::to_string(&analysis).unwrap();
        let back: CompleteAnalysis = serde_json::from_str(&json).unwrap();
        assert!((back.students[0].sciences - 4.0).abs() < 1e-10);
    }

    #[test]
    fn supplied_general_average_drives_orientation() {
        let s = uniform("1", Sex::Male, "A", 11.0).with_general_average(16.5);
        let analysis = analyze(&[s], "S1", "4AM");
        assert_eq!(analysis.students[0].orientation, Orientation::Scientific);
        assert_eq!(analysis.students[0].general_average, 16.5);
    }

    #[test]
    fn all_absent_student_is_counted_but_never_scored() {
        let absent = student("9", Sex::Male, "A", &[(Subject::Arabic, 0.0), (Subject::Mathematics, 0.0)]);
        let present = student("1", Sex::Female, "A", &[(Subject::Arabic, 12.0), (Subject::Mathematics, 8.0)]);
        let analysis = analyze(&[absent, present], "S1", "4AM");

        assert_eq!(analysis.meta.total_students, 2);
        assert_eq!(analysis.students.len(), 2);
        assert_eq!(analysis.students[0].orientation, Orientation::Undetermined);
        assert_eq!(analysis.students[0].general_average, 0.0);

        let arabic = analysis.subject(Subject::Arabic).unwrap();
        assert_eq!(arabic.present, 1);
        let bands: usize = arabic.bands.buckets().iter().map(|b| b.count).sum();
        assert_eq!(bands, 1);
        // The absent student still lands in the observation bucket.
        assert_eq!(analysis.qualitative_indicators.observation.count, 2);
    }

    #[test]
    fn top_level_subjects_drop_empty_ones_but_subgroups_keep_them() {
        let students = vec![
            student("1", Sex::Male, "A", &[(Subject::Arabic, 12.0)]),
            student("2", Sex::Female, "A", &[(Subject::Arabic, 14.0), (Subject::Music, 16.0)]),
        ];
        let analysis = analyze(&students, "S1", "4AM");

        let listed: Vec<Subject> = analysis.subjects.iter().map(|s| s.subject).collect();
        assert_eq!(listed, vec![Subject::Arabic, Subject::Music]);

        assert_eq!(analysis.gender_analysis.male.len(), 14);
        assert_eq!(analysis.gender_analysis.female.len(), 14);
        assert_eq!(analysis.repeat_analysis.repeaters.len(), 14);
        assert_eq!(analysis.repeat_analysis.non_repeaters.len(), 14);
        let male_music = &analysis.gender_analysis.male[Subject::Music as usize];
        assert_eq!(male_music.subject, Subject::Music);
        assert_eq!(male_music.present, 0);
    }

    #[test]
    fn sex_split_reconciles_with_overall_counts() {
        let students = vec![
            student("1", Sex::Male, "A", &[(Subject::Arabic, 12.0), (Subject::French, 7.0)]),
            student("2", Sex::Female, "A", &[(Subject::Arabic, 14.0)]),
            student("3", Sex::Female, "B", &[(Subject::Arabic, 0.0), (Subject::French, 11.0)]),
            student("4", Sex::Male, "B", &[(Subject::Mathematics, 9.0)]),
        ];
        let analysis = analyze(&students, "S1", "4AM");
        let overall = subgroup_statistics(&students, StudentFilter::All, &IndicatorConfig::default());
        for (i, all) in overall.iter().enumerate() {
            let male = &analysis.gender_analysis.male[i];
            let female = &analysis.gender_analysis.female[i];
            assert_eq!(male.present + female.present, all.present, "{}", all.subject);
            let repeat = &analysis.repeat_analysis;
            assert_eq!(
                repeat.repeaters[i].present + repeat.non_repeaters[i].present,
                all.present
            );
        }
    }

    #[test]
    fn distribution_cross_tab_uses_sex_field() {
        let students = vec![
            uniform("1", Sex::Male, "A", 17.0),
            uniform("2", Sex::Male, "A", 11.0),
            uniform("3", Sex::Female, "A", 17.5).with_repeater(true),
            uniform("4", Sex::Female, "B", 8.0),
        ];
        let analysis = analyze(&students, "S1", "4AM");
        let d = &analysis.distribution;

        assert_eq!(d.gender.male.count, 2);
        assert!((d.gender.female.percentage - 50.0).abs() < 1e-10);
        assert_eq!(d.repeat.repeaters.count, 1);
        assert_eq!(d.repeat.total.count, 4);

        let scientific = d
            .orientation
            .iter()
            .find(|o| o.orientation == Orientation::Scientific)
            .unwrap();
        assert_eq!(scientific.total.count, 2);
        assert_eq!(scientific.male.count, 1);
        assert_eq!(scientific.female.count, 1);
        assert!((scientific.male.percentage - 50.0).abs() < 1e-10);

        let per_track: usize = d.orientation.iter().map(|o| o.total.count).sum();
        assert_eq!(per_track, 4);
    }

    #[test]
    fn highlights_sort_students() {
        let students = vec![
            uniform("1", Sex::Male, "A", 9.0),
            uniform("2", Sex::Male, "A", 17.0),
            uniform("3", Sex::Female, "A", 6.0),
            uniform("4", Sex::Female, "B", 18.5),
            uniform("5", Sex::Female, "B", 12.0),
        ];
        let analysis = analyze(&students, "S1", "4AM");
        let h = &analysis.highlights;

        let weak: Vec<&str> = h.in_difficulty.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(weak, vec!["3", "1"]);
        let strong: Vec<&str> = h.excellent.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(strong, vec!["4", "2"]);
        assert!((h.success_rate - 60.0).abs() < 1e-10);
        assert!((h.general_mean - 12.5).abs() < 1e-10);
    }

    #[test]
    fn custom_config_changes_subjects_and_marks() {
        let config = IndicatorConfig {
            subjects: vec![Subject::Mathematics, Subject::Physics],
            pass_mark: 12.0,
            ..Default::default()
        };
        let engine = IndicatorEngine::new(config);
        let students = vec![
            student("1", Sex::Male, "A", &[(Subject::Mathematics, 11.0), (Subject::Arabic, 15.0)]),
            student("2", Sex::Female, "A", &[(Subject::Mathematics, 13.0)]),
        ];
        let analysis = engine.analyze(&students, "S2", "4AM");
        assert_eq!(analysis.subjects.len(), 1);
        assert_eq!(analysis.subjects[0].success_count, 1);
        assert_eq!(analysis.gender_analysis.male.len(), 2);
    }
}
