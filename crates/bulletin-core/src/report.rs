//! Analysis report types with JSON persistence and semester comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CompleteAnalysis;
use crate::model::{Roster, Subject};

/// A saved analysis of one cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub school_name: Option<String>,
    /// Where the students came from.
    pub roster: RosterSummary,
    pub analysis: CompleteAnalysis,
}

/// Summary of the analysed roster(s), without the student records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSummary {
    pub id: String,
    pub name: String,
    pub student_count: usize,
}

impl RosterSummary {
    /// Summarise one or more rosters analysed together.
    pub fn of(rosters: &[Roster]) -> Self {
        let ids: Vec<&str> = rosters.iter().map(|r| r.id.as_str()).collect();
        let names: Vec<&str> = rosters.iter().map(|r| r.name.as_str()).collect();
        Self {
            id: ids.join("+"),
            name: names.join(", "),
            student_count: rosters.iter().map(|r| r.students.len()).sum(),
        }
    }
}

impl AnalysisReport {
    pub fn new(roster: RosterSummary, analysis: CompleteAnalysis) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            school_name: None,
            roster,
            analysis,
        }
    }

    pub fn with_school_name(mut self, name: Option<String>) -> Self {
        self.school_name = name;
        self
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AnalysisReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline (typically the previous semester).
    ///
    /// A subject whose mean moved by more than `threshold` points is a
    /// regression or an improvement.
    pub fn compare(&self, baseline: &AnalysisReport, threshold: f64) -> ProgressReport {
        let means = |report: &AnalysisReport| -> BTreeMap<Subject, f64> {
            report
                .analysis
                .subjects
                .iter()
                .map(|s| (s.subject, s.mean))
                .collect()
        };

        let baseline_means = means(baseline);
        let current_means = means(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_subjects = Vec::new();

        for (&subject, &current) in &current_means {
            let Some(&baseline_mean) = baseline_means.get(&subject) else {
                new_subjects.push(subject);
                continue;
            };
            let change = SubjectChange {
                subject,
                baseline_mean,
                current_mean: current,
                delta: current - baseline_mean,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_subjects = baseline_means
            .keys()
            .filter(|s| !current_means.contains_key(*s))
            .copied()
            .collect();

        let baseline_rate = baseline.analysis.highlights.success_rate;
        let current_rate = self.analysis.highlights.success_rate;

        ProgressReport {
            baseline_semester: baseline.analysis.meta.semester.clone(),
            current_semester: self.analysis.meta.semester.clone(),
            regressions,
            improvements,
            unchanged,
            new_subjects,
            removed_subjects,
            baseline_success_rate: baseline_rate,
            current_success_rate: current_rate,
            success_rate_delta: current_rate - baseline_rate,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_semester: String,
    pub current_semester: String,
    /// Subjects whose mean went down.
    pub regressions: Vec<SubjectChange>,
    /// Subjects whose mean went up.
    pub improvements: Vec<SubjectChange>,
    /// Subjects with no significant change.
    pub unchanged: usize,
    /// Subjects scored in current but not baseline.
    pub new_subjects: Vec<Subject>,
    /// Subjects scored in baseline but not current.
    pub removed_subjects: Vec<Subject>,
    pub baseline_success_rate: f64,
    pub current_success_rate: f64,
    pub success_rate_delta: f64,
}

/// Mean movement of one subject between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectChange {
    pub subject: Subject,
    pub baseline_mean: f64,
    pub current_mean: f64,
    pub delta: f64,
}

impl ProgressReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## {} → {}\n\n",
            self.baseline_semester, self.current_semester
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));
        md.push_str(&format!(
            "**Success rate:** {:.1}% → {:.1}% ({:+.1})\n\n",
            self.baseline_success_rate, self.current_success_rate, self.success_rate_delta
        ));

        let table = |md: &mut String, title: &str, rows: &[SubjectChange]| {
            if rows.is_empty() {
                return;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Subject | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for r in rows {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:+.2} |\n",
                    r.subject.display_name(),
                    r.baseline_mean,
                    r.current_mean,
                    r.delta
                ));
            }
            md.push('\n');
        };
        table(&mut md, "Regressions", &self.regressions);
        table(&mut md, "Improvements", &self.improvements);

        if !self.new_subjects.is_empty() {
            let names: Vec<&str> = self.new_subjects.iter().map(|s| s.display_name()).collect();
            md.push_str(&format!("**New subjects:** {}\n\n", names.join("، ")));
        }
        if !self.removed_subjects.is_empty() {
            let names: Vec<&str> = self
                .removed_subjects
                .iter()
                .map(|s| s.display_name())
                .collect();
            md.push_str(&format!("**Removed subjects:** {}\n\n", names.join("، ")));
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
