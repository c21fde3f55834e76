//! CSV export of the subject statistics table.
//!
//! One row per subject, in report order, with the counts of every band so
//! the file can be reopened in a spreadsheet and charted directly.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use bulletin_core::report::AnalysisReport;
use bulletin_core::statistics::{CoarseBands, Quintiles, FINE_BANDS};

fn header() -> Vec<String> {
    let mut columns: Vec<String> = [
        "subject",
        "name",
        "present",
        "mean",
        "std_dev",
        "coefficient_of_variation",
        "success_count",
        "success_rate",
        "best_score",
        "worst_score",
        "performance",
        "cohesion",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    columns.extend(CoarseBands::LABELS.iter().map(|l| format!("band {l}")));
    columns.extend(Quintiles::LABELS.iter().map(|l| format!("quintile {l}")));
    columns.extend(FINE_BANDS.iter().map(|(l, _)| format!("range {l}")));
    columns
}

/// Write the subject table of `report` as CSV to any writer.
pub fn write_subjects_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(header())?;

    for s in &report.analysis.subjects {
        let mut row = vec![
            s.subject.key().to_string(),
            s.name.clone(),
            s.present.to_string(),
            format!("{:.2}", s.mean),
            format!("{:.2}", s.std_dev),
            format!("{:.2}", s.coefficient_of_variation),
            s.success_count.to_string(),
            format!("{:.2}", s.success_rate),
            format!("{:.2}", s.best_score),
            format!("{:.2}", s.worst_score),
            s.performance.label().to_string(),
            s.cohesion.label().to_string(),
        ];
        row.extend(s.bands.buckets().iter().map(|b| b.count.to_string()));
        row.extend(s.quintiles.buckets().iter().map(|b| b.count.to_string()));
        row.extend(s.distribution.iter().map(|b| b.count.to_string()));
        out.write_record(&row)?;
    }

    out.flush()?;
    Ok(())
}

/// Write the subject table to a file.
pub fn write_csv_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_subjects_csv(report, file)
}
