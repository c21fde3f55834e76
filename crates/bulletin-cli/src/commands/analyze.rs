//! The `bulletin analyze` command.

use std::path::PathBuf;

use anyhow::Result;

use bulletin_core::config::load_config_from;
use bulletin_core::engine::{IndicatorEngine, Mention};
use bulletin_core::parser;
use bulletin_core::report::{AnalysisReport, RosterSummary};
use bulletin_report::csv_export::write_csv_report;
use bulletin_report::html::write_html_report;

pub fn execute(
    roster_path: PathBuf,
    semester: String,
    level: String,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
) -> Result<()> {
    anyhow::ensure!(!semester.trim().is_empty(), "semester must not be empty");
    anyhow::ensure!(!level.trim().is_empty(), "level must not be empty");

    let config = load_config_from(config_path.as_deref())?;
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let format = format.unwrap_or_else(|| config.default_format.clone());

    let rosters = parser::load_rosters(&roster_path)?;
    anyhow::ensure!(
        !rosters.is_empty(),
        "no roster found under {}",
        roster_path.display()
    );

    let students: Vec<_> = rosters
        .iter()
        .flat_map(|r| r.students.iter().cloned())
        .collect();
    tracing::info!(
        "loaded {} students from {} roster(s)",
        students.len(),
        rosters.len()
    );

    let engine = IndicatorEngine::new(config.indicators.clone());
    let analysis = engine.analyze(&students, &semester, &level);
    let report = AnalysisReport::new(RosterSummary::of(&rosters), analysis)
        .with_school_name(Some(config.school_name.clone()).filter(|n| !n.is_empty()));

    print_summary(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let stem = format!("analysis-{}-{}-{timestamp}", slug(&level), slug(&semester));

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "csv"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Analysis saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "csv" => {
                let path = output.join(format!("{stem}.csv"));
                write_csv_report(&report, &path)?;
                eprintln!("CSV export: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

/// File-name-safe version of a label.
fn slug(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn print_summary(report: &AnalysisReport) {
    use comfy_table::{Cell, Table};

    let analysis = &report.analysis;
    let h = &analysis.highlights;
    eprintln!(
        "\n{} — {} | {} students | mean {:.2} | success {:.1}% | repeaters {:.1}%",
        analysis.meta.level,
        analysis.meta.semester,
        analysis.meta.total_students,
        h.general_mean,
        h.success_rate,
        h.repeat_rate
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Subject", "Present", "Mean", "Std dev", "CV %", "Success %", "Best", "Worst",
    ]);
    for s in &analysis.subjects {
        table.add_row(vec![
            Cell::new(s.subject.key()),
            Cell::new(s.present),
            Cell::new(format!("{:.2}", s.mean)),
            Cell::new(format!("{:.2}", s.std_dev)),
            Cell::new(format!("{:.1}", s.coefficient_of_variation)),
            Cell::new(format!("{:.1}%", s.success_rate)),
            Cell::new(format!("{:.2}", s.best_score)),
            Cell::new(format!("{:.2}", s.worst_score)),
        ]);
    }
    eprintln!("\n{table}");

    let mut ranking = Table::new();
    ranking.set_header(vec!["Rank", "Class", "Students", "Mean"]);
    for c in &analysis.class_ranking {
        ranking.add_row(vec![
            Cell::new(c.rank),
            Cell::new(&c.class),
            Cell::new(c.student_count),
            Cell::new(format!("{:.2}", c.mean)),
        ]);
    }
    eprintln!("\n{ranking}");

    let mentions: Vec<String> = Mention::ALL
        .iter()
        .map(|&m| format!("{:?}: {}", m, analysis.qualitative_indicators.get(m).count))
        .collect();
    eprintln!("\nMentions: {}", mentions.join(", "));

    for r in &analysis.recommendations {
        eprintln!("  * {}", r.message());
    }
}
