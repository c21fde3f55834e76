//! The `bulletin compare` command.

use std::path::PathBuf;

use anyhow::Result;

use bulletin_core::report::AnalysisReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = AnalysisReport::load_json(&baseline_path)?;
    let current = AnalysisReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison {} -> {}: {} regressions, {} improvements, {} unchanged",
                report.baseline_semester,
                report.current_semester,
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );
            println!(
                "Success rate: {:.1}% -> {:.1}% ({:+.1})",
                report.baseline_success_rate, report.current_success_rate, report.success_rate_delta
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2})",
                        r.subject, r.baseline_mean, r.current_mean, r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2})",
                        i.subject, i.baseline_mean, i.current_mean, i.delta
                    );
                }
            }

            if !report.new_subjects.is_empty() {
                println!("\n{} new subject(s)", report.new_subjects.len());
            }
            if !report.removed_subjects.is_empty() {
                println!("{} removed subject(s)", report.removed_subjects.len());
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
