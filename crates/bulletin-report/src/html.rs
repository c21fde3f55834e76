//! HTML report generator.
//!
//! Produces a self-contained, right-to-left HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use bulletin_core::engine::{HighlightedStudent, Mention};
use bulletin_core::report::AnalysisReport;
use bulletin_core::statistics::SubjectStatistics;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// CSS class for a mean on the 20-point scale.
fn grade_class(mean: f64) -> &'static str {
    if mean >= 12.0 {
        "pass"
    } else if mean >= 10.0 {
        "near"
    } else {
        "fail"
    }
}

/// Generate an HTML report from an analysis report.
pub fn generate_html(report: &AnalysisReport) -> String {
    let analysis = &report.analysis;
    let meta = &analysis.meta;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>تحليل نتائج {} — {}</title>\n",
        html_escape(&meta.level),
        html_escape(&meta.semester)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    if let Some(school) = &report.school_name {
        html.push_str(&format!("<p class=\"school\">{}</p>\n", html_escape(school)));
    }
    html.push_str(&format!(
        "<h1>تحليل نتائج المستوى {} — {}</h1>\n",
        html_escape(&meta.level),
        html_escape(&meta.semester)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">{} | {} تلميذ | {}</p>\n",
        html_escape(&report.roster.name),
        meta.total_students,
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    let h = &analysis.highlights;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>ملخص</h2>\n");
    html.push_str("<div class=\"cards\">\n");
    for (label, value) in [
        ("المعدل العام", format!("{:.2}", h.general_mean)),
        ("نسبة النجاح", format!("{:.1}%", h.success_rate)),
        ("نسبة الإعادة", format!("{:.1}%", h.repeat_rate)),
        ("عدد التلاميذ", meta.total_students.to_string()),
    ] {
        html.push_str(&format!(
            "<div class=\"card\"><span>{label}</span><strong>{value}</strong></div>\n"
        ));
    }
    html.push_str("</div>\n");
    if !analysis.subjects.is_empty() {
        html.push_str(&generate_bar_chart(&analysis.subjects));
    }
    html.push_str("</section>\n");

    // Subject statistics
    html.push_str("<section>\n<h2>نتائج المواد</h2>\n");
    html.push_str("<table id=\"subjects\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable('subjects', 0)\">المادة</th><th onclick=\"sortTable('subjects', 1)\">الحاضرون</th><th onclick=\"sortTable('subjects', 2)\">المتوسط</th><th onclick=\"sortTable('subjects', 3)\">الانحراف المعياري</th><th onclick=\"sortTable('subjects', 4)\">معامل الاختلاف</th><th onclick=\"sortTable('subjects', 5)\">نسبة النجاح</th><th>أعلى علامة</th><th>أدنى علامة</th><th>الأداء</th><th>الانسجام</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &analysis.subjects {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{:.2}</td><td>{:.2}</td><td>{:.1}%</td><td>{:.1}%</td><td>{:.2}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&s.name),
            s.present,
            grade_class(s.mean),
            s.mean,
            s.std_dev,
            s.coefficient_of_variation,
            s.success_rate,
            s.best_score,
            s.worst_score,
            s.performance.label(),
            s.cohesion.label(),
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Gender comparison
    let gender = &analysis.gender_analysis;
    html.push_str("<section>\n<h2>المقارنة حسب الجنس</h2>\n");
    html.push_str("<table>\n<thead><tr><th>المادة</th><th>متوسط الذكور</th><th>نجاح الذكور</th><th>متوسط الإناث</th><th>نجاح الإناث</th></tr></thead>\n<tbody>\n");
    for (male, female) in gender.male.iter().zip(&gender.female) {
        if !male.has_scores() && !female.has_scores() {
            continue;
        }
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.2}</td><td>{:.1}%</td><td>{:.2}</td><td>{:.1}%</td></tr>\n",
            html_escape(&male.name),
            male.mean,
            male.success_rate,
            female.mean,
            female.success_rate
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Class ranking
    html.push_str("<section>\n<h2>ترتيب الأقسام</h2>\n");
    html.push_str("<table>\n<thead><tr><th>الرتبة</th><th>القسم</th><th>عدد التلاميذ</th><th>المتوسط</th></tr></thead>\n<tbody>\n");
    for c in &analysis.class_ranking {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{:.2}</td></tr>\n",
            c.rank,
            html_escape(&c.class),
            c.student_count,
            grade_class(c.mean),
            c.mean
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Mentions
    html.push_str("<section>\n<h2>المؤشرات النوعية</h2>\n");
    html.push_str("<table>\n<thead><tr><th>التقدير</th><th>العدد</th><th>النسبة</th></tr></thead>\n<tbody>\n");
    for mention in Mention::ALL {
        let bucket = analysis.qualitative_indicators.get(mention);
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            mention.label(),
            bucket.count,
            bucket.percentage
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Orientation
    html.push_str("<section>\n<h2>التوجيه</h2>\n");
    html.push_str("<table>\n<thead><tr><th>التوجيه</th><th>المجموع</th><th>%</th><th>ذكور</th><th>%</th><th>إناث</th><th>%</th></tr></thead>\n<tbody>\n");
    for o in &analysis.distribution.orientation {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td><td>{:.1}%</td><td>{}</td><td>{:.1}%</td></tr>\n",
            o.orientation.label(),
            o.total.count,
            o.total.percentage,
            o.male.count,
            o.male.percentage,
            o.female.count,
            o.female.percentage
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Highlights
    html.push_str("<section>\n<h2>تلاميذ بارزون</h2>\n");
    html.push_str(&student_list("تلاميذ في صعوبة", &h.in_difficulty));
    html.push_str(&student_list("تلاميذ متفوقون", &h.excellent));
    html.push_str("</section>\n");

    // Recommendations
    if !analysis.recommendations.is_empty() {
        html.push_str("<section>\n<h2>توصيات</h2>\n<ul class=\"recommendations\">\n");
        for r in &analysis.recommendations {
            html.push_str(&format!("<li>{}</li>\n", html_escape(&r.message())));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>البيانات الخام (JSON)</summary>\n");
    html.push_str("<pre dir=\"ltr\"><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn student_list(title: &str, students: &[HighlightedStudent]) -> String {
    let mut out = format!("<h3>{title} ({})</h3>\n", students.len());
    if students.is_empty() {
        return out;
    }
    out.push_str("<table>\n<thead><tr><th>الاسم</th><th>القسم</th><th>المعدل</th></tr></thead>\n<tbody>\n");
    for s in students {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{:.2}</td></tr>\n",
            html_escape(&s.name),
            html_escape(&s.class),
            grade_class(s.general_average),
            s.general_average
        ));
    }
    out.push_str("</tbody></table>\n");
    out
}

/// Horizontal bar chart of subject means, bars growing right to left.
fn generate_bar_chart(subjects: &[SubjectStatistics]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 200;
    let scale = 20.0;

    let total_height = subjects.len() * (bar_height + padding) + padding;
    let chart_width = label_width + max_width + 60;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        chart_width, total_height
    );

    for (i, s) in subjects.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = ((s.mean / scale).clamp(0.0, 1.0) * max_width as f64) as usize;
        let right = chart_width - label_width;

        let color = match grade_class(s.mean) {
            "pass" => "#22c55e",
            "near" => "#eab308",
            _ => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"start\" dominant-baseline=\"middle\">{}</text>\n",
            right + 10,
            y + bar_height / 2,
            html_escape(&s.name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            right - width,
            y,
            width,
            bar_height,
            color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{:.2}</text>\n",
            (right - width).saturating_sub(8),
            y + bar_height / 2,
            s.mean
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --near: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --near: #713f12; --fail: #7f1d1d; }
}
body { font-family: 'Noto Naskh Arabic', 'Segoe UI', Tahoma, sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .school { color: #6b7280; }
.cards { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; display: flex; flex-direction: column; }
.card strong { font-size: 1.5rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: right; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.near { background: var(--near); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; text-align: left; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  const key = r => {
    const t = r.cells[col].textContent;
    const n = parseFloat(t);
    return isNaN(n) ? t : n;
  };
  rows.sort((a, b) => {
    const va = key(a), vb = key(b);
    const cmp = typeof va === 'number' && typeof vb === 'number' ? va - vb : String(va).localeCompare(String(vb), 'ar');
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use bulletin_core::engine::analyze;
    use bulletin_core::model::{Sex, StudentRecord, Subject};
    use bulletin_core::report::RosterSummary;

    fn make_test_report() -> AnalysisReport {
        let students = vec![
            StudentRecord::new("1", "Amine <A>", Sex::Male, "4AM1")
                .with_score(Subject::Arabic, 14.0)
                .with_score(Subject::Mathematics, 7.5),
            StudentRecord::new("2", "Sara", Sex::Female, "4AM2")
                .with_score(Subject::Arabic, 17.0)
                .with_score(Subject::Mathematics, 16.5),
        ];
        let analysis = analyze(&students, "S1", "4AM");
        AnalysisReport::new(
            RosterSummary {
                id: "4am".into(),
                name: "Test Roster".into(),
                student_count: 2,
            },
            analysis,
        )
        .with_school_name(Some("CEM Ibn Khaldoun".into()))
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report);

        assert!(html.contains("<html lang=\"ar\" dir=\"rtl\">"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Test Roster"));
        assert!(html.contains("CEM Ibn Khaldoun"));
        assert!(html.contains(Subject::Arabic.display_name()));
        assert!(html.contains("4AM2"));
        assert!(html.contains("<svg"));
        assert!(html.contains(Mention::Excellence.label()));
    }

    #[test]
    fn html_report_escapes_names() {
        let html = generate_html(&make_test_report());
        assert!(!html.contains("Amine <A>"));
        assert!(html.contains("Amine &lt;A&gt;"));
    }

    #[test]
    fn empty_analysis_renders_without_chart() {
        let report = AnalysisReport::new(
            RosterSummary {
                id: "empty".into(),
                name: "Empty".into(),
                student_count: 0,
            },
            analyze(&[], "S1", "4AM"),
        );
        let html = generate_html(&report);
        assert!(html.contains("</html>"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
