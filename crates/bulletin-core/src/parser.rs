//! Roster import.
//!
//! Loads student records from CSV exports of the school register or from
//! hand-written TOML rosters, and validates them.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::IndicatorConfig;
use crate::error::ImportError;
use crate::model::{Roster, Sex, StudentRecord, Subject};

/// Intermediate TOML structure for roster files.
#[derive(Debug, Deserialize)]
struct TomlRosterFile {
    roster: TomlRosterHeader,
    #[serde(default)]
    students: Vec<TomlStudent>,
}

#[derive(Debug, Deserialize)]
struct TomlRosterHeader {
    id: String,
    name: String,
    #[serde(default)]
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    name: String,
    sex: String,
    #[serde(default)]
    repeater: bool,
    class: String,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    scores: BTreeMap<String, f64>,
    #[serde(default)]
    general_average: Option<f64>,
}

/// Header spellings accepted for the fixed CSV columns.
const ID_HEADERS: &[&str] = &["id", "matricule", "الرقم"];
const NAME_HEADERS: &[&str] = &["name", "nom", "الاسم", "اللقب والاسم"];
const SEX_HEADERS: &[&str] = &["sex", "sexe", "الجنس"];
const REPEATER_HEADERS: &[&str] = &["repeater", "redoublant", "الإعادة", "معيد"];
const CLASS_HEADERS: &[&str] = &["class", "classe", "القسم"];
const LEVEL_HEADERS: &[&str] = &["level", "niveau", "المستوى"];
const AVERAGE_HEADERS: &[&str] = &["general_average", "moyenne", "المعدل"];

/// Column positions resolved from a CSV header row.
#[derive(Debug)]
struct CsvLayout {
    id: Option<usize>,
    name: usize,
    sex: usize,
    repeater: Option<usize>,
    class: usize,
    level: Option<usize>,
    general_average: Option<usize>,
    subjects: Vec<(usize, Subject)>,
}

impl CsvLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        let find = |names: &[&str]| normalized.iter().position(|h| names.contains(&h.as_str()));

        let mut layout = CsvLayout {
            id: find(ID_HEADERS),
            name: find(NAME_HEADERS).ok_or(ImportError::MissingColumn("name"))?,
            sex: find(SEX_HEADERS).ok_or(ImportError::MissingColumn("sex"))?,
            repeater: find(REPEATER_HEADERS),
            class: find(CLASS_HEADERS).ok_or(ImportError::MissingColumn("class"))?,
            level: find(LEVEL_HEADERS),
            general_average: find(AVERAGE_HEADERS),
            subjects: Vec::new(),
        };

        for (i, header) in headers.iter().enumerate() {
            let header = header.trim_start_matches('\u{feff}');
            if let Ok(subject) = header.parse::<Subject>() {
                if layout.subjects.iter().all(|(_, s)| *s != subject) {
                    layout.subjects.push((i, subject));
                }
            } else if !layout.is_fixed_column(i) {
                tracing::debug!("ignoring unknown column '{}'", header.trim());
            }
        }
        Ok(layout)
    }

    fn is_fixed_column(&self, i: usize) -> bool {
        [
            self.id,
            Some(self.name),
            Some(self.sex),
            self.repeater,
            Some(self.class),
            self.level,
            self.general_average,
        ]
        .contains(&Some(i))
    }
}

/// Truthy spellings of the repeater column.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "oui" | "نعم"
    )
}

/// Parse a numeric cell. Empty cells are `None`; a decimal comma is accepted.
fn parse_number(value: &str) -> Option<Result<f64, ()>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace(',', ".").parse::<f64>().map_err(|_| ()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roster".to_string())
}

/// The single level shared by every student, if there is one.
fn common_level(students: &[StudentRecord]) -> Option<String> {
    let levels: BTreeSet<&str> = students
        .iter()
        .map(|s| s.level.as_str())
        .filter(|l| !l.is_empty())
        .collect();
    match levels.len() {
        1 => levels.into_iter().next().map(str::to_string),
        _ => None,
    }
}

/// Parse a roster file, picking the format from the extension.
pub fn parse_roster(path: &Path) -> Result<Roster> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster file: {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => parse_roster_csv_str(&content, path),
        Some("toml") => parse_roster_toml_str(&content, path),
        _ => anyhow::bail!("unsupported roster format: {}", path.display()),
    }
}

/// Parse CSV content into a `Roster`. The roster id and name are the file stem.
pub fn parse_roster_csv_str(content: &str, source_path: &Path) -> Result<Roster> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read CSV header: {}", source_path.display()))?
        .clone();
    let layout = CsvLayout::from_headers(&headers)
        .with_context(|| format!("invalid roster: {}", source_path.display()))?;

    let mut students = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record
            .with_context(|| format!("failed to read CSV row {row}: {}", source_path.display()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let student = student_from_record(&record, &layout, row)
            .with_context(|| format!("invalid roster: {}", source_path.display()))?;
        students.push(student);
    }

    let stem = file_stem(source_path);
    Ok(Roster {
        id: stem.clone(),
        name: stem,
        level: common_level(&students),
        students,
    })
}

fn student_from_record(
    record: &csv::StringRecord,
    layout: &CsvLayout,
    row: usize,
) -> Result<StudentRecord, ImportError> {
    let cell = |i: usize| record.get(i).unwrap_or("").trim();
    let optional = |i: Option<usize>| i.map(cell).unwrap_or("");

    let name = cell(layout.name);
    if name.is_empty() {
        return Err(ImportError::EmptyField { row, column: "name" });
    }
    let class = cell(layout.class);
    if class.is_empty() {
        return Err(ImportError::EmptyField { row, column: "class" });
    }
    let sex_cell = cell(layout.sex);
    let sex: Sex = sex_cell.parse().map_err(|_| ImportError::InvalidSex {
        row,
        value: sex_cell.to_string(),
    })?;

    let id = match optional(layout.id) {
        "" => row.to_string(),
        id => id.to_string(),
    };

    let mut student = StudentRecord::new(id, name, sex, class)
        .with_level(optional(layout.level))
        .with_repeater(parse_flag(optional(layout.repeater)));

    for &(i, subject) in &layout.subjects {
        let value = cell(i);
        match parse_number(value) {
            None => {}
            Some(Ok(score)) => {
                student.scores.insert(subject, score);
            }
            Some(Err(())) => {
                return Err(ImportError::InvalidScore {
                    row,
                    subject,
                    value: value.to_string(),
                })
            }
        }
    }

    if let Some(i) = layout.general_average {
        let value = cell(i);
        match parse_number(value) {
            None => {}
            Some(Ok(avg)) => student.general_average = Some(avg),
            Some(Err(())) => {
                return Err(ImportError::InvalidAverage {
                    row,
                    value: value.to_string(),
                })
            }
        }
    }

    Ok(student)
}

/// Parse TOML content into a `Roster` (useful for testing).
pub fn parse_roster_toml_str(content: &str, source_path: &Path) -> Result<Roster> {
    let parsed: TomlRosterFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let roster_level = parsed.roster.level.clone().unwrap_or_default();

    let students = parsed
        .students
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let row = i + 1;
            let sex: Sex = s.sex.parse().map_err(|_| ImportError::InvalidSex {
                row,
                value: s.sex.clone(),
            })?;

            let scores = s
                .scores
                .into_iter()
                .map(|(key, score)| {
                    let subject: Subject = key
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!("student {}: {}", s.id, e))?;
                    Ok((subject, score))
                })
                .collect::<Result<BTreeMap<_, _>>>()?;

            Ok(StudentRecord {
                id: s.id,
                name: s.name,
                sex,
                repeater: s.repeater,
                class: s.class,
                level: s.level.unwrap_or_else(|| roster_level.clone()),
                scores,
                general_average: s.general_average,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid roster: {}", source_path.display()))?;

    Ok(Roster {
        id: parsed.roster.id,
        name: parsed.roster.name,
        level: parsed.roster.level,
        students,
    })
}

fn is_roster_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "csv" || ext == "toml")
}

/// Recursively load every `.csv` and `.toml` roster from a directory.
///
/// Files that fail to parse are skipped with a warning. The result is sorted
/// by path so repeated runs see the same order.
pub fn load_roster_directory(dir: &Path) -> Result<Vec<Roster>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut rosters = Vec::new();
    for path in paths {
        if path.is_dir() {
            rosters.extend(load_roster_directory(&path)?);
        } else if is_roster_file(&path) {
            match parse_roster(&path) {
                Ok(roster) => rosters.push(roster),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(rosters)
}

/// Load one roster file, or every roster under a directory.
pub fn load_rosters(path: &Path) -> Result<Vec<Roster>> {
    if path.is_dir() {
        load_roster_directory(path)
    } else {
        Ok(vec![parse_roster(path)?])
    }
}

/// A warning from roster validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The student ID (if applicable).
    pub student_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a roster for common data-entry issues.
pub fn validate_roster(roster: &Roster, config: &IndicatorConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for student in &roster.students {
        if !seen_ids.insert(&student.id) {
            warnings.push(ValidationWarning {
                student_id: Some(student.id.clone()),
                message: format!("duplicate student ID: {}", student.id),
            });
        }
    }

    for student in &roster.students {
        if student.name.trim().is_empty() {
            warnings.push(ValidationWarning {
                student_id: Some(student.id.clone()),
                message: "name is empty".into(),
            });
        }

        for (subject, &score) in &student.scores {
            if !(0.0..=config.max_score).contains(&score) {
                warnings.push(ValidationWarning {
                    student_id: Some(student.id.clone()),
                    message: format!(
                        "{} score {} is outside [0, {}]",
                        subject, score, config.max_score
                    ),
                });
            }
        }

        if student.present_scores().next().is_none() {
            warnings.push(ValidationWarning {
                student_id: Some(student.id.clone()),
                message: "no present score; student is absent from every subject".into(),
            });
        }
    }

    let levels: BTreeSet<&str> = roster
        .students
        .iter()
        .map(|s| s.level.as_str())
        .filter(|l| !l.is_empty())
        .collect();
    if levels.len() > 1 {
        warnings.push(ValidationWarning {
            student_id: None,
            message: format!(
                "roster mixes levels: {}",
                levels.into_iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_CSV: &str = "\
id,name,sex,repeater,class,level,arabic,math,physics,french,general_average
1,Amine,M,0,4AM1,4AM,12.5,14,,11,12.75
2,Sara,F,oui,4AM1,4AM,16,17.5,15,0,
3,Yacine,ذكر,نعم,4AM2,4AM,9,\"8,5\",10,7,
";

    const VALID_TOML: &str = r#"
[roster]
id = "4am-s1"
name = "4AM first semester"
level = "4AM"

[[students]]
id = "1"
name = "Amine"
sex = "male"
class = "4AM1"

[students.scores]
arabic = 12.5
math = 14.0
"طبيعة" = 11.0

[[students]]
id = "2"
name = "Sara"
sex = "أنثى"
repeater = true
class = "4AM2"
level = "4AM-bis"
general_average = 15.25

[students.scores]
arabic = 16.0
"#;

    #[test]
    fn parse_valid_csv() {
        let roster = parse_roster_csv_str(VALID_CSV, &PathBuf::from("4am-s1.csv")).unwrap();
        assert_eq!(roster.id, "4am-s1");
        assert_eq!(roster.level.as_deref(), Some("4AM"));
        assert_eq!(roster.students.len(), 3);

        let amine = &roster.students[0];
        assert_eq!(amine.sex, Sex::Male);
        assert!(!amine.repeater);
        assert_eq!(amine.score(Subject::Mathematics), 14.0);
        assert!(!amine.scores.contains_key(&Subject::Physics));
        assert_eq!(amine.general_average, Some(12.75));

        let sara = &roster.students[1];
        assert!(sara.repeater);
        assert_eq!(sara.general_average, None);
        assert!(!sara.is_present(Subject::French));

        let yacine = &roster.students[2];
        assert_eq!(yacine.sex, Sex::Male);
        assert!(yacine.repeater);
        assert_eq!(yacine.score(Subject::Mathematics), 8.5);
    }

    #[test]
    fn csv_accepts_arabic_headers_and_defaults_id() {
        let csv = "الاسم,الجنس,القسم,عربية,رياضيات\nAmine,ذكر,4AM1,12,13\n";
        let roster = parse_roster_csv_str(csv, &PathBuf::from("ar.csv")).unwrap();
        let s = &roster.students[0];
        assert_eq!(s.id, "1");
        assert_eq!(s.score(Subject::Arabic), 12.0);
        assert_eq!(s.score(Subject::Mathematics), 13.0);
        assert_eq!(roster.level, None);
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let csv = "id,name,class\n1,Amine,4AM1\n";
        let err = parse_roster_csv_str(csv, &PathBuf::from("bad.csv")).unwrap_err();
        let import = err.downcast_ref::<ImportError>().unwrap();
        assert!(matches!(import, ImportError::MissingColumn("sex")));
    }

    #[test]
    fn csv_bad_score_reports_row() {
        let csv = "name,sex,class,arabic\nAmine,M,4AM1,12\nSara,F,4AM1,abc\n";
        let err = parse_roster_csv_str(csv, &PathBuf::from("bad.csv")).unwrap_err();
        let import = err.downcast_ref::<ImportError>().unwrap();
        assert_eq!(import.row(), Some(2));
        assert!(format!("{err:#}").contains("abc"));
    }

    #[test]
    fn csv_bad_sex_is_an_error() {
        let csv = "name,sex,class\nAmine,x,4AM1\n";
        let err = parse_roster_csv_str(csv, &PathBuf::from("bad.csv")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::InvalidSex { row: 1, .. })
        ));
    }

    #[test]
    fn parse_valid_toml() {
        let roster = parse_roster_toml_str(VALID_TOML, &PathBuf::from("r.toml")).unwrap();
        assert_eq!(roster.id, "4am-s1");
        assert_eq!(roster.students.len(), 2);
        assert_eq!(roster.students[0].level, "4AM");
        assert_eq!(roster.students[0].score(Subject::NaturalScience), 11.0);
        assert_eq!(roster.students[1].sex, Sex::Female);
        assert_eq!(roster.students[1].level, "4AM-bis");
        assert_eq!(roster.students[1].general_average, Some(15.25));
    }

    #[test]
    fn toml_unknown_subject_is_an_error() {
        let toml = r#"
[roster]
id = "x"
name = "x"

[[students]]
id = "1"
name = "Amine"
sex = "m"
class = "A"

[students.scores]
astrology = 12.0
"#;
        let err = parse_roster_toml_str(toml, &PathBuf::from("x.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("astrology"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_roster_toml_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_data_entry_issues() {
        let csv = "\
id,name,sex,class,level,arabic,math
1,Amine,M,A,4AM,12,25
1,Sara,F,A,3AM,14,-1
2,Yacine,M,A,4AM,0,
";
        let roster = parse_roster_csv_str(csv, &PathBuf::from("v.csv")).unwrap();
        let warnings = validate_roster(&roster, &IndicatorConfig::default());
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert_eq!(messages.iter().filter(|m| m.contains("outside")).count(), 2);
        assert!(messages.iter().any(|m| m.contains("no present score")));
        assert!(messages.iter().any(|m| m.contains("mixes levels")));
    }

    #[test]
    fn validate_clean_roster() {
        let roster = parse_roster_csv_str(VALID_CSV, &PathBuf::from("ok.csv")).unwrap();
        assert!(validate_roster(&roster, &IndicatorConfig::default()).is_empty());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), VALID_CSV).unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("b.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.csv"), "id,name\n1,x\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let rosters = load_roster_directory(dir.path()).unwrap();
        let ids: Vec<&str> = rosters.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "4am-s1"]);
    }

    #[test]
    fn load_rosters_accepts_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.csv");
        std::fs::write(&path, VALID_CSV).unwrap();
        let rosters = load_rosters(&path).unwrap();
        assert_eq!(rosters.len(), 1);
        assert_eq!(rosters[0].students.len(), 3);
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        std::fs::write(&path, "").unwrap();
        assert!(parse_roster(&path).is_err());
    }
}
