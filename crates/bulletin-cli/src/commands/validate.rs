//! The `bulletin validate` command.

use std::path::PathBuf;

use anyhow::Result;

use bulletin_core::config::IndicatorConfig;
use bulletin_core::error::ImportError;

pub fn execute(roster_path: PathBuf) -> Result<()> {
    let rosters = match bulletin_core::parser::load_rosters(&roster_path) {
        Ok(rosters) => rosters,
        Err(err) => {
            if let Some(row) = err.downcast_ref::<ImportError>().and_then(ImportError::row) {
                println!("Record {row} of {} is invalid.", roster_path.display());
            }
            return Err(err);
        }
    };
    let config = IndicatorConfig::default();

    let mut total_warnings = 0;

    for roster in &rosters {
        println!("Roster: {} ({} students)", roster.name, roster.students.len());

        let warnings = bulletin_core::parser::validate_roster(roster, &config);
        for w in &warnings {
            let prefix = w
                .student_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if rosters.is_empty() {
        println!("No roster found.");
    } else if total_warnings == 0 {
        println!("All rosters valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
