//! The `bulletin init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create bulletin.toml
    if std::path::Path::new("bulletin.toml").exists() {
        println!("bulletin.toml already exists, skipping.");
    } else {
        std::fs::write("bulletin.toml", SAMPLE_CONFIG)?;
        println!("Created bulletin.toml");
    }

    // Create example roster
    std::fs::create_dir_all("rosters")?;
    let example_path = std::path::Path::new("rosters/example.csv");
    if example_path.exists() {
        println!("rosters/example.csv already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ROSTER)?;
        println!("Created rosters/example.csv");
    }

    println!("\nNext steps:");
    println!("  1. Edit bulletin.toml with your school name");
    println!("  2. Run: bulletin validate --roster rosters/example.csv");
    println!("  3. Run: bulletin analyze --roster rosters/example.csv --semester S1 --level 4AM");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# bulletin configuration

school_name = "${BULLETIN_SCHOOL_NAME}"
output_dir = "./bulletin-reports"
default_format = "json,html"

# Every table below is optional; omitted keys keep their defaults.
[indicators]
max_score = 20.0
pass_mark = 10.0
near_pass_mark = 8.0

[indicators.orientation]
scientific = 16.0
technical = 14.0
vocational = 10.0

[indicators.mentions]
excellence = 18.0
congratulations = 15.0
encouragement = 14.0
honor_roll = 12.0
"#;

const EXAMPLE_ROSTER: &str = "\
id,name,sex,repeater,class,level,arabic,french,english,mathematics,natural_science,physics,history_geography,islamic,civic
1,Amine Benali,M,0,4AM1,4AM,13.5,11,12,15,14,13.5,12,16,15
2,Sara Khelifi,F,0,4AM1,4AM,17,16.5,18,17.5,16,17,15.5,18,17
3,Yacine Haddad,M,1,4AM1,4AM,8,6.5,7,9,8.5,7,9,11,10
4,Lina Mansouri,F,0,4AM2,4AM,15,14,16,12.5,13,12,14,17,16
5,Karim Bouzid,M,0,4AM2,4AM,10,9,,11,10.5,9.5,10,12,13
6,Nour Zerrouki,F,1,4AM2,4AM,11.5,12,13,10,11,10,12.5,14,14
";

#[cfg(test)]
mod tests {
    use super::*;
    use bulletin_core::parser::parse_roster_csv_str;

    #[test]
    fn sample_config_parses() {
        let config = bulletin_core::config::parse_config_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.default_format, "json,html");
        assert_eq!(config.indicators.orientation.scientific, 16.0);
    }

    #[test]
    fn example_roster_parses() {
        let roster = parse_roster_csv_str(EXAMPLE_ROSTER, "example.csv".as_ref()).unwrap();
        assert_eq!(roster.students.len(), 6);
        assert_eq!(roster.level.as_deref(), Some("4AM"));
    }
}
