use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bulletin_core::model::Subject;
use bulletin_core::parser::{parse_roster_csv_str, parse_roster_toml_str};

fn bench_csv_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_parsing");

    let small = generate_roster_csv(30);
    let medium = generate_roster_csv(300);
    let large = generate_roster_csv(3000);

    group.bench_function("30_students", |b| {
        b.iter(|| parse_roster_csv_str(black_box(&small), black_box("bench.csv".as_ref())))
    });

    group.bench_function("300_students", |b| {
        b.iter(|| parse_roster_csv_str(black_box(&medium), black_box("bench.csv".as_ref())))
    });

    group.bench_function("3000_students", |b| {
        b.iter(|| parse_roster_csv_str(black_box(&large), black_box("bench.csv".as_ref())))
    });

    group.finish();
}

fn bench_toml_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("toml_parsing");

    let small = generate_roster_toml(30);
    let medium = generate_roster_toml(300);

    group.bench_function("30_students", |b| {
        b.iter(|| parse_roster_toml_str(black_box(&small), black_box("bench.toml".as_ref())))
    });

    group.bench_function("300_students", |b| {
        b.iter(|| parse_roster_toml_str(black_box(&medium), black_box("bench.toml".as_ref())))
    });

    group.finish();
}

fn score(i: usize, j: usize) -> f64 {
    ((i * 13 + j * 7) % 81) as f64 / 4.0
}

fn generate_roster_csv(n: usize) -> String {
    let mut s = String::from("id,name,sex,repeater,class,level");
    for subject in Subject::ALL {
        s.push(',');
        s.push_str(subject.key());
    }
    s.push('\n');
    for i in 0..n {
        let sex = if i % 2 == 0 { "M" } else { "F" };
        s.push_str(&format!("{i},Student {i},{sex},{},4AM{},4AM", i % 7 == 0, i % 6 + 1));
        for j in 0..Subject::ALL.len() {
            s.push_str(&format!(",{}", score(i, j)));
        }
        s.push('\n');
    }
    s
}

fn generate_roster_toml(n: usize) -> String {
    let mut s = String::from(
        r#"[roster]
id = "bench"
name = "Benchmark"
level = "4AM"
"#,
    );
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[students]]
id = "{i}"
name = "Student {i}"
sex = "{}"
class = "4AM{}"

[students.scores]
"#,
            if i % 2 == 0 { "male" } else { "female" },
            i % 6 + 1
        ));
        for (j, subject) in Subject::ALL.iter().enumerate() {
            s.push_str(&format!("{} = {:.2}\n", subject.key(), score(i, j)));
        }
    }
    s
}

criterion_group!(benches, bench_csv_parsing, bench_toml_parsing);
criterion_main!(benches);
