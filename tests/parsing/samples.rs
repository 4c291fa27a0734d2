use std::fs;
use std::path::{Path, PathBuf};

use turnstile::parsing;

fn collect(dir: &Path) -> Vec<PathBuf> {
    assert!(dir.exists(), "{:?} directory missing", dir);

    let entries = fs::read_dir(dir).expect("Failed to read directory");

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.expect("Failed to read directory entry");
        let path = entry.path();

        if path
            .extension()
            .and_then(|s| s.to_str())
            == Some("tr")
        {
            files.push(path);
        }
    }

    assert!(!files.is_empty(), "No .tr files found in {:?}", dir);

    files.sort();
    files
}

#[test]
fn ensure_samples_validate() {
    let mut failures = Vec::new();

    for file in collect(Path::new("tests/samples/"))
        .iter()
        .chain(collect(Path::new("tests/golden/")).iter())
    {
        let content = parsing::load(file)
            .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

        match turnstile::parse_and_validate(&content) {
            Ok(_) => {}
            Err(diagnostics) => {
                for diagnostic in &diagnostics {
                    println!("{:?}: {}", file, diagnostic);
                }
                failures.push(file.clone());
            }
        }
    }

    if !failures.is_empty() {
        panic!(
            "Sample files should validate successfully, but {} files failed",
            failures.len()
        );
    }
}

#[test]
fn ensure_broken_fail() {
    let mut unexpected_successes = Vec::new();

    for file in &collect(Path::new("tests/broken/")) {
        let content = parsing::load(file)
            .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

        if turnstile::parse_and_validate(&content).is_ok() {
            println!("File {:?} unexpectedly validated successfully", file);
            unexpected_successes.push(file.clone());
        }
    }

    if !unexpected_successes.is_empty() {
        panic!(
            "Broken files should not validate successfully, but {} files passed",
            unexpected_successes.len()
        );
    }
}

#[test]
fn lookup_after_validation() {
    let content = parsing::load(Path::new("tests/samples/lookup.tr")).unwrap();
    let validated = turnstile::parse_and_validate(&content).unwrap();

    let (production, rule) = validated
        .lookup("shadow")
        .unwrap();
    assert_eq!(production.name.0, "Shadow");
    assert_eq!(rule.premises.len(), 2);

    let environment = validated
        .environment("shadow")
        .unwrap();
    assert!(environment.contains(&turnstile::language::Variable::new("x₁", 0)));
    assert!(!environment.contains(&turnstile::language::Variable::new("y", 0)));

    assert!(validated
        .lookup("missing")
        .is_none());
}

#[test]
fn missing_file() {
    let result = parsing::load(Path::new("tests/samples/nonexistent.tr"));
    let error = result.unwrap_err();
    assert_eq!(error.problem, "File not found");
}
