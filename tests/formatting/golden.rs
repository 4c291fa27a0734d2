use std::fs;
use std::path::Path;

use turnstile::formatting::*;
use turnstile::parsing;

/// Files in tests/golden/ are in their canonical formatted form; running the
/// format command over them must reproduce them exactly. If one fails,
/// either the parser & formatter is wrong or the golden file needs
/// reformatting after a deliberate style change.

fn show_diff(original: &str, formatted: &str, file_path: &Path) {
    let original_lines: Vec<&str> = original
        .lines()
        .collect();
    let formatted_lines: Vec<&str> = formatted
        .lines()
        .collect();

    let max_lines = original_lines
        .len()
        .max(formatted_lines.len());

    println!("\nDifferences found in file: {:?}", file_path);
    println!("--- Original");
    println!("+++ Formatted");

    for i in 0..max_lines {
        let orig_line = original_lines
            .get(i)
            .unwrap_or(&"");
        let fmt_line = formatted_lines
            .get(i)
            .unwrap_or(&"");

        if orig_line != fmt_line {
            println!("@@ Line {} @@", i + 1);
            println!("- {}", orig_line);
            println!("+ {}", fmt_line);
        }
    }
}

#[test]
fn ensure_identical_output() {
    let dir = Path::new("tests/golden");

    assert!(dir.exists(), "golden directory missing");

    let entries = fs::read_dir(dir).expect("Failed to read golden directory");

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

    assert!(!files.is_empty(), "No .tr files found in golden directory");

    let mut failures = Vec::new();

    for file in &files {
        let original = parsing::load(file)
            .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

        let document = parsing::parse(&original)
            .unwrap_or_else(|e| panic!("Failed to parse file {:?}: {:?}", file, e));

        let formatted = render(&Identity, &document);

        if original != formatted {
            show_diff(&original, &formatted, file);
            failures.push(file.clone());
        }
    }

    if !failures.is_empty() {
        panic!(
            "Golden files should format unchanged, but {} files differed",
            failures.len()
        );
    }
}
