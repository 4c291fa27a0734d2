use std::fs;
use std::path::Path;

use turnstile::formatting::*;
use turnstile::language::{Declaration, Document};
use turnstile::parsing;

/// Structural equality that ignores where declarations sit in the source.
fn assert_same(before: &Document, after: &Document) {
    assert_eq!(
        before
            .declarations
            .len(),
        after
            .declarations
            .len()
    );

    for (one, two) in before
        .declarations
        .iter()
        .zip(after.declarations.iter())
    {
        match (one, two) {
            (Declaration::Production(one), Declaration::Production(two)) => {
                assert_eq!(one.name, two.name);
                assert_eq!(one.rule, two.rule);
                assert_eq!(one.rhs, two.rhs);
            }
            (Declaration::Typing(one), Declaration::Typing(two)) => {
                assert_eq!(one.name, two.name);
                assert_eq!(one.premises, two.premises);
                assert_eq!(one.conclusion, two.conclusion);
            }
            (Declaration::Comment(one), Declaration::Comment(two)) => {
                assert_eq!(one.trim(), two.trim());
            }
            _ => panic!("declarations differ: {:?} vs {:?}", one, two),
        }
    }
}

#[test]
fn samples_survive_reformatting() {
    let dir = Path::new("tests/samples");
    let entries = fs::read_dir(dir).expect("Failed to read samples directory");

    for entry in entries {
        let path = entry
            .expect("Failed to read directory entry")
            .path();
        if path
            .extension()
            .and_then(|s| s.to_str())
            != Some("tr")
        {
            continue;
        }

        let content = parsing::load(&path).unwrap();
        let before = parsing::parse(&content)
            .unwrap_or_else(|e| panic!("Failed to parse {:?}: {:?}", path, e));

        let formatted = render(&Identity, &before);
        let after = parsing::parse(&formatted)
            .unwrap_or_else(|e| panic!("Formatted {:?} no longer parses: {:?}", path, e));

        assert_same(&before, &after);

        // and formatting is idempotent
        assert_eq!(render(&Identity, &after), formatted);
    }
}

#[test]
fn reformatted_samples_still_validate() {
    let content = parsing::load(Path::new("tests/samples/stlc.tr")).unwrap();
    let document = parsing::parse(&content).unwrap();

    let formatted = render(&Identity, &document);
    assert!(turnstile::parse_and_validate(&formatted).is_ok());
    assert!(formatted.contains("τ -> σ\n"));
    assert!(formatted.contains("Γ ⊢ e₁ : τ -> σ, Γ ⊢ e₂ : τ\n"));
}

#[test]
fn terminal_output_differs_only_in_markup() {
    let content = parsing::load(Path::new("tests/golden/stlc.tr")).unwrap();
    let document = parsing::parse(&content).unwrap();

    let plain = render(&Identity, &document);
    let coloured = render(&Terminal, &document);

    let re = regex::Regex::new("\x1b\\[[0-9;]*m").unwrap();
    assert_eq!(re.replace_all(&coloured, ""), plain);
}
