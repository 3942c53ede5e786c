//! Translate every serialized tree under `tests/fixtures/` and compare the
//! output against the lines listed in the matching `.expected` file.

use std::path::{Path, PathBuf};

use translator::pipeline::{SourceUnit, Translator};
use walkdir::WalkDir;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn fixtures() -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(fixture_dir())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    found.sort();
    found
}

#[test]
fn test_fixtures_translate_cleanly() {
    translator::logging::init_test();
    let paths = fixtures();
    assert!(!paths.is_empty(), "no fixtures in {}", fixture_dir().display());

    let translator = Translator::default();
    for path in paths {
        let unit = SourceUnit::from_path(&path).unwrap();
        let output = translator.translate(&[unit]).unwrap();
        assert!(
            !output.has_errors(),
            "{}:\n{}",
            path.display(),
            translator.format_diagnostics(&output.diagnostics)
        );
        assert!(output.header.starts_with("#pragma once"));

        let expected = std::fs::read_to_string(path.with_extension("expected")).unwrap();
        for line in expected.lines().filter(|line| !line.trim().is_empty()) {
            assert!(
                output.source.contains(line),
                "{}: missing {:?} in\n{}",
                path.display(),
                line,
                output.source
            );
        }
    }
}

#[test]
fn test_counter_fixture_stats() {
    let unit = SourceUnit::from_path(&fixture_dir().join("counter.json")).unwrap();
    let output = Translator::default().translate(&[unit]).unwrap();

    assert_eq!(output.stats.classes, 2);
    assert_eq!(output.stats.constructors, 1);
    assert_eq!(output.stats.methods, 4);
    assert!(output.header.contains("namespace counting {"));
    assert!(output.header.contains("struct __Counter_VT {"));
}
