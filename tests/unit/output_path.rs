use chrono::{DateTime, Utc};
use std::path::PathBuf;
use timeshift_recorder::output::{format_occurrence, OutputError, OutputPathBuilder};

fn occurrence() -> DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339("2026-01-13T03:00:00+09:00").unwrap()
}

#[test]
fn test_path_layout() {
    let path = OutputPathBuilder::new(PathBuf::from("recordings"), occurrence(), "TBS", "Tuesday JUNK")
        .build()
        .unwrap();
    assert_eq!(path, PathBuf::from("recordings/20260113030000-TBS-Tuesday JUNK.aac"));
}

#[test]
fn test_occurrence_rendered_in_reference_zone() {
    // 18:00 UTC on the 12th is 03:00 JST on the 13th
    let utc: DateTime<Utc> = "2026-01-12T18:00:00Z".parse().unwrap();
    assert_eq!(format_occurrence(&utc), "20260113030000");

    let path = OutputPathBuilder::new(PathBuf::from("out"), utc, "TBS", "Show")
        .build()
        .unwrap();
    assert_eq!(path, PathBuf::from("out/20260113030000-TBS-Show.aac"));
}

#[test]
fn test_sanitize_replaces_path_separators() {
    let path = OutputPathBuilder::new(PathBuf::from("out"), occurrence(), "ST/1", "News: A\\B")
        .build()
        .unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(name, "20260113030000-ST_1-News_ A_B.aac");
    assert_eq!(path.parent().unwrap(), PathBuf::from("out"));
}

#[test]
fn test_sanitize_blocks_traversal() {
    let path = OutputPathBuilder::new(PathBuf::from("out"), occurrence(), "..", "../../etc/passwd")
        .build()
        .unwrap();
    assert_eq!(path.parent().unwrap(), PathBuf::from("out"));
    assert!(!path.to_string_lossy().contains(".."));
}

#[test]
fn test_custom_extension() {
    let builder = OutputPathBuilder::new(PathBuf::from("out"), occurrence(), "TBS", "Show");

    let with_dot = builder.clone().with_extension(".m4a").file_name().unwrap();
    let without_dot = builder.clone().with_extension("m4a").file_name().unwrap();
    assert_eq!(with_dot, "20260113030000-TBS-Show.m4a");
    assert_eq!(with_dot, without_dot);
}

#[test]
fn test_invalid_extension_rejected() {
    let builder = OutputPathBuilder::new(PathBuf::from("out"), occurrence(), "TBS", "Show");

    for ext in ["", "a/b", "a..b"] {
        let result = builder.clone().with_extension(ext).build();
        assert!(
            matches!(result, Err(OutputError::InvalidExtension(_))),
            "extension {ext:?} should be rejected"
        );
    }
}
