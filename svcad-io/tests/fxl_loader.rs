use std::fs;
use std::path::PathBuf;

use svcad_core::feature::FeatureKind;
use svcad_io::{FxlFacade, IoError, LibraryLoader, parse_codes, parse_layers};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_library_builds_all_tables() {
    let library = FxlFacade::new()
        .load(&fixture("library.fxl"))
        .expect("读取要素库失败");

    assert_eq!(library.layers().count(), 4);
    assert_eq!(library.point_codes().len(), 3);
    assert_eq!(library.line_codes().len(), 3);

    let kerb = library.layer("Kerb").expect("Kerb layer");
    assert_eq!(kerb.color_source(), Some("FF804000"));
    assert_eq!(kerb.properties.get("LineStyle").map(String::as_str), Some("Dashed"));
    assert_eq!(kerb.resolved_color(), 36);
    assert_eq!(library.layer("BenchMarks").map(|l| l.resolved_color()), Some(1));
    assert_eq!(library.layer("Fences").map(|l| l.resolved_color()), Some(7));

    let kb = library.line_code("kb").expect("kb code");
    assert_eq!(kb.kind, FeatureKind::Line);
    assert_eq!(kb.layer, "Kerb");
    assert_eq!(
        kb.raw_attributes.get("Name").map(String::as_str),
        Some("Kerb Back")
    );
}

#[test]
fn every_code_maps_to_its_declared_layer() {
    let source = fs::read_to_string(fixture("library.fxl")).expect("read fixture");
    let (points, lines, code_layers) = parse_codes(&source).expect("parse codes");

    assert_eq!(code_layers.len(), points.len() + lines.len());
    for code in points.values().chain(lines.values()) {
        assert_eq!(
            code_layers.get(&code.base_code),
            code.raw_attributes.get("Layer"),
            "code {} should map to its Layer attribute",
            code.base_code
        );
    }
}

#[test]
fn parsing_twice_yields_identical_tables() {
    let source = fs::read_to_string(fixture("library.fxl")).expect("read fixture");
    assert_eq!(
        parse_layers(&source).expect("first"),
        parse_layers(&source).expect("second")
    );

    let loader = FxlFacade::new();
    let first = loader.load(&fixture("library.fxl")).expect("first load");
    let second = loader.load(&fixture("library.fxl")).expect("second load");
    assert_eq!(first, second);
}

#[test]
fn malformed_library_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.fxl");
    fs::write(&path, "<FeatureDefinitionLibrary><LayerDefinitions>").expect("write");

    let err = FxlFacade::new().load(&path).unwrap_err();
    assert!(matches!(err, IoError::MalformedLibrary { .. }), "{err}");
}

#[test]
fn missing_library_reports_read_error() {
    let err = FxlFacade::new()
        .load(&fixture("does_not_exist.fxl"))
        .unwrap_err();
    assert!(matches!(err, IoError::LibraryRead { .. }));
}
