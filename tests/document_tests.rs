/// Document loading integration tests — diagnostics a host would show
/// to an author, and the no-partial-model guarantee.

use dialogue_engine::core::context::{ContextError, DialogueContext};
use dialogue_engine::schema::document::{DialogueDocument, JsonErrorKind, LoadError};

#[test]
fn dangling_reference_fails_construction_entirely() {
    let json = r#"{
        "version": 1,
        "nodes": [
            { "type": "line", "speaker": "a", "text": "fine", "next": 1 },
            { "type": "line", "speaker": "a", "text": "dangles", "next": 42 }
        ]
    }"#;

    // The loader reports the bad successor...
    let err = DialogueDocument::load(json).unwrap_err();
    assert!(matches!(err, LoadError::BadNextNode { node: 1, next: 42 }));

    // ...and the facade builder yields no usable context.
    let built = DialogueContext::builder().seed(1).build(json);
    assert!(matches!(
        built.unwrap_err(),
        ContextError::Document(LoadError::BadNextNode { .. })
    ));
}

#[test]
fn parse_failure_kinds_are_distinguishable() {
    let cases: &[(&str, JsonErrorKind)] = &[
        (r#"{ "nodes": [] }"#, JsonErrorKind::MissingField),
        (r#"{ "version": 1, "nodes": ["#, JsonErrorKind::UnexpectedEndOfInput),
        (r#"{ version: 1 }"#, JsonErrorKind::SyntaxError),
        (
            r#"{ "version": 1, "nodes": [ { "type": "portal" } ] }"#,
            JsonErrorKind::InvalidEnumTag,
        ),
        (
            r#"{ "version": true, "nodes": [] }"#,
            JsonErrorKind::UnexpectedToken,
        ),
        (r#"{ "version": -1, "nodes": [] }"#, JsonErrorKind::Overflow),
        (
            r#"{ "version": 99999999999999999999999, "nodes": [] }"#,
            JsonErrorKind::Overflow,
        ),
    ];
    for (json, expected) in cases {
        match DialogueDocument::load(json).unwrap_err() {
            LoadError::Json { kind, .. } => assert_eq!(kind, *expected, "for {json}"),
            other => panic!("expected json diagnostic for {json}, got {other:?}"),
        }
    }
}

#[test]
fn version_gate_runs_before_node_validation() {
    let json = r#"{
        "version": 2,
        "nodes": [ { "type": "line", "speaker": "a", "text": "b", "next": 99 } ]
    }"#;
    assert!(matches!(
        DialogueDocument::load(json).unwrap_err(),
        LoadError::UnknownVersion(2)
    ));
}

#[test]
fn diagnostics_carry_human_readable_messages() {
    let json = r#"{
        "version": 1,
        "nodes": [ { "type": "line", "speaker": "a", "text": "b", "next": 9 } ]
    }"#;
    let message = DialogueDocument::load(json).unwrap_err().to_string();
    assert!(message.contains('9'), "message should name the bad index: {message}");
}
